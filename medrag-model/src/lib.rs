//! # medrag-model
//!
//! Chat-completion providers for the medrag grounded QA pipeline.
//!
//! ## Overview
//!
//! This crate defines the [`Llm`] trait, a minimal system-prompt plus
//! user-prompt chat contract with whole-response and token-stream modes,
//! and provides:
//!
//! - [`ChatClient`]: OpenAI-compatible HTTP client (OpenAI, Mistral, Ollama,
//!   or any `/chat/completions` endpoint)
//! - [`MockLlm`]: scripted model for testing
//! - [`with_retry`] / [`RetryConfig`]: exponential backoff for transient
//!   provider failures
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use medrag_model::{ChatClient, Llm, Provider};
//!
//! let model = ChatClient::new(Provider::Ollama, "llama3.1:8b")?;
//! let reply = model.generate("You are a medical assistant.", "Hello").await?;
//! ```
//!
//! ## Streaming and cancellation
//!
//! [`Llm::generate_stream`] returns a finite, single-consumption
//! [`TokenStream`]. Dropping the stream aborts the in-flight request, so a
//! disconnected consumer cancels generation instead of draining it.

pub mod error;
pub mod llm;
pub mod mock;
pub mod openai;
pub mod retry;

pub use error::{ModelError, Result};
pub use llm::{Llm, TokenStream};
pub use mock::MockLlm;
pub use openai::{ChatClient, Provider};
pub use retry::{RetryConfig, with_retry};
