//! # medrag-rag
//!
//! Retrieval-and-grounding core for a medical QA chatbot.
//!
//! ## Overview
//!
//! The pipeline decides per conversational turn whether external evidence is
//! needed, retrieves it, and conditions the model's reply on it:
//!
//! 1. [`RetrievalGate`] asks the model for a bracketed search query, or the
//!    `[NO NEED]` sentinel when the turn needs no evidence.
//! 2. [`EvidenceStore`] searches by a selectable [`SearchMetric`]: cosine
//!    similarity with threshold filtering, maximal marginal relevance, or
//!    BM25 over the passage list.
//! 3. An optional [`Reranker`] re-scores the candidates against the query.
//! 4. [`GroundedResponder`] assembles the evidence and transcript into a
//!    grounding prompt and generates the answer, whole or as a token stream.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use medrag_model::{ChatClient, Provider};
//! use medrag_rag::{EvidenceStore, GroundedResponder, ResponderConfig};
//!
//! let model = Arc::new(ChatClient::new(Provider::Mistral, "mistral-medium")?);
//! let store = Arc::new(EvidenceStore::load("knowledge/vectorstore", embedder).await);
//!
//! let responder = GroundedResponder::builder()
//!     .llm(model)
//!     .store(store)
//!     .config(ResponderConfig::default())
//!     .build()?;
//!
//! let answer = responder.respond("What are the symptoms of influenza?", &history).await?;
//! ```
//!
//! The store is loaded once at process start and shared read-only across
//! requests; each `respond` call is independent and may run concurrently
//! with others.

pub mod config;
pub mod dataset;
pub mod document;
pub mod embedding;
pub mod error;
pub mod gate;
pub mod history;
pub mod index;
pub mod inmemory;
pub mod lexical;
pub mod prompts;
pub mod reranker;
pub mod responder;
pub mod store;

pub use config::{ResponderConfig, ResponderConfigBuilder};
pub use dataset::{QaRecord, load_qa_dataset};
pub use document::{Passage, ScoredPassage};
pub use embedding::{EmbeddingProvider, EmbeddingRegistry};
pub use error::{RagError, Result};
pub use gate::RetrievalGate;
pub use history::{ConversationTurn, transcript};
pub use index::{IndexEntry, VectorIndex};
pub use inmemory::InMemoryVectorIndex;
pub use reranker::{EmbeddingReranker, NoOpReranker, Reranker};
pub use responder::{GroundedResponder, GroundedResponderBuilder};
pub use store::{EvidenceStore, SearchMetric};
