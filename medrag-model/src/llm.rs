//! The chat-completion model trait.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::Result;

/// A lazy, finite sequence of generated tokens.
///
/// Single-consumption and not restartable. Dropping the stream cancels the
/// in-flight provider request, so a disconnected consumer stops generation
/// rather than draining it in the background.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A chat-completion language model.
///
/// Implementations wrap a specific provider endpoint behind a unified async
/// interface. Both methods take a system framing and a user prompt and are
/// independent calls; no conversation state is held by the model.
///
/// # Example
///
/// ```rust,ignore
/// use medrag_model::{ChatClient, Llm, Provider};
///
/// let model = ChatClient::new(Provider::Ollama, "llama3.1:8b")?;
/// let reply = model.generate("You are concise.", "Say hi.").await?;
/// ```
#[async_trait]
pub trait Llm: Send + Sync {
    /// The model identifier, for logging and registry keys.
    fn name(&self) -> &str;

    /// Generate a complete response for the given prompts.
    async fn generate(&self, system: &str, user: &str) -> Result<String>;

    /// Generate a response as a stream of tokens.
    ///
    /// The returned stream yields non-empty content deltas in generation
    /// order and ends when the provider signals completion.
    async fn generate_stream(&self, system: &str, user: &str) -> Result<TokenStream>;
}
