//! Embedding provider trait and the process-wide provider registry.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends that support native batching should override it.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}

/// A registry of constructed embedding providers, keyed by model identifier.
///
/// Providers are expensive to construct (model download, device placement),
/// so one instance per model is built for the process lifetime. Construction
/// is single-flight: the registry lock is held across the factory call, so
/// concurrent first-accesses for the same key build the provider exactly once.
///
/// # Example
///
/// ```rust,ignore
/// use medrag_rag::EmbeddingRegistry;
///
/// let registry = EmbeddingRegistry::new();
/// let provider = registry
///     .get_or_init("gte-multilingual-base", || async { build_provider().await })
///     .await?;
/// ```
#[derive(Default)]
pub struct EmbeddingRegistry {
    providers: Mutex<HashMap<String, Arc<dyn EmbeddingProvider>>>,
}

impl EmbeddingRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the provider for `model_id`, constructing it with `factory`
    /// on first access.
    ///
    /// A failed construction is not cached; the next access retries.
    pub async fn get_or_init<F, Fut>(
        &self,
        model_id: &str,
        factory: F,
    ) -> Result<Arc<dyn EmbeddingProvider>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<dyn EmbeddingProvider>>>,
    {
        let mut providers = self.providers.lock().await;
        if let Some(existing) = providers.get(model_id) {
            return Ok(Arc::clone(existing));
        }
        let provider = factory().await?;
        providers.insert(model_id.to_string(), Arc::clone(&provider));
        Ok(provider)
    }
}
