//! Reranker trait for re-scoring search results.

use std::sync::Arc;

use async_trait::async_trait;

use crate::document::ScoredPassage;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::inmemory::cosine_similarity;

/// A reranker that re-scores and reorders search results.
///
/// The relevance score is computed against the query directly, independent of
/// whichever metric produced the candidates. Implementations must be
/// deterministic given identical inputs, hold no state between calls, and
/// return a subset of the input passages: never introducing a passage absent
/// from the candidates and never duplicating one.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Rerank search results given the original query.
    ///
    /// Returns the same or fewer passages in a new order, with potentially
    /// updated scores.
    async fn rerank(&self, query: &str, results: Vec<ScoredPassage>)
    -> Result<Vec<ScoredPassage>>;
}

/// A no-op reranker that returns results unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReranker;

#[async_trait]
impl Reranker for NoOpReranker {
    async fn rerank(
        &self,
        _query: &str,
        results: Vec<ScoredPassage>,
    ) -> Result<Vec<ScoredPassage>> {
        Ok(results)
    }
}

/// Reranks by cosine similarity between the query embedding and each
/// passage's content embedding.
///
/// Useful to impose a uniform relevance ordering on candidates produced by a
/// non-similarity metric (MMR, BM25).
pub struct EmbeddingReranker {
    embedder: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingReranker {
    /// Create a reranker using the given embedding provider.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder }
    }
}

#[async_trait]
impl Reranker for EmbeddingReranker {
    async fn rerank(
        &self,
        query: &str,
        results: Vec<ScoredPassage>,
    ) -> Result<Vec<ScoredPassage>> {
        if results.is_empty() {
            return Ok(results);
        }

        let query_embedding = self.embedder.embed(query).await?;
        let texts: Vec<&str> = results.iter().map(|r| r.passage.content.as_str()).collect();
        let passage_embeddings = self.embedder.embed_batch(&texts).await?;

        let mut rescored: Vec<ScoredPassage> = results
            .into_iter()
            .zip(passage_embeddings)
            .map(|(result, embedding)| ScoredPassage {
                score: cosine_similarity(&query_embedding, &embedding),
                passage: result.passage,
            })
            .collect();
        rescored
            .sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(rescored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Passage;

    #[tokio::test]
    async fn noop_preserves_order_and_scores() {
        let input = vec![
            ScoredPassage { passage: Passage::new("a"), score: 0.9 },
            ScoredPassage { passage: Passage::new("b"), score: 0.5 },
        ];
        let output = NoOpReranker.rerank("query", input.clone()).await.unwrap();
        assert_eq!(output.len(), 2);
        assert_eq!(output[0].passage, input[0].passage);
        assert_eq!(output[1].passage, input[1].passage);
    }
}
