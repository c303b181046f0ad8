//! Vector index trait for nearest-neighbor search over embedded passages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{Passage, ScoredPassage};
use crate::error::Result;

/// A passage paired with its embedding, as held by an index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    /// The passage.
    pub passage: Passage,
    /// The embedding for the passage content.
    pub embedding: Vec<f32>,
}

/// A nearest-neighbor search structure over embedded passages.
///
/// The retrieval path treats an index as opaque and read-only: both search
/// methods take `&self` and may run concurrently. Mutation happens only in
/// the offline ingestion pipeline.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return the `k` entries most similar to `embedding`, with similarity
    /// scores, in descending score order.
    async fn similarity_search(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredPassage>>;

    /// Diversity-aware search by maximal marginal relevance.
    ///
    /// Considers the `fetch_k` most similar candidates and iteratively
    /// selects up to `k` of them, each maximizing
    /// `lambda * sim(query, cand) - (1 - lambda) * max sim(cand, selected)`.
    /// Scores on the returned passages are query similarities.
    async fn mmr_search(
        &self,
        embedding: &[f32],
        k: usize,
        fetch_k: usize,
        lambda: f32,
    ) -> Result<Vec<ScoredPassage>>;

    /// The number of passages held by the index.
    async fn len(&self) -> usize;

    /// Whether the index holds no passages.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot the entries held by the index, in insertion order.
    ///
    /// Used by the persistence path; search never calls this.
    async fn entries(&self) -> Vec<IndexEntry>;
}

/// Default MMR candidate pool size for a given `k`.
pub fn default_fetch_k(k: usize) -> usize {
    (4 * k).max(20)
}

/// Default MMR relevance/diversity balance.
pub const DEFAULT_MMR_LAMBDA: f32 = 0.5;
