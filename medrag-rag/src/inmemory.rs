//! In-memory vector index using cosine similarity.
//!
//! [`InMemoryVectorIndex`] holds entries in a `Vec` behind a
//! `tokio::sync::RwLock`: the serving path takes read locks only, the offline
//! ingestion path appends through [`add`](InMemoryVectorIndex::add).

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::ScoredPassage;
use crate::error::Result;
use crate::index::{IndexEntry, VectorIndex};

/// An in-memory vector index using cosine similarity for search.
#[derive(Debug, Default)]
pub struct InMemoryVectorIndex {
    entries: RwLock<Vec<IndexEntry>>,
}

impl InMemoryVectorIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index from existing entries (e.g. a loaded snapshot).
    pub fn from_entries(entries: Vec<IndexEntry>) -> Self {
        Self { entries: RwLock::new(entries) }
    }

    /// Append entries. Ingestion-path only; must not race the serving reads
    /// unless a fresh index is built and swapped in.
    pub async fn add(&self, entries: Vec<IndexEntry>) {
        self.entries.write().await.extend(entries);
    }

}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn similarity_search(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredPassage>> {
        let entries = self.entries.read().await;

        let mut scored: Vec<ScoredPassage> = entries
            .iter()
            .map(|entry| ScoredPassage {
                passage: entry.passage.clone(),
                score: cosine_similarity(&entry.embedding, embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn mmr_search(
        &self,
        embedding: &[f32],
        k: usize,
        fetch_k: usize,
        lambda: f32,
    ) -> Result<Vec<ScoredPassage>> {
        let entries = self.entries.read().await;

        // Candidate pool: fetch_k most similar to the query.
        let mut candidates: Vec<(&IndexEntry, f32)> = entries
            .iter()
            .map(|entry| (entry, cosine_similarity(&entry.embedding, embedding)))
            .collect();
        candidates
            .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        candidates.truncate(fetch_k);

        // Iteratively pick the candidate maximizing relevance minus
        // redundancy with what is already selected.
        let mut selected: Vec<(&IndexEntry, f32)> = Vec::with_capacity(k.min(candidates.len()));
        while selected.len() < k && !candidates.is_empty() {
            let mut best_idx = 0;
            let mut best_score = f32::NEG_INFINITY;
            for (i, (entry, relevance)) in candidates.iter().enumerate() {
                let redundancy = selected
                    .iter()
                    .map(|(sel, _)| cosine_similarity(&entry.embedding, &sel.embedding))
                    .fold(0.0f32, f32::max);
                let mmr = lambda * relevance - (1.0 - lambda) * redundancy;
                if mmr > best_score {
                    best_score = mmr;
                    best_idx = i;
                }
            }
            selected.push(candidates.remove(best_idx));
        }

        Ok(selected
            .into_iter()
            .map(|(entry, relevance)| ScoredPassage {
                passage: entry.passage.clone(),
                score: relevance,
            })
            .collect())
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    async fn entries(&self) -> Vec<IndexEntry> {
        self.entries.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Passage;

    fn entry(content: &str, embedding: Vec<f32>) -> IndexEntry {
        IndexEntry { passage: Passage::new(content), embedding }
    }

    #[tokio::test]
    async fn similarity_search_orders_by_score() {
        let index = InMemoryVectorIndex::new();
        index
            .add(vec![
                entry("far", vec![0.0, 1.0]),
                entry("near", vec![1.0, 0.0]),
                entry("mid", vec![0.7, 0.7]),
            ])
            .await;

        let results = index.similarity_search(&[1.0, 0.0], 3).await.unwrap();
        let contents: Vec<&str> =
            results.iter().map(|r| r.passage.content.as_str()).collect();
        assert_eq!(contents, vec!["near", "mid", "far"]);
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn empty_index_returns_nothing() {
        let index = InMemoryVectorIndex::new();
        assert!(index.similarity_search(&[1.0, 0.0], 5).await.unwrap().is_empty());
        assert!(index.mmr_search(&[1.0, 0.0], 5, 20, 0.5).await.unwrap().is_empty());
        assert!(index.is_empty().await);
    }

    #[tokio::test]
    async fn mmr_prefers_diversity_over_near_duplicates() {
        let index = InMemoryVectorIndex::new();
        index
            .add(vec![
                entry("a", vec![1.0, 0.0]),
                entry("a-dup", vec![0.999, 0.01]),
                entry("b", vec![0.6, 0.8]),
            ])
            .await;

        let results = index.mmr_search(&[1.0, 0.0], 2, 3, 0.5).await.unwrap();
        let contents: Vec<&str> =
            results.iter().map(|r| r.passage.content.as_str()).collect();
        // The near-duplicate loses to the diverse candidate in round two.
        assert_eq!(contents, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn mmr_respects_k() {
        let index = InMemoryVectorIndex::new();
        index
            .add((0..10).map(|i| entry(&format!("p{i}"), vec![i as f32, 1.0])).collect())
            .await;
        let results = index.mmr_search(&[1.0, 1.0], 3, 20, 0.5).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn cosine_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
