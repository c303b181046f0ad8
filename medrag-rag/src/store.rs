//! The evidence store: a vector index plus an optional parallel passage list,
//! searched by a selectable metric.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{info, warn};

use crate::document::{Passage, ScoredPassage};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::{DEFAULT_MMR_LAMBDA, IndexEntry, VectorIndex, default_fetch_k};
use crate::inmemory::InMemoryVectorIndex;
use crate::lexical::bm25_top_k;

/// File name of the serialized index inside a store directory.
const INDEX_FILE: &str = "index.json";
/// File name of the sibling passage list used by lexical search.
const PASSAGES_FILE: &str = "passages.json";

/// A retrieval metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMetric {
    /// Nearest-neighbor cosine similarity with threshold filtering.
    Cosine,
    /// Maximal marginal relevance: relevance balanced against redundancy.
    Mmr,
    /// Keyword BM25 ranking over the passage list.
    Bm25,
}

impl FromStr for SearchMetric {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cosine" => Ok(SearchMetric::Cosine),
            "mmr" => Ok(SearchMetric::Mmr),
            "bm25" => Ok(SearchMetric::Bm25),
            other => Err(RagError::InvalidArgument(format!(
                "unsupported metric '{other}'; supported metrics are 'cosine', 'mmr', and 'bm25'"
            ))),
        }
    }
}

/// A read-only store of retrievable evidence.
///
/// Wraps a [`VectorIndex`] plus an optional parallel passage list (required
/// only by [`SearchMetric::Bm25`], which cannot use the opaque index). The
/// store is constructed once at process start and shared read-only across
/// requests; [`search`](EvidenceStore::search) calls are independent and may
/// run concurrently.
pub struct EvidenceStore {
    index: Arc<dyn VectorIndex>,
    passages: Option<Vec<Passage>>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl EvidenceStore {
    /// Create a store from its parts.
    pub fn new(
        index: Arc<dyn VectorIndex>,
        passages: Option<Vec<Passage>>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self { index, passages, embedder }
    }

    /// Create an empty store. Every search returns no results.
    pub fn empty(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::new(Arc::new(InMemoryVectorIndex::new()), None, embedder)
    }

    /// Load a store from a persisted directory layout.
    ///
    /// The directory holds the serialized index (`index.json`) and a sibling
    /// passage list (`passages.json`). An absent or unreadable directory or
    /// index degrades to an empty store with a warning rather than failing:
    /// retrieval then returns empty results instead of failing every request.
    /// A missing passage list only disables lexical search, surfaced lazily
    /// as a [`RagError::Configuration`] when BM25 is actually requested.
    pub async fn load(dir: impl AsRef<Path>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let dir = dir.as_ref();

        let entries = match read_json::<Vec<IndexEntry>>(&dir.join(INDEX_FILE)).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "could not load vector index, starting empty");
                return Self::empty(embedder);
            }
        };

        let passages = match read_json::<Vec<Passage>>(&dir.join(PASSAGES_FILE)).await {
            Ok(passages) => Some(passages),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "passage list unavailable, BM25 search disabled");
                None
            }
        };

        info!(
            dir = %dir.display(),
            passage_count = entries.len(),
            lexical = passages.is_some(),
            "loaded evidence store"
        );
        Self::new(Arc::new(InMemoryVectorIndex::from_entries(entries)), passages, embedder)
    }

    /// Persist the store to a directory, writing the index and, when
    /// available, the sibling passage list. Ingestion-pipeline entry point.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::StoreLoad`] if the directory or files cannot be
    /// written.
    pub async fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| RagError::StoreLoad(format!("cannot create '{}': {e}", dir.display())))?;

        let entries = self.index.entries().await;
        write_json(&dir.join(INDEX_FILE), &entries).await?;

        if let Some(passages) = &self.passages {
            write_json(&dir.join(PASSAGES_FILE), passages).await?;
        } else {
            warn!("no passage list to save, BM25 search will not be available after reload");
        }

        info!(dir = %dir.display(), passage_count = entries.len(), "saved evidence store");
        Ok(())
    }

    /// Search the store.
    ///
    /// - [`SearchMetric::Cosine`]: embed the query, nearest-neighbor search,
    ///   keep only passages with `score > threshold`, descending order.
    /// - [`SearchMetric::Mmr`]: embed the query, diversity-aware search; the
    ///   threshold is not applied.
    /// - [`SearchMetric::Bm25`]: rank the passage list by BM25.
    ///
    /// Always returns at most `k` passages. Read-only and side-effect free.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidArgument`] if `threshold` is outside `[0, 1]`.
    /// - [`RagError::Configuration`] if BM25 is requested but the store was
    ///   loaded without a passage list.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        metric: SearchMetric,
        threshold: f32,
    ) -> Result<Vec<ScoredPassage>> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(RagError::InvalidArgument(format!(
                "threshold must be within [0, 1], got {threshold}"
            )));
        }

        let results = match metric {
            SearchMetric::Cosine => {
                let embedding = self.embedder.embed(query).await?;
                let results = self.index.similarity_search(&embedding, k).await?;
                results.into_iter().filter(|r| r.score > threshold).collect()
            }
            SearchMetric::Mmr => {
                let embedding = self.embedder.embed(query).await?;
                self.index
                    .mmr_search(&embedding, k, default_fetch_k(k), DEFAULT_MMR_LAMBDA)
                    .await?
            }
            SearchMetric::Bm25 => {
                let passages = self.passages.as_ref().ok_or_else(|| {
                    RagError::Configuration(
                        "passage list not available; BM25 requires ingested or loaded passages"
                            .to_string(),
                    )
                })?;
                bm25_top_k(passages, query, k)
            }
        };

        info!(?metric, k, result_count = results.len(), "evidence search completed");
        Ok(results)
    }

    /// The underlying vector index.
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// The parallel passage list, when available.
    pub fn passage_list(&self) -> Option<&[Passage]> {
        self.passages.as_deref()
    }

    /// The embedding provider.
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| RagError::StoreLoad(format!("cannot read '{}': {e}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| RagError::StoreLoad(format!("cannot parse '{}': {e}", path.display())))
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value)
        .map_err(|e| RagError::StoreLoad(format!("cannot serialize '{}': {e}", path.display())))?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| RagError::StoreLoad(format!("cannot write '{}': {e}", path.display())))
}
