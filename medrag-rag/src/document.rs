//! Data types for passages and search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A retrievable unit of text with provenance metadata.
///
/// Passages are immutable after ingestion: metadata is attached when the
/// passage enters the store and never mutated. They carry no cross-call
/// identity; a retrieval result references them by position only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Passage {
    /// The text body.
    pub content: String,
    /// Provenance metadata (e.g. a `source` identifier), attached at ingestion.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Passage {
    /// Create a passage with no metadata.
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), metadata: HashMap::new() }
    }

    /// Create a passage with a `source` metadata entry.
    pub fn with_source(content: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), serde_json::Value::String(source.into()));
        Self { content: content.into(), metadata }
    }

    /// The `source` metadata entry, if present and a string.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(|v| v.as_str())
    }
}

/// A retrieved [`Passage`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPassage {
    /// The retrieved passage.
    pub passage: Passage,
    /// The relevance score (higher is more relevant).
    pub score: f32,
}
