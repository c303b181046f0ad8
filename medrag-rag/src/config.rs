//! Configuration for the grounded responder.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::store::SearchMetric;

impl Serialize for SearchMetric {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let name = match self {
            SearchMetric::Cosine => "cosine",
            SearchMetric::Mmr => "mmr",
            SearchMetric::Bm25 => "bm25",
        };
        serializer.serialize_str(name)
    }
}

impl<'de> Deserialize<'de> for SearchMetric {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Configuration parameters for one responder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponderConfig {
    /// Number of top results to request from the store.
    pub top_k: usize,
    /// Retrieval metric.
    pub metric: SearchMetric,
    /// Minimum similarity for cosine results (exclusive).
    pub threshold: f32,
    /// Number of most recent history turns kept in the transcript.
    pub max_history_turns: usize,
    /// The conversational role of the counterpart, used in prompts.
    pub role: String,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            metric: SearchMetric::Mmr,
            threshold: 0.7,
            max_history_turns: 50,
            role: "user".to_string(),
        }
    }
}

impl ResponderConfig {
    /// Create a new builder for constructing a [`ResponderConfig`].
    pub fn builder() -> ResponderConfigBuilder {
        ResponderConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`ResponderConfig`].
#[derive(Debug, Clone, Default)]
pub struct ResponderConfigBuilder {
    config: ResponderConfig,
}

impl ResponderConfigBuilder {
    /// Set the number of top results to request from the store.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the retrieval metric.
    pub fn metric(mut self, metric: SearchMetric) -> Self {
        self.config.metric = metric;
        self
    }

    /// Set the minimum cosine similarity for results.
    pub fn threshold(mut self, threshold: f32) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Set the number of most recent history turns kept in the transcript.
    pub fn max_history_turns(mut self, turns: usize) -> Self {
        self.config.max_history_turns = turns;
        self
    }

    /// Set the conversational role used in prompts.
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.config.role = role.into();
        self
    }

    /// Build the [`ResponderConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if:
    /// - `threshold` is outside `[0, 1]`
    /// - `top_k == 0`
    pub fn build(self) -> Result<ResponderConfig> {
        if !(0.0..=1.0).contains(&self.config.threshold) {
            return Err(RagError::InvalidArgument(format!(
                "threshold must be within [0, 1], got {}",
                self.config.threshold
            )));
        }
        if self.config.top_k == 0 {
            return Err(RagError::InvalidArgument(
                "top_k must be greater than zero".to_string(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_serving_defaults() {
        let config = ResponderConfig::default();
        assert_eq!(config.top_k, 4);
        assert_eq!(config.metric, SearchMetric::Mmr);
        assert_eq!(config.threshold, 0.7);
        assert_eq!(config.max_history_turns, 50);
        assert_eq!(config.role, "user");
    }

    #[test]
    fn builder_rejects_bad_threshold() {
        assert!(ResponderConfig::builder().threshold(1.5).build().is_err());
        assert!(ResponderConfig::builder().threshold(-0.1).build().is_err());
        assert!(ResponderConfig::builder().threshold(1.0).build().is_ok());
    }

    #[test]
    fn builder_rejects_zero_top_k() {
        assert!(ResponderConfig::builder().top_k(0).build().is_err());
    }

    #[test]
    fn metric_serde_round_trip() {
        let config = ResponderConfig::builder().metric(SearchMetric::Bm25).build().unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"bm25\""));
        let back: ResponderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.metric, SearchMetric::Bm25);
    }

    #[test]
    fn unknown_metric_fails_deserialization() {
        let err = serde_json::from_str::<ResponderConfig>(
            r#"{"top_k":4,"metric":"sql","threshold":0.7,"max_history_turns":50,"role":"user"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("sql"));
    }
}
