//! Error types for the `medrag-rag` crate.

use thiserror::Error;

/// Errors that can occur in the retrieval-and-grounding pipeline.
#[derive(Debug, Error)]
pub enum RagError {
    /// A malformed argument: unsupported metric name, threshold outside
    /// `[0, 1]`, or similar. Not retried.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A requested capability is unavailable given the current store state
    /// (e.g. lexical search without a passage list). Not retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The retrieval gate produced a blank, unusable query.
    #[error("Retrieval gate produced an empty query")]
    EmptyQuery,

    /// The underlying model call failed after exhausting the retry policy.
    #[error("Generation error: {0}")]
    Generation(#[from] medrag_model::ModelError),

    /// Persisted store state was present but unreadable. Recovered into an
    /// empty store by the loader; surfaced only by the low-level load path.
    #[error("Store load error: {0}")]
    StoreLoad(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },
}

impl RagError {
    /// Shorthand for a malformed-gate-output generation error.
    pub(crate) fn malformed_gate_output(raw: &str) -> Self {
        RagError::Generation(medrag_model::ModelError::Parse {
            message: format!("gate output has no bracketed query: {raw:?}"),
        })
    }
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
