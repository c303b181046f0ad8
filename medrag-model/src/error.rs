//! Error types for the `medrag-model` crate.

use thiserror::Error;

/// Errors that can occur when calling a chat-completion provider.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Authentication with the provider failed (bad or missing credential).
    #[error("Authentication failed ({provider})")]
    Auth {
        /// The provider that rejected the credential.
        provider: String,
    },

    /// The provider rate-limited the request.
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Server-suggested wait before retrying, in seconds.
        retry_after_secs: u64,
    },

    /// The HTTP request could not be performed.
    #[error("Connection error: {message}")]
    Connection {
        /// A description of the failure.
        message: String,
    },

    /// The request timed out.
    #[error("Request timed out: {message}")]
    Timeout {
        /// A description of the failure.
        message: String,
    },

    /// The provider returned an error response.
    #[error("API error: {message}")]
    Api {
        /// A description of the failure.
        message: String,
    },

    /// The provider response could not be parsed.
    #[error("Response parse error: {message}")]
    Parse {
        /// A description of the failure.
        message: String,
    },

    /// An error occurred while reading a streaming response.
    #[error("Stream error: {message}")]
    Stream {
        /// A description of the failure.
        message: String,
    },
}

impl ModelError {
    /// Whether this error is transient and worth retrying.
    ///
    /// Rate limits, connection failures, timeouts, and stream setup errors
    /// are transient. Authentication, API rejections, and parse failures are
    /// permanent and returned immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ModelError::RateLimited { .. }
                | ModelError::Connection { .. }
                | ModelError::Timeout { .. }
                | ModelError::Stream { .. }
        )
    }
}

/// A convenience result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
