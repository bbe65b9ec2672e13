use thiserror::Error;

/// Errors from the embedding capability.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// HTTP client construction failed.
    #[error("embedding client build failed: {message}")]
    ClientBuild { message: String },

    /// The embedding service rejected the request or stayed unreachable
    /// through all retries.
    #[error("embedding request to {endpoint} failed: {message}")]
    Upstream { endpoint: String, message: String },

    /// The service answered but the body was not usable.
    #[error("malformed embedding response: {message}")]
    MalformedResponse { message: String },

    /// A returned vector did not match the configured dimension.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
