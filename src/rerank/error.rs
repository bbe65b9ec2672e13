use thiserror::Error;

#[derive(Debug, Error)]
pub enum RerankError {
    #[error("rerank client build failed: {message}")]
    ClientBuild { message: String },

    #[error("rerank request to {endpoint} failed: {message}")]
    Upstream { endpoint: String, message: String },

    #[error("malformed rerank response: {message}")]
    MalformedResponse { message: String },

    #[error("invalid rerank configuration: {reason}")]
    InvalidConfig { reason: String },
}
