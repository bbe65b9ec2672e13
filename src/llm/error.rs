use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("failed to build chat HTTP client: {message}")]
    ClientBuild { message: String },

    #[error("chat endpoint '{endpoint}' unavailable: {message}")]
    Upstream { endpoint: String, message: String },

    #[error("malformed chat response: {message}")]
    MalformedResponse { message: String },
}
