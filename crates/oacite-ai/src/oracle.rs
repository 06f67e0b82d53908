use thiserror::Error;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("oracle returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("oracle response contained no completion")]
    EmptyResponse,
}

/// A text-completion service: one system instruction, one user payload, one reply.
///
/// Implementations must decode deterministically so repeated calls on the
/// same input give the same answer.
#[async_trait::async_trait]
pub trait Oracle: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, OracleError>;

    /// Model name, for logs.
    fn model(&self) -> &str;
}
