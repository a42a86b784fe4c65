use thiserror::Error;

pub type Result<T> = std::result::Result<T, WriteError>;

/// Failure taxonomy of the write path.
///
/// Compilation failures (`SchemaNotFound`, `PropertyNotFound`,
/// `InvalidArgument`) abort a batch before any remote call is made. The
/// remote variants (`Allocation`, `Submission`) propagate synchronously to
/// the caller; this crate performs no retries of its own. Flush timeouts are
/// a negative `bool` result, never an error.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("schema not found: {0}")]
    SchemaNotFound(String),
    #[error("property not found: {0}")]
    PropertyNotFound(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("id lease allocation failed: {0}")]
    Allocation(String),
    #[error("batch submission failed: {0}")]
    Submission(String),
}

impl WriteError {
    /// Whether retrying the same call can succeed without caller changes.
    /// Only the remote variants qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WriteError::Allocation(_) | WriteError::Submission(_))
    }
}
