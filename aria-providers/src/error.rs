use aria_core::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("could not build request: {0}")]
    Request(String),

    #[error("unexpected status {status}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Payload(String),
}

impl ApiError {
    /// Collapse into the user-facing taxonomy.
    ///
    /// Unreachable endpoints, timeouts, and non-success statuses all read as
    /// a network failure; only malformed response shapes are distinguished.
    pub fn as_client_error(&self) -> ClientError {
        match self {
            ApiError::Transport(e) => ClientError::NetworkFailure(e.to_string()),
            ApiError::Request(msg) => ClientError::NetworkFailure(msg.clone()),
            ApiError::Status { status, .. } => {
                ClientError::NetworkFailure(format!("server returned status {status}"))
            }
            ApiError::Payload(msg) => ClientError::InvalidServerPayload(msg.clone()),
        }
    }
}
