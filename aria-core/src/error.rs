use thiserror::Error;

/// User-facing failure kinds surfaced as transient notifications.
///
/// None of these are fatal: prior session state is left intact and the user
/// may retry the same action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("microphone access was denied")]
    PermissionDenied,

    #[error("recording produced no audio")]
    EmptyCapture,

    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("malformed server response: {0}")]
    InvalidServerPayload(String),
}
