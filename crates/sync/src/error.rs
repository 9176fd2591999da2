use iems_core::error::CoreError;
use iems_remote::RemoteError;

/// Errors surfaced by the sync layer.
///
/// None of these are fatal; every one is recoverable by retrying or by
/// navigating elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// No remote port is attached yet. Reads report this as a disabled
    /// state rather than an error; writes fail with it.
    #[error("Remote service is not available yet")]
    TransportUnavailable,

    /// The remote service rejected the call. Shown verbatim.
    #[error("{0}")]
    RemoteOperationFailed(String),

    #[error("You are not signed in")]
    AuthenticationMissing,

    #[error("Your profile has not been completed")]
    ProfileMissing,

    /// A presence check failed before anything was sent.
    #[error("{0}")]
    Validation(String),

    /// The undo offer was replaced by a newer change or already used.
    #[error("This change can no longer be undone")]
    UndoExpired,
}

impl From<RemoteError> for SyncError {
    fn from(err: RemoteError) -> Self {
        Self::RemoteOperationFailed(err.to_string())
    }
}

impl From<CoreError> for SyncError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => Self::Validation(msg),
            other => Self::Validation(other.to_string()),
        }
    }
}
