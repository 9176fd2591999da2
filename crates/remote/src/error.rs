/// Errors from the remote data service.
///
/// There are no structured error codes at this boundary; the message is
/// what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The service rejected the call.
    #[error("{0}")]
    Operation(String),

    /// The call never reached the service, or the reply was unreadable.
    #[error("Remote transport failed: {0}")]
    Transport(String),
}

impl RemoteError {
    /// The human-readable message, without any prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Operation(msg) | Self::Transport(msg) => msg,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;
