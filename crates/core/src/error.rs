#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A presence check failed. The message is meant to be shown as-is.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unknown route: {0}")]
    UnknownRoute(String),
}
