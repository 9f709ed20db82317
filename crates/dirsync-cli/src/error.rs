//! Error types for dirsync-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] dirsync_core::Error),

    #[error(transparent)]
    Fs(#[from] dirsync_fs::Error),

    #[error(transparent)]
    Client(#[from] dirsync_client::Error),

    #[error(transparent)]
    Server(#[from] dirsync_server::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid log filter: {0}")]
    LogFilter(#[from] tracing_subscriber::filter::ParseError),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
