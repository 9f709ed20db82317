//! Error types for dirsync-client

/// Result type for dirsync-client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while dispatching changes
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request never produced a response
    #[error("Request to sync server failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a status outside the protocol
    #[error("Unexpected status {status} from {operation} '{target}'")]
    ProtocolViolation {
        operation: &'static str,
        target: String,
        status: u16,
    },

    /// The server refused a well-formed delete; local records are unchanged
    #[error("Server rejected delete of '{path}': {message}")]
    DeleteRejected { path: String, message: String },

    #[error("Background task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Core(#[from] dirsync_core::Error),

    #[error(transparent)]
    Store(#[from] dirsync_store::Error),

    #[error(transparent)]
    Fs(#[from] dirsync_fs::Error),
}

impl Error {
    /// Whether the client must stop processing further events.
    ///
    /// Only a rejected delete is recoverable.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::DeleteRejected { .. })
    }

    /// True when a local file or folder disappeared before it could be read.
    pub fn is_vanished(&self) -> bool {
        match self {
            Self::Fs(e) | Self::Core(dirsync_core::Error::Fs(e)) => e.is_not_found(),
            _ => false,
        }
    }
}
