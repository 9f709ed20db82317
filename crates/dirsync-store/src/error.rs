//! Error types for dirsync-store

use std::path::PathBuf;

/// Result type for dirsync-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in dirsync-store operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Store file could not be opened or created
    #[error("Failed to open store at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: redb::DatabaseError,
    },

    #[error(transparent)]
    Transaction(#[from] redb::TransactionError),

    #[error(transparent)]
    Table(#[from] redb::TableError),

    #[error(transparent)]
    Storage(#[from] redb::StorageError),

    #[error(transparent)]
    Commit(#[from] redb::CommitError),

    /// A stored value could not be encoded or decoded
    #[error("Corrupt record for key '{key}': {source}")]
    Codec {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Fs(#[from] dirsync_fs::Error),

    /// Internal lock was poisoned by a panicking writer
    #[error("Store lock poisoned")]
    Poisoned,
}
