//! Filesystem primitives for dirsync
//!
//! Provides sync-root relative path handling, content hashing, atomic binary
//! writes and the modification timestamps shared by client and server.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod path;
pub mod time;

pub use checksum::{compute_bytes_checksum, compute_file_checksum};
pub use config::ConfigStore;
pub use error::{Error, Result};
pub use path::{NormalizedPath, STATE_DIR};
pub use time::Timestamp;
