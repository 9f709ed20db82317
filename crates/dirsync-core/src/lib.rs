//! Core synchronization types for dirsync
//!
//! This crate holds everything client and server agree on, plus the
//! client-side change detector:
//!
//! - **Records**: [`FileRecord`], [`FolderRecord`], [`FileTransfer`] and the
//!   tagged [`SyncItem`] wire payload
//! - **Events**: the closed [`ChangeEvent`] enum
//! - **Watcher**: [`Snapshot`], [`scan`], [`diff`] and the interval-polling
//!   [`DirectoryWatcher`]
//! - **Configuration**: [`SyncConfig`]
//!
//! # Architecture
//!
//! ```text
//!            dirsync-cli
//!           /           \
//!  dirsync-client   dirsync-server
//!           \           /
//!           dirsync-core
//!           /           \
//!     dirsync-fs    dirsync-store
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod record;
pub mod watcher;

pub use config::{ClientConfig, ServerConfig, SyncConfig};
pub use dirsync_fs::{NormalizedPath, Timestamp};
pub use error::{Error, Result};
pub use event::{ChangeEvent, ChangeKind};
pub use record::{DeleteRequest, FileRecord, FileTransfer, FolderRecord, ItemKind, SyncItem};
pub use watcher::{DirectoryWatcher, ScanOptions, Snapshot, diff, scan};
