//! Client side of dirsync
//!
//! Turns [`ChangeEvent`](dirsync_core::ChangeEvent)s from the directory
//! watcher into requests against a sync server:
//!
//! - [`SyncRemote`]: the four server operations, implemented over HTTP by
//!   [`HttpRemote`]
//! - [`ClientStore`]: persisted file and folder records
//! - [`SyncDispatcher`]: resolves one event at a time, deduplicating
//!   uploads through the server's content-hash existence check
//! - [`run_client`]: wires watcher, dispatcher and store together

pub mod dispatcher;
pub mod error;
pub mod remote;
pub mod run;
pub mod store;

pub use dispatcher::{Outcome, SyncDispatcher};
pub use error::{Error, Result};
pub use remote::{HttpRemote, RemoteStatus, SyncRemote};
pub use run::{run_client, run_with};
pub use store::ClientStore;
