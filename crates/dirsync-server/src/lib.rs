//! Sync server for dirsync
//!
//! Applies create, update and delete requests to a server-side sync root and
//! keeps two stores:
//!
//! - **metadata**: relative path to the last applied [`StoredRecord`]
//! - **content index**: content hash to the canonical path holding those
//!   bytes, which lets clients skip uploading content the server already has
//!
//! # Endpoints
//!
//! | Verb | Path | Success | Failure |
//! |---|---|---|---|
//! | GET | `/sync/exists/{hash}` | 200 exists, 204 unknown | |
//! | POST | `/sync/{path}` | 200 | 400 invalid, 422 hash mismatch |
//! | PUT | `/sync/{path}` | 200 | 400 invalid, 422 hash mismatch |
//! | DELETE | `/sync/{path}` | 200 (also when absent) | 400 invalid |
//! | GET | `/health` | 200 | |

pub mod error;
pub mod locks;
pub mod routes;
pub mod service;

pub use error::{AppError, Error, Result};
pub use locks::PathLocks;
pub use routes::{router, serve, serve_with_shutdown};
pub use service::{StoredRecord, SyncService};
