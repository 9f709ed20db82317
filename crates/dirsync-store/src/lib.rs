//! Persistent key-value stores for dirsync
//!
//! The sync engine never talks to a storage engine directly. It sees:
//!
//! - [`KvStore`]: an ordered string-keyed byte store with get/put/delete/keys
//!   and an explicit [`commit`](KvStore::commit) boundary
//! - [`MetadataStore`]: a typed JSON view over one `KvStore`
//! - [`ContentIndex`]: content hash to canonical path, used for dedup
//!
//! Two backends are provided: [`RedbTable`] (on disk, one redb table per
//! logical store) and [`MemoryStore`] (tests and ephemeral use).

pub mod disk;
pub mod error;
pub mod index;
pub mod kv;
pub mod memory;
pub mod table;

pub use disk::{RedbDatabase, RedbTable};
pub use error::{Error, Result};
pub use index::ContentIndex;
pub use kv::KvStore;
pub use memory::MemoryStore;
pub use table::MetadataStore;
