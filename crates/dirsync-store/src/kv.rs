//! The key-value interface every store backend implements

use crate::Result;

/// An ordered mapping from string keys to opaque bytes.
///
/// Writes become durable at [`commit`](KvStore::commit); reads always observe
/// every write made through the same handle, committed or not.
pub trait KvStore: Send + Sync + std::fmt::Debug {
    /// Fetch the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Insert or replace the value stored under `key`.
    fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Delete `key` if present. Returns whether it was present.
    fn delete(&self, key: &str) -> Result<bool>;

    /// All keys, in ascending order.
    fn keys(&self) -> Result<Vec<String>>;

    /// Make every write so far durable.
    fn commit(&self) -> Result<()>;
}
