//! Content hash to canonical path index

use std::sync::Arc;

use dirsync_fs::NormalizedPath;

use crate::{KvStore, MetadataStore, Result};

/// Maps a content hash to the one server-side path currently holding the
/// authoritative bytes for it.
///
/// Entries can go stale when the canonical file is changed outside the sync
/// protocol; callers re-hash before trusting an entry.
#[derive(Debug, Clone)]
pub struct ContentIndex {
    entries: MetadataStore<String>,
}

impl ContentIndex {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            entries: MetadataStore::new(store),
        }
    }

    /// The canonical path recorded for `hash`.
    pub fn lookup(&self, hash: &str) -> Result<Option<NormalizedPath>> {
        Ok(self.entries.get(hash)?.map(NormalizedPath::from))
    }

    /// Make `path` the canonical holder of `hash`, replacing any previous one.
    pub fn insert(&self, hash: &str, path: &NormalizedPath) -> Result<()> {
        self.entries.upsert(hash, &path.as_str().to_string())
    }

    /// Drop the entry for `hash`, returning the path it named.
    pub fn remove(&self, hash: &str) -> Result<Option<NormalizedPath>> {
        Ok(self.entries.remove(hash)?.map(NormalizedPath::from))
    }

    /// Drop the entry for `hash` only while it still names `path`.
    ///
    /// Returns whether an entry was removed.
    pub fn remove_if_canonical(&self, hash: &str, path: &NormalizedPath) -> Result<bool> {
        match self.lookup(hash)? {
            Some(canonical) if &canonical == path => {
                self.entries.remove(hash)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.entries.keys()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn commit(&self) -> Result<()> {
        self.entries.commit()
    }
}
