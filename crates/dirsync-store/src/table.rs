//! Typed JSON records over a [`KvStore`]

use std::marker::PhantomData;
use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, KvStore, Result};

/// A persistent ordered mapping from a path string to a JSON record.
///
/// Supports upsert, delete-if-present, key enumeration and an explicit
/// commit boundary. Cloning shares the underlying store.
pub struct MetadataStore<T> {
    store: Arc<dyn KvStore>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for MetadataStore<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _record: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for MetadataStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataStore").field("store", &self.store).finish()
    }
}

impl<T: Serialize + DeserializeOwned> MetadataStore<T> {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    /// Fetch the record stored under `key`.
    pub fn get(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(key)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| Error::Codec {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Insert or replace the record stored under `key`.
    pub fn upsert(&self, key: &str, record: &T) -> Result<()> {
        let bytes = serde_json::to_vec(record).map_err(|source| Error::Codec {
            key: key.to_string(),
            source,
        })?;
        self.store.put(key, bytes)
    }

    /// Delete `key` if present, returning the record it held.
    pub fn remove(&self, key: &str) -> Result<Option<T>> {
        let previous = self.get(key)?;
        if previous.is_some() {
            self.store.delete(key)?;
        }
        Ok(previous)
    }

    /// All keys, in ascending order.
    pub fn keys(&self) -> Result<Vec<String>> {
        self.store.keys()
    }

    /// All `(key, record)` pairs, in ascending key order.
    pub fn entries(&self) -> Result<Vec<(String, T)>> {
        let mut out = Vec::new();
        for key in self.keys()? {
            if let Some(record) = self.get(&key)? {
                out.push((key, record));
            }
        }
        Ok(out)
    }

    pub fn commit(&self) -> Result<()> {
        self.store.commit()
    }
}
