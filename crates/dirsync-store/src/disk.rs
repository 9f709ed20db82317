//! redb-backed store
//!
//! One [`RedbDatabase`] file holds several logical stores, each a redb table
//! of `&str -> &[u8]`. Writes to a [`RedbTable`] are staged in memory and
//! applied in a single write transaction on [`KvStore::commit`].

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use redb::{Database, ReadableTable, TableDefinition};

use crate::{Error, KvStore, Result};

type Staged = BTreeMap<String, Option<Vec<u8>>>;

fn definition(name: &'static str) -> TableDefinition<'static, &'static str, &'static [u8]> {
    TableDefinition::new(name)
}

/// An open redb database file.
///
/// redb takes an exclusive lock on the file, so a second process opening the
/// same store fails instead of racing.
#[derive(Clone)]
pub struct RedbDatabase {
    db: Arc<Database>,
    path: PathBuf,
}

impl std::fmt::Debug for RedbDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbDatabase").field("path", &self.path).finish()
    }
}

impl RedbDatabase {
    /// Open or create the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            dirsync_fs::io::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Opened store");
        Ok(Self {
            db: Arc::new(db),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open (creating if needed) the logical store named `name`.
    pub fn table(&self, name: &'static str) -> Result<RedbTable> {
        let txn = self.db.begin_write()?;
        txn.open_table(definition(name))?;
        txn.commit()?;

        Ok(RedbTable {
            db: Arc::clone(&self.db),
            name,
            staged: Mutex::new(BTreeMap::new()),
        })
    }
}

/// One logical store inside a [`RedbDatabase`].
pub struct RedbTable {
    db: Arc<Database>,
    name: &'static str,
    staged: Mutex<Staged>,
}

impl std::fmt::Debug for RedbTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbTable").field("name", &self.name).finish()
    }
}

impl RedbTable {
    fn staged(&self) -> Result<MutexGuard<'_, Staged>> {
        self.staged.lock().map_err(|_| Error::Poisoned)
    }

    fn read_committed(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(definition(self.name))?;
        Ok(table.get(key)?.map(|guard| guard.value().to_vec()))
    }

    fn committed_keys(&self) -> Result<Vec<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(definition(self.name))?;
        let mut keys = Vec::new();
        for entry in table.iter()? {
            let (key, _) = entry?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}

impl KvStore for RedbTable {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(pending) = self.staged()?.get(key) {
            return Ok(pending.clone());
        }
        self.read_committed(key)
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.staged()?.insert(key.to_string(), Some(value));
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let present = self.get(key)?.is_some();
        if present {
            self.staged()?.insert(key.to_string(), None);
        }
        Ok(present)
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys: BTreeSet<String> = self.committed_keys()?.into_iter().collect();
        for (key, pending) in self.staged()?.iter() {
            match pending {
                Some(_) => keys.insert(key.clone()),
                None => keys.remove(key),
            };
        }
        Ok(keys.into_iter().collect())
    }

    fn commit(&self) -> Result<()> {
        let mut staged = self.staged()?;
        if staged.is_empty() {
            return Ok(());
        }

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(definition(self.name))?;
            for (key, pending) in staged.iter() {
                match pending {
                    Some(value) => {
                        table.insert(key.as_str(), value.as_slice())?;
                    }
                    None => {
                        table.remove(key.as_str())?;
                    }
                }
            }
        }
        txn.commit()?;

        tracing::trace!(table = self.name, writes = staged.len(), "Committed store");
        staged.clear();
        Ok(())
    }
}
