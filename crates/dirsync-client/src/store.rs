//! Persisted client-side records

use std::path::Path;
use std::sync::Arc;

use dirsync_core::{FileRecord, FolderRecord, NormalizedPath, Snapshot};
use dirsync_store::{KvStore, MemoryStore, MetadataStore, RedbDatabase};

use crate::Result;

/// Record tables of the client.
///
/// A path is recorded in at most one of the two tables. Every mutation is
/// committed before returning, so a record survives a crash as soon as the
/// event that produced it has been handled.
#[derive(Debug, Clone)]
pub struct ClientStore {
    files: MetadataStore<FileRecord>,
    folders: MetadataStore<FolderRecord>,
}

impl ClientStore {
    pub fn new(files: Arc<dyn KvStore>, folders: Arc<dyn KvStore>) -> Self {
        Self {
            files: MetadataStore::new(files),
            folders: MetadataStore::new(folders),
        }
    }

    /// Open the on-disk store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let db = RedbDatabase::open(path)?;
        Ok(Self::new(
            Arc::new(db.table("files")?),
            Arc::new(db.table("folders")?),
        ))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    pub fn file(&self, path: &NormalizedPath) -> Result<Option<FileRecord>> {
        Ok(self.files.get(path.as_str())?)
    }

    pub fn folder(&self, path: &NormalizedPath) -> Result<Option<FolderRecord>> {
        Ok(self.folders.get(path.as_str())?)
    }

    pub fn files(&self) -> Result<Vec<FileRecord>> {
        Ok(self.files.entries()?.into_iter().map(|(_, r)| r).collect())
    }

    pub fn folders(&self) -> Result<Vec<FolderRecord>> {
        Ok(self.folders.entries()?.into_iter().map(|(_, r)| r).collect())
    }

    /// Record a file, replacing a folder previously recorded at the same path.
    pub fn put_file(&self, record: &FileRecord) -> Result<()> {
        if self.folders.remove(&record.path)?.is_some() {
            self.folders.commit()?;
        }
        self.files.upsert(&record.path, record)?;
        self.files.commit()?;
        Ok(())
    }

    /// Record a folder, replacing a file previously recorded at the same path.
    pub fn put_folder(&self, record: &FolderRecord) -> Result<()> {
        if self.files.remove(&record.path)?.is_some() {
            self.files.commit()?;
        }
        self.folders.upsert(&record.path, record)?;
        self.folders.commit()?;
        Ok(())
    }

    pub fn remove_file(&self, path: &NormalizedPath) -> Result<bool> {
        let removed = self.files.remove(path.as_str())?.is_some();
        self.files.commit()?;
        Ok(removed)
    }

    /// Remove a folder record and every record beneath it.
    ///
    /// Returns the number of records removed.
    pub fn remove_folder_tree(&self, path: &NormalizedPath) -> Result<usize> {
        let mut removed = 0;
        for key in self.folders.keys()? {
            if NormalizedPath::new(&key).is_within(path) && self.folders.remove(&key)?.is_some() {
                removed += 1;
            }
        }
        for key in self.files.keys()? {
            if NormalizedPath::new(&key).is_within(path) && self.files.remove(&key)?.is_some() {
                removed += 1;
            }
        }
        self.folders.commit()?;
        self.files.commit()?;
        Ok(removed)
    }

    /// Watcher baseline describing what was last recorded under `root`.
    pub fn baseline(&self, root: &Path) -> Result<Snapshot> {
        let files = self
            .files()?
            .into_iter()
            .map(|r| (r.normalized_path(), r.modified));
        let folders = self
            .folders()?
            .into_iter()
            .map(|r| NormalizedPath::new(&r.path));
        Ok(Snapshot::from_records(root, files, folders))
    }
}
