//! Request application against the server sync root
//!
//! [`SyncService`] is the async face used by the HTTP layer: it validates
//! the target path, takes the path lock and runs the filesystem and store
//! work on the blocking pool. The two stores are updated best-effort; each
//! individual write is idempotent.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use dirsync_core::{
    DeleteRequest, FileRecord, FileTransfer, FolderRecord, ItemKind, NormalizedPath, ServerConfig,
    SyncItem,
};
use dirsync_fs::{STATE_DIR, compute_file_checksum, io};
use dirsync_store::{ContentIndex, KvStore, MemoryStore, MetadataStore, RedbDatabase};

use crate::{Error, PathLocks, Result};

/// What the server last applied at a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoredRecord {
    File(FileRecord),
    Folder(FolderRecord),
}

impl StoredRecord {
    fn file_hash(&self) -> Option<&str> {
        match self {
            Self::File(record) => Some(&record.hash),
            Self::Folder(_) => None,
        }
    }
}

/// Applies sync requests to one server-side root.
#[derive(Debug, Clone)]
pub struct SyncService {
    inner: Arc<Inner>,
    locks: PathLocks,
}

#[derive(Debug)]
struct Inner {
    root: PathBuf,
    /// Top-level folder holding the server's own stores; never synced into
    state_dir: String,
    metadata: MetadataStore<StoredRecord>,
    index: ContentIndex,
}

impl SyncService {
    pub fn new(
        root: impl Into<PathBuf>,
        metadata: Arc<dyn KvStore>,
        index: Arc<dyn KvStore>,
    ) -> Self {
        Self::with_state_dir(root, STATE_DIR, metadata, index)
    }

    /// Like [`SyncService::new`], reserving `state_dir` instead of the default.
    pub fn with_state_dir(
        root: impl Into<PathBuf>,
        state_dir: &str,
        metadata: Arc<dyn KvStore>,
        index: Arc<dyn KvStore>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                root: root.into(),
                state_dir: state_dir.to_string(),
                metadata: MetadataStore::new(metadata),
                index: ContentIndex::new(index),
            }),
            locks: PathLocks::new(),
        }
    }

    /// Open the on-disk stores for `root` as configured.
    pub fn open(root: &Path, config: &ServerConfig) -> Result<Self> {
        io::create_dir_all(root)?;
        let db = RedbDatabase::open(&config.store_path(root))?;
        Ok(Self::with_state_dir(
            root,
            &config.state_dir,
            Arc::new(db.table("metadata")?),
            Arc::new(db.table("content_index")?),
        ))
    }

    pub fn in_memory(root: impl Into<PathBuf>) -> Self {
        Self::new(root, Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    pub fn metadata(&self) -> &MetadataStore<StoredRecord> {
        &self.inner.metadata
    }

    pub fn index(&self) -> &ContentIndex {
        &self.inner.index
    }

    /// Whether the server holds intact content for `hash`.
    ///
    /// A stale index entry (canonical file gone or changed) is repaired and
    /// reported as absent.
    pub async fn exists(&self, hash: &str) -> Result<bool> {
        let key = hash.to_string();
        let canonical = self
            .blocking(move |inner| Ok(inner.index.lookup(&key)?))
            .await?;
        let Some(canonical) = canonical else {
            return Ok(false);
        };

        let _guard = self.locks.lock(&canonical).await;
        let key = hash.to_string();
        self.blocking(move |inner| inner.verify(&key)).await
    }

    /// Apply a create (`POST`) or update (`PUT`) of `raw_path`.
    pub async fn apply(&self, raw_path: &str, item: SyncItem, update: bool) -> Result<()> {
        let rel = self.target(raw_path)?;
        if update && item.kind() != ItemKind::File {
            return Err(Error::validation("updates accept only file payloads"));
        }

        let _guard = self.locks.lock(&rel).await;
        self.blocking(move |inner| match item {
            SyncItem::File(transfer) => inner.put_file(&rel, transfer),
            SyncItem::Folder(record) => inner.put_folder(&rel, record),
        })
        .await
    }

    /// Delete `raw_path`. Absence is success.
    pub async fn delete(&self, raw_path: &str, request: DeleteRequest) -> Result<()> {
        let rel = self.target(raw_path)?;

        let _guard = self.locks.lock(&rel).await;
        self.blocking(move |inner| match request.kind {
            ItemKind::File => inner.delete_file(&rel),
            ItemKind::Folder => inner.delete_folder(&rel),
        })
        .await
    }

    /// Sanitize a request path, refusing anything inside the state directory.
    fn target(&self, raw_path: &str) -> Result<NormalizedPath> {
        let rel = NormalizedPath::sanitize(raw_path)?;
        if rel.segments().next() == Some(self.inner.state_dir.as_str()) {
            return Err(Error::validation(format!(
                "'{rel}' is inside the reserved state directory"
            )));
        }
        Ok(rel)
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Inner) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&inner))
            .await
            .map_err(|e| Error::Task(e.to_string()))?
    }
}

impl Inner {
    fn verify(&self, hash: &str) -> Result<bool> {
        let Some(canonical) = self.index.lookup(hash)? else {
            return Ok(false);
        };

        let abs = canonical.resolve(&self.root);
        if !abs.is_file() {
            tracing::debug!(%hash, path = %canonical, "Canonical file gone, evicting");
            self.index.remove(hash)?;
            self.index.commit()?;
            return Ok(false);
        }

        let actual = compute_file_checksum(&abs)?;
        if actual == hash {
            return Ok(true);
        }

        tracing::warn!(
            %hash,
            %actual,
            path = %canonical,
            "Canonical file changed outside sync, re-indexing"
        );
        self.index.remove(hash)?;
        self.index.insert(&actual, &canonical)?;
        self.index.commit()?;
        Ok(false)
    }

    fn put_file(&self, rel: &NormalizedPath, transfer: FileTransfer) -> Result<()> {
        let target = rel.resolve(&self.root);
        if target.is_dir() {
            return Err(Error::validation(format!("'{rel}' is a folder")));
        }

        let FileTransfer { mut record, content } = transfer;
        match content {
            Some(bytes) => {
                io::write_atomic(&target, &bytes)?;
                let actual = compute_file_checksum(&target)?;
                if actual != record.hash {
                    return Err(Error::Corrupt {
                        path: rel.to_string(),
                        expected: record.hash,
                        actual,
                    });
                }
                self.index.insert(&record.hash, rel)?;
            }
            None => self.copy_from_canonical(rel, &target, &record.hash)?,
        }

        io::set_modified(&target, record.modified)?;

        let previous = self.metadata.get(rel.as_str())?;
        if let Some(old) = previous.as_ref().and_then(StoredRecord::file_hash)
            && old != record.hash
        {
            self.index.remove_if_canonical(old, rel)?;
        }

        record.path = rel.to_string();
        self.metadata.upsert(rel.as_str(), &StoredRecord::File(record))?;
        self.index.commit()?;
        self.metadata.commit()?;

        tracing::info!(path = %rel, "Synced file");
        Ok(())
    }

    /// Fill `target` with the bytes already held for `hash`.
    fn copy_from_canonical(&self, rel: &NormalizedPath, target: &Path, hash: &str) -> Result<()> {
        let Some(source) = self.index.lookup(hash)? else {
            return Err(Error::MissingSource { hash: hash.to_string() });
        };

        if &source != rel {
            match io::copy_atomic(&source.resolve(&self.root), target) {
                Ok(_) => {}
                Err(e) if e.is_not_found() => {
                    self.index.remove(hash)?;
                    self.index.commit()?;
                    return Err(Error::MissingSource { hash: hash.to_string() });
                }
                Err(e) => return Err(e.into()),
            }
        }

        let actual = compute_file_checksum(target)?;
        if actual != hash {
            self.index.remove_if_canonical(hash, &source)?;
            self.index.commit()?;
            return Err(Error::Corrupt {
                path: rel.to_string(),
                expected: hash.to_string(),
                actual,
            });
        }

        tracing::debug!(path = %rel, source = %source, "Copied deduplicated content");
        Ok(())
    }

    fn put_folder(&self, rel: &NormalizedPath, mut record: FolderRecord) -> Result<()> {
        let target = rel.resolve(&self.root);
        if target.is_file() {
            // A file replaced by a folder: the folder is announced before the
            // file's deletion.
            tracing::debug!(path = %rel, "Replacing file with folder");
            self.forget(rel)?;
            io::remove_file_if_exists(&target)?;
        }

        io::create_dir_all(&target)?;
        io::set_modified(&target, record.modified)?;

        record.path = rel.to_string();
        self.metadata.upsert(rel.as_str(), &StoredRecord::Folder(record))?;
        self.index.commit()?;
        self.metadata.commit()?;

        tracing::info!(path = %rel, "Synced folder");
        Ok(())
    }

    fn delete_file(&self, rel: &NormalizedPath) -> Result<()> {
        if rel.resolve(&self.root).is_dir() {
            tracing::debug!(path = %rel, "Already replaced by a folder");
            return Ok(());
        }

        self.forget(rel)?;
        let removed = io::remove_file_if_exists(&rel.resolve(&self.root))?;
        self.index.commit()?;
        self.metadata.commit()?;

        tracing::info!(path = %rel, removed, "Deleted file");
        Ok(())
    }

    fn delete_folder(&self, rel: &NormalizedPath) -> Result<()> {
        for key in self.metadata.keys()? {
            let path = NormalizedPath::new(&key);
            if path.is_within(rel) {
                self.forget(&path)?;
            }
        }
        let removed = io::remove_dir_all_if_exists(&rel.resolve(&self.root))?;
        self.index.commit()?;
        self.metadata.commit()?;

        tracing::info!(path = %rel, removed, "Deleted folder");
        Ok(())
    }

    /// Drop the metadata of `rel` and the index entry it owns, if any.
    fn forget(&self, rel: &NormalizedPath) -> Result<()> {
        if let Some(previous) = self.metadata.remove(rel.as_str())?
            && let Some(hash) = previous.file_hash()
        {
            self.index.remove_if_canonical(hash, rel)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirsync_core::Timestamp;
    use dirsync_fs::compute_bytes_checksum;
    use dirsync_test_utils::TestTree;
    use pretty_assertions::assert_eq;

    fn transfer(path: &str, content: &[u8]) -> SyncItem {
        let record = FileRecord {
            path: path.into(),
            modified: Timestamp::from_secs(1_000.0),
            hash: String::new(),
            size: 0,
            synced: false,
        };
        SyncItem::File(FileTransfer::with_content(record, content.to_vec()))
    }

    fn metadata_only(path: &str, content: &[u8]) -> SyncItem {
        SyncItem::File(FileTransfer::metadata_only(FileRecord {
            path: path.into(),
            modified: Timestamp::from_secs(1_000.0),
            hash: compute_bytes_checksum(content),
            size: content.len() as u64,
            synced: false,
        }))
    }

    #[tokio::test]
    async fn write_sets_declared_mtime() {
        let tree = TestTree::new();
        let service = SyncService::in_memory(tree.root());

        service.apply("a.txt", transfer("a.txt", b"abc"), false).await.unwrap();

        assert_eq!(tree.mtime("a.txt"), 1_000.0);
    }

    #[tokio::test]
    async fn rewrite_drops_index_entry_of_old_content() {
        let tree = TestTree::new();
        let service = SyncService::in_memory(tree.root());

        service.apply("a.txt", transfer("a.txt", b"v1"), false).await.unwrap();
        service.apply("a.txt", transfer("a.txt", b"v2"), true).await.unwrap();

        assert_eq!(service.index().lookup(&compute_bytes_checksum(b"v1")).unwrap(), None);
        assert_eq!(
            service.index().lookup(&compute_bytes_checksum(b"v2")).unwrap(),
            Some(NormalizedPath::new("a.txt"))
        );
    }

    #[tokio::test]
    async fn deleting_a_copy_keeps_canonical_entry() {
        let tree = TestTree::new();
        let service = SyncService::in_memory(tree.root());
        service.apply("a.txt", transfer("a.txt", b"same"), false).await.unwrap();
        service.apply("b.txt", metadata_only("b.txt", b"same"), false).await.unwrap();

        service.delete("b.txt", DeleteRequest::new(ItemKind::File)).await.unwrap();

        assert!(service.exists(&compute_bytes_checksum(b"same")).await.unwrap());
        tree.assert_not_exists("b.txt");
    }

    #[tokio::test]
    async fn drifted_dedup_source_is_evicted() {
        let tree = TestTree::new();
        let service = SyncService::in_memory(tree.root());
        service.apply("a.txt", transfer("a.txt", b"orig"), false).await.unwrap();
        tree.write("a.txt", "tampered");

        let err = service
            .apply("b.txt", metadata_only("b.txt", b"orig"), false)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Corrupt { .. }));
        assert_eq!(service.index().lookup(&compute_bytes_checksum(b"orig")).unwrap(), None);
    }

    #[tokio::test]
    async fn exists_reindexes_changed_canonical_file() {
        let tree = TestTree::new();
        let service = SyncService::in_memory(tree.root());
        service.apply("a.txt", transfer("a.txt", b"orig"), false).await.unwrap();
        tree.write("a.txt", "edited");

        assert!(!service.exists(&compute_bytes_checksum(b"orig")).await.unwrap());
        assert!(service.exists(&compute_bytes_checksum(b"edited")).await.unwrap());
    }

    #[tokio::test]
    async fn exists_evicts_missing_canonical_file() {
        let tree = TestTree::new();
        let service = SyncService::in_memory(tree.root());
        service.apply("a.txt", transfer("a.txt", b"orig"), false).await.unwrap();
        tree.remove("a.txt");

        let hash = compute_bytes_checksum(b"orig");
        assert!(!service.exists(&hash).await.unwrap());
        assert!(service.index().is_empty().unwrap());
    }

    #[tokio::test]
    async fn folder_delete_forgets_descendants() {
        let tree = TestTree::new();
        let service = SyncService::in_memory(tree.root());
        let folder = SyncItem::Folder(FolderRecord {
            path: "docs".into(),
            modified: Timestamp::from_secs(500.0),
            synced: false,
        });
        service.apply("docs", folder, false).await.unwrap();
        service.apply("docs/a.txt", transfer("docs/a.txt", b"a"), false).await.unwrap();
        service.apply("docsx.txt", transfer("docsx.txt", b"x"), false).await.unwrap();

        service.delete("docs", DeleteRequest::new(ItemKind::Folder)).await.unwrap();

        assert_eq!(service.metadata().keys().unwrap(), vec!["docsx.txt".to_string()]);
        assert_eq!(service.index().len().unwrap(), 1);
        tree.assert_not_exists("docs");
    }

    fn folder(path: &str) -> SyncItem {
        SyncItem::Folder(FolderRecord {
            path: path.into(),
            modified: Timestamp::from_secs(2_000.0),
            synced: false,
        })
    }

    #[tokio::test]
    async fn configured_state_dir_is_reserved() {
        let tree = TestTree::new();
        let config = ServerConfig {
            state_dir: "meta".into(),
            ..ServerConfig::default()
        };
        let service = SyncService::open(tree.root(), &config).unwrap();
        tree.assert_exists("meta/server.redb");
        let store = tree.read("meta/server.redb");

        let write = service
            .apply("meta/server.redb", transfer("meta/server.redb", b"x"), false)
            .await
            .unwrap_err();
        let delete = service
            .delete("meta", DeleteRequest::new(ItemKind::Folder))
            .await
            .unwrap_err();

        assert_eq!(write.status(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(delete.status(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(tree.read("meta/server.redb"), store);
    }

    #[tokio::test]
    async fn reserved_state_dir_matches_whole_segment() {
        let tree = TestTree::new();
        let service = SyncService::with_state_dir(
            tree.root(),
            "meta",
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        );

        let err = service.apply("meta", folder("meta"), false).await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        service.apply("metadata", folder("metadata"), false).await.unwrap();
        tree.assert_exists("metadata");
    }

    #[tokio::test]
    async fn folder_replaces_file_at_same_path() {
        let tree = TestTree::new();
        let service = SyncService::in_memory(tree.root());
        service.apply("x", transfer("x", b"was a file"), false).await.unwrap();

        service.apply("x", folder("x"), false).await.unwrap();
        service.delete("x", DeleteRequest::new(ItemKind::File)).await.unwrap();

        assert!(tree.path("x").is_dir());
        assert_eq!(tree.mtime("x"), 2_000.0);
        assert!(service.index().is_empty().unwrap());
        assert_eq!(
            service.metadata().get("x").unwrap(),
            Some(StoredRecord::Folder(FolderRecord {
                path: "x".into(),
                modified: Timestamp::from_secs(2_000.0),
                synced: false,
            }))
        );
    }

    #[tokio::test]
    async fn update_rejects_folder_payload() {
        let tree = TestTree::new();
        let service = SyncService::in_memory(tree.root());
        let folder = SyncItem::Folder(FolderRecord {
            path: "docs".into(),
            modified: Timestamp::from_secs(1.0),
            synced: false,
        });

        let err = service.apply("docs", folder, true).await.unwrap_err();

        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        tree.assert_not_exists("docs");
    }
}
