//! Event-to-request dispatch
//!
//! One [`ChangeEvent`] is fully resolved (request sent, answer handled,
//! record persisted) before the next is looked at.

use std::path::{Path, PathBuf};

use dirsync_core::{
    ChangeEvent, DeleteRequest, FileRecord, FileTransfer, FolderRecord, ItemKind, NormalizedPath,
    SyncItem,
};

use crate::{ClientStore, Error, RemoteStatus, Result, SyncRemote};

/// What handling one event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The server accepted the change; recorded as synced
    Synced,
    /// The server refused the payload; recorded as not synced
    Unsynced,
    /// Local records of a deleted path were dropped
    Removed,
    /// The path vanished before it could be read
    Skipped,
}

/// Sends watcher events to a [`SyncRemote`] and records the result.
#[derive(Debug)]
pub struct SyncDispatcher<R> {
    root: PathBuf,
    remote: R,
    store: ClientStore,
}

impl<R: SyncRemote> SyncDispatcher<R> {
    pub fn new(root: impl Into<PathBuf>, remote: R, store: ClientStore) -> Self {
        Self {
            root: root.into(),
            remote,
            store,
        }
    }

    pub fn store(&self) -> &ClientStore {
        &self.store
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub async fn handle(&self, event: &ChangeEvent) -> Result<Outcome> {
        tracing::debug!(%event, "Dispatching");
        let outcome = match event {
            ChangeEvent::CreatedFolder(path) => self.push_folder(path).await,
            ChangeEvent::CreatedFile(path) => self.push_file(path, false).await,
            ChangeEvent::ModifiedFile(path) => self.push_file(path, true).await,
            ChangeEvent::DeletedFile(path) => self.delete(path, ItemKind::File).await,
            ChangeEvent::DeletedFolder(path) => self.delete(path, ItemKind::Folder).await,
        };

        match outcome {
            Err(e) if e.is_vanished() => {
                tracing::debug!(path = %event.path().display(), "Path vanished before dispatch");
                Ok(Outcome::Skipped)
            }
            other => other,
        }
    }

    async fn push_file(&self, path: &Path, modified: bool) -> Result<Outcome> {
        let root = self.root.clone();
        let abs = path.to_path_buf();
        let record = blocking(move || Ok(FileRecord::from_disk(&root, &abs)?)).await?;

        let transfer = if self.remote.exists(&record.hash).await? {
            tracing::debug!(
                path = %record.path,
                hash = %record.hash,
                "Server holds content, sending metadata only"
            );
            FileTransfer::metadata_only(record)
        } else {
            let abs = path.to_path_buf();
            let content = blocking(move || Ok(dirsync_fs::io::read_bytes(&abs)?)).await?;
            FileTransfer::with_content(record, content)
        };

        let rel = transfer.record.normalized_path();
        let mut record = transfer.record.clone();
        let item = SyncItem::File(transfer);
        let status = if modified {
            self.remote.update(&rel, &item).await?
        } else {
            self.remote.create(&rel, &item).await?
        };

        record.synced = accepted(&rel, &status);
        self.store.put_file(&record)?;
        Ok(outcome_of(record.synced))
    }

    async fn push_folder(&self, path: &Path) -> Result<Outcome> {
        let root = self.root.clone();
        let abs = path.to_path_buf();
        let mut record = blocking(move || Ok(FolderRecord::from_disk(&root, &abs)?)).await?;

        let rel = NormalizedPath::new(&record.path);
        let status = self
            .remote
            .create(&rel, &SyncItem::Folder(record.clone()))
            .await?;

        record.synced = accepted(&rel, &status);
        self.store.put_folder(&record)?;
        Ok(outcome_of(record.synced))
    }

    async fn delete(&self, path: &Path, kind: ItemKind) -> Result<Outcome> {
        let rel = NormalizedPath::relative(&self.root, path)?;
        match self.remote.delete(&rel, DeleteRequest::new(kind)).await? {
            RemoteStatus::Accepted => {
                match kind {
                    ItemKind::File => {
                        self.store.remove_file(&rel)?;
                    }
                    ItemKind::Folder => {
                        self.store.remove_folder_tree(&rel)?;
                    }
                }
                tracing::info!(path = %rel, kind = %kind, "Deleted on server");
                Ok(Outcome::Removed)
            }
            RemoteStatus::Invalid(message) | RemoteStatus::Corrupt(message) => {
                Err(Error::DeleteRejected {
                    path: rel.as_str().to_string(),
                    message,
                })
            }
        }
    }
}

fn accepted(rel: &NormalizedPath, status: &RemoteStatus) -> bool {
    match status {
        RemoteStatus::Accepted => {
            tracing::info!(path = %rel, "Synced");
            true
        }
        RemoteStatus::Invalid(message) => {
            tracing::warn!(path = %rel, %message, "Server rejected payload");
            false
        }
        RemoteStatus::Corrupt(message) => {
            tracing::warn!(path = %rel, %message, "Server reported content mismatch");
            false
        }
    }
}

fn outcome_of(synced: bool) -> Outcome {
    if synced { Outcome::Synced } else { Outcome::Unsynced }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Task(e.to_string()))?
}
