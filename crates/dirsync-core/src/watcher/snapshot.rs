//! Point-in-time view of a directory tree

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use dirsync_fs::{NormalizedPath, STATE_DIR, Timestamp};

use crate::{Error, Result};

/// Options controlling what a scan reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Entry names skipped at any depth, together with everything beneath
    /// them.
    pub ignore: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            ignore: vec![STATE_DIR.to_string()],
        }
    }
}

impl ScanOptions {
    pub fn is_ignored(&self, name: &OsStr) -> bool {
        self.ignore.iter().any(|i| OsStr::new(i) == name)
    }
}

/// Every folder and every file (with its modification time) under a root.
///
/// The root itself is always one of the folders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub folders: BTreeSet<PathBuf>,
    pub files: BTreeMap<PathBuf, Timestamp>,
}

impl Snapshot {
    /// Walk `root` and record what is there now.
    ///
    /// Symlinks are not followed. Entries that vanish or become unreadable
    /// mid-walk are skipped; failing to read the root itself is an error.
    pub fn capture(root: &Path, options: &ScanOptions) -> Result<Self> {
        let mut snapshot = Self::default();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !options.is_ignored(e.file_name()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(Error::Scan {
                        root: root.to_path_buf(),
                        source: e,
                    });
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                snapshot.folders.insert(entry.into_path());
            } else if file_type.is_file() {
                match entry.metadata().ok().and_then(|m| m.modified().ok()) {
                    Some(modified) => {
                        snapshot.files.insert(entry.into_path(), Timestamp::from(modified));
                    }
                    None => {
                        let path = entry.path().display();
                        tracing::debug!(%path, "File vanished during scan");
                    }
                }
            }
        }

        Ok(snapshot)
    }

    /// Rebuild a baseline from persisted records.
    ///
    /// `files` and `folders` carry root-relative paths. The root is added
    /// implicitly so it is never reported as created.
    pub fn from_records<F, D>(root: &Path, files: F, folders: D) -> Self
    where
        F: IntoIterator<Item = (NormalizedPath, Timestamp)>,
        D: IntoIterator<Item = NormalizedPath>,
    {
        let mut snapshot = Self::default();
        snapshot.folders.insert(root.to_path_buf());
        snapshot
            .folders
            .extend(folders.into_iter().map(|rel| rel.resolve(root)));
        snapshot.files.extend(
            files
                .into_iter()
                .map(|(rel, modified)| (rel.resolve(root), modified)),
        );
        snapshot
    }
}
