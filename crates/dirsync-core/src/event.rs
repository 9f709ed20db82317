//! Typed change notifications

use std::path::{Path, PathBuf};

/// A path was created, deleted or modified between two scans.
///
/// Paths are absolute (rooted at the watched directory).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChangeEvent {
    CreatedFile(PathBuf),
    ModifiedFile(PathBuf),
    DeletedFile(PathBuf),
    CreatedFolder(PathBuf),
    DeletedFolder(PathBuf),
}

/// The tag of a [`ChangeEvent`], without its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    CreatedFile,
    ModifiedFile,
    DeletedFile,
    CreatedFolder,
    DeletedFolder,
}

impl ChangeEvent {
    pub fn path(&self) -> &Path {
        match self {
            Self::CreatedFile(p)
            | Self::ModifiedFile(p)
            | Self::DeletedFile(p)
            | Self::CreatedFolder(p)
            | Self::DeletedFolder(p) => p,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::CreatedFile(_) => ChangeKind::CreatedFile,
            Self::ModifiedFile(_) => ChangeKind::ModifiedFile,
            Self::DeletedFile(_) => ChangeKind::DeletedFile,
            Self::CreatedFolder(_) => ChangeKind::CreatedFolder,
            Self::DeletedFolder(_) => ChangeKind::DeletedFolder,
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::CreatedFile => "file created",
            Self::ModifiedFile => "file modified",
            Self::DeletedFile => "file deleted",
            Self::CreatedFolder => "folder created",
            Self::DeletedFolder => "folder deleted",
        };
        f.write_str(label)
    }
}

impl std::fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind(), self.path().display())
    }
}
