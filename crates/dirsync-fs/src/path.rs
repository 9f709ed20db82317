//! Sync-root relative path handling
//!
//! Every path that crosses the wire or keys a store is a [`NormalizedPath`]:
//! relative to the sync root, forward-slash separated, with no `.`/`..`
//! components. Conversion to a platform path happens only at I/O boundaries.

use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// Name of the per-root directory holding dirsync's own state.
///
/// The watcher never reports it and the server refuses to sync into it.
pub const STATE_DIR: &str = ".dirsync";

/// A path normalized to use forward slashes internally.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    ///
    /// Converts backslashes to forward slashes for internal storage. No
    /// validation is performed; use [`NormalizedPath::sanitize`] for input
    /// that arrives from the network.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        let normalized = path_str.replace('\\', "/");
        Self { inner: normalized }
    }

    /// Validate an untrusted relative path.
    ///
    /// Leading and trailing slashes are stripped. Empty paths, `.` and `..`
    /// components, NUL bytes and paths inside [`STATE_DIR`] are rejected.
    pub fn sanitize(raw: &str) -> Result<Self> {
        let unified = raw.replace('\\', "/");
        let trimmed = unified.trim_matches('/');
        if trimmed.is_empty() {
            return Err(Error::invalid_path(raw, "path is empty"));
        }
        if trimmed.contains('\0') {
            return Err(Error::invalid_path(raw, "path contains a NUL byte"));
        }

        let mut segments = Vec::new();
        for segment in trimmed.split('/') {
            match segment {
                "" => continue,
                "." | ".." => {
                    return Err(Error::invalid_path(raw, "relative components are not allowed"));
                }
                s => segments.push(s),
            }
        }
        if segments.first() == Some(&STATE_DIR) {
            return Err(Error::invalid_path(raw, "path is reserved for sync state"));
        }

        Ok(Self {
            inner: segments.join("/"),
        })
    }

    /// Express `path` relative to `root`.
    ///
    /// Returns an empty path when `path` is the root itself.
    pub fn relative(root: &Path, path: &Path) -> Result<Self> {
        let rel = path.strip_prefix(root).map_err(|_| {
            Error::invalid_path(
                path.to_string_lossy(),
                format!("not inside sync root {}", root.display()),
            )
        })?;

        let segments: Vec<String> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        Ok(Self {
            inner: segments.join("/"),
        })
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// True for the empty path (the sync root itself).
    pub fn is_root(&self) -> bool {
        self.inner.is_empty()
    }

    /// Resolve this relative path beneath `root`.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        let mut out = root.to_path_buf();
        for segment in self.segments() {
            out.push(segment);
        }
        out
    }

    /// Iterate over the `/`-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.inner.split('/').filter(|s| !s.is_empty())
    }

    /// True if this path equals `ancestor` or lies beneath it.
    pub fn is_within(&self, ancestor: &NormalizedPath) -> bool {
        if ancestor.is_root() {
            return true;
        }
        self.inner == ancestor.inner
            || (self.inner.starts_with(&ancestor.inner)
                && self.inner.as_bytes().get(ancestor.inner.len()) == Some(&b'/'))
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
