//! [`TestTree`] fixture for sync-root test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tempfile::TempDir;

/// A temporary directory used as a sync root.
///
/// All `rel` arguments are `/`-separated paths relative to the root.
///
/// # Example
///
/// ```rust,no_run
/// use dirsync_test_utils::TestTree;
///
/// let tree = TestTree::new();
/// tree.write("docs/a.txt", "abc123").set_mtime("docs/a.txt", 1_000.0);
/// tree.assert_file_contains("docs/a.txt", "abc123");
/// ```
pub struct TestTree {
    temp_dir: TempDir,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `rel` inside the tree.
    pub fn path(&self, rel: &str) -> PathBuf {
        rel.split('/')
            .filter(|s| !s.is_empty())
            .fold(self.root().to_path_buf(), |acc, s| acc.join(s))
    }

    /// Write `content` to `rel`, creating parent folders.
    pub fn write(&self, rel: &str, content: impl AsRef<[u8]>) -> &Self {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        self
    }

    pub fn mkdir(&self, rel: &str) -> &Self {
        fs::create_dir_all(self.path(rel)).unwrap();
        self
    }

    /// Remove a file or a whole folder.
    pub fn remove(&self, rel: &str) -> &Self {
        let path = self.path(rel);
        if path.is_dir() {
            fs::remove_dir_all(&path).unwrap();
        } else {
            fs::remove_file(&path).unwrap();
        }
        self
    }

    /// Set the modification time of `rel` to `secs` since the epoch.
    ///
    /// Tests pin mtimes so change detection does not depend on filesystem
    /// timestamp granularity.
    pub fn set_mtime(&self, rel: &str, secs: f64) -> &Self {
        let whole = secs.trunc() as i64;
        let nanos = (secs.fract() * 1e9).round() as u32;
        filetime::set_file_mtime(self.path(rel), FileTime::from_unix_time(whole, nanos)).unwrap();
        self
    }

    /// Modification time of `rel` in seconds since the epoch.
    pub fn mtime(&self, rel: &str) -> f64 {
        let meta = fs::metadata(self.path(rel)).unwrap();
        let time = FileTime::from_last_modification_time(&meta);
        time.unix_seconds() as f64 + f64::from(time.nanoseconds()) / 1e9
    }

    pub fn read(&self, rel: &str) -> Vec<u8> {
        fs::read(self.path(rel)).unwrap()
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_exists(&self, rel: &str) {
        let full_path = self.path(rel);
        assert!(
            full_path.exists(),
            "Expected path to exist: {}",
            full_path.display()
        );
    }

    pub fn assert_not_exists(&self, rel: &str) {
        let full_path = self.path(rel);
        assert!(
            !full_path.exists(),
            "Expected path NOT to exist: {}",
            full_path.display()
        );
    }

    /// # Panics
    /// Panics if the file cannot be read or its bytes differ from `expected`.
    pub fn assert_file_contains(&self, rel: &str, expected: impl AsRef<[u8]>) {
        let full_path = self.path(rel);
        let actual = fs::read(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()));
        assert!(
            actual == expected.as_ref(),
            "File {} has unexpected content.\nExpected: {}\nActual: {}",
            full_path.display(),
            String::from_utf8_lossy(expected.as_ref()),
            String::from_utf8_lossy(&actual)
        );
    }
}
