//! Client and server settings
//!
//! ```toml
//! [client]
//! server_url = "http://127.0.0.1:5000"
//! interval_secs = 5
//!
//! [server]
//! bind = "127.0.0.1:5000"
//! ```
//!
//! Every field has a default, so an empty or absent file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use dirsync_fs::{ConfigStore, STATE_DIR};

use crate::Result;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_INTERVAL_SECS: u64 = 5;

/// File name of the client's record store inside the state directory.
pub const CLIENT_STORE_FILE: &str = "client.redb";
/// File name of the server's record store inside the state directory.
pub const SERVER_STORE_FILE: &str = "server.redb";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub client: ClientConfig,
    pub server: ServerConfig,
}

impl SyncConfig {
    /// Load from `path`, or return defaults when no path is given or the
    /// file does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Ok(ConfigStore::new().load_or_default(path)?),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the sync server, without the `/sync` suffix
    pub server_url: String,
    /// Seconds between two scans of the watched directory
    pub interval_secs: u64,
    /// Directory (relative to the watched root) holding the record store
    pub state_dir: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            interval_secs: DEFAULT_INTERVAL_SECS,
            state_dir: STATE_DIR.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn store_path(&self, root: &Path) -> PathBuf {
        root.join(&self.state_dir).join(CLIENT_STORE_FILE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,
    pub state_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            state_dir: STATE_DIR.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn store_path(&self, root: &Path) -> PathBuf {
        root.join(&self.state_dir).join(SERVER_STORE_FILE)
    }
}
