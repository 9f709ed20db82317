//! Modification timestamps

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// A file modification time, in fractional seconds since the Unix epoch.
///
/// This is the wire and store representation of an mtime. Conversion from
/// [`SystemTime`] is deterministic, so a timestamp read back from a store
/// compares equal to a fresh stat of an unchanged file.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(f64);

impl Timestamp {
    pub fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> f64 {
        self.0
    }

    /// Read the modification time from file metadata.
    pub fn from_metadata(meta: &std::fs::Metadata) -> std::io::Result<Self> {
        Ok(Self::from(meta.modified()?))
    }

    /// Convert back to a [`SystemTime`].
    ///
    /// Negative and non-finite values clamp to the epoch.
    pub fn to_system_time(&self) -> SystemTime {
        if self.0.is_finite() && self.0 > 0.0 {
            UNIX_EPOCH + Duration::from_secs_f64(self.0)
        } else {
            UNIX_EPOCH
        }
    }
}

impl From<SystemTime> for Timestamp {
    fn from(t: SystemTime) -> Self {
        match t.duration_since(UNIX_EPOCH) {
            Ok(d) => Self(d.as_secs_f64()),
            Err(e) => Self(-e.duration().as_secs_f64()),
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
