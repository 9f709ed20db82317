//! Sync records and their wire representation
//!
//! A file travels as:
//!
//! ```json
//! {"type": "file", "path": "docs/a.txt", "modified": 1608675488.04,
//!  "md5": "<hex sha-256>", "size": 6, "sync": false, "bin": "QUJDMTIz"}
//! ```
//!
//! `bin` is omitted for a metadata-only (dedup) transfer. Folders carry only
//! `type`, `path`, `modified` and `sync`.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use dirsync_fs::{NormalizedPath, Timestamp, compute_bytes_checksum, compute_file_checksum};

use crate::{Error, Result};

/// Metadata for one tracked file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the sync root, `/`-separated
    pub path: String,
    pub modified: Timestamp,
    /// Hex SHA-256 of the full contents. Serialized under the `md5` key.
    #[serde(rename = "md5")]
    pub hash: String,
    pub size: u64,
    /// Client-side only: the server accepted this version
    #[serde(rename = "sync", default)]
    pub synced: bool,
}

impl FileRecord {
    /// Build a record by statting and hashing a file under `root`.
    pub fn from_disk(root: &Path, path: &Path) -> Result<Self> {
        let rel = NormalizedPath::relative(root, path)?;
        let meta = std::fs::metadata(path).map_err(|e| dirsync_fs::Error::io(path, e))?;
        let modified = Timestamp::from_metadata(&meta).map_err(|e| dirsync_fs::Error::io(path, e))?;
        let hash = compute_file_checksum(path)?;

        Ok(Self {
            path: rel.as_str().to_string(),
            modified,
            hash,
            size: meta.len(),
            synced: false,
        })
    }

    pub fn normalized_path(&self) -> NormalizedPath {
        NormalizedPath::new(&self.path)
    }
}

/// Metadata for one tracked folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderRecord {
    pub path: String,
    pub modified: Timestamp,
    #[serde(rename = "sync", default)]
    pub synced: bool,
}

impl FolderRecord {
    pub fn from_disk(root: &Path, path: &Path) -> Result<Self> {
        let rel = NormalizedPath::relative(root, path)?;
        let meta = std::fs::metadata(path).map_err(|e| dirsync_fs::Error::io(path, e))?;
        let modified = Timestamp::from_metadata(&meta).map_err(|e| dirsync_fs::Error::io(path, e))?;

        Ok(Self {
            path: rel.as_str().to_string(),
            modified,
            synced: false,
        })
    }
}

/// A file record plus, unless deduplicated, its full contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTransfer {
    #[serde(flatten)]
    pub record: FileRecord,
    #[serde(
        rename = "bin",
        default,
        skip_serializing_if = "Option::is_none",
        with = "base64_content"
    )]
    pub content: Option<Vec<u8>>,
}

impl FileTransfer {
    /// A transfer that relies on the server already holding the bytes.
    pub fn metadata_only(record: FileRecord) -> Self {
        Self {
            record,
            content: None,
        }
    }

    /// A transfer carrying `content`.
    ///
    /// The declared hash and size are taken from `content` itself so they
    /// always describe the bytes being sent.
    pub fn with_content(mut record: FileRecord, content: Vec<u8>) -> Self {
        record.hash = compute_bytes_checksum(&content);
        record.size = content.len() as u64;
        Self {
            record,
            content: Some(content),
        }
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }
}

mod base64_content {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        content: &Option<Vec<u8>>,
        ser: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match content {
            Some(bytes) => ser.serialize_str(&STANDARD.encode(bytes)),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        de: D,
    ) -> std::result::Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(de)?;
        encoded
            .map(|s| STANDARD.decode(s.as_bytes()).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Discriminator carried in every payload's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Folder,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
        }
    }

    fn parse(value: &Value) -> Result<Self> {
        match value.get("type").and_then(Value::as_str) {
            Some("file") => Ok(Self::File),
            Some("folder") => Ok(Self::Folder),
            Some(other) => Err(Error::validation(format!("unknown item type '{other}'"))),
            None => Err(Error::validation("missing 'type' field")),
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a create or update request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SyncItem {
    File(FileTransfer),
    Folder(FolderRecord),
}

impl SyncItem {
    /// Parse an untrusted JSON body.
    ///
    /// An unknown `type` or a missing/mistyped field is a
    /// [`Error::Validation`].
    pub fn from_value(value: Value) -> Result<Self> {
        ItemKind::parse(&value)?;
        serde_json::from_value(value).map_err(|e| Error::validation(e.to_string()))
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Self::File(_) => ItemKind::File,
            Self::Folder(_) => ItemKind::Folder,
        }
    }
}

/// Body of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    #[serde(rename = "type")]
    pub kind: ItemKind,
}

impl DeleteRequest {
    pub fn new(kind: ItemKind) -> Self {
        Self { kind }
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(Self {
            kind: ItemKind::parse(value)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record() -> FileRecord {
        FileRecord {
            path: "example/path".into(),
            modified: Timestamp::from_secs(1608675488.0458164),
            hash: compute_bytes_checksum(b"ABC123"),
            size: 6,
            synced: false,
        }
    }

    #[test]
    fn file_payload_uses_wire_keys() {
        let item = SyncItem::File(FileTransfer::with_content(record(), b"ABC123".to_vec()));
        let value = serde_json::to_value(&item).unwrap();

        assert_eq!(value["type"], "file");
        assert_eq!(value["bin"], "QUJDMTIz");
        assert_eq!(value["md5"], compute_bytes_checksum(b"ABC123"));
        assert_eq!(value["sync"], false);
        assert_eq!(value["size"], 6);
    }

    #[test]
    fn metadata_only_payload_omits_bin() {
        let item = SyncItem::File(FileTransfer::metadata_only(record()));
        let value = serde_json::to_value(&item).unwrap();
        assert!(value.get("bin").is_none());
    }

    #[test]
    fn content_survives_the_wire() {
        let bytes: Vec<u8> = (0..=255).collect();
        let item = SyncItem::File(FileTransfer::with_content(record(), bytes.clone()));
        let text = serde_json::to_string(&item).unwrap();

        let parsed = SyncItem::from_value(serde_json::from_str(&text).unwrap()).unwrap();
        let SyncItem::File(transfer) = parsed else {
            panic!("expected a file payload");
        };
        assert_eq!(transfer.content.as_deref(), Some(bytes.as_slice()));
        assert_eq!(compute_bytes_checksum(&bytes), transfer.record.hash);
    }

    #[test]
    fn folder_payload_parses() {
        let value = json!({"type": "folder", "path": "a/b", "modified": 100000.0, "sync": false});
        let item = SyncItem::from_value(value).unwrap();
        assert_eq!(item.kind(), ItemKind::Folder);
    }

    #[test]
    fn unknown_type_is_validation_error() {
        let value = json!({"type": "invaid-type", "path": "example/path", "modified": 1.0});
        let err = SyncItem::from_value(value).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn missing_field_is_validation_error() {
        let value = json!({"type": "file", "path": "a.txt"});
        assert!(matches!(SyncItem::from_value(value), Err(Error::Validation { .. })));
    }

    #[test]
    fn bad_base64_is_validation_error() {
        let item = SyncItem::File(FileTransfer::metadata_only(record()));
        let mut value = serde_json::to_value(item).unwrap();
        value["bin"] = json!("***not base64***");
        assert!(matches!(SyncItem::from_value(value), Err(Error::Validation { .. })));
    }

    #[test]
    fn sync_flag_defaults_to_false() {
        let value = json!({"type": "folder", "path": "a", "modified": 1.0});
        let SyncItem::Folder(folder) = SyncItem::from_value(value).unwrap() else {
            panic!("expected a folder payload");
        };
        assert!(!folder.synced);
    }

    #[test]
    fn delete_request_requires_known_type() {
        assert_eq!(
            DeleteRequest::from_value(&json!({"type": "file"})).unwrap(),
            DeleteRequest::new(ItemKind::File)
        );
        assert!(DeleteRequest::from_value(&json!({"type": "invalid-type"})).is_err());
        assert!(DeleteRequest::from_value(&json!({})).is_err());
    }

    #[test]
    fn record_from_disk_is_relative_and_hashed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        let file = dir.path().join("docs").join("a.txt");
        std::fs::write(&file, "abc123").unwrap();

        let record = FileRecord::from_disk(dir.path(), &file).unwrap();

        assert_eq!(record.path, "docs/a.txt");
        assert_eq!(record.size, 6);
        assert_eq!(record.hash, compute_bytes_checksum(b"abc123"));
        assert!(!record.synced);
    }
}
