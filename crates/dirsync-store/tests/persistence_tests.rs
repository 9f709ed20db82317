//! Tests for redb-backed stores surviving process restarts

use dirsync_fs::NormalizedPath;
use dirsync_store::{ContentIndex, KvStore, MetadataStore, RedbDatabase};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tempfile::tempdir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Record {
    path: String,
    size: u64,
}

#[test]
fn committed_records_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state").join("store.redb");

    {
        let db = RedbDatabase::open(&path).unwrap();
        let table: MetadataStore<Record> = MetadataStore::new(Arc::new(db.table("files").unwrap()));
        table
            .upsert("a.txt", &Record { path: "a.txt".into(), size: 6 })
            .unwrap();
        table.commit().unwrap();
    }

    let db = RedbDatabase::open(&path).unwrap();
    let table: MetadataStore<Record> = MetadataStore::new(Arc::new(db.table("files").unwrap()));
    assert_eq!(
        table.get("a.txt").unwrap(),
        Some(Record { path: "a.txt".into(), size: 6 })
    );
}

#[test]
fn uncommitted_records_are_lost_on_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.redb");

    {
        let db = RedbDatabase::open(&path).unwrap();
        let table = db.table("files").unwrap();
        table.put("draft", b"{}".to_vec()).unwrap();
    }

    let db = RedbDatabase::open(&path).unwrap();
    let table = db.table("files").unwrap();
    assert!(table.keys().unwrap().is_empty());
}

#[test]
fn keys_are_ordered() {
    let dir = tempdir().unwrap();
    let db = RedbDatabase::open(&dir.path().join("store.redb")).unwrap();
    let table = db.table("files").unwrap();

    for key in ["b", "a/c", "a"] {
        table.put(key, b"1".to_vec()).unwrap();
    }
    table.commit().unwrap();
    table.put("0", b"1".to_vec()).unwrap();

    assert_eq!(table.keys().unwrap(), vec!["0", "a", "a/c", "b"]);
}

#[test]
fn content_index_persists_canonical_paths() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.redb");

    {
        let db = RedbDatabase::open(&path).unwrap();
        let index = ContentIndex::new(Arc::new(db.table("content_index").unwrap()));
        index.insert("abc", &NormalizedPath::new("docs/a.txt")).unwrap();
        index.commit().unwrap();
    }

    let db = RedbDatabase::open(&path).unwrap();
    let index = ContentIndex::new(Arc::new(db.table("content_index").unwrap()));
    assert_eq!(
        index.lookup("abc").unwrap(),
        Some(NormalizedPath::new("docs/a.txt"))
    );
}
