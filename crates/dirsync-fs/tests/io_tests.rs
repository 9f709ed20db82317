use dirsync_fs::{Timestamp, compute_file_checksum, io};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_write_atomic_creates_file_and_parents() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("deeper").join("test.bin");

    io::write_atomic(&path, b"hello world").unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"hello world");
}

#[test]
fn test_write_atomic_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("test.txt");
    fs::write(&path, "original").unwrap();

    io::write_atomic(&path, b"updated").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "updated");
}

#[test]
fn test_write_atomic_leaves_no_temp_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("test.txt");

    io::write_atomic(&path, b"content").unwrap();

    let entries: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
    assert_eq!(entries.len(), 1, "Only the target file should remain");
}

#[test]
fn test_copy_atomic_produces_identical_bytes() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("a.txt");
    let dst = temp.path().join("sub").join("b.txt");
    fs::write(&src, "abc123").unwrap();

    let copied = io::copy_atomic(&src, &dst).unwrap();

    assert_eq!(copied, 6);
    assert_eq!(
        compute_file_checksum(&src).unwrap(),
        compute_file_checksum(&dst).unwrap()
    );
}

#[test]
fn test_set_modified_is_observable() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("file.txt");
    fs::write(&path, "x").unwrap();

    io::set_modified(&path, Timestamp::from_secs(1_608_675_488.0)).unwrap();

    let meta = fs::metadata(&path).unwrap();
    let observed = Timestamp::from_metadata(&meta).unwrap();
    assert!((observed.as_secs() - 1_608_675_488.0).abs() < 1e-3);
}

#[test]
fn test_remove_file_if_exists_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("gone.txt");
    fs::write(&path, "x").unwrap();

    assert!(io::remove_file_if_exists(&path).unwrap());
    assert!(!io::remove_file_if_exists(&path).unwrap());
}

#[test]
fn test_remove_dir_all_if_exists_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("a").join("b");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("f.txt"), "x").unwrap();

    assert!(io::remove_dir_all_if_exists(&temp.path().join("a")).unwrap());
    assert!(!io::remove_dir_all_if_exists(&temp.path().join("a")).unwrap());
}

#[test]
fn test_read_bytes_nonexistent_file() {
    let temp = TempDir::new().unwrap();
    let result = io::read_bytes(&temp.path().join("missing"));
    assert!(result.unwrap_err().is_not_found());
}
