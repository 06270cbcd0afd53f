//! Tests for RemoteBinaryRepository selection and DirectoryRepository

#[path = "../common/mod.rs"]
mod common;

use std::io::Read;

use common::publish;
use ikv_client::binary::{file_name_of, DirectoryRepository, RemoteBinaryRepository};
use ikv_client::{IkvError, PlatformTag, SemanticVersion};
use tempfile::TempDir;

#[test]
fn test_file_name_of() {
    assert_eq!(file_name_of("release/linux-x86_64/0.0.1-libikv.so"), "0.0.1-libikv.so");
    assert_eq!(file_name_of("0.0.1-libikv.so"), "0.0.1-libikv.so");
}

#[test]
fn test_list_keys_under_prefix() {
    let temp = TempDir::new().unwrap();
    publish(temp.path(), "linux-x86_64", "0.0.2-libikv.so", b"b");
    publish(temp.path(), "linux-x86_64", "0.0.1-libikv.so", b"a");
    publish(temp.path(), "mac-aarch64", "0.0.9-libikv.dylib", b"c");

    let repo = DirectoryRepository::new(temp.path());
    let keys = repo.list_keys("release/linux-x86_64").unwrap();

    assert_eq!(
        keys,
        vec![
            "release/linux-x86_64/0.0.1-libikv.so".to_string(),
            "release/linux-x86_64/0.0.2-libikv.so".to_string(),
        ]
    );
}

#[test]
fn test_list_remote_picks_highest_version() {
    let temp = TempDir::new().unwrap();
    for name in ["0.0.3-libikv.so", "0.0.12-libikv.so", "0.1.0-libikv.so", "libikv.so", "notes"] {
        publish(temp.path(), "linux-x86_64", name, b"bin");
    }

    let repo = DirectoryRepository::new(temp.path());
    let asset = repo.list_remote(PlatformTag::LinuxX86_64).unwrap().unwrap();

    assert_eq!(asset.version, SemanticVersion::parse("0.1.0").unwrap());
    assert_eq!(asset.location, "release/linux-x86_64/0.1.0-libikv.so");
}

#[test]
fn test_list_remote_ties_keep_first() {
    let temp = TempDir::new().unwrap();
    publish(temp.path(), "linux-x86_64", "0.0.5-a.so", b"a");
    publish(temp.path(), "linux-x86_64", "0.0.5-b.so", b"b");

    let repo = DirectoryRepository::new(temp.path());
    let asset = repo.list_remote(PlatformTag::LinuxX86_64).unwrap().unwrap();

    assert_eq!(asset.location, "release/linux-x86_64/0.0.5-a.so");
}

#[test]
fn test_list_remote_only_unparseable() {
    let temp = TempDir::new().unwrap();
    publish(temp.path(), "linux-x86_64", "libikv.so", b"bin");

    let repo = DirectoryRepository::new(temp.path());
    assert_eq!(repo.list_remote(PlatformTag::LinuxX86_64).unwrap(), None);
}

#[test]
fn test_list_remote_empty_prefix() {
    let temp = TempDir::new().unwrap();
    let repo = DirectoryRepository::new(temp.path());
    assert_eq!(repo.list_remote(PlatformTag::MacAarch64).unwrap(), None);
}

#[test]
fn test_fetch_streams_contents() {
    let temp = TempDir::new().unwrap();
    publish(temp.path(), "linux-aarch64", "0.0.1-libikv.so", b"binary bytes");

    let repo = DirectoryRepository::new(temp.path());
    let mut stream = repo.fetch("release/linux-aarch64/0.0.1-libikv.so").unwrap();
    let mut contents = Vec::new();
    stream.read_to_end(&mut contents).unwrap();

    assert_eq!(contents, b"binary bytes");
}

#[test]
fn test_fetch_missing_object() {
    let temp = TempDir::new().unwrap();
    let repo = DirectoryRepository::new(temp.path());

    assert!(matches!(
        repo.fetch("release/linux-x86_64/9.9.9-libikv.so"),
        Err(IkvError::Fetch(_))
    ));
}

#[test]
fn test_fetch_rejects_parent_segments() {
    let temp = TempDir::new().unwrap();
    let repo = DirectoryRepository::new(temp.path().join("mirror"));

    assert!(matches!(repo.fetch("release/../../etc/passwd"), Err(IkvError::Fetch(_))));
}
