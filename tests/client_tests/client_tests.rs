//! Tests for the Reader client
//!
//! Startup runs against a bucket mirror directory and an in-process engine,
//! so no network or shared object is involved.

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use common::{install_local, publish, FakeLibrary, FakeLoader};
use ikv_client::binary::{CancellationFlag, DirectoryRepository};
use ikv_client::{Config, EngineConfig, IkvError, PlatformTag, Reader};
use tempfile::TempDir;

const NO_KEYS: [&[u8]; 0] = [];

// =============================================================================
// Helper Functions
// =============================================================================

fn config(mount: &TempDir) -> Config {
    Config::builder()
        .mount_directory(mount.path())
        .store_name("users")
        .account_id("acct")
        .account_passkey("secret")
        .partition(3)
        .build()
        .unwrap()
}

fn engine() -> FakeLibrary {
    FakeLibrary::new()
        .with_value(b"alice", "city", b"Paris")
        .with_value(b"alice", "age", b"31")
        .with_value(b"bob", "city", b"Oslo")
}

fn start(mount: &TempDir, bucket: &TempDir, loader: &FakeLoader) -> Reader {
    install_local(mount.path(), "0.0.1-libikv.so", b"elf");
    Reader::startup(
        config(mount),
        Box::new(DirectoryRepository::new(bucket.path())),
        loader,
    )
    .unwrap()
}

// =============================================================================
// Startup Tests
// =============================================================================

#[test]
fn test_startup_opens_engine_with_config() {
    let mount = TempDir::new().unwrap();
    let bucket = TempDir::new().unwrap();
    let loader = FakeLoader::new(engine());
    let stats = loader.stats();

    let reader = start(&mount, &bucket, &loader);

    assert!(reader.engine().is_open());
    assert_eq!(stats.opens(), 1);

    let sent = EngineConfig::from_bytes(&stats.last_config.lock()).unwrap();
    let mount_dir = mount.path().to_string_lossy().into_owned();
    assert_eq!(sent.string("mount_directory"), Some(mount_dir.as_str()));
    assert_eq!(sent.string("store_name"), Some("users"));
    assert_eq!(sent.string("account_passkey"), Some("secret"));
    assert_eq!(sent.string("rust_client_log_level"), Some("info"));
    assert_eq!(sent.boolean("rust_client_log_to_console"), Some(true));
    assert_eq!(sent.int("partition"), Some(3));
}

#[test]
fn test_startup_loads_resolved_binary() {
    let mount = TempDir::new().unwrap();
    let bucket = TempDir::new().unwrap();
    let loader = FakeLoader::new(engine());

    let _reader = start(&mount, &bucket, &loader);

    assert_eq!(
        *loader.loaded.lock(),
        vec![mount.path().join("bin").join("0.0.1-libikv.so")]
    );
}

#[test]
fn test_startup_downloads_on_supported_host() {
    let Some(platform) = PlatformTag::resolve() else {
        return;
    };

    let mount = TempDir::new().unwrap();
    let bucket = TempDir::new().unwrap();
    install_local(mount.path(), "0.0.1-libikv.so", b"old");
    publish(bucket.path(), platform.as_str(), "0.0.2-libikv.so", b"new");

    let loader = FakeLoader::new(engine());
    let _reader = Reader::startup(
        config(&mount),
        Box::new(DirectoryRepository::new(bucket.path())),
        &loader,
    )
    .unwrap();

    let installed = mount.path().join("bin").join("0.0.2-libikv.so");
    assert_eq!(*loader.loaded.lock(), vec![installed.clone()]);
    assert_eq!(std::fs::read(installed).unwrap(), b"new");
}

#[test]
fn test_startup_without_binary() {
    let mount = TempDir::new().unwrap();
    let bucket = TempDir::new().unwrap();
    let loader = FakeLoader::new(engine());

    let result = Reader::startup(
        config(&mount),
        Box::new(DirectoryRepository::new(bucket.path())),
        &loader,
    );

    assert!(matches!(result, Err(IkvError::NoBinary)));
    assert!(loader.loaded.lock().is_empty());
}

#[test]
fn test_startup_open_failure() {
    let mount = TempDir::new().unwrap();
    let bucket = TempDir::new().unwrap();
    install_local(mount.path(), "0.0.1-libikv.so", b"elf");
    let loader = FakeLoader::new(engine().with_open_status(-5));
    let stats = loader.stats();

    let result = Reader::startup(
        config(&mount),
        Box::new(DirectoryRepository::new(bucket.path())),
        &loader,
    );

    assert!(matches!(result, Err(IkvError::EngineOpen(-5))));
    assert_eq!(stats.closes(), 0);
}

#[test]
fn test_startup_with_base_config() {
    let mount = TempDir::new().unwrap();
    let bucket = TempDir::new().unwrap();
    install_local(mount.path(), "0.0.1-libikv.so", b"elf");
    let loader = FakeLoader::new(engine());
    let stats = loader.stats();

    let mut base = EngineConfig::default();
    base.set_string("store_name", "overridden");
    base.set_string("region_hint", "eu");
    base.set_int("partition", 99);

    let _reader = Reader::startup_with(
        config(&mount),
        Box::new(DirectoryRepository::new(bucket.path())),
        &loader,
        Some(&base),
        CancellationFlag::new(),
    )
    .unwrap();

    let sent = EngineConfig::from_bytes(&stats.last_config.lock()).unwrap();
    assert_eq!(sent.string("store_name"), Some("users"));
    assert_eq!(sent.string("region_hint"), Some("eu"));
    assert_eq!(sent.int("partition"), Some(3));
}

// =============================================================================
// Lookup Tests
// =============================================================================

#[test]
fn test_single_lookups() {
    let mount = TempDir::new().unwrap();
    let bucket = TempDir::new().unwrap();
    let loader = FakeLoader::new(engine());
    let reader = start(&mount, &bucket, &loader);

    assert_eq!(reader.get_string_value("alice", "city").unwrap(), Some("Paris".to_string()));
    assert_eq!(reader.get_bytes_value(b"bob", "city").unwrap(), Some(b"Oslo".to_vec()));
    assert_eq!(reader.get_string_value("carol", "city").unwrap(), None);
}

#[test]
fn test_multiget_lookups() {
    let mount = TempDir::new().unwrap();
    let bucket = TempDir::new().unwrap();
    let loader = FakeLoader::new(engine());
    let stats = loader.stats();
    let reader = start(&mount, &bucket, &loader);

    let values = reader
        .multiget_string_values(&[b"bob".as_slice()], &["alice"], &["city", "age"])
        .unwrap();
    assert_eq!(
        values,
        vec![
            Some("Oslo".to_string()),
            None,
            Some("Paris".to_string()),
            Some("31".to_string()),
        ]
    );

    let raw = reader
        .multiget_bytes_values(&NO_KEYS, &["alice"], &["age"])
        .unwrap();
    assert_eq!(raw, vec![Some(b"31".to_vec())]);

    assert_eq!(stats.freed(), stats.allocated());
}

#[test]
fn test_health_check() {
    let mount = TempDir::new().unwrap();
    let bucket = TempDir::new().unwrap();
    let loader = FakeLoader::new(engine());
    let reader = start(&mount, &bucket, &loader);

    assert!(reader.health_check("ping").unwrap());
}

// =============================================================================
// Shutdown Tests
// =============================================================================

#[test]
fn test_shutdown_closes_engine() {
    let mount = TempDir::new().unwrap();
    let bucket = TempDir::new().unwrap();
    let loader = FakeLoader::new(engine());
    let stats = loader.stats();
    let reader = start(&mount, &bucket, &loader);

    reader.shutdown();
    assert_eq!(stats.closes(), 1);
}

#[test]
fn test_from_engine() {
    let mount = TempDir::new().unwrap();
    let library = engine();
    let stats = Arc::clone(&library.stats);
    let handle = ikv_client::NativeEngineHandle::new(Box::new(library));

    let reader = Reader::from_engine(config(&mount), handle).unwrap();
    assert_eq!(stats.opens(), 1);
    assert_eq!(reader.config().store_name.as_deref(), Some("users"));

    drop(reader);
    assert_eq!(stats.closes(), 1);
}
