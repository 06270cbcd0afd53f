//! Tests for Config, ConfigBuilder and EngineConfig

use std::path::PathBuf;

use ikv_client::config::VALID_LOG_LEVELS;
use ikv_client::{Config, EngineConfig, IkvError};

// =============================================================================
// Builder Tests
// =============================================================================

#[test]
fn test_defaults() {
    let config = Config::builder().mount_directory("/tmp/ikv").build().unwrap();

    assert_eq!(config.mount_directory, PathBuf::from("/tmp/ikv"));
    assert_eq!(config.log_level, "info");
    assert!(config.log_to_console);
    assert_eq!(config.bucket, "ikv-binaries");
    assert_eq!(config.region, "us-west-2");
    assert_eq!(config.download_chunk_size, 8 * 1024 * 1024);
    assert_eq!(config.partition, 0);
}

#[test]
fn test_mount_directory_required() {
    assert!(matches!(Config::builder().build(), Err(IkvError::Config(_))));
}

#[test]
fn test_log_levels() {
    for level in VALID_LOG_LEVELS {
        let config = Config::builder()
            .mount_directory("/tmp/ikv")
            .console_logging(level.to_uppercase())
            .build()
            .unwrap();
        assert_eq!(config.log_level, level);
    }

    let result = Config::builder()
        .mount_directory("/tmp/ikv")
        .console_logging("verbose")
        .build();
    assert!(matches!(result, Err(IkvError::Config(_))));
}

#[test]
fn test_file_logging() {
    let config = Config::builder()
        .mount_directory("/tmp/ikv")
        .file_logging("debug", "/tmp/ikv.log")
        .build()
        .unwrap();

    assert!(!config.log_to_console);
    assert_eq!(config.log_file, Some(PathBuf::from("/tmp/ikv.log")));

    let engine = config.engine_config();
    assert_eq!(engine.boolean("rust_client_log_to_console"), Some(false));
    assert_eq!(engine.string("rust_client_log_file"), Some("/tmp/ikv.log"));
    assert_eq!(engine.string("rust_client_log_level"), Some("debug"));
}

#[test]
fn test_console_logging_clears_file() {
    let config = Config::builder()
        .mount_directory("/tmp/ikv")
        .file_logging("debug", "/tmp/ikv.log")
        .console_logging("warn")
        .build()
        .unwrap();

    assert!(config.log_to_console);
    assert_eq!(config.log_file, None);
    assert_eq!(config.engine_config().string("rust_client_log_file"), None);
}

#[test]
fn test_rejects_zero_chunk_size() {
    let result = Config::builder()
        .mount_directory("/tmp/ikv")
        .download_chunk_size(0)
        .build();
    assert!(matches!(result, Err(IkvError::Config(_))));
}

#[test]
fn test_rejects_blank_identity() {
    let result = Config::builder()
        .mount_directory("/tmp/ikv")
        .account_passkey("  ")
        .build();
    assert!(matches!(result, Err(IkvError::Config(_))));
}

#[test]
fn test_s3_repository_from_config() {
    let config = Config::builder()
        .mount_directory("/tmp/ikv")
        .endpoint("http://127.0.0.1:9000/ikv-binaries")
        .build()
        .unwrap();
    assert!(config.s3_repository().is_ok());
}

// =============================================================================
// EngineConfig Tests
// =============================================================================

#[test]
fn test_engine_config_keys() {
    let config = Config::builder()
        .mount_directory("/data/ikv")
        .store_name("users")
        .account_id("acct")
        .partition(2)
        .build()
        .unwrap();

    let engine = config.engine_config();
    assert_eq!(engine.string("mount_directory"), Some("/data/ikv"));
    assert_eq!(engine.string("store_name"), Some("users"));
    assert_eq!(engine.string("account_id"), Some("acct"));
    assert_eq!(engine.string("account_passkey"), None);
    assert_eq!(engine.int("partition"), Some(2));
}

#[test]
fn test_engine_config_merge() {
    let mut base = EngineConfig::default();
    base.set_string("store_name", "old");
    base.set_string("kept", "yes");
    base.set_bool("flag", false);
    base.set_float("ratio", 0.25);
    base.set_bytes("salt", b"aa".to_vec());

    let mut overlay = EngineConfig::default();
    overlay.set_string("store_name", "new");
    overlay.set_bool("flag", true);
    overlay.set_int("partition", 4);
    overlay.set_float("ratio", 0.5);
    overlay.set_bytes("key", b"k".to_vec());

    base.merge_from(&overlay);

    assert_eq!(base.string("store_name"), Some("new"));
    assert_eq!(base.string("kept"), Some("yes"));
    assert_eq!(base.boolean("flag"), Some(true));
    assert_eq!(base.int("partition"), Some(4));
    assert_eq!(base.float("ratio"), Some(0.5));
    assert_eq!(base.bytes("salt"), Some(b"aa".as_slice()));
    assert_eq!(base.bytes("key"), Some(b"k".as_slice()));
}

#[test]
fn test_engine_config_bytes_roundtrip() {
    let mut config = EngineConfig::default();
    config.set_string("mount_directory", "/data");
    config.set_int("partition", -1);
    config.set_float("sample_rate", 0.75);
    config.set_bytes("passkey_salt", vec![0u8, 1, 2]);
    config.set_bool("rust_client_log_to_console", true);

    let bytes = config.to_bytes().unwrap();
    assert_eq!(EngineConfig::from_bytes(&bytes).unwrap(), config);

    assert!(matches!(EngineConfig::from_bytes(&[0xff]), Err(IkvError::Config(_))));
}

#[test]
fn test_engine_config_protobuf_layout() {
    let mut config = EngineConfig::default();
    config.set_string("a", "b");
    config.set_int("p", 1);
    config.set_bool("c", true);

    // field 1 (stringConfigs) entry {key=1:"a", value=2:"b"}
    let mut expected = vec![0x0a, 0x06, 0x0a, 0x01, b'a', 0x12, 0x01, b'b'];
    // field 2 (intConfigs) entry {key=1:"p", value=2:varint 1}
    expected.extend_from_slice(&[0x12, 0x05, 0x0a, 0x01, b'p', 0x10, 0x01]);
    // field 5 (booleanConfigs) entry {key=1:"c", value=2:true}
    expected.extend_from_slice(&[0x2a, 0x05, 0x0a, 0x01, b'c', 0x10, 0x01]);

    assert_eq!(config.to_bytes().unwrap(), expected);
}

#[test]
fn test_empty_engine_config_encodes_empty() {
    assert!(EngineConfig::default().to_bytes().unwrap().is_empty());
}
