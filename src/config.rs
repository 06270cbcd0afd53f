//! Configuration for the IKV client
//!
//! Centralized configuration with sensible defaults.

use std::collections::BTreeMap;
use std::path::PathBuf;

use prost::Message;

use crate::binary::{S3Repository, DEFAULT_CHUNK_SIZE};
use crate::error::{IkvError, Result};

/// Log levels understood by the engine
pub const VALID_LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Main configuration for a reader
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory owned by the engine
    /// Internal structure:
    ///   {mount_directory}/
    ///     └── bin/            (installed native binary, single slot)
    pub mount_directory: PathBuf,

    // -------------------------------------------------------------------------
    // Store Identity
    // -------------------------------------------------------------------------
    pub store_name: Option<String>,
    pub account_id: Option<String>,
    pub account_passkey: Option<String>,
    pub partition: i64,

    // -------------------------------------------------------------------------
    // Engine Logging
    // -------------------------------------------------------------------------
    /// One of `VALID_LOG_LEVELS`
    pub log_level: String,

    /// Log to console (true) or to `log_file` (false)
    pub log_to_console: bool,
    pub log_file: Option<PathBuf>,

    // -------------------------------------------------------------------------
    // Binary Distribution
    // -------------------------------------------------------------------------
    /// Bucket holding published binaries
    pub bucket: String,
    pub region: String,

    /// Overrides the bucket's default S3 endpoint
    pub endpoint: Option<String>,

    /// Read size while streaming a binary download (bytes)
    pub download_chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mount_directory: PathBuf::new(),
            store_name: None,
            account_id: None,
            account_passkey: None,
            partition: 0,
            log_level: "info".to_string(),
            log_to_console: true,
            log_file: None,
            bucket: S3Repository::DEFAULT_BUCKET.to_string(),
            region: S3Repository::DEFAULT_REGION.to_string(),
            endpoint: None,
            download_chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Flatten engine-relevant settings into the engine's key-value config
    pub fn engine_config(&self) -> EngineConfig {
        let mut cfg = EngineConfig::default();

        cfg.set_string("mount_directory", self.mount_directory.to_string_lossy());
        if let Some(name) = &self.store_name {
            cfg.set_string("store_name", name);
        }
        if let Some(id) = &self.account_id {
            cfg.set_string("account_id", id);
        }
        if let Some(passkey) = &self.account_passkey {
            cfg.set_string("account_passkey", passkey);
        }
        cfg.set_string("rust_client_log_level", &self.log_level);
        cfg.set_bool("rust_client_log_to_console", self.log_to_console);
        if let Some(file) = &self.log_file {
            cfg.set_string("rust_client_log_file", file.to_string_lossy());
        }
        cfg.set_int("partition", self.partition);

        cfg
    }

    /// Repository for this config's bucket
    pub fn s3_repository(&self) -> Result<S3Repository> {
        match &self.endpoint {
            Some(endpoint) => S3Repository::with_endpoint(endpoint.clone()),
            None => S3Repository::new(&self.bucket, &self.region),
        }
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the mount directory (root for the binary slot and index data)
    pub fn mount_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.mount_directory = path.into();
        self
    }

    pub fn store_name(mut self, name: impl Into<String>) -> Self {
        self.config.store_name = Some(name.into());
        self
    }

    pub fn account_id(mut self, id: impl Into<String>) -> Self {
        self.config.account_id = Some(id.into());
        self
    }

    pub fn account_passkey(mut self, passkey: impl Into<String>) -> Self {
        self.config.account_passkey = Some(passkey.into());
        self
    }

    pub fn partition(mut self, partition: i64) -> Self {
        self.config.partition = partition;
        self
    }

    /// Engine logs to console at `level`
    pub fn console_logging(mut self, level: impl Into<String>) -> Self {
        self.config.log_level = level.into().to_lowercase();
        self.config.log_to_console = true;
        self.config.log_file = None;
        self
    }

    /// Engine logs to `path` at `level`
    pub fn file_logging(mut self, level: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.config.log_level = level.into().to_lowercase();
        self.config.log_to_console = false;
        self.config.log_file = Some(path.into());
        self
    }

    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.config.bucket = bucket.into();
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.config.region = region.into();
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = Some(endpoint.into());
        self
    }

    /// Set the download chunk size (in bytes)
    pub fn download_chunk_size(mut self, size: usize) -> Self {
        self.config.download_chunk_size = size;
        self
    }

    pub fn build(self) -> Result<Config> {
        let config = self.config;

        if config.mount_directory.as_os_str().is_empty() {
            return Err(IkvError::Config("mount directory is required".to_string()));
        }
        if !VALID_LOG_LEVELS.contains(&config.log_level.as_str()) {
            return Err(IkvError::Config(format!(
                "invalid log level {:?}, expected one of {}",
                config.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }
        if !config.log_to_console && config.log_file.is_none() {
            return Err(IkvError::Config("file logging requires a log file".to_string()));
        }
        if config.download_chunk_size == 0 {
            return Err(IkvError::Config("download chunk size must be non-zero".to_string()));
        }
        for (name, value) in [
            ("store name", &config.store_name),
            ("account id", &config.account_id),
            ("account passkey", &config.account_passkey),
        ] {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(IkvError::Config(format!("{} must not be blank", name)));
            }
        }

        Ok(config)
    }
}

/// Flat typed key-value configuration handed to the engine's `open`
///
/// Encoded as the engine's `IKVStoreConfig` protobuf message:
/// ```text
/// message IKVStoreConfig {
///   map<string, string> stringConfigs  = 1;
///   map<string, int64>  intConfigs     = 2;
///   map<string, float>  floatConfigs   = 3;
///   map<string, bytes>  bytesConfigs   = 4;
///   map<string, bool>   booleanConfigs = 5;
/// }
/// ```
#[derive(Clone, PartialEq, Message)]
pub struct EngineConfig {
    #[prost(btree_map = "string, string", tag = "1")]
    pub string_configs: BTreeMap<String, String>,

    #[prost(btree_map = "string, int64", tag = "2")]
    pub int_configs: BTreeMap<String, i64>,

    #[prost(btree_map = "string, float", tag = "3")]
    pub float_configs: BTreeMap<String, f32>,

    #[prost(btree_map = "string, bytes", tag = "4")]
    pub bytes_configs: BTreeMap<String, Vec<u8>>,

    #[prost(btree_map = "string, bool", tag = "5")]
    pub bool_configs: BTreeMap<String, bool>,
}

impl EngineConfig {
    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.string_configs.insert(key.into(), value.into());
    }

    pub fn set_int(&mut self, key: impl Into<String>, value: i64) {
        self.int_configs.insert(key.into(), value);
    }

    pub fn set_float(&mut self, key: impl Into<String>, value: f32) {
        self.float_configs.insert(key.into(), value);
    }

    pub fn set_bytes(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.bytes_configs.insert(key.into(), value.into());
    }

    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        self.bool_configs.insert(key.into(), value);
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        self.string_configs.get(key).map(String::as_str)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.int_configs.get(key).copied()
    }

    pub fn float(&self, key: &str) -> Option<f32> {
        self.float_configs.get(key).copied()
    }

    pub fn bytes(&self, key: &str) -> Option<&[u8]> {
        self.bytes_configs.get(key).map(Vec::as_slice)
    }

    pub fn boolean(&self, key: &str) -> Option<bool> {
        self.bool_configs.get(key).copied()
    }

    /// Overlay `other` onto self; entries in `other` win
    pub fn merge_from(&mut self, other: &EngineConfig) {
        self.string_configs
            .extend(other.string_configs.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.int_configs
            .extend(other.int_configs.iter().map(|(k, v)| (k.clone(), *v)));
        self.float_configs
            .extend(other.float_configs.iter().map(|(k, v)| (k.clone(), *v)));
        self.bytes_configs
            .extend(other.bytes_configs.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.bool_configs
            .extend(other.bool_configs.iter().map(|(k, v)| (k.clone(), *v)));
    }

    /// Protobuf bytes passed to `open`
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode(&mut buf)
            .map_err(|e| IkvError::Config(format!("cannot encode config: {}", e)))?;
        Ok(buf)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::decode(bytes).map_err(|e| IkvError::Config(format!("cannot decode config: {}", e)))
    }
}
