//! Reader Client
//!
//! Brings an engine up from a config and serves lookups.
//!
//! ## Startup
//! 1. Resolve the native binary (download if a newer one is published)
//! 2. Load it through the library loader
//! 3. Open the engine with the serialized engine config
//!
//! Any failure after step 2 drops the engine handle, which closes it.

use crate::binary::{BinaryLifecycleManager, CancellationFlag, RemoteBinaryRepository};
use crate::config::{Config, EngineConfig};
use crate::error::{IkvError, Result};
use crate::native::{LibraryLoader, NativeEngineHandle};

/// Read-only client over an embedded engine
pub struct Reader {
    config: Config,
    engine: NativeEngineHandle,
}

impl Reader {
    /// Provision the binary, load it, and open the engine
    pub fn startup(
        config: Config,
        repository: Box<dyn RemoteBinaryRepository>,
        loader: &dyn LibraryLoader,
    ) -> Result<Self> {
        Self::startup_with(config, repository, loader, None, CancellationFlag::new())
    }

    /// `startup` with engine settings merged over `base` and an external
    /// cancellation flag for the binary download
    pub fn startup_with(
        config: Config,
        repository: Box<dyn RemoteBinaryRepository>,
        loader: &dyn LibraryLoader,
        base: Option<&EngineConfig>,
        cancel: CancellationFlag,
    ) -> Result<Self> {
        let manager = BinaryLifecycleManager::new(&config.mount_directory, repository)
            .with_chunk_size(config.download_chunk_size)
            .with_cancellation(cancel);

        let path = manager.resolve_binary_path()?.ok_or(IkvError::NoBinary)?;
        let engine = NativeEngineHandle::load(&path, loader)?;

        let mut engine_config = base.cloned().unwrap_or_default();
        engine_config.merge_from(&config.engine_config());
        engine.open(&engine_config.to_bytes()?)?;

        tracing::info!(
            "Reader started for store {}",
            config.store_name.as_deref().unwrap_or("<unnamed>")
        );
        Ok(Self { config, engine })
    }

    /// Wrap an already loaded engine handle and open it
    pub fn from_engine(config: Config, engine: NativeEngineHandle) -> Result<Self> {
        engine.open(&config.engine_config().to_bytes()?)?;
        Ok(Self { config, engine })
    }

    pub fn get_bytes_value(
        &self,
        primary_key: impl AsRef<[u8]>,
        field_name: &str,
    ) -> Result<Option<Vec<u8>>> {
        self.engine.get(primary_key.as_ref(), field_name)
    }

    pub fn get_string_value(
        &self,
        primary_key: impl AsRef<[u8]>,
        field_name: &str,
    ) -> Result<Option<String>> {
        self.engine.get_as_text(primary_key.as_ref(), field_name)
    }

    /// Values for `(bytes_keys ++ str_keys) × field_names`, keys outer
    pub fn multiget_bytes_values<B, T, F>(
        &self,
        bytes_keys: &[B],
        str_keys: &[T],
        field_names: &[F],
    ) -> Result<Vec<Option<Vec<u8>>>>
    where
        B: AsRef<[u8]>,
        T: AsRef<str>,
        F: AsRef<str>,
    {
        self.engine.multiget(bytes_keys, str_keys, field_names)
    }

    pub fn multiget_string_values<B, T, F>(
        &self,
        bytes_keys: &[B],
        str_keys: &[T],
        field_names: &[F],
    ) -> Result<Vec<Option<String>>>
    where
        B: AsRef<[u8]>,
        T: AsRef<str>,
        F: AsRef<str>,
    {
        self.engine.multiget_as_text(bytes_keys, str_keys, field_names)
    }

    pub fn health_check(&self, probe: &str) -> Result<bool> {
        self.engine.health_check(probe)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &NativeEngineHandle {
        &self.engine
    }

    /// Close the engine and release the library
    pub fn shutdown(self) {
        self.engine.close();
        tracing::info!("Reader shut down");
    }
}
