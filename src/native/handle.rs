//! Native Engine Handle
//!
//! Owns a loaded engine library and the token of the index opened in it.
//!
//! ## State Machine
//! ```text
//!            open(config)
//!   Closed ───────────────► Open
//!     ▲                       │
//!     └───────── close() ─────┘
//! ```
//! `open` on an open handle and `close` on a closed one are no-ops.

use std::ffi::CString;
use std::path::Path;

use parking_lot::Mutex;

use crate::error::{IkvError, Result};
use crate::protocol::{decode_items_as_bytes, BatchRequest};

use super::{LibraryLoader, NativeBuffer, NativeLibrary};

/// Opaque engine index handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexToken(i64);

impl IndexToken {
    /// Raw value the engine uses for "no index"
    pub const CLOSED: i64 = -1;

    pub fn value(self) -> i64 {
        self.0
    }
}

/// An engine library plus at most one open index
///
/// ## Concurrency Model
/// Every native call (including health checks) runs with `token` locked, so
/// at most one call is in flight per handle. The engine's own threading
/// contract is unknown to this layer. Calls block the calling thread and
/// cannot be cancelled once issued.
pub struct NativeEngineHandle {
    /// Loaded engine binary
    library: Box<dyn NativeLibrary>,

    /// `None` while closed
    token: Mutex<Option<IndexToken>>,
}

impl NativeEngineHandle {
    /// Wrap an already loaded library. Starts closed.
    pub fn new(library: Box<dyn NativeLibrary>) -> Self {
        Self {
            library,
            token: Mutex::new(None),
        }
    }

    /// Load the binary at `path` through `loader`
    pub fn load(path: &Path, loader: &dyn LibraryLoader) -> Result<Self> {
        let library = loader.load(path)?;
        tracing::info!("Native engine loaded from {}", path.display());
        Ok(Self::new(library))
    }

    /// Open the engine with serialized configuration bytes
    ///
    /// No-op when already open. A non-zero status from the engine is
    /// returned verbatim as `EngineOpen`.
    pub fn open(&self, config: &[u8]) -> Result<()> {
        let mut token = self.token.lock();
        if token.is_some() {
            tracing::debug!("Engine already open, ignoring open");
            return Ok(());
        }

        check_len(config.len(), "config")?;

        let result = self.library.open_index(config);
        if result.status != 0 {
            tracing::error!("Engine open failed with status {}", result.status);
            return Err(IkvError::EngineOpen(result.status));
        }

        *token = Some(IndexToken(result.handle));
        tracing::info!("Engine opened");
        Ok(())
    }

    /// Close the engine. No-op when already closed.
    pub fn close(&self) {
        if let Some(token) = self.token.lock().take() {
            self.library.close_index(token.value());
            tracing::info!("Engine closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.token.lock().is_some()
    }

    /// Current token, or `IndexToken::CLOSED` when closed
    pub fn raw_handle(&self) -> i64 {
        let token = *self.token.lock();
        token.map_or(IndexToken::CLOSED, IndexToken::value)
    }

    /// Liveness probe. True iff the engine reports status 0.
    ///
    /// Independent of the open/close lifecycle.
    pub fn health_check(&self, probe: &str) -> Result<bool> {
        let probe = CString::new(probe)
            .map_err(|_| IkvError::EngineCall("health check probe contains NUL".to_string()))?;

        let _serialized = self.token.lock();
        let status = self.library.health_check(&probe);
        if status != 0 {
            tracing::warn!("Engine health check returned status {}", status);
        }
        Ok(status == 0)
    }

    /// Single-key lookup. An absent or empty engine buffer is `None`.
    pub fn get(&self, key: &[u8], field_name: &str) -> Result<Option<Vec<u8>>> {
        check_len(key.len(), "primary key")?;
        let field = CString::new(field_name)
            .map_err(|_| IkvError::EngineCall(format!("field name {:?} contains NUL", field_name)))?;

        let token = self.token.lock();
        let handle = (*token).ok_or(IkvError::EngineClosed)?.value();

        let raw = self.library.get_field_value(handle, key, &field);
        // SAFETY: raw was just returned by this library and is wrapped once.
        let buffer = unsafe { NativeBuffer::new(self.library.as_ref(), raw) };
        Ok(buffer.to_value())
    }

    /// `get` with the value decoded as UTF-8
    pub fn get_as_text(&self, key: &[u8], field_name: &str) -> Result<Option<String>> {
        self.get(key, field_name)?
            .map(|bytes| {
                String::from_utf8(bytes).map_err(|e| {
                    IkvError::Decode(format!("value of {:?} is not valid UTF-8: {}", field_name, e))
                })
            })
            .transpose()
    }

    /// Batched lookup over `byte_keys ++ text_keys` × `field_names`
    ///
    /// Slot `i` of the result corresponds to the `i`-th pair of
    /// `BatchRequest::slots`. The response is decoded fully before the
    /// engine buffer is freed.
    pub fn multiget<B, T, F>(
        &self,
        byte_keys: &[B],
        text_keys: &[T],
        field_names: &[F],
    ) -> Result<Vec<Option<Vec<u8>>>>
    where
        B: AsRef<[u8]>,
        T: AsRef<str>,
        F: AsRef<str>,
    {
        self.multiget_request(&BatchRequest::new(byte_keys, text_keys, field_names))
    }

    /// `multiget` with values decoded as UTF-8
    pub fn multiget_as_text<B, T, F>(
        &self,
        byte_keys: &[B],
        text_keys: &[T],
        field_names: &[F],
    ) -> Result<Vec<Option<String>>>
    where
        B: AsRef<[u8]>,
        T: AsRef<str>,
        F: AsRef<str>,
    {
        self.multiget_request(&BatchRequest::new(byte_keys, text_keys, field_names))?
            .into_iter()
            .enumerate()
            .map(|(idx, value)| {
                value
                    .map(|bytes| {
                        String::from_utf8(bytes).map_err(|e| {
                            IkvError::Decode(format!("slot {} is not valid UTF-8: {}", idx, e))
                        })
                    })
                    .transpose()
            })
            .collect()
    }

    /// Batched lookup for a prepared request
    ///
    /// An empty cross product returns an empty result without a native
    /// call. An absent engine buffer yields `None` for every slot.
    pub fn multiget_request(&self, request: &BatchRequest) -> Result<Vec<Option<Vec<u8>>>> {
        let slot_count = request.slot_count();
        if slot_count == 0 {
            return Ok(Vec::new());
        }

        let keys = request.encode_keys()?;
        let field_names = request.encode_field_names()?;
        check_len(keys.len(), "encoded primary keys")?;
        check_len(field_names.len(), "encoded field names")?;

        let token = self.token.lock();
        let handle = (*token).ok_or(IkvError::EngineClosed)?.value();

        let raw = self
            .library
            .multiget_field_values(handle, &keys, &field_names);
        // SAFETY: raw was just returned by this library and is wrapped once.
        let buffer = unsafe { NativeBuffer::new(self.library.as_ref(), raw) };

        if buffer.is_empty() {
            return Ok(vec![None; slot_count]);
        }

        let values = decode_items_as_bytes(buffer.as_slice()).map_err(|e| {
            tracing::warn!("Multiget response rejected: {}", e);
            e
        })?;
        if values.len() != slot_count {
            tracing::warn!("Multiget slot count mismatch");
            return Err(IkvError::Decode(format!(
                "expected {} slots, engine returned {}",
                slot_count,
                values.len()
            )));
        }

        tracing::trace!("Multiget decoded {} slot(s)", slot_count);
        Ok(values)
    }
}

impl Drop for NativeEngineHandle {
    fn drop(&mut self) {
        self.close();
    }
}

fn check_len(len: usize, what: &str) -> Result<()> {
    if i32::try_from(len).is_err() {
        return Err(IkvError::EngineCall(format!(
            "{} of {} bytes exceeds the native length limit",
            what, len
        )));
    }
    Ok(())
}
