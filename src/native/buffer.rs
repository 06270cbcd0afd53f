//! Scoped ownership of engine-allocated buffers

use std::slice;

use super::{BytesBuffer, NativeLibrary};

/// Owns a `BytesBuffer` returned by the engine and frees it on drop.
///
/// The free runs exactly once on every exit path, including decode errors
/// while the bytes are borrowed. A null `start` is never freed.
pub struct NativeBuffer<'lib> {
    library: &'lib dyn NativeLibrary,
    raw: BytesBuffer,
}

impl<'lib> NativeBuffer<'lib> {
    /// Take ownership of `raw`.
    ///
    /// # Safety
    ///
    /// `raw` must have been returned by `library`, must not have been freed,
    /// and must not be wrapped by another `NativeBuffer`.
    pub unsafe fn new(library: &'lib dyn NativeLibrary, raw: BytesBuffer) -> Self {
        Self { library, raw }
    }

    /// True when the engine returned no buffer at all
    pub fn is_null(&self) -> bool {
        self.raw.start.is_null()
    }

    /// Null or zero/negative length
    pub fn is_empty(&self) -> bool {
        self.is_null() || self.raw.length <= 0
    }

    /// Borrow the engine's bytes. Empty for null or non-positive length.
    pub fn as_slice(&self) -> &[u8] {
        if self.is_empty() {
            return &[];
        }
        // SAFETY: the engine guarantees `start` points at `length` readable
        // bytes until the buffer is freed, which happens only in drop.
        unsafe { slice::from_raw_parts(self.raw.start, self.raw.length as usize) }
    }

    /// Copy into owned memory; `None` for an absent or empty buffer
    pub fn to_value(&self) -> Option<Vec<u8>> {
        if self.is_empty() {
            None
        } else {
            Some(self.as_slice().to_vec())
        }
    }
}

impl Drop for NativeBuffer<'_> {
    fn drop(&mut self) {
        if !self.raw.start.is_null() {
            // SAFETY: constructed from an unfreed engine buffer; drop runs once.
            unsafe { self.library.free_bytes_buffer(self.raw) };
        }
    }
}
