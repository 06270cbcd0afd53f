//! Native library loading
//!
//! `NativeLibrary` is the capability surface of an engine binary. The real
//! implementation resolves the ABI symbols from a dynamically loaded shared
//! object; tests substitute an in-process double.

use std::ffi::CStr;
use std::path::Path;

use crate::error::Result;

use super::{BytesBuffer, IndexHandle};

/// Calls exported by an engine binary
///
/// Slice lengths passed to these methods must fit in `i32`; the engine
/// handle validates this before calling.
pub trait NativeLibrary: Send + Sync {
    /// Status 0 means healthy
    fn health_check(&self, input: &CStr) -> i64;

    fn open_index(&self, config: &[u8]) -> IndexHandle;

    fn close_index(&self, handle: i64);

    fn get_field_value(&self, handle: i64, primary_key: &[u8], field_name: &CStr) -> BytesBuffer;

    fn multiget_field_values(&self, handle: i64, primary_keys: &[u8], field_names: &[u8])
        -> BytesBuffer;

    /// Release a buffer returned by this library.
    ///
    /// # Safety
    ///
    /// `buffer` must have been returned by this library and not freed yet.
    unsafe fn free_bytes_buffer(&self, buffer: BytesBuffer);
}

/// Produces a `NativeLibrary` from a binary path
pub trait LibraryLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn NativeLibrary>>;
}

/// Loads shared objects with `dlopen`
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicLoader;

impl LibraryLoader for DynamicLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn NativeLibrary>> {
        #[cfg(unix)]
        {
            Ok(Box::new(DynamicLibrary::open(path)?))
        }

        #[cfg(not(unix))]
        {
            Err(crate::error::IkvError::LibraryLoad(format!(
                "dynamic loading is not supported on this platform: {}",
                path.display()
            )))
        }
    }
}

#[cfg(unix)]
pub use self::unix::DynamicLibrary;

#[cfg(unix)]
mod unix {
    use std::ffi::{CStr, CString};
    use std::os::raw::{c_char, c_void};
    use std::os::unix::ffi::OsStrExt;
    use std::path::Path;

    use crate::error::{IkvError, Result};
    use crate::native::ffi::{self, BytesBuffer, IndexHandle};

    use super::NativeLibrary;

    /// A `dlopen`ed engine binary with its resolved ABI symbols
    pub struct DynamicLibrary {
        handle: *mut c_void,
        health_check: ffi::HealthCheckFn,
        open_index: ffi::OpenIndexFn,
        close_index: ffi::CloseIndexFn,
        get_field_value: ffi::GetFieldValueFn,
        multiget_field_values: ffi::MultigetFieldValuesFn,
        free_bytes_buffer: ffi::FreeBytesBufferFn,
    }

    // SAFETY: the library handle is a process-global resource and the symbols
    // are plain function pointers. NativeEngineHandle serializes calls.
    unsafe impl Send for DynamicLibrary {}
    unsafe impl Sync for DynamicLibrary {}

    impl DynamicLibrary {
        /// `dlopen` the binary at `path` and resolve every ABI symbol
        pub fn open(path: &Path) -> Result<Self> {
            let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| {
                IkvError::LibraryLoad(format!("path contains NUL: {}", path.display()))
            })?;

            // SAFETY: c_path is a valid C string for the duration of the call.
            let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
            if handle.is_null() {
                return Err(IkvError::LibraryLoad(format!(
                    "{}: {}",
                    path.display(),
                    last_dl_error()
                )));
            }

            // SAFETY: handle is a live dlopen handle.
            let resolved = unsafe { Self::resolve(handle) };

            match resolved {
                Ok(library) => {
                    tracing::debug!("Loaded native library {}", path.display());
                    Ok(library)
                }
                Err(e) => {
                    // SAFETY: handle came from dlopen above and nothing references it.
                    unsafe { libc::dlclose(handle) };
                    Err(e)
                }
            }
        }

        /// Resolve every ABI symbol, casting each to its declared signature.
        ///
        /// # Safety
        ///
        /// `handle` must be a live dlopen handle of an engine binary.
        unsafe fn resolve(handle: *mut c_void) -> Result<Self> {
            Ok(Self {
                handle,
                health_check: std::mem::transmute::<*mut c_void, ffi::HealthCheckFn>(symbol(
                    handle,
                    ffi::HEALTH_CHECK,
                )?),
                open_index: std::mem::transmute::<*mut c_void, ffi::OpenIndexFn>(symbol(
                    handle,
                    ffi::OPEN_INDEX,
                )?),
                close_index: std::mem::transmute::<*mut c_void, ffi::CloseIndexFn>(symbol(
                    handle,
                    ffi::CLOSE_INDEX,
                )?),
                get_field_value: std::mem::transmute::<*mut c_void, ffi::GetFieldValueFn>(
                    symbol(handle, ffi::GET_FIELD_VALUE)?,
                ),
                multiget_field_values: std::mem::transmute::<
                    *mut c_void,
                    ffi::MultigetFieldValuesFn,
                >(symbol(handle, ffi::MULTIGET_FIELD_VALUES)?),
                free_bytes_buffer: std::mem::transmute::<*mut c_void, ffi::FreeBytesBufferFn>(
                    symbol(handle, ffi::FREE_BYTES_BUFFER)?,
                ),
            })
        }
    }

    /// Resolve a NUL-terminated symbol name
    ///
    /// # Safety
    ///
    /// `handle` must be a live dlopen handle.
    unsafe fn symbol(handle: *mut c_void, name: &[u8]) -> Result<*mut c_void> {
        let name = CStr::from_bytes_with_nul(name)
            .map_err(|_| IkvError::LibraryLoad("malformed symbol name".to_string()))?;

        libc::dlerror();
        let ptr = libc::dlsym(handle, name.as_ptr());
        if ptr.is_null() {
            return Err(IkvError::LibraryLoad(format!(
                "missing symbol {}: {}",
                name.to_string_lossy(),
                last_dl_error()
            )));
        }
        Ok(ptr)
    }

    fn last_dl_error() -> String {
        // SAFETY: dlerror returns null or a thread-local C string.
        let err = unsafe { libc::dlerror() };
        if err.is_null() {
            "unknown dlopen error".to_string()
        } else {
            unsafe { CStr::from_ptr(err) }.to_string_lossy().into_owned()
        }
    }

    impl NativeLibrary for DynamicLibrary {
        fn health_check(&self, input: &CStr) -> i64 {
            unsafe { (self.health_check)(input.as_ptr()) }
        }

        fn open_index(&self, config: &[u8]) -> IndexHandle {
            unsafe { (self.open_index)(config.as_ptr() as *const c_char, config.len() as i32) }
        }

        fn close_index(&self, handle: i64) {
            unsafe { (self.close_index)(handle) }
        }

        fn get_field_value(&self, handle: i64, primary_key: &[u8], field_name: &CStr) -> BytesBuffer {
            unsafe {
                (self.get_field_value)(
                    handle,
                    primary_key.as_ptr() as *const c_char,
                    primary_key.len() as i32,
                    field_name.as_ptr(),
                )
            }
        }

        fn multiget_field_values(
            &self,
            handle: i64,
            primary_keys: &[u8],
            field_names: &[u8],
        ) -> BytesBuffer {
            unsafe {
                (self.multiget_field_values)(
                    handle,
                    primary_keys.as_ptr() as *const c_char,
                    primary_keys.len() as i32,
                    field_names.as_ptr() as *const c_char,
                    field_names.len() as i32,
                )
            }
        }

        unsafe fn free_bytes_buffer(&self, buffer: BytesBuffer) {
            (self.free_bytes_buffer)(buffer)
        }
    }

    impl Drop for DynamicLibrary {
        fn drop(&mut self) {
            if !self.handle.is_null() {
                // SAFETY: no symbol from this handle outlives self.
                unsafe {
                    libc::dlclose(self.handle);
                }
            }
        }
    }
}
