//! C ABI of the engine binary
//!
//! ```c
//! typedef struct BytesBuffer { int32_t length; uint8_t *start; } BytesBuffer;
//! typedef struct IndexHandle { int64_t handle; int64_t status; } IndexHandle;
//!
//! int64_t     health_check(const char *input);
//! IndexHandle open_index_v2(const char *config, int32_t config_len);
//! void        close_index(int64_t handle);
//! BytesBuffer get_field_value(int64_t handle, const char *pkey, int32_t pkey_len,
//!                             const char *field_name);
//! BytesBuffer multiget_field_values(int64_t handle, const char *pkeys, int32_t pkeys_len,
//!                                   const char *field_names, int32_t field_names_len);
//! void        free_bytes_buffer(BytesBuffer buf);
//! ```

use std::os::raw::c_char;
use std::ptr;

/// Engine-allocated byte buffer. `start` may be null (no value).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct BytesBuffer {
    pub length: i32,
    pub start: *mut u8,
}

impl BytesBuffer {
    /// A buffer carrying no value
    pub fn null() -> Self {
        Self {
            length: 0,
            start: ptr::null_mut(),
        }
    }
}

/// Result of `open_index_v2`. `status == 0` means success.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexHandle {
    pub handle: i64,
    pub status: i64,
}

pub(crate) const HEALTH_CHECK: &[u8] = b"health_check\0";
pub(crate) const OPEN_INDEX: &[u8] = b"open_index_v2\0";
pub(crate) const CLOSE_INDEX: &[u8] = b"close_index\0";
pub(crate) const GET_FIELD_VALUE: &[u8] = b"get_field_value\0";
pub(crate) const MULTIGET_FIELD_VALUES: &[u8] = b"multiget_field_values\0";
pub(crate) const FREE_BYTES_BUFFER: &[u8] = b"free_bytes_buffer\0";

pub(crate) type HealthCheckFn = unsafe extern "C" fn(*const c_char) -> i64;
pub(crate) type OpenIndexFn = unsafe extern "C" fn(*const c_char, i32) -> IndexHandle;
pub(crate) type CloseIndexFn = unsafe extern "C" fn(i64);
pub(crate) type GetFieldValueFn =
    unsafe extern "C" fn(i64, *const c_char, i32, *const c_char) -> BytesBuffer;
pub(crate) type MultigetFieldValuesFn =
    unsafe extern "C" fn(i64, *const c_char, i32, *const c_char, i32) -> BytesBuffer;
pub(crate) type FreeBytesBufferFn = unsafe extern "C" fn(BytesBuffer);
