//! Native Module
//!
//! Access to the engine binary through its C ABI.
//!
//! ## Components
//! - `ffi`: `#[repr(C)]` structs and function signatures of the ABI
//! - `library`: the `NativeLibrary` capability trait and the dlopen-backed
//!   implementation, produced by a `LibraryLoader`
//! - `buffer`: `NativeBuffer`, the guard that frees engine-allocated memory
//! - `handle`: `NativeEngineHandle`, the open/close state machine and lookups
//!
//! ## Ownership Across the Boundary
//! Every `BytesBuffer` returned by the engine is read-only to us. It is
//! wrapped in a `NativeBuffer` immediately, copied into owned memory, and
//! released by `free_bytes_buffer` exactly once when the guard drops.

mod buffer;
mod ffi;
mod handle;
mod library;

pub use buffer::NativeBuffer;
pub use ffi::{BytesBuffer, IndexHandle};
pub use handle::{IndexToken, NativeEngineHandle};
pub use library::{DynamicLoader, LibraryLoader, NativeLibrary};

#[cfg(unix)]
pub use library::DynamicLibrary;
