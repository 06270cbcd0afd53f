//! # IKV Client
//!
//! Client for an embedded key-value engine shipped as a native shared
//! library:
//! - Native binary lifecycle: versioned discovery, download, atomic swap
//! - FFI handle with scoped ownership of engine-allocated buffers
//! - Length-prefixed batch protocol for multi-key, multi-field reads
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Reader                               │
//! │                 (startup / lookups / shutdown)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌──────────────┐          ┌──────────────┐
//!   │   Lifecycle  │          │    Engine    │
//!   │    Manager   │          │    Handle    │
//!   └──────┬───────┘          └──────┬───────┘
//!          │                         │
//!    ┌─────┴──────┐                  ▼
//!    ▼            ▼           ┌──────────────┐
//! ┌───────┐  ┌─────────┐      │ Batch Codec  │
//! │ Local │  │ Remote  │      │  (i32 LE)    │
//! │  bin/ │  │ bucket  │      └──────┬───────┘
//! └───────┘  └─────────┘             ▼
//!                              native library (FFI)
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod version;
pub mod platform;
pub mod binary;
pub mod protocol;
pub mod native;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{IkvError, Result};
pub use config::{Config, EngineConfig};
pub use version::SemanticVersion;
pub use platform::PlatformTag;
pub use binary::{BinaryAsset, BinaryLifecycleManager};
pub use native::NativeEngineHandle;
pub use client::Reader;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the client crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
