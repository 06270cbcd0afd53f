//! Error types for the IKV client
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using IkvError
pub type Result<T> = std::result::Result<T, IkvError>;

/// Unified error type for IKV client operations
#[derive(Debug, Error)]
pub enum IkvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Binary Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Invalid semantic version: {0}")]
    VersionParse(String),

    #[error("Remote fetch failed: {0}")]
    Fetch(String),

    #[error("Download cancelled")]
    Cancelled,

    #[error("No native binary could be provisioned")]
    NoBinary,

    // -------------------------------------------------------------------------
    // Native Engine Errors
    // -------------------------------------------------------------------------
    #[error("Cannot load native library: {0}")]
    LibraryLoad(String),

    #[error("Cannot open engine, status code: {0}")]
    EngineOpen(i64),

    #[error("Engine call failed: {0}")]
    EngineCall(String),

    #[error("Engine is not open")]
    EngineClosed,

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Malformed response buffer: {0}")]
    Decode(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
