//! Core types and errors for the uploadguard library.
//!
//! - [`types`] - `ScanVerdict`, `ScanEngine`, `ScanOptions`
//! - [`error`] - Structured error types
//! - [`hasher`] - SHA-256 content addressing

pub mod error;
pub mod hasher;
pub mod types;

pub use error::{AuditError, QuarantineError, ScanError};
pub use hasher::Sha256Digest;
pub use types::{
    EngineVersion, ScanDisposition, ScanEngine, ScanOptions, ScanVerdict, DEFAULT_SCAN_TIMEOUT,
};
