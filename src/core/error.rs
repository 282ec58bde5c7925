//! Error types for the uploadguard library.
//!
//! This module provides structured, typed errors for all failure scenarios.
//! The library never panics; all errors are returned as `Result` values, and
//! errors inside the scan pipeline are folded into a fail-closed
//! [`ScanVerdict`](crate::core::ScanVerdict) before reaching callers.

use crate::core::types::ScanEngine;

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The main error type for scan operations.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The scanning backend is not usable and the next backend in the
    /// fallback chain should be tried.
    #[error("backend '{engine}' unavailable: {reason}")]
    BackendUnavailable {
        /// Engine that is unavailable.
        engine: ScanEngine,
        /// Human-readable reason for unavailability.
        reason: String,
    },

    /// The external scanner did not finish within the allowed time.
    #[error("scan timed out after {elapsed:?} on engine '{engine}'")]
    Timeout {
        /// Engine that timed out.
        engine: ScanEngine,
        /// How long the invocation ran before being cut off.
        elapsed: Duration,
    },

    /// The external scanner ran but produced unusable output or a failing
    /// exit status.
    #[error("scan execution failed on engine '{engine}': {details}")]
    ExecutionFailed {
        /// Engine that failed.
        engine: ScanEngine,
        /// Exit status and output details.
        details: String,
    },

    /// The file to scan does not exist.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// An I/O error occurred while reading the file or talking to a
    /// subprocess.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },

    /// The scanner or queue was misconfigured.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl ScanError {
    /// Returns `true` if the fallback chain should continue with the next
    /// backend rather than failing the scan.
    pub fn is_fallthrough(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. })
    }

    /// Returns the engine associated with this error, if any.
    pub fn engine(&self) -> Option<ScanEngine> {
        match self {
            Self::BackendUnavailable { engine, .. }
            | Self::Timeout { engine, .. }
            | Self::ExecutionFailed { engine, .. } => Some(*engine),
            _ => None,
        }
    }

    /// Creates a `BackendUnavailable` error.
    pub fn unavailable(engine: ScanEngine, reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            engine,
            reason: reason.into(),
        }
    }

    /// Creates a `Timeout` error.
    pub fn timeout(engine: ScanEngine, elapsed: Duration) -> Self {
        Self::Timeout { engine, elapsed }
    }

    /// Creates an `ExecutionFailed` error.
    pub fn execution_failed(engine: ScanEngine, details: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            engine,
            details: details.into(),
        }
    }

    /// Creates an `Internal` error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Error type for quarantine operations.
///
/// Quarantine is best-effort housekeeping: the scan engine logs these errors
/// and returns the scan verdict unchanged.
#[derive(Debug, Error)]
pub enum QuarantineError {
    /// Failed to create the quarantine directory.
    #[error("failed to create quarantine directory {}: {source}", dir.display())]
    CreateDirFailed {
        /// Directory that could not be created.
        dir: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to move the file into quarantine.
    #[error("failed to move {} into quarantine: {source}", src.display())]
    MoveFailed {
        /// File that could not be moved.
        src: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to write the side-car metadata record.
    #[error("failed to write quarantine record: {reason}")]
    RecordFailed {
        /// Reason for the failure.
        reason: String,
    },
}

/// Error type for audit persistence.
///
/// These never escape [`AuditLogger`](crate::audit::AuditLogger); they are
/// logged to the console trail and swallowed.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The durable store rejected the record.
    #[error("audit store append failed: {reason}")]
    StoreFailed {
        /// Reason for the failure.
        reason: String,
    },

    /// Actor role lookup failed.
    #[error("actor role lookup failed for '{actor_id}': {reason}")]
    RoleLookupFailed {
        /// Actor whose role could not be resolved.
        actor_id: String,
        /// Reason for the failure.
        reason: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallthrough_classification() {
        let unavailable = ScanError::unavailable(ScanEngine::Clamdscan, "daemon not running");
        assert!(unavailable.is_fallthrough());

        let timeout = ScanError::timeout(ScanEngine::Clamscan, Duration::from_secs(60));
        assert!(!timeout.is_fallthrough());

        let exec = ScanError::execution_failed(ScanEngine::Clamscan, "exit code 2");
        assert!(!exec.is_fallthrough());
    }

    #[test]
    fn test_error_engine() {
        let err = ScanError::unavailable(ScanEngine::Clamdscan, "not running");
        assert_eq!(err.engine(), Some(ScanEngine::Clamdscan));

        let io = ScanError::Io(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert_eq!(io.engine(), None);
    }

    #[test]
    fn test_error_display() {
        let err = ScanError::timeout(ScanEngine::Clamscan, Duration::from_secs(60));
        let text = err.to_string();
        assert!(text.contains("timed out"));
        assert!(text.contains("clamscan"));
    }
}
