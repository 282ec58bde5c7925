//! # Uploadguard
//!
//! The upload integrity and security pipeline of a content-publishing
//! platform: content-addressed virus scanning with multi-engine fallback,
//! quarantine handling, and compliance-ready audit logging.
//!
//! ## Overview
//!
//! Uploadguard sits behind the upload-commit path of the surrounding
//! application. Once a chunked upload is assembled and hashed, the
//! application hands the file over and uploadguard takes care of:
//!
//! - Scanning it with the best scanner available (ClamAV daemon, direct
//!   ClamAV, or built-in heuristics as a last resort)
//! - Running at most one scan per content digest, however many upload
//!   sessions race on the same bytes
//! - Serializing scanner subprocesses through a single FIFO worker
//! - Quarantining infected files out of the serving path
//! - Leaving a durable, normalized audit record of every outcome
//!
//! Scanning fails closed: a scan that cannot complete yields a verdict that
//! is not clean, and the application must not serve the file. Audit logging
//! is the opposite — best-effort by contract, it never fails the operation
//! that emitted the event.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use uploadguard::audit::{AuditLogger, JsonlAuditStore};
//! use uploadguard::quarantine::FileQuarantine;
//! use uploadguard::scanner::{AvScanner, ScanQueue};
//! use uploadguard::core::Sha256Digest;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let audit = AuditLogger::new(Arc::new(JsonlAuditStore::new("audit/events.jsonl")));
//!     let scanner = AvScanner::with_system_backends(
//!         audit,
//!         FileQuarantine::new("/var/lib/uploadguard/quarantine"),
//!     );
//!     let queue = ScanQueue::new(scanner);
//!
//!     // After an upload commit:
//!     let digest = Sha256Digest::hash_file("/uploads/abc.pdf".as_ref()).unwrap();
//!     queue.queue_virus_scan(&digest, "/uploads/abc.pdf".as_ref());
//!     // The upload response returns immediately; the verdict lands in the
//!     // audit trail.
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several layers:
//!
//! - **Core**: verdict and option types, errors, SHA-256 content addressing
//! - **Backends**: individual scanner implementations behind one trait
//! - **Scanner**: the fallback-chain engine, dedup map, and FIFO queue
//! - **Quarantine**: hash-keyed relocation of infected files
//! - **Audit**: action taxonomy, durable event store, and the logger façade

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod audit;
pub mod backends;
pub mod core;
pub mod quarantine;
pub mod scanner;

// Re-export commonly used types at the crate root
pub use crate::audit::{AuditEvent, AuditLogger, AuditRecord, AuditStore, JsonlAuditStore};
pub use crate::core::{
    ScanDisposition, ScanEngine, ScanError, ScanOptions, ScanVerdict, Sha256Digest,
};
pub use crate::quarantine::FileQuarantine;
pub use crate::scanner::{AvScanner, ScanQueue};

/// Prelude module for convenient imports.
///
/// ```rust
/// use uploadguard::prelude::*;
/// ```
pub mod prelude {
    pub use crate::audit::{
        AuditAction, AuditEvent, AuditLogger, AuditRecord, AuditStore, JsonlAuditStore,
        MemoryAuditStore,
    };
    pub use crate::backends::ScanBackend;
    pub use crate::core::{
        ScanDisposition, ScanEngine, ScanError, ScanOptions, ScanVerdict, Sha256Digest,
    };
    pub use crate::quarantine::FileQuarantine;
    pub use crate::scanner::{AvScanner, ScanQueue};
}
