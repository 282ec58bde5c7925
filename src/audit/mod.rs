//! Audit logging for security and content-management events.
//!
//! Free-form events are normalized onto a small closed action taxonomy and
//! appended to a durable store, with a structured console line as the
//! unconditional fallback trail. Audit logging is best-effort by contract:
//! nothing in this module ever fails the primary operation that emitted the
//! event.

mod action;
mod event;
mod logger;
mod store;

pub use action::{normalize_action, ActorRole, AuditAction};
pub use event::{
    changed_fields, AuditEvent, AuditRecord, ENTITY_BOOK, ENTITY_FILE, ENTITY_SECURITY,
    ENTITY_UPLOAD,
};
pub use logger::{AuditLogger, UploadCommit};
pub use store::{
    ArcAuditStore, AuditStore, JsonlAuditStore, MemoryAuditStore, NullRoleDirectory,
    RoleDirectory, StaticRoleDirectory,
};
