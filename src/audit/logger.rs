//! The audit logger façade.
//!
//! [`AuditLogger`] normalizes free-form events into the audit taxonomy and
//! writes them to the durable store, with a structured console line as the
//! unconditional fallback trail.
//!
//! Audit logging is advisory infrastructure: it must never be the reason a
//! primary operation fails. `log_event` returns nothing and swallows every
//! persistence error after logging it — the console line is always emitted
//! first, so no event disappears without a trace.

use crate::audit::action::{normalize_action, ActorRole};
use crate::audit::event::{
    changed_fields, AuditEvent, AuditRecord, ENTITY_BOOK, ENTITY_FILE, ENTITY_SECURITY,
    ENTITY_UPLOAD,
};
use crate::audit::store::{ArcAuditStore, NullRoleDirectory, RoleDirectory};
use crate::core::{ScanDisposition, ScanVerdict, Sha256Digest};

use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Summary of a successfully committed upload, as reported to the audit
/// trail.
#[derive(Debug, Clone)]
pub struct UploadCommit {
    /// Content digest of the assembled file.
    pub sha256: Sha256Digest,
    /// Size of the assembled file in bytes.
    pub size: u64,
    /// Whether the content already existed under another upload session.
    pub is_duplicate: bool,
    /// Where the file was stored.
    pub storage_path: String,
}

/// Normalizes and records audit events. Never fails the caller.
#[derive(Debug, Clone)]
pub struct AuditLogger {
    store: ArcAuditStore,
    roles: Arc<dyn RoleDirectory>,
}

impl AuditLogger {
    /// Creates a logger writing to the given store, with no role directory.
    pub fn new(store: ArcAuditStore) -> Self {
        Self {
            store,
            roles: Arc::new(NullRoleDirectory),
        }
    }

    /// Sets the directory used to denormalize actor roles onto records.
    pub fn with_role_directory(mut self, roles: Arc<dyn RoleDirectory>) -> Self {
        self.roles = roles;
        self
    }

    /// Records an audit event.
    ///
    /// Always emits a structured console line first. If the event's action
    /// normalizes into the taxonomy, a durable record is also appended;
    /// store and role-lookup failures are logged and swallowed.
    pub async fn log_event(&self, event: AuditEvent) {
        let metadata_display = Value::Object(event.metadata.clone());
        tracing::info!(
            target: "uploadguard::audit",
            timestamp = %event.timestamp.to_rfc3339(),
            actor_id = ?event.actor_id,
            action = %event.action,
            resource = %event.resource,
            success = event.success,
            metadata = %metadata_display,
            "audit event"
        );

        let Some(action) = normalize_action(&event.action) else {
            return;
        };

        let actor_role = self.resolve_role(event.actor_id.as_deref()).await;

        let entity_type = event
            .entity_type
            .unwrap_or_else(|| ENTITY_UPLOAD.to_string());
        let entity_id = event.entity_id.unwrap_or_else(|| event.resource.clone());

        let mut metadata = event.metadata;
        metadata.insert("originalAction".to_string(), json!(event.action));
        metadata.insert("resource".to_string(), json!(event.resource));
        metadata.insert("success".to_string(), json!(event.success));

        let record = AuditRecord {
            id: uuid::Uuid::new_v4(),
            timestamp: event.timestamp,
            actor_id: event.actor_id,
            actor_role,
            action,
            entity_type,
            entity_id,
            previous_state: event.previous_state,
            new_state: event.new_state,
            metadata,
        };

        if let Err(e) = self.store.append(&record).await {
            tracing::error!(
                target: "uploadguard::audit",
                record_id = %record.id,
                error = %e,
                "failed to persist audit record; console trail is the record"
            );
        }
    }

    /// Resolves the actor's role, defaulting to lowest privilege when the
    /// actor is absent, unknown, or the lookup fails.
    async fn resolve_role(&self, actor_id: Option<&str>) -> ActorRole {
        let Some(actor_id) = actor_id else {
            return ActorRole::default();
        };

        match self.roles.role_of(actor_id).await {
            Ok(Some(role)) => role,
            Ok(None) => ActorRole::default(),
            Err(e) => {
                tracing::debug!(
                    target: "uploadguard::audit",
                    actor_id = %actor_id,
                    error = %e,
                    "role lookup failed, defaulting to lowest privilege"
                );
                ActorRole::default()
            }
        }
    }

    /// Records the start of an upload session.
    pub async fn upload_init(
        &self,
        actor_id: &str,
        upload_id: &str,
        file_name: &str,
        extra: Map<String, Value>,
    ) {
        let event = AuditEvent::new("UPLOAD_INIT", "/api/uploads/init")
            .with_actor(actor_id)
            .with_entity(ENTITY_UPLOAD, upload_id)
            .with_metadata("uploadId", json!(upload_id))
            .with_metadata("fileName", json!(file_name))
            .with_metadata_map(extra);
        self.log_event(event).await;
    }

    /// Records one chunk of an upload session.
    pub async fn upload_chunk(
        &self,
        actor_id: &str,
        upload_id: &str,
        part_number: u32,
        success: bool,
        extra: Map<String, Value>,
    ) {
        let event = AuditEvent::new(
            "UPLOAD_CHUNK",
            format!("/api/uploads/{upload_id}/part/{part_number}"),
        )
        .with_actor(actor_id)
        .with_success(success)
        .with_entity(ENTITY_UPLOAD, upload_id)
        .with_metadata("uploadId", json!(upload_id))
        .with_metadata("partNumber", json!(part_number))
        .with_metadata_map(extra);
        self.log_event(event).await;
    }

    /// Records a successful upload commit; the entity is the committed file
    /// under its content digest.
    pub async fn upload_commit_success(
        &self,
        actor_id: &str,
        upload_id: &str,
        commit: &UploadCommit,
        extra: Map<String, Value>,
    ) {
        let event = AuditEvent::new(
            "UPLOAD_COMMIT_SUCCESS",
            format!("/api/uploads/{upload_id}/commit"),
        )
        .with_actor(actor_id)
        .with_entity(ENTITY_FILE, commit.sha256.as_str())
        .with_metadata("uploadId", json!(upload_id))
        .with_metadata("sha256", json!(commit.sha256.as_str()))
        .with_metadata("size", json!(commit.size))
        .with_metadata("isDuplicate", json!(commit.is_duplicate))
        .with_metadata("storagePath", json!(commit.storage_path))
        .with_metadata_map(extra);
        self.log_event(event).await;
    }

    /// Records a failed upload commit.
    pub async fn upload_commit_failure(
        &self,
        actor_id: &str,
        upload_id: &str,
        error: &str,
        extra: Map<String, Value>,
    ) {
        let event = AuditEvent::new(
            "UPLOAD_COMMIT_FAILURE",
            format!("/api/uploads/{upload_id}/commit"),
        )
        .with_actor(actor_id)
        .with_success(false)
        .with_entity(ENTITY_UPLOAD, upload_id)
        .with_metadata("uploadId", json!(upload_id))
        .with_metadata("error", json!(error))
        .with_metadata_map(extra);
        self.log_event(event).await;
    }

    /// Records creation of a book.
    pub async fn book_create(
        &self,
        actor_id: &str,
        book_id: &str,
        book: &Value,
        extra: Map<String, Value>,
    ) {
        let event = AuditEvent::new("CREATED", "/api/admin/books")
            .with_actor(actor_id)
            .with_entity(ENTITY_BOOK, book_id)
            .with_new_state(book.clone())
            .with_metadata("bookId", json!(book_id))
            .with_metadata_map(extra);
        self.log_event(event).await;
    }

    /// Records an edit to a book, with a shallow change summary in metadata.
    pub async fn book_update(
        &self,
        actor_id: &str,
        book_id: &str,
        previous: &Value,
        new: &Value,
        extra: Map<String, Value>,
    ) {
        let event = AuditEvent::new("EDITED", format!("/api/admin/books/{book_id}"))
            .with_actor(actor_id)
            .with_entity(ENTITY_BOOK, book_id)
            .with_previous_state(previous.clone())
            .with_new_state(new.clone())
            .with_metadata("bookId", json!(book_id))
            .with_metadata("changes", json!(changed_fields(previous, new)))
            .with_metadata_map(extra);
        self.log_event(event).await;
    }

    /// Records a workflow status change on a book. The action follows the
    /// new status where it maps onto the taxonomy, else `EDITED`.
    pub async fn book_status_change(
        &self,
        actor_id: &str,
        book_id: &str,
        old_status: &str,
        new_status: &str,
        extra: Map<String, Value>,
    ) {
        let action = match new_status {
            "PUBLISHED" => "PUBLISHED",
            "APPROVED" => "APPROVED",
            "REJECTED" => "REJECTED",
            _ => "EDITED",
        };

        let event = AuditEvent::new(action, format!("/api/admin/books/{book_id}/status"))
            .with_actor(actor_id)
            .with_entity(ENTITY_BOOK, book_id)
            .with_previous_state(json!({ "status": old_status }))
            .with_new_state(json!({ "status": new_status }))
            .with_metadata("bookId", json!(book_id))
            .with_metadata(
                "statusTransition",
                json!(format!("{old_status} -> {new_status}")),
            )
            .with_metadata_map(extra);
        self.log_event(event).await;
    }

    /// Records a denied access attempt. Not part of the persistable
    /// taxonomy; the structured console line is its trail.
    pub async fn unauthorized_access(
        &self,
        actor_id: Option<&str>,
        resource: &str,
        extra: Map<String, Value>,
    ) {
        let mut event = AuditEvent::new("UNAUTHORIZED_ACCESS", resource)
            .with_success(false)
            .with_entity(ENTITY_SECURITY, resource)
            .with_metadata_map(extra);
        if let Some(actor_id) = actor_id {
            event = event.with_actor(actor_id);
        }
        self.log_event(event).await;
    }

    /// Records the outcome of a virus scan.
    ///
    /// System-originated (no actor). A clean verdict maps to `APPROVED`;
    /// infected and failed scans both map to `REJECTED`, with `success`
    /// false only for failures.
    pub async fn virus_scan_result(&self, sha256: &Sha256Digest, verdict: &ScanVerdict) {
        let disposition = verdict.disposition();
        let action = match disposition {
            ScanDisposition::Clean => "APPROVED",
            ScanDisposition::Infected | ScanDisposition::Error => "REJECTED",
        };

        let mut event = AuditEvent::new(action, format!("/security/virus-scan/{sha256}"))
            .with_success(disposition != ScanDisposition::Error)
            .with_entity(ENTITY_FILE, sha256.as_str())
            .with_metadata("sha256", json!(sha256.as_str()))
            .with_metadata("scanResult", json!(disposition.to_string()))
            .with_metadata("scanEngine", json!(verdict.engine.as_str()))
            .with_metadata("duration", json!(verdict.duration.as_millis() as u64));

        if let Some(threat) = &verdict.threat_name {
            event = event.with_metadata("threatName", json!(threat));
        }
        if let Some(error) = &verdict.error {
            event = event.with_metadata("error", json!(error));
        }

        self.log_event(event).await;
    }
}
