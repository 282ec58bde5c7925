//! Audit event and record types.
//!
//! [`AuditEvent`] is what callers hand to the logger: a free-form action
//! string plus whatever context they have. [`AuditRecord`] is the normalized
//! shape that reaches durable storage: taxonomy action, denormalized actor
//! role, and a metadata bag that always carries the verbatim original
//! action.

use crate::audit::action::{ActorRole, AuditAction};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Entity type for chunked-upload sessions.
pub const ENTITY_UPLOAD: &str = "UPLOAD";
/// Entity type for committed, content-addressed files.
pub const ENTITY_FILE: &str = "FILE";
/// Entity type for books.
pub const ENTITY_BOOK: &str = "BOOK";
/// Entity type for security events without a content entity.
pub const ENTITY_SECURITY: &str = "SECURITY";

/// A free-form audit event as reported by a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// When the event happened.
    pub timestamp: DateTime<Utc>,

    /// User who performed the action; absent for system-originated events
    /// such as virus scans.
    pub actor_id: Option<String>,

    /// Free-form action string (open vocabulary).
    pub action: String,

    /// Resource the action touched, e.g. an API route.
    pub resource: String,

    /// Whether the action succeeded.
    pub success: bool,

    /// Entity type; defaults to [`ENTITY_UPLOAD`] when absent.
    pub entity_type: Option<String>,

    /// Entity id; defaults to the resource when absent.
    pub entity_id: Option<String>,

    /// Snapshot before the change, for diffing.
    pub previous_state: Option<Value>,

    /// Snapshot after the change.
    pub new_state: Option<Value>,

    /// Anything not fitting the typed fields (ip, user agent, scan engine,
    /// ...).
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl AuditEvent {
    /// Creates an event for the given action and resource, stamped now and
    /// assumed successful.
    pub fn new(action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            actor_id: None,
            action: action.into(),
            resource: resource.into(),
            success: true,
            entity_type: None,
            entity_id: None,
            previous_state: None,
            new_state: None,
            metadata: Map::new(),
        }
    }

    /// Sets the acting user.
    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    /// Sets the success flag.
    pub fn with_success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }

    /// Sets the entity the event is about.
    pub fn with_entity(mut self, entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Sets the before-change snapshot.
    pub fn with_previous_state(mut self, state: Value) -> Self {
        self.previous_state = Some(state);
        self
    }

    /// Sets the after-change snapshot.
    pub fn with_new_state(mut self, state: Value) -> Self {
        self.new_state = Some(state);
        self
    }

    /// Adds one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Merges a metadata map into the event.
    pub fn with_metadata_map(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata.extend(metadata);
        self
    }
}

/// A normalized audit record as persisted to the durable store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique record id.
    pub id: uuid::Uuid,

    /// When the event happened.
    pub timestamp: DateTime<Utc>,

    /// Acting user, if any.
    pub actor_id: Option<String>,

    /// The actor's role at write time (lowest privilege when unknown).
    pub actor_role: ActorRole,

    /// Taxonomy action. A coarse category only; the original action string
    /// is in `metadata["originalAction"]`.
    pub action: AuditAction,

    /// Entity type, e.g. `UPLOAD`, `FILE`, `BOOK`, `SECURITY`.
    pub entity_type: String,

    /// Entity id, e.g. an upload id or a content digest.
    pub entity_id: String,

    /// Snapshot before the change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_state: Option<Value>,

    /// Snapshot after the change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_state: Option<Value>,

    /// Open metadata bag, including the verbatim original action, the
    /// resource, and the success flag.
    pub metadata: Map<String, Value>,
}

/// Returns the top-level keys of `new` whose values differ from `old`.
///
/// A shallow change summary for audit metadata, not a deep diff. Returns an
/// empty list when either snapshot is not a JSON object.
pub fn changed_fields(old: &Value, new: &Value) -> Vec<String> {
    let (Some(old), Some(new)) = (old.as_object(), new.as_object()) else {
        return Vec::new();
    };

    new.iter()
        .filter(|(key, value)| old.get(*key) != Some(value))
        .map(|(key, _)| key.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_builder() {
        let event = AuditEvent::new("UPLOAD_INIT", "/api/uploads/init")
            .with_actor("user-42")
            .with_entity(ENTITY_UPLOAD, "upload-1")
            .with_metadata("fileName", json!("story.pdf"));

        assert_eq!(event.actor_id.as_deref(), Some("user-42"));
        assert_eq!(event.entity_type.as_deref(), Some("UPLOAD"));
        assert!(event.success);
        assert_eq!(event.metadata["fileName"], json!("story.pdf"));
    }

    #[test]
    fn test_changed_fields() {
        let old = json!({"title": "Draft", "status": "PENDING", "pages": 10});
        let new = json!({"title": "Final", "status": "PENDING", "pages": 12});

        let mut changes = changed_fields(&old, &new);
        changes.sort();
        assert_eq!(changes, vec!["pages", "title"]);
    }

    #[test]
    fn test_changed_fields_new_key_counts() {
        let old = json!({"title": "Draft"});
        let new = json!({"title": "Draft", "summary": "added"});
        assert_eq!(changed_fields(&old, &new), vec!["summary"]);
    }

    #[test]
    fn test_changed_fields_non_objects() {
        assert!(changed_fields(&json!("a"), &json!({"k": 1})).is_empty());
        assert!(changed_fields(&json!({"k": 1}), &json!(null)).is_empty());
    }
}
