//! Durable audit persistence.
//!
//! [`AuditStore`] abstracts the append-only event store. Records are
//! independent and uniquely keyed, so implementations need no coordination
//! between concurrent appends. [`JsonlAuditStore`] persists one JSON line
//! per record; [`MemoryAuditStore`] backs tests and embedded use.

use crate::audit::action::ActorRole;
use crate::audit::event::AuditRecord;
use crate::core::AuditError;

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;

/// Append-only storage for audit records.
#[async_trait]
pub trait AuditStore: Send + Sync + Debug {
    /// Appends one record.
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

/// An arc-wrapped store for shared ownership.
pub type ArcAuditStore = Arc<dyn AuditStore>;

/// Resolves an actor id to their current role for denormalized storage.
///
/// Lookup failures never fail an audit write; the logger falls back to the
/// lowest-privilege role.
#[async_trait]
pub trait RoleDirectory: Send + Sync + Debug {
    /// Returns the actor's role, or `None` if the actor is unknown.
    async fn role_of(&self, actor_id: &str) -> Result<Option<ActorRole>, AuditError>;
}

/// A role directory that knows nobody.
#[derive(Debug, Default)]
pub struct NullRoleDirectory;

#[async_trait]
impl RoleDirectory for NullRoleDirectory {
    async fn role_of(&self, _actor_id: &str) -> Result<Option<ActorRole>, AuditError> {
        Ok(None)
    }
}

/// A map-backed role directory.
#[derive(Debug, Default)]
pub struct StaticRoleDirectory {
    roles: HashMap<String, ActorRole>,
}

impl StaticRoleDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an actor with the given role.
    pub fn with_role(mut self, actor_id: impl Into<String>, role: ActorRole) -> Self {
        self.roles.insert(actor_id.into(), role);
        self
    }
}

#[async_trait]
impl RoleDirectory for StaticRoleDirectory {
    async fn role_of(&self, actor_id: &str) -> Result<Option<ActorRole>, AuditError> {
        Ok(self.roles.get(actor_id).copied())
    }
}

/// Durable JSON-lines audit store.
///
/// One serialized record per line, appended with `O_APPEND`. The parent
/// directory is created on demand.
#[derive(Debug)]
pub struct JsonlAuditStore {
    path: PathBuf,
}

impl JsonlAuditStore {
    /// Creates a store writing to the given file.
    ///
    /// No I/O happens here; the file and its parent directory are created on
    /// first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl AuditStore for JsonlAuditStore {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}

/// In-memory audit store for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all stored records.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Returns `true` if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::action::AuditAction;
    use chrono::Utc;
    use tempfile::TempDir;

    fn make_record(entity_id: &str) -> AuditRecord {
        AuditRecord {
            id: uuid::Uuid::new_v4(),
            timestamp: Utc::now(),
            actor_id: Some("user-1".to_string()),
            actor_role: ActorRole::Teacher,
            action: AuditAction::Created,
            entity_type: "UPLOAD".to_string(),
            entity_id: entity_id.to_string(),
            previous_state: None,
            new_state: None,
            metadata: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn test_memory_store_appends() {
        let store = MemoryAuditStore::new();
        assert!(store.is_empty());

        store.append(&make_record("upload-1")).await.unwrap();
        store.append(&make_record("upload-2")).await.unwrap();

        let records = store.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].entity_id, "upload-1");
        assert_eq!(records[1].entity_id, "upload-2");
    }

    #[tokio::test]
    async fn test_jsonl_store_appends_lines() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("audit").join("events.jsonl");
        let store = JsonlAuditStore::new(&path);

        store.append(&make_record("upload-1")).await.unwrap();
        store.append(&make_record("upload-2")).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: AuditRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.entity_id, "upload-1");
        assert_eq!(first.actor_role, ActorRole::Teacher);
    }

    #[tokio::test]
    async fn test_static_role_directory() {
        let directory = StaticRoleDirectory::new().with_role("user-1", ActorRole::Admin);

        assert_eq!(
            directory.role_of("user-1").await.unwrap(),
            Some(ActorRole::Admin)
        );
        assert_eq!(directory.role_of("user-2").await.unwrap(), None);
    }
}
