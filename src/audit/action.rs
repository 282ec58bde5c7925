//! The audit action taxonomy and actor roles.
//!
//! Callers describe events with free-form action strings
//! (`"UPLOAD_COMMIT_SUCCESS"`, `"INVALID_PDF_UPLOAD"`, ...). Durable storage
//! uses a small closed set of actions. [`normalize_action`] compresses the
//! open vocabulary onto that set; the mapping is lossy by design — the enum
//! is a coarse query category, and the verbatim action string is preserved
//! in record metadata, never round-tripped from the enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical audit action categories for durable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// An entity was created (also the default for successful uploads).
    Created,
    /// An entity was submitted for review.
    Submitted,
    /// An entity was approved.
    Approved,
    /// An entity was rejected (also failed/invalid uploads and bad scans).
    Rejected,
    /// An entity was published.
    Published,
    /// An entity was edited.
    Edited,
    /// An entity was assigned.
    Assigned,
    /// An entity was viewed (also duplicate-upload detections).
    Viewed,
    /// An entity was downloaded.
    Downloaded,
}

impl AuditAction {
    /// Returns the canonical string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Submitted => "SUBMITTED",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Published => "PUBLISHED",
            Self::Edited => "EDITED",
            Self::Assigned => "ASSIGNED",
            Self::Viewed => "VIEWED",
            Self::Downloaded => "DOWNLOADED",
        }
    }

    /// Parses an exact canonical string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATED" => Some(Self::Created),
            "SUBMITTED" => Some(Self::Submitted),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            "PUBLISHED" => Some(Self::Published),
            "EDITED" => Some(Self::Edited),
            "ASSIGNED" => Some(Self::Assigned),
            "VIEWED" => Some(Self::Viewed),
            "DOWNLOADED" => Some(Self::Downloaded),
            _ => None,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a free-form action string onto the closed taxonomy.
///
/// Pure and deterministic. Returns `None` for actions that are not
/// persistable — those events still get a console trail, but no durable
/// record.
///
/// Rules, in order:
/// 1. Exact taxonomy matches pass through.
/// 2. Known upload lifecycle actions map to their category.
/// 3. Any other `UPLOAD`-flavored string maps to `Rejected` when it smells
///    like a failure (`FAILURE`/`INVALID`/`ERROR`), else `Created`.
/// 4. Everything else is non-persistable.
pub fn normalize_action(action: &str) -> Option<AuditAction> {
    if let Some(exact) = AuditAction::parse(action) {
        return Some(exact);
    }

    match action {
        "UPLOAD_INIT" | "UPLOAD_COMMIT_SUCCESS" => Some(AuditAction::Created),
        "UPLOAD_COMMIT_FAILURE" | "UPLOAD_COMMIT_SYSTEM_ERROR" | "INVALID_PDF_UPLOAD" => {
            Some(AuditAction::Rejected)
        }
        "UPLOAD_DUPLICATE_DETECTED" => Some(AuditAction::Viewed),
        _ if action.contains("UPLOAD") => {
            if action.contains("FAILURE") || action.contains("INVALID") || action.contains("ERROR")
            {
                Some(AuditAction::Rejected)
            } else {
                Some(AuditAction::Created)
            }
        }
        _ => None,
    }
}

/// Platform roles, denormalized onto audit records at write time so records
/// stay readable if a user's role later changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    /// Platform administrator.
    Admin,
    /// Administrator of published content.
    ContentAdmin,
    /// Manager of the book catalog.
    BookManager,
    /// Classroom teacher.
    Teacher,
    /// Volunteer contributor.
    Volunteer,
    /// Reader; the lowest-privilege role and the default when an actor is
    /// missing or cannot be resolved.
    Learner,
}

impl Default for ActorRole {
    fn default() -> Self {
        Self::Learner
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => f.write_str("ADMIN"),
            Self::ContentAdmin => f.write_str("CONTENT_ADMIN"),
            Self::BookManager => f.write_str("BOOK_MANAGER"),
            Self::Teacher => f.write_str("TEACHER"),
            Self::Volunteer => f.write_str("VOLUNTEER"),
            Self::Learner => f.write_str("LEARNER"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_matches_pass_through() {
        for (s, expected) in [
            ("CREATED", AuditAction::Created),
            ("SUBMITTED", AuditAction::Submitted),
            ("APPROVED", AuditAction::Approved),
            ("REJECTED", AuditAction::Rejected),
            ("PUBLISHED", AuditAction::Published),
            ("EDITED", AuditAction::Edited),
            ("ASSIGNED", AuditAction::Assigned),
            ("VIEWED", AuditAction::Viewed),
            ("DOWNLOADED", AuditAction::Downloaded),
        ] {
            assert_eq!(normalize_action(s), Some(expected));
        }
    }

    #[test]
    fn test_upload_lifecycle_mapping() {
        assert_eq!(normalize_action("UPLOAD_INIT"), Some(AuditAction::Created));
        assert_eq!(
            normalize_action("UPLOAD_COMMIT_SUCCESS"),
            Some(AuditAction::Created)
        );
        assert_eq!(
            normalize_action("UPLOAD_COMMIT_FAILURE"),
            Some(AuditAction::Rejected)
        );
        assert_eq!(
            normalize_action("UPLOAD_COMMIT_SYSTEM_ERROR"),
            Some(AuditAction::Rejected)
        );
        assert_eq!(
            normalize_action("INVALID_PDF_UPLOAD"),
            Some(AuditAction::Rejected)
        );
        assert_eq!(
            normalize_action("UPLOAD_DUPLICATE_DETECTED"),
            Some(AuditAction::Viewed)
        );
    }

    #[test]
    fn test_unknown_upload_flavored_strings() {
        assert_eq!(
            normalize_action("UPLOAD_RESUMED"),
            Some(AuditAction::Created)
        );
        assert_eq!(
            normalize_action("UPLOAD_CHECKSUM_INVALID"),
            Some(AuditAction::Rejected)
        );
        assert_eq!(
            normalize_action("UPLOAD_PART_ERROR"),
            Some(AuditAction::Rejected)
        );
    }

    #[test]
    fn test_non_persistable_actions() {
        assert_eq!(normalize_action("UNAUTHORIZED_ACCESS"), None);
        assert_eq!(normalize_action("LOGIN"), None);
        assert_eq!(normalize_action(""), None);
    }

    #[test]
    fn test_mapping_is_deterministic() {
        for action in ["UPLOAD_COMMIT_SUCCESS", "UPLOAD_WEIRD_ERROR", "VIEWED"] {
            let first = normalize_action(action);
            for _ in 0..10 {
                assert_eq!(normalize_action(action), first);
            }
        }
    }

    #[test]
    fn test_lowest_privilege_default() {
        assert_eq!(ActorRole::default(), ActorRole::Learner);
    }

    #[test]
    fn test_action_serde_form() {
        let json = serde_json::to_string(&AuditAction::Rejected).unwrap();
        assert_eq!(json, "\"REJECTED\"");
    }
}
