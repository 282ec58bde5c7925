//! Filesystem quarantine for infected uploads.
//!
//! On a positive detection the scan engine moves the file out of the
//! serving path into a quarantine directory, keyed by its content digest, so
//! nothing can serve it while the evidence is preserved for review. The
//! quarantine directory is created on demand.
//!
//! Layout:
//!
//! ```text
//! quarantine/
//! ├── {sha256}.quarantine     # the relocated file
//! └── {sha256}.json           # side-car record (origin, threat, time)
//! ```

use crate::core::{QuarantineError, Sha256Digest};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Side-car metadata written next to a quarantined file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarantineRecord {
    /// Content digest of the quarantined file.
    pub sha256: Sha256Digest,

    /// Where the file lived before quarantine.
    pub original_path: PathBuf,

    /// Threat that triggered the quarantine, if the scanner named one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threat_name: Option<String>,

    /// When the file was quarantined.
    pub quarantined_at: DateTime<Utc>,
}

/// Moves infected files into a hash-keyed quarantine directory.
#[derive(Debug, Clone)]
pub struct FileQuarantine {
    dir: PathBuf,
}

impl FileQuarantine {
    /// Creates a quarantine rooted at `dir`.
    ///
    /// No I/O happens here; the directory is created on first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the quarantine directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the quarantine destination for a digest.
    pub fn path_for(&self, digest: &Sha256Digest) -> PathBuf {
        self.dir.join(format!("{digest}.quarantine"))
    }

    fn record_path(&self, digest: &Sha256Digest) -> PathBuf {
        self.dir.join(format!("{digest}.json"))
    }

    /// Moves `src` into quarantine under its content digest.
    ///
    /// The move is a single rename where possible, with a copy-and-remove
    /// fallback for cross-device paths. Returns the quarantine path. The
    /// side-car record is best-effort: a record write failure is logged but
    /// the file stays quarantined and the call still succeeds.
    pub async fn quarantine(
        &self,
        src: &Path,
        digest: &Sha256Digest,
        threat_name: Option<&str>,
    ) -> Result<PathBuf, QuarantineError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            QuarantineError::CreateDirFailed {
                dir: self.dir.clone(),
                source: e,
            }
        })?;

        let dest = self.path_for(digest);
        if let Err(rename_err) = tokio::fs::rename(src, &dest).await {
            // Quarantine may live on another filesystem; fall back to
            // copy + remove.
            tokio::fs::copy(src, &dest)
                .await
                .map_err(|_| QuarantineError::MoveFailed {
                    src: src.to_path_buf(),
                    source: rename_err,
                })?;
            tokio::fs::remove_file(src)
                .await
                .map_err(|e| QuarantineError::MoveFailed {
                    src: src.to_path_buf(),
                    source: e,
                })?;
        }

        let record = QuarantineRecord {
            sha256: digest.clone(),
            original_path: src.to_path_buf(),
            threat_name: threat_name.map(str::to_string),
            quarantined_at: Utc::now(),
        };
        if let Err(e) = self.write_record(&record).await {
            tracing::warn!(
                sha256 = %digest,
                error = %e,
                "failed to write quarantine record"
            );
        }

        tracing::info!(
            sha256 = %digest,
            src = %src.display(),
            dest = %dest.display(),
            threat = ?threat_name,
            "file quarantined"
        );

        Ok(dest)
    }

    async fn write_record(&self, record: &QuarantineRecord) -> Result<(), QuarantineError> {
        let content =
            serde_json::to_string_pretty(record).map_err(|e| QuarantineError::RecordFailed {
                reason: e.to_string(),
            })?;
        tokio::fs::write(self.record_path(&record.sha256), content)
            .await
            .map_err(|e| QuarantineError::RecordFailed {
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_quarantine_moves_file() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("upload.pdf");
        tokio::fs::write(&src, b"infected bytes").await.unwrap();

        let digest = Sha256Digest::hash_bytes(b"infected bytes");
        let quarantine = FileQuarantine::new(tmp.path().join("quarantine"));

        let dest = quarantine
            .quarantine(&src, &digest, Some("Eicar-Test-Signature"))
            .await
            .unwrap();

        assert!(!src.exists());
        assert_eq!(dest, quarantine.path_for(&digest));
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"infected bytes");

        let record: QuarantineRecord = serde_json::from_slice(
            &tokio::fs::read(tmp.path().join("quarantine").join(format!("{digest}.json")))
                .await
                .unwrap(),
        )
        .unwrap();
        assert_eq!(record.sha256, digest);
        assert_eq!(record.threat_name.as_deref(), Some("Eicar-Test-Signature"));
        assert_eq!(record.original_path, src);
    }

    #[tokio::test]
    async fn test_quarantine_missing_source_fails() {
        let tmp = TempDir::new().unwrap();
        let digest = Sha256Digest::hash_bytes(b"whatever");
        let quarantine = FileQuarantine::new(tmp.path().join("quarantine"));

        let err = quarantine
            .quarantine(&tmp.path().join("gone.pdf"), &digest, None)
            .await
            .unwrap_err();
        assert!(matches!(err, QuarantineError::MoveFailed { .. }));
    }

    #[tokio::test]
    async fn test_quarantine_creates_directory_on_demand() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("upload.bin");
        tokio::fs::write(&src, b"x").await.unwrap();

        let dir = tmp.path().join("deep").join("quarantine");
        let quarantine = FileQuarantine::new(&dir);
        let digest = Sha256Digest::hash_bytes(b"x");

        quarantine.quarantine(&src, &digest, None).await.unwrap();
        assert!(dir.join(format!("{digest}.quarantine")).exists());
    }
}
