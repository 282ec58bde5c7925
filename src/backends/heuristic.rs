//! Byte-pattern heuristic fallback.
//!
//! Used only when no external scanner is installed at all. Reads the first
//! 1 KB of the file and looks for a small fixed set of script-injection
//! markers that have no business appearing in uploaded documents.
//!
//! This is explicitly a weak, best-effort check and is NOT an antivirus
//! scan: a clean verdict from this backend means only that none of the
//! known-bad markers appear in the first kilobyte. Deployments that care
//! about uploads should install ClamAV; this backend exists so the pipeline
//! still fails closed on the patterns it can see rather than waving
//! everything through.

use crate::backends::{Detection, ScanBackend};
use crate::core::{ScanEngine, ScanError};

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncReadExt;

/// How much of the file the heuristics inspect.
const INSPECT_LEN: usize = 1024;

/// Threat label reported for any heuristic hit.
const HEURISTIC_THREAT: &str = "Suspicious_Script_Content";

/// Byte sequences that flag a file as suspicious.
const SUSPICIOUS_PATTERNS: &[&[u8]] = &[
    b"eval(",
    b"document.write",
    b"<script",
    b"javascript:",
    b"vbscript:",
];

/// Last-resort scanner backend using fixed byte patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicBackend;

impl HeuristicBackend {
    /// Creates the heuristic backend.
    pub fn new() -> Self {
        Self
    }

    fn contains_pattern(haystack: &[u8], needle: &[u8]) -> bool {
        if needle.is_empty() || haystack.len() < needle.len() {
            return false;
        }
        haystack.windows(needle.len()).any(|window| window == needle)
    }
}

#[async_trait]
impl ScanBackend for HeuristicBackend {
    fn engine(&self) -> ScanEngine {
        ScanEngine::BasicHeuristics
    }

    async fn scan(&self, path: &Path, _timeout: Duration) -> Result<Detection, ScanError> {
        let mut file = tokio::fs::File::open(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScanError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ScanError::Io(e)
            }
        })?;

        let mut head = vec![0u8; INSPECT_LEN];
        let mut filled = 0;
        while filled < INSPECT_LEN {
            let n = file.read(&mut head[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        head.truncate(filled);

        for pattern in SUSPICIOUS_PATTERNS {
            if Self::contains_pattern(&head, pattern) {
                return Ok(Detection::Infected {
                    threat: HEURISTIC_THREAT.to_string(),
                });
            }
        }

        Ok(Detection::Clean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    async fn scan_bytes(content: &[u8]) -> Detection {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();

        HeuristicBackend::new()
            .scan(file.path(), Duration::from_secs(5))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_script_tag_detected() {
        let detection = scan_bytes(b"%PDF-1.4 <script>evil()</script>").await;
        assert_eq!(
            detection,
            Detection::Infected {
                threat: HEURISTIC_THREAT.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_clean_content_passes() {
        let detection = scan_bytes(b"%PDF-1.4\nplain document content\n").await;
        assert!(detection.is_clean());
    }

    #[tokio::test]
    async fn test_pattern_beyond_first_kilobyte_not_seen() {
        let mut content = vec![b' '; 2048];
        content.extend_from_slice(b"<script>");
        let detection = scan_bytes(&content).await;
        assert!(detection.is_clean());
    }

    #[tokio::test]
    async fn test_pattern_inside_first_kilobyte_seen() {
        let mut content = vec![b' '; 900];
        content.extend_from_slice(b"javascript:alert(1)");
        let detection = scan_bytes(&content).await;
        assert!(!detection.is_clean());
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let err = HeuristicBackend::new()
            .scan(Path::new("/nonexistent/upload.pdf"), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::FileNotFound { .. }));
        assert!(!err.is_fallthrough());
    }

    #[tokio::test]
    async fn test_empty_file_is_clean() {
        let detection = scan_bytes(b"").await;
        assert!(detection.is_clean());
    }
}
