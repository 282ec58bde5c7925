//! Mock backend for testing.
//!
//! A configurable backend that returns scripted outcomes without invoking
//! any external scanner, keyed by file path with a default for everything
//! else.

use crate::backends::{Detection, ScanBackend};
use crate::core::{ScanEngine, ScanError};

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// Scripted outcome for a mock scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    /// Report the file as clean.
    Clean,
    /// Report the file as infected with the given threat name.
    Infected(String),
    /// Signal fall-through to the next backend.
    Unavailable(String),
    /// Fail the scan with an execution error.
    Fail(String),
    /// Fail the scan with a timeout, as if the scanner never answered.
    Timeout,
}

/// A scripted scanner backend for tests.
///
/// # Examples
///
/// ```rust
/// use uploadguard::backends::{MockBackend, MockOutcome};
///
/// // Clean by default, one infected path.
/// let backend = MockBackend::new_clean()
///     .with_response("/tmp/evil.bin", MockOutcome::Infected("Test.Malware".into()));
/// ```
#[derive(Debug)]
pub struct MockBackend {
    engine: ScanEngine,
    responses: RwLock<HashMap<PathBuf, MockOutcome>>,
    default_outcome: MockOutcome,
    latency: Option<Duration>,
    scan_count: AtomicU64,
}

impl MockBackend {
    /// Creates a mock that reports every file clean.
    pub fn new_clean() -> Self {
        Self::with_default_outcome(MockOutcome::Clean)
    }

    /// Creates a mock that reports every file infected.
    pub fn new_infected(threat: impl Into<String>) -> Self {
        Self::with_default_outcome(MockOutcome::Infected(threat.into()))
    }

    /// Creates a mock that is never available.
    pub fn new_unavailable() -> Self {
        Self::with_default_outcome(MockOutcome::Unavailable("scripted".to_string()))
    }

    /// Creates a mock with the given default outcome.
    pub fn with_default_outcome(outcome: MockOutcome) -> Self {
        Self {
            engine: ScanEngine::Clamscan,
            responses: RwLock::new(HashMap::new()),
            default_outcome: outcome,
            latency: None,
            scan_count: AtomicU64::new(0),
        }
    }

    /// Sets the engine tag this mock claims.
    pub fn with_engine(mut self, engine: ScanEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Scripts an outcome for a specific path.
    pub fn with_response(self, path: impl Into<PathBuf>, outcome: MockOutcome) -> Self {
        self.responses
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(path.into(), outcome);
        self
    }

    /// Adds simulated latency to each scan.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Returns how many scans this backend has executed.
    pub fn scan_count(&self) -> u64 {
        self.scan_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScanBackend for MockBackend {
    fn engine(&self) -> ScanEngine {
        self.engine
    }

    async fn scan(&self, path: &Path, timeout: Duration) -> Result<Detection, ScanError> {
        self.scan_count.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let outcome = self
            .responses
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(path)
            .cloned()
            .unwrap_or_else(|| self.default_outcome.clone());

        match outcome {
            MockOutcome::Clean => Ok(Detection::Clean),
            MockOutcome::Infected(threat) => Ok(Detection::Infected { threat }),
            MockOutcome::Unavailable(reason) => Err(ScanError::unavailable(self.engine, reason)),
            MockOutcome::Fail(details) => {
                Err(ScanError::execution_failed(self.engine, details))
            }
            MockOutcome::Timeout => Err(ScanError::timeout(self.engine, timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_default_clean() {
        let backend = MockBackend::new_clean();
        let detection = backend
            .scan(Path::new("/tmp/file"), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(detection.is_clean());
        assert_eq!(backend.scan_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_scripted_response() {
        let backend = MockBackend::new_clean()
            .with_response("/tmp/evil", MockOutcome::Infected("Test.Malware".into()));

        let clean = backend
            .scan(Path::new("/tmp/fine"), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(clean.is_clean());

        let infected = backend
            .scan(Path::new("/tmp/evil"), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(!infected.is_clean());
    }

    #[tokio::test]
    async fn test_mock_unavailable() {
        let backend = MockBackend::new_unavailable();
        let err = backend
            .scan(Path::new("/tmp/file"), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.is_fallthrough());
    }
}
