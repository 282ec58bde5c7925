//! Daemon-based ClamAV backend.
//!
//! Invokes `clamdscan`, the thin client for a persistently running `clamd`
//! daemon. Signature databases stay loaded in the daemon, so this is an
//! order of magnitude faster than a direct `clamscan` run and is tried
//! first.
//!
//! Every failure of this backend — missing executable, unreachable daemon,
//! timeout, unparseable output — maps to
//! [`ScanError::BackendUnavailable`](crate::core::ScanError): the direct
//! scanner must still get its chance before the scan is failed.

use crate::backends::{parse_clamav_output, run_scan_command, Detection, ScanBackend};
use crate::core::{ScanEngine, ScanError};

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Configuration for the `clamdscan` backend.
#[derive(Debug, Clone)]
pub struct ClamdConfig {
    /// Executable to invoke.
    pub command: String,
}

impl Default for ClamdConfig {
    fn default() -> Self {
        Self {
            command: "clamdscan".to_string(),
        }
    }
}

impl ClamdConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the executable name or path.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }
}

/// Scanner backend backed by the ClamAV daemon client.
#[derive(Debug, Default)]
pub struct ClamdBackend {
    config: ClamdConfig,
}

impl ClamdBackend {
    /// Creates a backend with the given configuration.
    pub fn new(config: ClamdConfig) -> Self {
        Self { config }
    }

    /// Creates a backend with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ClamdConfig::default())
    }
}

#[async_trait]
impl ScanBackend for ClamdBackend {
    fn engine(&self) -> ScanEngine {
        ScanEngine::Clamdscan
    }

    async fn scan(&self, path: &Path, timeout: Duration) -> Result<Detection, ScanError> {
        let path_arg = path.to_string_lossy();
        let result = run_scan_command(
            &self.config.command,
            &["--no-summary", path_arg.as_ref()],
            timeout,
            ScanEngine::Clamdscan,
        )
        .await
        .and_then(|output| parse_clamav_output(&output, ScanEngine::Clamdscan));

        // Daemon failures of any kind fall through to the direct scanner.
        result.map_err(|e| {
            if e.is_fallthrough() {
                e
            } else {
                ScanError::unavailable(ScanEngine::Clamdscan, e.to_string())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ClamdConfig::new().with_command("/opt/clamav/bin/clamdscan");
        assert_eq!(config.command, "/opt/clamav/bin/clamdscan");
    }

    #[tokio::test]
    async fn test_missing_daemon_client_falls_through() {
        let backend = ClamdBackend::new(ClamdConfig::new().with_command("clamdscan-nonexistent"));
        let err = backend
            .scan(Path::new("/tmp/anything"), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.is_fallthrough());
        assert_eq!(err.engine(), Some(ScanEngine::Clamdscan));
    }

    #[tokio::test]
    async fn test_unparseable_daemon_output_falls_through() {
        // `echo` runs fine but prints neither OK nor FOUND; the resulting
        // execution failure must be downgraded to a fall-through so the
        // direct scanner still runs.
        let backend = ClamdBackend::new(ClamdConfig::new().with_command("echo"));
        let err = backend
            .scan(Path::new("/tmp/anything"), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.is_fallthrough());
    }
}
