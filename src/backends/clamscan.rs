//! Direct ClamAV backend.
//!
//! Invokes `clamscan`, which loads the signature database on every run.
//! Slow, but works without a running daemon. Unlike the daemon backend,
//! only a missing executable falls through to the heuristic fallback; a
//! timeout or execution failure here is terminal and fails the scan closed.

use crate::backends::{parse_clamav_output, run_scan_command, Detection, ScanBackend};
use crate::core::{EngineVersion, ScanEngine, ScanError};

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Timeout for the `clamscan --version` probe.
const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the `clamscan` backend.
#[derive(Debug, Clone)]
pub struct ClamscanConfig {
    /// Executable to invoke.
    pub command: String,
}

impl Default for ClamscanConfig {
    fn default() -> Self {
        Self {
            command: "clamscan".to_string(),
        }
    }
}

impl ClamscanConfig {
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

/// Scanner backend invoking ClamAV directly.
#[derive(Debug, Default)]
pub struct ClamscanBackend {
    config: ClamscanConfig,
}

impl ClamscanBackend {
    /// Creates a backend with the given configuration.
    pub fn new(config: ClamscanConfig) -> Self {
        Self { config }
    }

    /// Creates a backend with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ClamscanConfig::default())
    }

    /// Parses `clamscan --version` output.
    ///
    /// The expected form is `ClamAV 1.2.3/27391/...` where the second field
    /// is the signature database serial.
    fn parse_version(stdout: &str) -> Option<EngineVersion> {
        let line = stdout.lines().next()?.trim();
        let rest = line.strip_prefix("ClamAV ")?;
        let mut fields = rest.split('/');
        let version = fields.next()?.trim();
        if version.is_empty() {
            return None;
        }
        let database = fields
            .next()
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Some(EngineVersion {
            engine: "ClamAV".to_string(),
            version: version.to_string(),
            database,
        })
    }
}

#[async_trait]
impl ScanBackend for ClamscanBackend {
    fn engine(&self) -> ScanEngine {
        ScanEngine::Clamscan
    }

    async fn scan(&self, path: &Path, timeout: Duration) -> Result<Detection, ScanError> {
        let path_arg = path.to_string_lossy();
        let output = run_scan_command(
            &self.config.command,
            &["--no-summary", path_arg.as_ref()],
            timeout,
            ScanEngine::Clamscan,
        )
        .await?;

        parse_clamav_output(&output, ScanEngine::Clamscan)
    }

    async fn version(&self) -> Option<EngineVersion> {
        let output = run_scan_command(
            &self.config.command,
            &["--version"],
            VERSION_PROBE_TIMEOUT,
            ScanEngine::Clamscan,
        )
        .await
        .ok()?;

        Self::parse_version(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ClamscanConfig::new().with_command("/usr/local/bin/clamscan");
        assert_eq!(config.command, "/usr/local/bin/clamscan");
    }

    #[tokio::test]
    async fn test_missing_executable_falls_through() {
        let backend =
            ClamscanBackend::new(ClamscanConfig::new().with_command("clamscan-nonexistent"));
        let err = backend
            .scan(Path::new("/tmp/anything"), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.is_fallthrough());
    }

    #[tokio::test]
    async fn test_unparseable_output_fails_closed() {
        let backend = ClamscanBackend::new(ClamscanConfig::new().with_command("echo"));
        let err = backend
            .scan(Path::new("/tmp/anything"), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::ExecutionFailed { .. }));
        assert!(!err.is_fallthrough());
    }

    #[test]
    fn test_parse_version() {
        let version =
            ClamscanBackend::parse_version("ClamAV 1.3.1/27391/Tue Jun  3 08:31:40 2025\n")
                .unwrap();
        assert_eq!(version.engine, "ClamAV");
        assert_eq!(version.version, "1.3.1");
        assert_eq!(version.database, "27391");
    }

    #[test]
    fn test_parse_version_without_database() {
        let version = ClamscanBackend::parse_version("ClamAV 0.103.8\n").unwrap();
        assert_eq!(version.version, "0.103.8");
        assert_eq!(version.database, "unknown");
    }

    #[test]
    fn test_parse_version_garbage() {
        assert!(ClamscanBackend::parse_version("command not found").is_none());
        assert!(ClamscanBackend::parse_version("").is_none());
    }
}
