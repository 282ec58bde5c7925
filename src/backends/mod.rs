//! Scanning backend implementations.
//!
//! This module contains implementations of the [`ScanBackend`] trait, tried
//! by the scan engine in priority order:
//!
//! - [`clamd`] - daemon-based ClamAV client (`clamdscan`), the fast path
//! - [`clamscan`] - direct ClamAV invocation, used when the daemon is down
//! - [`heuristic`] - built-in byte-pattern fallback when no scanner is
//!   installed
//! - [`mock`] - a scripted backend for testing
//!
//! A backend signals "try the next one" by returning
//! [`ScanError::BackendUnavailable`]; any other error fails the scan closed.

pub mod clamd;
pub mod clamscan;
pub mod heuristic;
pub mod mock;

pub use clamd::{ClamdBackend, ClamdConfig};
pub use clamscan::{ClamscanBackend, ClamscanConfig};
pub use heuristic::HeuristicBackend;
pub use mock::{MockBackend, MockOutcome};

use crate::core::{ScanEngine, ScanError};

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

/// What a backend found in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// No threat detected.
    Clean,
    /// A threat was detected.
    Infected {
        /// Name of the threat as reported by the backend.
        threat: String,
    },
}

impl Detection {
    /// Returns `true` if no threat was detected.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }
}

/// A single scanning backend.
///
/// Implementations must be `Send + Sync` and must never panic; all failures
/// are returned as [`ScanError`]. Returning
/// [`ScanError::BackendUnavailable`] hands the file to the next backend in
/// the chain; any other error is terminal and fails the scan closed.
#[async_trait]
pub trait ScanBackend: Send + Sync + Debug {
    /// The engine tag this backend stamps on its verdicts.
    fn engine(&self) -> ScanEngine;

    /// Scans the file at `path`, finishing within `timeout`.
    async fn scan(&self, path: &Path, timeout: Duration) -> Result<Detection, ScanError>;

    /// Returns the backend's engine and signature-database version, if it
    /// can be determined.
    async fn version(&self) -> Option<crate::core::EngineVersion> {
        None
    }
}

/// An arc-wrapped backend for shared ownership.
pub type ArcBackend = Arc<dyn ScanBackend>;

/// Captured output of a scanner subprocess.
#[derive(Debug)]
pub(crate) struct CommandOutput {
    /// Collected stdout, lossily decoded.
    pub stdout: String,
    /// Collected stderr, lossily decoded.
    pub stderr: String,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
}

/// Runs a scanner executable and captures its output.
///
/// A missing executable maps to [`ScanError::BackendUnavailable`]; exceeding
/// `timeout` kills the child and maps to [`ScanError::Timeout`]. A nonzero
/// exit code is NOT an error here: ClamAV exits 1 on detection, so callers
/// interpret output and exit code together.
pub(crate) async fn run_scan_command(
    program: &str,
    args: &[&str],
    timeout: Duration,
    engine: ScanEngine,
) -> Result<CommandOutput, ScanError> {
    let output = tokio::process::Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(timeout, output).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ScanError::unavailable(
                engine,
                format!("{program} not installed or not in PATH"),
            ));
        }
        Ok(Err(e)) => return Err(ScanError::Io(e)),
        Err(_) => return Err(ScanError::timeout(engine, timeout)),
    };

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        code: output.status.code(),
    })
}

/// Placeholder threat name when a detection line carries no parseable name.
pub(crate) const UNKNOWN_THREAT: &str = "Unknown threat";

/// Interprets ClamAV textual output.
///
/// Both `clamdscan` and `clamscan` print `<path>: OK` for clean files and
/// `<path>: <threat> FOUND` on detection. Anything else is ambiguous and
/// returned as an execution failure.
pub(crate) fn parse_clamav_output(
    output: &CommandOutput,
    engine: ScanEngine,
) -> Result<Detection, ScanError> {
    let stdout = output.stdout.trim();

    if stdout.contains("FOUND") {
        let threat = stdout
            .lines()
            .find(|line| line.contains("FOUND"))
            .and_then(|line| line.splitn(2, ':').nth(1))
            .and_then(|rest| rest.trim().strip_suffix("FOUND"))
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_THREAT)
            .to_string();
        return Ok(Detection::Infected { threat });
    }

    if stdout.contains("OK") {
        return Ok(Detection::Clean);
    }

    Err(ScanError::execution_failed(
        engine,
        format!(
            "unexpected scanner output (exit code {:?}): {:?} {:?}",
            output.code, stdout, output.stderr
        ),
    ))
}
