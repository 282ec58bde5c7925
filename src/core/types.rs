//! Core types used throughout the uploadguard library.
//!
//! This module defines the fundamental data structures for representing
//! scan verdicts, per-request scan options, and engine provenance.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default timeout for a directly requested scan.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(60);

/// Identifies which backend produced a scan verdict.
///
/// The serialized form matches the engine tags recorded in audit metadata:
/// `"clamdscan"`, `"clamscan"`, `"basic_heuristics"`, `"error"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanEngine {
    /// Daemon-based ClamAV client (`clamdscan`), the fast path.
    Clamdscan,
    /// Direct ClamAV invocation (`clamscan`), used when the daemon is down.
    Clamscan,
    /// Built-in byte-pattern heuristics, used when no scanner is installed.
    ///
    /// Verdicts from this engine are best-effort only; see
    /// [`HeuristicBackend`](crate::backends::HeuristicBackend).
    BasicHeuristics,
    /// No backend produced a verdict; the scan failed and is treated as
    /// unsafe.
    Error,
}

impl ScanEngine {
    /// Returns the stable engine tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clamdscan => "clamdscan",
            Self::Clamscan => "clamscan",
            Self::BasicHeuristics => "basic_heuristics",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ScanEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse scan outcome as recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanDisposition {
    /// No threat detected.
    Clean,
    /// A threat was detected.
    Infected,
    /// The scan could not complete; treated as unsafe.
    Error,
}

impl fmt::Display for ScanDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => f.write_str("CLEAN"),
            Self::Infected => f.write_str("INFECTED"),
            Self::Error => f.write_str("ERROR"),
        }
    }
}

/// The outcome of one scan invocation.
///
/// A verdict is produced for every scan, including failed ones: any error in
/// the scan pipeline folds into a verdict with [`ScanEngine::Error`] and
/// `is_clean == false`. Callers must treat `is_clean == false` uniformly as
/// "do not serve this file", whether the cause was a detection or an
/// infrastructure failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanVerdict {
    /// Whether the file is considered safe to serve.
    pub is_clean: bool,

    /// Name of the detected threat. Always present on an infected verdict
    /// (a generic placeholder is used when the backend reported no parseable
    /// name), always absent otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threat_name: Option<String>,

    /// The backend that produced this verdict.
    pub engine: ScanEngine,

    /// Wall time of the scan pipeline, serialized as integer milliseconds.
    #[serde(with = "duration_ms")]
    pub duration: Duration,

    /// Error message when the scan failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScanVerdict {
    /// Creates a clean verdict from the given engine.
    pub fn clean(engine: ScanEngine, duration: Duration) -> Self {
        Self {
            is_clean: true,
            threat_name: None,
            engine,
            duration,
            error: None,
        }
    }

    /// Creates an infected verdict carrying the detected threat name.
    pub fn infected(engine: ScanEngine, threat_name: impl Into<String>, duration: Duration) -> Self {
        Self {
            is_clean: false,
            threat_name: Some(threat_name.into()),
            engine,
            duration,
            error: None,
        }
    }

    /// Creates a failed verdict. Fail closed: the file is not clean.
    ///
    /// This is the only constructor producing [`ScanEngine::Error`].
    pub fn error(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            is_clean: false,
            threat_name: None,
            engine: ScanEngine::Error,
            duration,
            error: Some(message.into()),
        }
    }

    /// Returns `true` if a threat was positively detected.
    pub fn is_infected(&self) -> bool {
        !self.is_clean && self.engine != ScanEngine::Error
    }

    /// Returns `true` if the scan failed to complete.
    pub fn is_error(&self) -> bool {
        self.engine == ScanEngine::Error
    }

    /// Returns the coarse outcome recorded in the audit trail.
    pub fn disposition(&self) -> ScanDisposition {
        if self.is_error() {
            ScanDisposition::Error
        } else if self.is_clean {
            ScanDisposition::Clean
        } else {
            ScanDisposition::Infected
        }
    }
}

/// Per-request scan configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Move the file into quarantine when a threat is detected.
    pub quarantine_on_detection: bool,

    /// Delete the file when a threat is detected. Ignored when
    /// `quarantine_on_detection` is also set: quarantine wins so the
    /// evidence is preserved.
    pub delete_on_detection: bool,

    /// Timeout applied to each external scanner invocation.
    pub timeout: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            quarantine_on_detection: false,
            delete_on_detection: false,
            timeout: DEFAULT_SCAN_TIMEOUT,
        }
    }
}

impl ScanOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables quarantine on detection.
    pub fn with_quarantine_on_detection(mut self, enabled: bool) -> Self {
        self.quarantine_on_detection = enabled;
        self
    }

    /// Enables or disables deletion on detection.
    pub fn with_delete_on_detection(mut self, enabled: bool) -> Self {
        self.delete_on_detection = enabled;
        self
    }

    /// Sets the scanner timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Version information reported by an installed scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineVersion {
    /// Engine name, e.g. `"ClamAV"`.
    pub engine: String,
    /// Engine release version.
    pub version: String,
    /// Signature database serial, or `"unknown"`.
    pub database: String,
}

/// Serde helper serializing a `Duration` as integer milliseconds.
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_tags() {
        assert_eq!(ScanEngine::Clamdscan.to_string(), "clamdscan");
        assert_eq!(ScanEngine::Clamscan.to_string(), "clamscan");
        assert_eq!(ScanEngine::BasicHeuristics.to_string(), "basic_heuristics");
        assert_eq!(ScanEngine::Error.to_string(), "error");
    }

    #[test]
    fn test_error_verdict_fails_closed() {
        let verdict = ScanVerdict::error("scanner exploded", Duration::from_millis(5));
        assert!(!verdict.is_clean);
        assert!(verdict.is_error());
        assert!(!verdict.is_infected());
        assert_eq!(verdict.engine, ScanEngine::Error);
        assert_eq!(verdict.disposition(), ScanDisposition::Error);
    }

    #[test]
    fn test_infected_verdict_always_named() {
        let verdict = ScanVerdict::infected(
            ScanEngine::Clamscan,
            "Eicar-Test-Signature",
            Duration::from_millis(40),
        );
        assert!(verdict.is_infected());
        assert_eq!(verdict.threat_name.as_deref(), Some("Eicar-Test-Signature"));
        assert_eq!(verdict.disposition(), ScanDisposition::Infected);
    }

    #[test]
    fn test_clean_verdict() {
        let verdict = ScanVerdict::clean(ScanEngine::Clamdscan, Duration::from_millis(12));
        assert!(verdict.is_clean);
        assert!(verdict.threat_name.is_none());
        assert_eq!(verdict.disposition(), ScanDisposition::Clean);
    }

    #[test]
    fn test_verdict_duration_serialized_as_millis() {
        let verdict = ScanVerdict::clean(ScanEngine::Clamscan, Duration::from_millis(250));
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["duration"], 250);

        let back: ScanVerdict = serde_json::from_value(json).unwrap();
        assert_eq!(back.duration, Duration::from_millis(250));
    }

    #[test]
    fn test_scan_options_builder() {
        let options = ScanOptions::new()
            .with_quarantine_on_detection(true)
            .with_timeout(Duration::from_secs(120));

        assert!(options.quarantine_on_detection);
        assert!(!options.delete_on_detection);
        assert_eq!(options.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_disposition_display() {
        assert_eq!(ScanDisposition::Clean.to_string(), "CLEAN");
        assert_eq!(ScanDisposition::Infected.to_string(), "INFECTED");
        assert_eq!(ScanDisposition::Error.to_string(), "ERROR");
    }
}
