//! The antivirus scan engine.
//!
//! [`AvScanner`] orchestrates a fallback chain of [`ScanBackend`]s over a
//! single file, deduplicates concurrent requests by content digest, applies
//! quarantine housekeeping, and audit-logs every completed scan.
//!
//! The public surface is infallible by type: `scan_file` always returns a
//! [`ScanVerdict`]. Any failure inside the pipeline — missing file, no
//! backend available, timeout, subprocess error — folds into an error
//! verdict with `is_clean == false`. An error is never treated as clean.

use crate::audit::AuditLogger;
use crate::backends::{
    ArcBackend, ClamdBackend, ClamscanBackend, Detection, HeuristicBackend, ScanBackend,
};
use crate::core::{EngineVersion, ScanEngine, ScanError, ScanOptions, ScanVerdict, Sha256Digest};
use crate::quarantine::FileQuarantine;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

type SharedScan = Shared<BoxFuture<'static, ScanVerdict>>;

/// Builder for [`AvScanner`].
pub struct AvScannerBuilder {
    backends: Vec<ArcBackend>,
    quarantine: Option<FileQuarantine>,
    audit: Option<AuditLogger>,
}

impl AvScannerBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
            quarantine: None,
            audit: None,
        }
    }

    /// Appends a backend to the fallback chain. Order is priority order.
    pub fn add_backend<B: ScanBackend + 'static>(self, backend: B) -> Self {
        self.add_arc_backend(Arc::new(backend))
    }

    /// Appends an arc-wrapped backend to the fallback chain.
    pub fn add_arc_backend(mut self, backend: ArcBackend) -> Self {
        self.backends.push(backend);
        self
    }

    /// Sets the quarantine used for infected files.
    pub fn with_quarantine(mut self, quarantine: FileQuarantine) -> Self {
        self.quarantine = Some(quarantine);
        self
    }

    /// Sets the audit logger. Required: every completed scan is logged.
    pub fn with_audit_logger(mut self, audit: AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Builds the scanner.
    pub fn build(self) -> Result<AvScanner, ScanError> {
        if self.backends.is_empty() {
            return Err(ScanError::configuration("at least one backend is required"));
        }
        let audit = self
            .audit
            .ok_or_else(|| ScanError::configuration("an audit logger is required"))?;

        Ok(AvScanner {
            inner: Arc::new(Inner {
                backends: self.backends,
                quarantine: self.quarantine,
                audit,
                in_flight: Mutex::new(HashMap::new()),
            }),
        })
    }
}

impl Default for AvScannerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The antivirus scan engine.
///
/// Cheap to clone; clones share the same in-flight deduplication map, so the
/// at-most-one-scan-per-digest guarantee holds across all clones.
#[derive(Clone)]
pub struct AvScanner {
    inner: Arc<Inner>,
}

struct Inner {
    backends: Vec<ArcBackend>,
    quarantine: Option<FileQuarantine>,
    audit: AuditLogger,
    in_flight: Mutex<HashMap<Sha256Digest, SharedScan>>,
}

impl AvScanner {
    /// Creates a builder.
    pub fn builder() -> AvScannerBuilder {
        AvScannerBuilder::new()
    }

    /// Creates a scanner with the standard backend chain: ClamAV daemon
    /// client, direct ClamAV, then byte-pattern heuristics.
    pub fn with_system_backends(audit: AuditLogger, quarantine: FileQuarantine) -> Self {
        Self {
            inner: Arc::new(Inner {
                backends: vec![
                    Arc::new(ClamdBackend::with_defaults()),
                    Arc::new(ClamscanBackend::with_defaults()),
                    Arc::new(HeuristicBackend::new()),
                ],
                quarantine: Some(quarantine),
                audit,
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Scans the file at `path`, identified by its content digest.
    ///
    /// If a scan for this digest is already in flight the call attaches to
    /// it and both callers receive the same verdict: at most one scan per
    /// digest runs system-wide. Two uploads with identical content are the
    /// same scan subject even if they arrived through different upload
    /// sessions, so an attaching caller's `path` and `options` are not used.
    ///
    /// The in-flight entry is removed once the scan completes, whatever the
    /// outcome — a failed scan does not poison its digest, and a later
    /// request will retry.
    pub async fn scan_file(
        &self,
        path: &Path,
        digest: &Sha256Digest,
        options: ScanOptions,
    ) -> ScanVerdict {
        let scan = {
            let mut in_flight = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());

            if let Some(existing) = in_flight.get(digest) {
                tracing::debug!(sha256 = %digest, "attaching to in-flight scan");
                existing.clone()
            } else {
                let scan = Inner::run_scan(
                    Arc::clone(&self.inner),
                    path.to_path_buf(),
                    digest.clone(),
                    options,
                )
                .boxed()
                .shared();
                in_flight.insert(digest.clone(), scan.clone());

                // A detached driver guarantees the scan completes and the
                // in-flight entry is removed even if every caller goes away.
                tokio::spawn({
                    let inner = Arc::clone(&self.inner);
                    let digest = digest.clone();
                    let scan = scan.clone();
                    async move {
                        let _ = scan.await;
                        inner
                            .in_flight
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner())
                            .remove(&digest);
                    }
                });

                scan
            }
        };

        scan.await
    }

    /// Returns version information from the first backend that can report
    /// it.
    pub async fn engine_version(&self) -> Option<EngineVersion> {
        for backend in &self.inner.backends {
            if let Some(version) = backend.version().await {
                return Some(version);
            }
        }
        None
    }

    /// Returns the audit logger this scanner reports to.
    pub fn audit_logger(&self) -> &AuditLogger {
        &self.inner.audit
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl std::fmt::Debug for AvScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvScanner")
            .field("backend_count", &self.inner.backends.len())
            .field("quarantine", &self.inner.quarantine)
            .finish()
    }
}

impl Inner {
    /// Runs one scan to a final verdict: pipeline, housekeeping, audit.
    async fn run_scan(
        inner: Arc<Inner>,
        path: PathBuf,
        digest: Sha256Digest,
        options: ScanOptions,
    ) -> ScanVerdict {
        let started = Instant::now();

        let verdict = match inner.perform_scan(&path, &options).await {
            Ok((engine, Detection::Clean)) => ScanVerdict::clean(engine, started.elapsed()),
            Ok((engine, Detection::Infected { threat })) => {
                ScanVerdict::infected(engine, threat, started.elapsed())
            }
            Err(e) => {
                tracing::error!(
                    sha256 = %digest,
                    path = %path.display(),
                    error = %e,
                    "scan failed, failing closed"
                );
                ScanVerdict::error(e.to_string(), started.elapsed())
            }
        };

        if verdict.is_infected() {
            inner.handle_detection(&path, &digest, &verdict, &options).await;
        }

        // Unconditional: clean, infected, and failed scans all leave a
        // trail, whichever backend produced the verdict.
        inner.audit.virus_scan_result(&digest, &verdict).await;

        verdict
    }

    /// Runs the backend chain. Unavailable backends fall through; any other
    /// error is terminal.
    async fn perform_scan(
        &self,
        path: &Path,
        options: &ScanOptions,
    ) -> Result<(ScanEngine, Detection), ScanError> {
        match tokio::fs::metadata(path).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ScanError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(ScanError::Io(e)),
        }

        for backend in &self.backends {
            match backend.scan(path, options.timeout).await {
                Ok(detection) => return Ok((backend.engine(), detection)),
                Err(e) if e.is_fallthrough() => {
                    tracing::warn!(
                        engine = %backend.engine(),
                        error = %e,
                        "backend unavailable, trying next"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(ScanError::internal("no scan backend produced a verdict"))
    }

    /// Post-detection housekeeping. Never alters the verdict.
    async fn handle_detection(
        &self,
        path: &Path,
        digest: &Sha256Digest,
        verdict: &ScanVerdict,
        options: &ScanOptions,
    ) {
        if options.quarantine_on_detection {
            // Quarantine wins over delete: the evidence is preserved.
            match &self.quarantine {
                Some(quarantine) => {
                    if let Err(e) = quarantine
                        .quarantine(path, digest, verdict.threat_name.as_deref())
                        .await
                    {
                        tracing::error!(
                            sha256 = %digest,
                            error = %e,
                            "quarantine failed, verdict unchanged"
                        );
                    }
                }
                None => {
                    tracing::error!(
                        sha256 = %digest,
                        "quarantine requested but no quarantine is configured"
                    );
                }
            }
        } else if options.delete_on_detection {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {
                    tracing::info!(sha256 = %digest, path = %path.display(), "infected file deleted")
                }
                Err(e) => tracing::error!(
                    sha256 = %digest,
                    error = %e,
                    "failed to delete infected file, verdict unchanged"
                ),
            }
        }
    }
}
