//! Single-worker FIFO scan queue.
//!
//! Virus scanning shells out to external processes; unbounded concurrency
//! risks exhausting the upload host. The queue serializes scans through one
//! worker: requests are processed strictly in arrival order, one at a time,
//! capping subprocess concurrency at one across the whole process. The
//! latency cost lands on the already-committed scan step, never on the
//! upload response path.
//!
//! A queued item's failure is isolated: it reaches only that caller's reply
//! channel and the worker moves on to the next item.

use crate::core::{ScanError, ScanOptions, ScanVerdict, Sha256Digest};
use crate::scanner::engine::AvScanner;

use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Timeout for scans queued by the upload-commit path.
pub const QUEUED_SCAN_TIMEOUT: Duration = Duration::from_secs(120);

struct ScanJob {
    path: PathBuf,
    digest: Sha256Digest,
    options: ScanOptions,
    reply: oneshot::Sender<ScanVerdict>,
}

/// FIFO queue in front of an [`AvScanner`].
///
/// Cheap to clone; all clones feed the same worker.
#[derive(Clone)]
pub struct ScanQueue {
    jobs: mpsc::UnboundedSender<ScanJob>,
}

impl ScanQueue {
    /// Creates a queue and spawns its worker around the given scanner.
    ///
    /// The worker runs until every clone of the queue is dropped.
    pub fn new(scanner: AvScanner) -> Self {
        let (jobs, mut rx) = mpsc::unbounded_channel::<ScanJob>();

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let verdict = scanner
                    .scan_file(&job.path, &job.digest, job.options)
                    .await;
                if job.reply.send(verdict).is_err() {
                    // Fire-and-forget caller; the audit trail has the outcome.
                    tracing::debug!(sha256 = %job.digest, "scan completed with no listener");
                }
            }
            tracing::debug!("scan queue worker stopped");
        });

        Self { jobs }
    }

    /// Enqueues a scan and waits for its verdict.
    ///
    /// Jobs complete strictly in enqueue order. An error here means the
    /// queue itself is gone, not that the scan found anything — scan
    /// failures come back as fail-closed verdicts.
    pub async fn enqueue(
        &self,
        path: &Path,
        digest: &Sha256Digest,
        options: ScanOptions,
    ) -> Result<ScanVerdict, ScanError> {
        let (reply, receiver) = oneshot::channel();
        self.jobs
            .send(ScanJob {
                path: path.to_path_buf(),
                digest: digest.clone(),
                options,
                reply,
            })
            .map_err(|_| ScanError::internal("scan queue worker is gone"))?;

        receiver
            .await
            .map_err(|_| ScanError::internal("scan queue dropped the reply"))
    }

    /// Fire-and-forget entry point for the upload-commit path.
    ///
    /// Enqueues a scan with quarantine enabled and the long queued-scan
    /// timeout, then returns immediately: the upload response is never
    /// blocked on scanning. The outcome is observable only through the
    /// audit trail (or a later status query), which is the contract — this
    /// is a one-way task handoff, not an awaited future.
    pub fn queue_virus_scan(&self, digest: &Sha256Digest, path: &Path) {
        let (reply, _discard) = oneshot::channel();
        let job = ScanJob {
            path: path.to_path_buf(),
            digest: digest.clone(),
            options: ScanOptions::new()
                .with_quarantine_on_detection(true)
                .with_timeout(QUEUED_SCAN_TIMEOUT),
            reply,
        };

        if self.jobs.send(job).is_err() {
            tracing::error!(
                sha256 = %digest,
                path = %path.display(),
                "scan queue is gone, committed upload will not be scanned"
            );
            return;
        }

        tracing::debug!(sha256 = %digest, "virus scan queued for committed upload");
    }
}

impl std::fmt::Debug for ScanQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanQueue").finish_non_exhaustive()
    }
}
