//! Simulate the upload-commit path: queue a scan and return immediately,
//! then watch the verdict arrive in the audit trail.
//!
//! ```sh
//! cargo run --example fire_and_forget
//! ```

use uploadguard::audit::{AuditLogger, MemoryAuditStore};
use uploadguard::quarantine::FileQuarantine;
use uploadguard::scanner::{AvScanner, ScanQueue};
use uploadguard::Sha256Digest;

use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let upload = dir.path().join("upload.pdf");
    let content = b"%PDF-1.4 <script>alert('not a real pdf')</script>";
    tokio::fs::write(&upload, content).await.expect("write failed");

    let digest = Sha256Digest::hash_bytes(content);

    let store = Arc::new(MemoryAuditStore::new());
    let scanner = AvScanner::with_system_backends(
        AuditLogger::new(store.clone()),
        FileQuarantine::new(dir.path().join("quarantine")),
    );
    let queue = ScanQueue::new(scanner);

    // The upload commit handler does exactly this and responds to the
    // client without waiting.
    queue.queue_virus_scan(&digest, &upload);
    println!("upload committed, scan queued for {digest}");

    // The verdict is observable only through the audit trail.
    while store.is_empty() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    for record in store.records() {
        println!(
            "audit: action={} entity={}:{} metadata={}",
            record.action,
            record.entity_type,
            record.entity_id,
            serde_json::Value::Object(record.metadata.clone())
        );
    }

    println!("file still present: {}", upload.exists());
}
