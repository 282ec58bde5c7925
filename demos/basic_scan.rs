//! Scan a file directly and print the verdict.
//!
//! ```sh
//! cargo run --example basic_scan -- /path/to/file
//! ```

use uploadguard::audit::{AuditLogger, JsonlAuditStore};
use uploadguard::quarantine::FileQuarantine;
use uploadguard::scanner::AvScanner;
use uploadguard::{ScanOptions, Sha256Digest};

use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let path: PathBuf = std::env::args()
        .nth(1)
        .expect("usage: basic_scan <file>")
        .into();

    let digest = Sha256Digest::hash_file(&path).expect("failed to hash file");
    println!("sha256: {digest}");

    let audit = AuditLogger::new(Arc::new(JsonlAuditStore::new("audit-events.jsonl")));
    let scanner = AvScanner::with_system_backends(audit, FileQuarantine::new("quarantine"));

    if let Some(version) = scanner.engine_version().await {
        println!(
            "scanner: {} {} (db {})",
            version.engine, version.version, version.database
        );
    } else {
        println!("scanner: none installed, heuristics only");
    }

    let verdict = scanner.scan_file(&path, &digest, ScanOptions::default()).await;

    println!(
        "engine={} clean={} threat={:?} took={}ms",
        verdict.engine,
        verdict.is_clean,
        verdict.threat_name,
        verdict.duration.as_millis()
    );
}
