//! NDJSON batch importer.
//!
//! Reads records from stdin, saves them through the devtools endpoint
//! given as the first argument (default `ws://127.0.0.1:8097`), prints a
//! summary, and exits non-zero if any line failed.
//!
//! ```text
//! hk-import ws://127.0.0.1:8097 < samples.ndjson
//! ```

use std::io::BufReader;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use healthkit_devtools::{HealthClient, batch};

const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8097";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let endpoint = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

    let client = HealthClient::new(&endpoint);
    if let Err(e) = client.connect().await {
        error!(endpoint = %endpoint, error = %e, "Failed to connect");
        return ExitCode::FAILURE;
    }

    let summary = batch::run(&client, BufReader::new(std::io::stdin().lock())).await;
    client.disconnect();

    info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "Import finished"
    );
    for failure in &summary.failures {
        eprintln!("line {}: {}", failure.line, failure.message);
    }
    println!(
        "{} saved, {} failed ({} total)",
        summary.succeeded, summary.failed, summary.total
    );

    if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
