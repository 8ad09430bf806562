//! Opsdeck CLI binary.

use anyhow::Result;
use opsdeck::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the opsdeck CLI.
///
/// Uses tokio's current_thread runtime; every command is a sequence of
/// IO-bound operations with no internal parallelism.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Controlled via RUST_LOG, e.g. RUST_LOG=opsdeck=debug,opsdeck_jsonl=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("opsdeck=info,opsdeck_jsonl=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse_args();
    cli.execute().await?;

    Ok(())
}
