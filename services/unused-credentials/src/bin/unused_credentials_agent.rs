//! Unused Credentials Agent - Standalone Binary
//!
//! Runs one scan from a workstation or CI job using the local AWS profile.
//!
//! ## Usage
//!
//! ```bash
//! # Scan one OU and its children, 90-day threshold
//! unused-credentials-agent --role-name unused-credentials-audit --ou-id ou-ab12-cdefgh34
//!
//! # Scan the whole organization with a 30-day threshold, JSON report on stdout
//! unused-credentials-agent --role-name unused-credentials-audit --threshold-days 30 --output json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use unused_credentials::{ScanArgs, UnusedCredentialsAgent};

/// Unused Credentials Agent - Report IAM users that never or no longer sign in
#[derive(Parser, Debug)]
#[command(name = "unused-credentials-agent", version, about)]
struct Args {
    #[command(flatten)]
    scan: ScanArgs,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = args
        .scan
        .into_config()
        .context("Invalid scan configuration")?;

    info!(
        role = %config.assumed_role_name,
        threshold_days = config.staleness_threshold_days,
        "Starting Unused Credentials Agent"
    );

    let agent = UnusedCredentialsAgent::new(config)
        .await
        .context("Failed to initialize Unused Credentials Agent")?;

    let report = agent.scan().await.context("Unused credentials scan failed")?;

    match args.output {
        OutputFormat::Text => {
            println!("{}", report.display());
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?
            );
        }
    }

    Ok(())
}
