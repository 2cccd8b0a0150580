//! Unused Credentials Lambda
//!
//! Scheduled entry point. The event payload is ignored; configuration comes
//! from `UNUSED_CREDENTIALS_*` environment variables on the function.

use anyhow::Context;
use clap::Parser;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use unused_credentials::{ScanArgs, UnusedCredentialsAgent};

#[derive(Parser, Debug)]
#[command(name = "bootstrap", version)]
struct LambdaConfig {
    #[command(flatten)]
    scan: ScanArgs,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .with_ansi(false)
        .json()
        .init();

    lambda_runtime::run(service_fn(handler)).await
}

async fn handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let (_payload, context) = event.into_parts();
    info!(request_id = %context.request_id, "Received scan invocation");

    // Only the binary name is passed, so every option comes from the environment
    let config = LambdaConfig::try_parse_from(["bootstrap"])
        .context("Missing or invalid UNUSED_CREDENTIALS_* environment variables")?
        .scan
        .into_config()?;

    let agent = UnusedCredentialsAgent::new(config).await?;

    let report = agent.scan().await.map_err(|e| {
        error!(stage = %e.stage(), error = %e, "Unused credentials scan failed");
        e
    })?;

    Ok(serde_json::to_value(&report)?)
}
