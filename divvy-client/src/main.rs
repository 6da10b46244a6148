//! divvy-admin entry point.

use divvy_client::cli::{self, Command};
use divvy_client::config::AdminConfig;
use divvy_client::error::ClientError;
use divvy_client::logging::init_tracing;
use divvy_client::state::AdminCaches;

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    let command = Command::from_args(std::env::args().skip(1))?;
    let config = AdminConfig::load()?;
    init_tracing(&config.logging)?;
    tracing::info!(
        api = config.base_url(),
        domain = %command.domain,
        key = %command.key,
        "divvy-admin starting"
    );

    let caches = AdminCaches::from_config(&config)?;
    let report = cli::run(&caches, &command).await?;
    if let Some(message) = &report.stale {
        tracing::warn!(domain = %command.domain, "showing cached data: {}", message);
        eprintln!("warning: {} (showing cached data)", message);
    }
    println!("{}", serde_json::to_string_pretty(&report.items)?);
    Ok(())
}
