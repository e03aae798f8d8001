//! Command-line front end of the Gencon hotel block watcher.

use std::sync::Arc;

use anyhow::Context;
use clap::{CommandFactory, FromArgMatches};
use hotel_scan::{
    AlertDispatcher, RunMode, ScanExecutor, SearchCriteria, SessionConfig, SessionManager,
};
use notification_services::build_channels;
use reqwest::Url;

mod cli;
mod version_check;

use cli::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let matches = Args::command().get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let criteria = SearchCriteria::from_request(args.search_request())
        .context("Invalid search parameters")?;
    let config = args.executor_config();

    let version_url = std::env::var("HOTEL_CHECK_VERSION_URL")
        .unwrap_or_else(|_| version_check::PUBLISHED_VERSION_URL.to_string());
    version_check::warn_if_outdated(&version_url).await;

    // Test mode never opens a session, so any well-formed URL will do
    let entry_url = match &args.url {
        Some(url) => url.clone(),
        None => Url::parse(&format!("{}/home", hotel_scan::base_url()))
            .context("Invalid housing block URL")?,
    };
    let site = SessionManager::new(SessionConfig::new(entry_url))
        .context("Failed to create HTTP session")?;
    let home_url = site.home_url();

    let targets = args.alert_targets(&matches);
    let channels = match build_channels(&targets, &home_url).await {
        Ok(channels) => channels,
        Err(e) => {
            log::error!("❌ Failed to set up alerts: {}", e);
            std::process::exit(1);
        }
    };
    if channels.is_empty() {
        log::warn!("⚠️ No alerts specified; matches will only be printed");
        if config.mode == RunMode::Test {
            log::warn!("Nothing to test");
        }
    }

    log::info!("🚀 Starting hotel check...");

    let mut executor = ScanExecutor::new(
        Arc::new(site),
        AlertDispatcher::new(channels),
        criteria,
        Some(config),
    );
    let mut stdout = std::io::stdout();
    executor.start(&mut stdout).await;

    Ok(())
}
