//! callwatch CLI
//!
//! Polls the active-calls feed and posts corridor alerts to a webhook.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use callwatch::{
    error::Result,
    models::Config,
    pipeline,
    services::{HttpFeedClient, WebhookNotifier},
    storage::SeenStore,
    utils::http,
};

/// callwatch - active-call corridor alerting
#[derive(Parser, Debug)]
#[command(
    name = "callwatch",
    version,
    about = "Watches a police active-calls feed and posts corridor alerts"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "callwatch.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the feed forever (the default)
    Watch,

    /// Run a single poll cycle and exit
    Once,

    /// Post a test message to the configured webhook
    Test,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Load the seen-incident store, spelling out the recovery path on corruption.
async fn load_store(config: &Config) -> Result<SeenStore> {
    match SeenStore::load(&config.state_path).await {
        Ok(store) => {
            log::info!("Loaded {} previously seen incidents", store.len());
            Ok(store)
        }
        Err(e) => {
            log::error!("Cannot start: {e}");
            log::error!(
                "If the state file is corrupt, remove {} to reset alert history",
                config.state_path.display()
            );
            Err(e)
        }
    }
}

fn log_startup(config: &Config, notifier: &WebhookNotifier) {
    log::info!("callwatch starting...");
    log::info!("Feed URL: {}", config.feed.url);
    log::info!("Poll interval: {} seconds", config.feed.poll_interval_secs);
    log::info!("Webhook configured: {}", notifier.is_configured());
    log::info!("Corridor keywords: {}", config.keywords.join(", "));
    log::info!("State file: {}", config.state_path.display());
    if config.keywords.is_empty() {
        log::warn!("Corridor keyword list is empty; no incident will ever match");
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env();
    config.validate()?;

    let client = http::create_client(&config.feed)?;
    let notifier = WebhookNotifier::new(client.clone(), config.notify.webhook_url.as_deref())?;

    match cli.command.unwrap_or(Command::Watch) {
        Command::Watch => {
            log_startup(&config, &notifier);
            let feed = HttpFeedClient::new(client, &config.feed.url);
            let mut store = load_store(&config).await?;
            pipeline::run_loop(&feed, &notifier, &mut store, &config).await?;
        }

        Command::Once => {
            log_startup(&config, &notifier);
            let feed = HttpFeedClient::new(client, &config.feed.url);
            let mut store = load_store(&config).await?;
            let stats = pipeline::run_cycle(&feed, &notifier, &mut store, &config.keywords).await;
            log::info!("Cycle complete: {}", stats.summary());
        }

        Command::Test => {
            log::info!("Posting test message to webhook...");
            notifier.post_test_message().await?;
            log::info!("Test message accepted by webhook");
        }
    }

    log::info!("Done!");

    Ok(())
}
