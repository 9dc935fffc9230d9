//! Peerchat - direct messaging CLI
//!
//! Main entry point for the Peerchat client.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use peerchat::cli::{Cli, Commands};
use peerchat::commands;
use peerchat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    let config_path = cli
        .config
        .clone()
        .map(Into::into)
        .unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path, &cli)?;
    config.validate()?;

    match cli.command {
        Commands::Chat { with } => {
            tracing::info!("Starting interactive chat");
            commands::chat::run_chat(config, with).await
        }
        Commands::Users => commands::users::run_users(config).await,
        Commands::Unread => commands::unread::run_unread(config).await,
    }
}

/// Initialize tracing with an env-filter; `--verbose` lowers the
/// default level to debug for this crate
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "peerchat=debug" } else { "peerchat=info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
