//! `copilot-interactive`: serve human-in-the-loop input requests over HTTP.
//!
//! Settings come from the environment (and an optional `.env` file); command
//! line flags override them.

use anyhow::{Context, Result};
use clap::Parser;
use copilot_interactive_core::{platform, InputService, Settings, TerminalReader};
use copilot_interactive_server::{shutdown_signal, InteractiveServer, ServerConfig};
use log::LevelFilter;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Copilot Interactive - ask the operator at the terminal for input")]
struct Cli {
    #[clap(long, help = "Host to bind (overrides APP_HOST)")]
    host: Option<String>,

    #[clap(long, short, help = "Port to bind (overrides APP_PORT)")]
    port: Option<u16>,

    #[clap(long, help = "Seconds to wait for terminal input (overrides INPUT_TIMEOUT)")]
    input_timeout: Option<u64>,

    #[clap(long, short, default_value = "info")]
    log_level: String,

    #[clap(long, help = "Disable operator notifications")]
    no_notify: bool,
}

impl Cli {
    fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(host) = &self.host {
            settings = settings.with_app_host(host.clone());
        }
        if let Some(port) = self.port {
            settings = settings.with_app_port(port);
        }
        if let Some(timeout) = self.input_timeout {
            settings = settings.with_input_timeout(timeout);
        }
        if self.no_notify {
            settings = settings.with_notifications(false);
        }
        settings
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level_filter = cli.log_level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();

    let settings = cli.apply(Settings::from_env());

    log::info!(
        "Starting Copilot Interactive v{} on {}",
        env!("CARGO_PKG_VERSION"),
        platform::platform_name()
    );
    log::info!(
        "Server will listen on {}:{}",
        settings.app_host,
        settings.app_port
    );
    log::info!("Input timeout: {} seconds", settings.input_timeout);
    if !settings.notification_enabled {
        log::info!("Notifications are disabled");
    }

    let terminal = TerminalReader::stdio().context("Failed to start the terminal input worker")?;
    let input_service = InputService::from_settings(&settings, Arc::new(terminal));
    let server_config = ServerConfig::from_settings(&settings)?;
    let server = InteractiveServer::with_config(Arc::new(input_service), server_config);

    if let Err(e) = server.serve_with_shutdown(shutdown_signal()).await {
        log::error!("Server failed: {}", e);
        return Err(e.into());
    }

    log::info!("Shutting down Copilot Interactive");
    Ok(())
}
