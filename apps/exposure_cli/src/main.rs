use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use exposure_core::{
    ExposureCoordinator, ExposureDataController, ExposureStateStream, HttpExposureDataController,
    MissingExposureDataController,
};
use futures::StreamExt;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod config;
mod platform;

use config::load_settings;
use platform::platform_from_setting;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "exposure.toml")]
    config: PathBuf,
    /// Overrides the configured exposure API base url.
    #[arg(long)]
    api_url: Option<String>,
    /// Overrides the simulated platform status, or `unavailable`.
    #[arg(long)]
    platform_status: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Activate exposure detection and print the resulting state.
    Status,
    /// Ask the platform to enable exposure notifications.
    Enable,
    /// Fetch a lab confirmation key from the API.
    ConfirmationKey,
    /// Activate, then print every published state until interrupted.
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings(&cli.config)?;
    if let Some(api_url) = cli.api_url {
        settings.api_url = Some(api_url);
    }
    if let Some(platform_status) = cli.platform_status {
        settings.platform_status = platform_status;
    }

    let platform = platform_from_setting(&settings.platform_status)?;
    let data_controller: Arc<dyn ExposureDataController> = match settings.parsed_api_url()? {
        Some(url) => Arc::new(HttpExposureDataController::new(url)),
        None => {
            warn!("no api url configured, confirmation key requests will fail");
            Arc::new(MissingExposureDataController)
        }
    };

    let stream = Arc::new(ExposureStateStream::new());
    let coordinator = ExposureCoordinator::with_config(
        settings.coordinator_config(),
        stream.clone(),
        platform,
        data_controller,
    );

    match cli.command {
        Command::Status => {
            let outcome = coordinator.activate_now().await;
            println!("{}", serde_json::to_string_pretty(&outcome.state)?);
            if let Some(err) = outcome.error {
                eprintln!("activation failed: {err}");
            }
        }
        Command::Enable => {
            let outcome = coordinator
                .request_exposure_notification_permission_now()
                .await;
            println!("{}", serde_json::to_string_pretty(&outcome.state)?);
            if let Some(err) = outcome.error {
                eprintln!("enable request failed: {err}");
            }
        }
        Command::ConfirmationKey => {
            let key = coordinator
                .lab_confirmation_key()
                .await
                .context("failed to fetch lab confirmation key")?;
            println!("{}", serde_json::to_string_pretty(&key)?);
        }
        Command::Watch => {
            let mut updates = Box::pin(stream.updates());
            coordinator.activate();
            loop {
                tokio::select! {
                    state = updates.next() => match state {
                        Some(state) => println!("{}", serde_json::to_string(&state)?),
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            coordinator.shutdown();
        }
    }

    Ok(())
}
