//! StudyBox CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use studybox::cli::{commands, Cli, Commands};
use studybox::config::{Credentials, Settings};
use studybox::session::Session;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("studybox={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let credentials = Credentials::from_env(settings.backend.provider);

    // Execute command
    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Menu => {
            let mut session = Session::new(settings, &credentials)?;
            commands::run_menu(&mut session, &credentials).await?;
        }

        Commands::Upload { path } => {
            let mut session = Session::new(settings, &credentials)?;
            commands::run_upload(&mut session, &path)?;
        }

        Commands::List => {
            let session = Session::new(settings, &credentials)?;
            commands::run_list(&session)?;
        }

        Commands::Delete { name } => {
            let mut session = Session::new(settings, &credentials)?;
            commands::run_delete(&mut session, &name)?;
        }

        Commands::Extensions => {
            commands::run_extensions();
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, &credentials)?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, &settings, config_path.as_ref())?;
        }
    }

    Ok(())
}
