use std::path::Path;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use idkey_auth::bus::EventKind;
use idkey_auth::cli::{parse_args, run_cli_command, CliCommand, USAGE};
use idkey_auth::startup::{AuthConfig, Authenticator};

fn init_tracing(config: &AuthConfig) {
    let filter = EnvFilter::try_new(config.log_filter()).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let command = match parse_args(std::env::args()) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("ERROR: {}", message);
            eprintln!("{}", USAGE);
            std::process::exit(1);
        }
    };

    if !matches!(command, CliCommand::Run { .. }) {
        init_tracing(&AuthConfig::from_env().unwrap_or_default());
    }
    if let Some(code) = run_cli_command(&command) {
        std::process::exit(code);
    }

    color_eyre::install()?;

    let config_path = match &command {
        CliCommand::Run { config } => config.clone(),
        _ => None,
    };
    let config = AuthConfig::load(config_path.as_deref())
        .map_err(|e| eyre!("{} ({})", e.user_message(), e))?;
    init_tracing(&config);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_daemon(config, config_path.as_deref()))
}

async fn run_daemon(config: AuthConfig, config_path: Option<&Path>) -> Result<()> {
    if let Some(path) = config_path {
        tracing::info!("Loaded config from {}", path.display());
    }

    let authenticator = match Authenticator::start(config) {
        Ok(authenticator) => authenticator,
        Err(e) => {
            tracing::error!("[{}] {}", e.error_code(), e);
            eprintln!("{}", e.user_message());
            eprintln!("{}", e.recovery_hint());
            std::process::exit(1);
        }
    };

    let mut events = authenticator.subscribe(&EventKind::ALL);
    let reporter = tokio::spawn(async move {
        while let Some(notification) = events.recv().await {
            match serde_json::to_string(&notification) {
                Ok(json) => tracing::info!("event {}", json),
                Err(e) => tracing::warn!("Unserializable event: {}", e),
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupted, shutting down");

    authenticator.shutdown().await;
    reporter.abort();
    Ok(())
}
