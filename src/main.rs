use anyhow::{Context, Result};

use sightline::{
    cli::config_path_from_args, config::Config, continuity::TrackerPersistence,
    logging::init_tracing, server, session::TrackerSession,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config_path_from_args()?;
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let logging_guard =
        init_tracing(&config.logging).context("failed to initialize logging")?;
    tracing::info!(
        target: "main",
        run_id = logging_guard.run_id(),
        config = %config_path.display(),
        "sightline_starting"
    );

    let persistence = TrackerPersistence::new(config.continuity.state_path.clone());
    let session = TrackerSession::with_persistence(config.tracker.clone(), persistence)
        .context("failed to restore tracker session")?;

    server::run(&config, session).await
}
