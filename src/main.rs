use anyhow::Context;

use media_rename::config::{ConfigStore, FileConfigStore, log_dir};
use media_rename::logging;
use media_rename::tui::{self, App};
use media_rename::tui::validation::default_factory;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let store = FileConfigStore::default_location().context("Could not locate the configuration directory")?;
    let config = store
        .load()
        .with_context(|| format!("Failed to load configuration from {}", store.path().display()))?;

    let logs = log_dir().context("Could not locate the log directory")?;
    let _guard = logging::init(&config.logging, &logs).context("Failed to initialise logging")?;
    if let Err(err) = logging::prune_old_logs(&logs, config.logging.retention_days) {
        tracing::warn!("Could not prune old logs: {}", err);
    }

    tracing::info!(path = %store.path().display(), "Starting configuration editor");
    let app = App::with_config(config, Box::new(store));
    tui::run_tui(app, default_factory()).await
}
