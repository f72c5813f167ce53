use crate::output::Output;
use color_eyre::eyre::Context;
use color_eyre::Result;
use rewind_config::{Config, PathManager};
use scrobble_core::open_store;

/// Open the configured credential store and ping it
pub async fn run_health(config: &Config, paths: &PathManager, output: &Output) -> Result<()> {
    let store = open_store(&config.storage, &paths.keystore_dir())
        .await
        .wrap_err("Failed to open credential store")?;

    if let Err(e) = store.health_check().await {
        output.error(format!("{} credential store is unhealthy: {}", store.backend_name(), e));
        return Err(e).wrap_err("Health check failed");
    }

    output.success(format!("{} credential store is healthy", store.backend_name()));
    Ok(())
}
