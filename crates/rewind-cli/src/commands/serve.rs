use crate::output::Output;
use crate::server::{self, AppState};
use color_eyre::eyre::{eyre, Context};
use color_eyre::Result;
use rewind_config::{Config, PathManager};
use scrobble_core::{open_store, EventRelay};
use scrobble_sources::TraktClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub async fn run_serve(
    config: Config,
    paths: &PathManager,
    listen: Option<String>,
    output: &Output,
) -> Result<()> {
    config.validate().map_err(|e| eyre!("{}", e))?;
    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create data directories: {}", e))?;

    let store = open_store(&config.storage, &paths.keystore_dir())
        .await
        .wrap_err("Failed to open credential store")?;

    let tracker = TraktClient::new(
        config.trakt.client_id.clone(),
        config.trakt.client_secret.clone(),
    )
    .with_base_url(config.trakt.api_url.as_str())
    .with_timeout(Duration::from_secs(config.trakt.timeout_secs));

    let backend = store.backend_name();
    let state = AppState {
        relay: Arc::new(EventRelay::new(store, Arc::new(tracker))),
        client_id: Arc::from(config.trakt.client_id.as_str()),
        allowed_hosts: config.server.allowed_hostnames.iter().cloned().collect(),
    };

    let listen = listen.unwrap_or_else(|| config.server.listen.clone());
    info!(
        operation = "serve",
        listen = %listen,
        backend,
        allowed_hosts = config.server.allowed_hostnames.len(),
        "Starting webhook server"
    );
    output.info(format!("Listening on {} ({} credential store)", listen, backend));

    server::serve(state, &listen).await.map_err(|e| eyre!("{}", e))
}
