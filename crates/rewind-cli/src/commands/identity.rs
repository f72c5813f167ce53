use crate::output::Output;
use chrono::Utc;
use color_eyre::eyre::{eyre, Context};
use color_eyre::Result;
use rewind_config::{Config, PathManager};
use scrobble_core::{open_store, CredentialStore, IdentityRecord};
use scrobble_models::CredentialState;
use std::sync::Arc;

fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

async fn store(config: &Config, paths: &PathManager) -> Result<Arc<dyn CredentialStore>> {
    open_store(&config.storage, &paths.keystore_dir())
        .await
        .wrap_err("Failed to open credential store")
}

pub async fn run_show(config: &Config, paths: &PathManager, id: &str, output: &Output) -> Result<()> {
    let record = IdentityRecord::load(store(config, paths).await?, id)
        .await?
        .ok_or_else(|| eyre!("No identity with id {}", id))?;

    let identity = record.identity();
    let state = match record.state_at(Utc::now()) {
        CredentialState::Active => "active",
        CredentialState::Expired => "expired",
    };

    output.fields(&[
        ("id", identity.id.clone()),
        ("username", identity.username.clone()),
        ("access_token", mask(&identity.access_token)),
        ("refresh_token", mask(&identity.refresh_token)),
        ("expires_at", identity.token_expires_at.to_rfc3339()),
        ("state", state.to_string()),
    ]);
    Ok(())
}

pub async fn run_revoke(config: &Config, paths: &PathManager, id: &str, output: &Output) -> Result<()> {
    let Some(record) = IdentityRecord::load(store(config, paths).await?, id).await? else {
        output.warn(format!("No identity with id {}", id));
        return Ok(());
    };

    let username = record.username().to_string();
    record.revoke().await?;
    output.success(format!("Revoked identity {} ({})", id, username));
    Ok(())
}
