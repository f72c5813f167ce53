use chrono::{DateTime, Utc};
use scrobble_models::{CredentialState, Identity};
use scrobble_sources::TrackingService;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use crate::error::{RelayError, StoreError};
use crate::store::CredentialStore;

/// An identity bound to the store it lives in.
///
/// Every mutation goes through here so the record and its stored copy move
/// together: `issue` and `refresh` persist before returning.
pub struct IdentityRecord {
    identity: Identity,
    store: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for IdentityRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityRecord")
            .field("id", &self.identity.id)
            .field("username", &self.identity.username)
            .field("token_expires_at", &self.identity.token_expires_at)
            .field("store", &self.store.backend_name())
            .finish()
    }
}

/// Fresh opaque id for a newly linked account
pub fn new_identity_id() -> String {
    Uuid::new_v4().simple().to_string()
}

impl IdentityRecord {
    /// Exchange an authorization code and persist the new identity under a fresh id
    pub async fn issue(
        store: Arc<dyn CredentialStore>,
        tracker: &dyn TrackingService,
        username: &str,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Self, RelayError> {
        let grant = tracker
            .exchange_code(code, redirect_uri)
            .await
            .map_err(RelayError::AuthFailed)?;

        let identity = Identity::new(
            new_identity_id(),
            username,
            grant.access_token,
            grant.refresh_token,
            grant.expires_at,
        );
        let record = Self { identity, store };
        record.persist().await?;

        info!(
            operation = "identity_issue",
            id = %record.identity.id,
            username = %record.identity.username,
            expires_at = %record.identity.token_expires_at,
            "Linked {} account", tracker.service_name()
        );
        Ok(record)
    }

    pub async fn load(store: Arc<dyn CredentialStore>, id: &str) -> Result<Option<Self>, StoreError> {
        Ok(store
            .get(id)
            .await?
            .map(|identity| Self { identity, store }))
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn id(&self) -> &str {
        &self.identity.id
    }

    pub fn username(&self) -> &str {
        &self.identity.username
    }

    pub fn access_token(&self) -> &str {
        &self.identity.access_token
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.identity.is_expired_at(now)
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> CredentialState {
        self.identity.state_at(now)
    }

    /// Trade the refresh token for new tokens and persist them. One attempt;
    /// a 4xx answer is `RefreshRejected`, anything else is `Tracking`.
    /// The record is left untouched on failure.
    pub async fn refresh(
        &mut self,
        tracker: &dyn TrackingService,
        redirect_uri: &str,
    ) -> Result<(), RelayError> {
        let grant = match tracker
            .refresh_token(&self.identity.refresh_token, redirect_uri)
            .await
        {
            Ok(grant) => grant,
            Err(e) if e.is_rejection() => {
                warn!(id = %self.identity.id, "Refresh token rejected: {}", e);
                return Err(RelayError::RefreshRejected {
                    id: self.identity.id.clone(),
                    source: e,
                });
            }
            Err(e) => return Err(RelayError::Tracking(e)),
        };

        let updated = self
            .identity
            .clone()
            .with_tokens(grant.access_token, grant.refresh_token, grant.expires_at);
        self.store.put(&updated).await?;
        self.identity = updated;

        info!(
            operation = "identity_refresh",
            id = %self.identity.id,
            expires_at = %self.identity.token_expires_at,
            "Refreshed tokens"
        );
        Ok(())
    }

    pub async fn persist(&self) -> Result<(), StoreError> {
        self.store.put(&self.identity).await
    }

    /// Remove the stored identity. Returns whether anything was removed.
    pub async fn revoke(self) -> Result<bool, StoreError> {
        let removed = self.store.delete(&self.identity.id).await?;
        info!(operation = "identity_revoke", id = %self.identity.id, removed, "Revoked identity");
        Ok(removed)
    }
}
