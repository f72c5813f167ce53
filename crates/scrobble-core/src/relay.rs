use chrono::Utc;
use scrobble_models::{LibrarySection, MediaItem, PlaybackEvent, ScrobbleAction, ScrobbleBody};
use scrobble_sources::{redirect_uri, TrackingService};
use std::sync::Arc;
use tracing::{debug, info, warn};
use crate::action::action_for;
use crate::error::RelayError;
use crate::identity::IdentityRecord;
use crate::locks::IdentityLocks;
use crate::resolver::MediaResolver;
use crate::store::CredentialStore;

pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:8000";

/// Why an event was accepted without a tracking call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The event belongs to another media-server account
    AccountMismatch { account: String },
    /// The event kind maps to no tracking action
    NoAction { event: String },
    UnsupportedLibrary { section: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Scrobbled {
        action: ScrobbleAction,
        progress: u8,
        item: MediaItem,
    },
    Skipped(SkipReason),
}

/// Turns playback events into tracking calls on behalf of stored identities.
///
/// Handling is serialized per identity id, which is what keeps two
/// simultaneous events for an expired identity down to a single refresh.
pub struct EventRelay {
    store: Arc<dyn CredentialStore>,
    tracker: Arc<dyn TrackingService>,
    locks: IdentityLocks,
    public_url: String,
}

impl EventRelay {
    pub fn new(store: Arc<dyn CredentialStore>, tracker: Arc<dyn TrackingService>) -> Self {
        Self {
            store,
            tracker,
            locks: IdentityLocks::new(),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
        }
    }

    /// Root used to build redirect URIs when none is supplied per call
    pub fn with_public_url(mut self, public_url: impl Into<String>) -> Self {
        self.public_url = public_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn tracker(&self) -> &Arc<dyn TrackingService> {
        &self.tracker
    }

    /// Complete the authorization handshake for `username` and store the new identity
    pub async fn link(
        &self,
        public_url: &str,
        username: &str,
        code: &str,
    ) -> Result<IdentityRecord, RelayError> {
        let redirect = redirect_uri(public_url, username);
        IdentityRecord::issue(self.store.clone(), self.tracker.as_ref(), username, code, &redirect).await
    }

    pub async fn handle(&self, id: &str, event: &PlaybackEvent) -> Result<RelayOutcome, RelayError> {
        self.handle_at(&self.public_url, id, event).await
    }

    /// Handle an event with redirect URIs rooted at `public_url`
    pub async fn handle_at(
        &self,
        public_url: &str,
        id: &str,
        event: &PlaybackEvent,
    ) -> Result<RelayOutcome, RelayError> {
        self.locks
            .with_lock(id, || self.process(public_url, id, event))
            .await
    }

    async fn process(
        &self,
        public_url: &str,
        id: &str,
        event: &PlaybackEvent,
    ) -> Result<RelayOutcome, RelayError> {
        let mut record = IdentityRecord::load(self.store.clone(), id)
            .await?
            .ok_or_else(|| RelayError::NotFound(id.to_string()))?;

        if record.is_expired_at(Utc::now()) {
            info!(id, "Token expired, refreshing");
            let redirect = redirect_uri(public_url, record.username());
            match record.refresh(self.tracker.as_ref(), &redirect).await {
                Ok(()) => {}
                Err(RelayError::RefreshRejected { .. }) => {
                    warn!(id, "Refresh rejected, removing identity");
                    record.revoke().await?;
                    return Err(RelayError::Unauthorized(id.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        if !event.is_for_account(record.username()) {
            debug!(
                id,
                account = %event.account_title,
                "Event for another account, skipping"
            );
            return Ok(RelayOutcome::Skipped(SkipReason::AccountMismatch {
                account: event.account_title.clone(),
            }));
        }

        let Some(intent) = action_for(&event.kind) else {
            debug!(id, event = event.kind.as_str(), "Event has no tracking action");
            return Ok(RelayOutcome::Skipped(SkipReason::NoAction {
                event: event.kind.as_str().to_string(),
            }));
        };

        if let LibrarySection::Other(section) = &event.library_section_type {
            debug!(id, section = %section, "Library section not tracked");
            return Ok(RelayOutcome::Skipped(SkipReason::UnsupportedLibrary {
                section: section.clone(),
            }));
        }

        let item = MediaResolver::new(self.tracker.as_ref()).resolve(event).await?;
        let body = ScrobbleBody {
            item,
            progress: intent.progress,
        };

        self.tracker
            .scrobble(record.access_token(), intent.action, &body)
            .await
            .map_err(RelayError::Tracking)?;

        info!(
            operation = "scrobble",
            id,
            action = intent.action.as_str(),
            progress = intent.progress,
            item = %body.item,
            "Scrobbled {}", body.item.kind()
        );

        Ok(RelayOutcome::Scrobbled {
            action: intent.action,
            progress: intent.progress,
            item: body.item,
        })
    }
}
