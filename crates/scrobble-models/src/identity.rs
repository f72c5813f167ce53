use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Sub-second digits kept on `token_expires_at`. Microseconds are the finest
/// precision every credential backend can store (Postgres `TIMESTAMPTZ`).
pub const EXPIRY_SUBSEC_DIGITS: u16 = 6;

/// A linked user: the credentials this bridge holds for them on the tracking service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub username: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_expires_at: DateTime<Utc>,
}

/// Credential state derived from the expiry timestamp; never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    Active,
    Expired,
}

impl Identity {
    pub fn new(
        id: impl Into<String>,
        username: &str,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        token_expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            username: normalize_username(username),
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            token_expires_at: storable_expiry(token_expires_at),
        }
    }

    /// Swap in freshly granted tokens
    pub fn with_tokens(
        mut self,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        token_expires_at: DateTime<Utc>,
    ) -> Self {
        self.access_token = access_token.into();
        self.refresh_token = refresh_token.into();
        self.token_expires_at = storable_expiry(token_expires_at);
        self
    }

    /// A token expiring exactly at `now` is already expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.token_expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> CredentialState {
        if self.is_expired_at(now) {
            CredentialState::Expired
        } else {
            CredentialState::Active
        }
    }

    /// Canonical stored form: trimmed lowercase username, expiry at
    /// microsecond precision. Stores call this on every read and write.
    pub fn normalized(mut self) -> Self {
        self.username = normalize_username(&self.username);
        self.token_expires_at = storable_expiry(self.token_expires_at);
        self
    }
}

pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

pub fn storable_expiry(expires_at: DateTime<Utc>) -> DateTime<Utc> {
    expires_at.trunc_subsecs(EXPIRY_SUBSEC_DIGITS)
}
