use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration as StdDuration;
use tracing::debug;
use crate::error::SourceError;
use crate::trakt::api;

pub const TOKEN_PATH: &str = "/oauth/token";
pub const AUTHORIZE_URL: &str = "https://trakt.tv/oauth/authorize";

/// Browser URL that starts the authorization code flow
pub fn authorize_url(client_id: &str, redirect_uri: &str) -> String {
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code",
        AUTHORIZE_URL,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri)
    )
}

/// The redirect URI registered for a user: `<root>/authorize?username=<name>`.
/// Code exchange and refresh must send the same value.
pub fn redirect_uri(root: &str, username: &str) -> String {
    format!(
        "{}/authorize?username={}",
        root.trim_end_matches('/'),
        urlencoding::encode(username)
    )
}

/// Create the reqwest Client shared by every Trakt call
pub fn create_trakt_client(timeout: StdDuration) -> Client {
    Client::builder()
        .user_agent(concat!("rewind/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    created_at: Option<i64>,
}

/// Tokens handed out by a successful code exchange or refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenGrant {
    /// Expiry is `created_at + expires_in`, no safety margin. Falls back to
    /// `now` when the service did not report a creation time.
    pub(crate) fn from_response(response: TokenResponse, now: DateTime<Utc>) -> Self {
        let issued_at = response
            .created_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or(now);

        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: issued_at + Duration::seconds(response.expires_in),
        }
    }
}

/// Grant types accepted by the token endpoint
#[derive(Debug, Clone, Copy)]
pub enum Grant<'a> {
    AuthorizationCode(&'a str),
    RefreshToken(&'a str),
}

impl Grant<'_> {
    fn payload(&self, client_id: &str, client_secret: &str, redirect_uri: &str) -> serde_json::Value {
        match self {
            Grant::AuthorizationCode(code) => serde_json::json!({
                "code": code,
                "client_id": client_id,
                "client_secret": client_secret,
                "redirect_uri": redirect_uri,
                "grant_type": "authorization_code"
            }),
            Grant::RefreshToken(refresh_token) => serde_json::json!({
                "refresh_token": refresh_token,
                "client_id": client_id,
                "client_secret": client_secret,
                "redirect_uri": redirect_uri,
                "grant_type": "refresh_token"
            }),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Grant::AuthorizationCode(_) => "authorization_code",
            Grant::RefreshToken(_) => "refresh_token",
        }
    }
}

/// Exchange a grant for tokens. A single request; callers decide what a
/// failure means.
pub async fn request_token(
    client: &Client,
    base_url: &str,
    client_id: &str,
    client_secret: &str,
    redirect_uri: &str,
    grant: Grant<'_>,
) -> Result<TokenGrant, SourceError> {
    let url = format!("{}{}", base_url, TOKEN_PATH);
    debug!(grant_type = grant.name(), "Requesting Trakt token");

    let response = client
        .post(&url)
        .json(&grant.payload(client_id, client_secret, redirect_uri))
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|source| SourceError::Http {
            endpoint: TOKEN_PATH.to_string(),
            source,
        })?;

    let token_response: TokenResponse = api::read_json(response, TOKEN_PATH).await?;
    Ok(TokenGrant::from_response(token_response, Utc::now()))
}
