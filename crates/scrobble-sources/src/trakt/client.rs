use async_trait::async_trait;
use reqwest::Client;
use scrobble_models::{ScrobbleAction, ScrobbleBody, Season};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use crate::error::SourceError;
use crate::traits::TrackingService;
use crate::trakt::api::{self, SearchHit, SearchKind};
use crate::trakt::auth::{self, Grant, TokenGrant};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Trakt REST client holding the application credentials
#[derive(Clone)]
pub struct TraktClient {
    client: Arc<Client>,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl TraktClient {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client: Arc::new(auth::create_trakt_client(DEFAULT_TIMEOUT)),
            base_url: api::DEFAULT_API_URL.to_string(),
            client_id,
            client_secret,
        }
    }

    /// Point the client at another API root (staging, a local stub)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Arc::new(auth::create_trakt_client(timeout));
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl std::fmt::Debug for TraktClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraktClient")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .finish()
    }
}

#[async_trait]
impl TrackingService for TraktClient {
    fn service_name(&self) -> &str {
        "trakt"
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenGrant, SourceError> {
        let grant = auth::request_token(
            &self.client,
            &self.base_url,
            &self.client_id,
            &self.client_secret,
            redirect_uri,
            Grant::AuthorizationCode(code),
        )
        .await?;
        info!("Exchanged Trakt authorization code (expires at {})", grant.expires_at);
        Ok(grant)
    }

    async fn refresh_token(&self, refresh_token: &str, redirect_uri: &str) -> Result<TokenGrant, SourceError> {
        let grant = auth::request_token(
            &self.client,
            &self.base_url,
            &self.client_id,
            &self.client_secret,
            redirect_uri,
            Grant::RefreshToken(refresh_token),
        )
        .await?;
        info!("Refreshed Trakt access token (expires at {})", grant.expires_at);
        Ok(grant)
    }

    async fn search_by_id(&self, provider: &str, id: &str, kind: SearchKind) -> Result<Vec<SearchHit>, SourceError> {
        api::search_by_id(&self.client, &self.base_url, &self.client_id, provider, id, kind).await
    }

    async fn search_by_text(&self, kind: SearchKind, query: &str) -> Result<Vec<SearchHit>, SourceError> {
        api::search_by_text(&self.client, &self.base_url, &self.client_id, kind, query).await
    }

    async fn show_seasons(&self, show_id: u64) -> Result<Vec<Season>, SourceError> {
        api::get_show_seasons(&self.client, &self.base_url, &self.client_id, show_id).await
    }

    async fn scrobble(&self, access_token: &str, action: ScrobbleAction, body: &ScrobbleBody) -> Result<(), SourceError> {
        api::scrobble(&self.client, &self.base_url, &self.client_id, access_token, action, body).await
    }
}
