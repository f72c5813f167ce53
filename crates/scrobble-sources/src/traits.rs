use async_trait::async_trait;
use scrobble_models::{ScrobbleAction, ScrobbleBody, Season};
use crate::error::SourceError;
use crate::trakt::api::{SearchHit, SearchKind};
use crate::trakt::auth::TokenGrant;

/// Client contract against the tracking service.
///
/// Implementations are stateless apart from their application credentials:
/// user tokens are passed in per call.
#[async_trait]
pub trait TrackingService: Send + Sync {
    fn service_name(&self) -> &str;

    // Authorization handshake
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenGrant, SourceError>;
    async fn refresh_token(&self, refresh_token: &str, redirect_uri: &str) -> Result<TokenGrant, SourceError>;

    // Catalog
    /// Search by an external provider id (`tvdb`, `tmdb`, `imdb`, ...). Zero or more hits.
    async fn search_by_id(&self, provider: &str, id: &str, kind: SearchKind) -> Result<Vec<SearchHit>, SourceError>;
    /// Free-text search. Zero or more hits, each carrying a year when known.
    async fn search_by_text(&self, kind: SearchKind, query: &str) -> Result<Vec<SearchHit>, SourceError>;
    /// Seasons of a show, each with its ordered episode list
    async fn show_seasons(&self, show_id: u64) -> Result<Vec<Season>, SourceError>;

    // Progress
    async fn scrobble(&self, access_token: &str, action: ScrobbleAction, body: &ScrobbleBody) -> Result<(), SourceError>;
}
