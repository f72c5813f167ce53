use reqwest::{Client, RequestBuilder, Response};
use scrobble_models::{Episode, Movie, ScrobbleAction, ScrobbleBody, Season, Show};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::error::SourceError;

pub const DEFAULT_API_URL: &str = "https://api.trakt.tv";

/// Catalog type a search is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchKind {
    Episode,
    Movie,
    Show,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Episode => "episode",
            SearchKind::Movie => "movie",
            SearchKind::Show => "show",
        }
    }
}

/// One entry of a `/search` response
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub show: Option<Show>,
    #[serde(default)]
    pub episode: Option<Episode>,
    #[serde(default)]
    pub movie: Option<Movie>,
}

/// Headers every Trakt API call needs
fn with_trakt_headers(request: RequestBuilder, client_id: &str) -> RequestBuilder {
    request
        .header("trakt-api-version", "2")
        .header("trakt-api-key", client_id)
        .header("Accept", "application/json")
        .header("Content-Type", "application/json")
}

/// Turn a response into `T`, mapping non-success statuses and bad bodies to
/// `SourceError`
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response, endpoint: &str) -> Result<T, SourceError> {
    let status = response.status();
    let body = response.text().await.map_err(|source| SourceError::Http {
        endpoint: endpoint.to_string(),
        source,
    })?;

    if !status.is_success() {
        return Err(SourceError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|source| SourceError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

async fn get_json<T: DeserializeOwned>(
    client: &Client,
    base_url: &str,
    client_id: &str,
    path: &str,
) -> Result<T, SourceError> {
    let url = format!("{}{}", base_url, path);
    debug!("GET {}", url);

    let response = with_trakt_headers(client.get(&url), client_id)
        .send()
        .await
        .map_err(|source| SourceError::Http {
            endpoint: path.to_string(),
            source,
        })?;

    read_json(response, path).await
}

pub fn search_by_id_path(provider: &str, id: &str, kind: SearchKind) -> String {
    format!(
        "/search/{}/{}?type={}",
        urlencoding::encode(provider),
        urlencoding::encode(id),
        kind.as_str()
    )
}

pub fn search_by_text_path(kind: SearchKind, query: &str) -> String {
    format!("/search/{}?query={}", kind.as_str(), urlencoding::encode(query))
}

pub fn show_seasons_path(show_id: u64) -> String {
    format!("/shows/{}/seasons?extended=episodes", show_id)
}

/// Search by an external provider id
pub async fn search_by_id(
    client: &Client,
    base_url: &str,
    client_id: &str,
    provider: &str,
    id: &str,
    kind: SearchKind,
) -> Result<Vec<SearchHit>, SourceError> {
    get_json(client, base_url, client_id, &search_by_id_path(provider, id, kind)).await
}

/// Free-text search
pub async fn search_by_text(
    client: &Client,
    base_url: &str,
    client_id: &str,
    kind: SearchKind,
    query: &str,
) -> Result<Vec<SearchHit>, SourceError> {
    get_json(client, base_url, client_id, &search_by_text_path(kind, query)).await
}

/// Fetch all seasons of a show including their episodes
pub async fn get_show_seasons(
    client: &Client,
    base_url: &str,
    client_id: &str,
    show_id: u64,
) -> Result<Vec<Season>, SourceError> {
    get_json(client, base_url, client_id, &show_seasons_path(show_id)).await
}

/// Submit a scrobble for the user owning `access_token`
pub async fn scrobble(
    client: &Client,
    base_url: &str,
    client_id: &str,
    access_token: &str,
    action: ScrobbleAction,
    body: &ScrobbleBody,
) -> Result<(), SourceError> {
    let path = format!("/scrobble/{}", action.as_str());
    let url = format!("{}{}", base_url, path);

    let response = with_trakt_headers(client.post(&url), client_id)
        .header("Authorization", format!("Bearer {}", access_token))
        .json(body)
        .send()
        .await
        .map_err(|source| SourceError::Http {
            endpoint: path.clone(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::Status {
            endpoint: path,
            status: status.as_u16(),
            body,
        });
    }

    debug!(action = action.as_str(), status = status.as_u16(), "Scrobble accepted");
    Ok(())
}
