//! In-memory tracking service for resolver and relay tests. Catalog answers
//! are keyed by the request path the real client would hit.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use scrobble_models::{ScrobbleAction, ScrobbleBody, Season};
use scrobble_sources::trakt::api::{search_by_id_path, search_by_text_path, show_seasons_path};
use scrobble_sources::{SearchHit, SearchKind, SourceError, TokenGrant, TrackingService};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy)]
pub enum RefreshBehavior {
    Grant,
    Reject,
    Unavailable,
}

pub struct StubTracker {
    grant: TokenGrant,
    reject_codes: bool,
    refresh: RefreshBehavior,
    refresh_delay: Option<std::time::Duration>,
    hits: HashMap<String, Vec<SearchHit>>,
    seasons: HashMap<String, Vec<Season>>,
    failing: HashSet<String>,
    pub(crate) requests: Mutex<Vec<String>>,
    scrobbles: Mutex<Vec<(ScrobbleAction, serde_json::Value, String)>>,
    exchanges: AtomicUsize,
    refreshes: AtomicUsize,
    last_refresh_token: Mutex<Option<String>>,
}

fn status(endpoint: &str, status: u16) -> SourceError {
    SourceError::Status {
        endpoint: endpoint.to_string(),
        status,
        body: String::new(),
    }
}

impl StubTracker {
    pub fn new() -> Self {
        Self {
            grant: TokenGrant {
                access_token: "fresh-access".to_string(),
                refresh_token: "fresh-refresh".to_string(),
                expires_at: Utc::now() + Duration::days(90),
            },
            reject_codes: false,
            refresh: RefreshBehavior::Grant,
            refresh_delay: None,
            hits: HashMap::new(),
            seasons: HashMap::new(),
            failing: HashSet::new(),
            requests: Mutex::new(Vec::new()),
            scrobbles: Mutex::new(Vec::new()),
            exchanges: AtomicUsize::new(0),
            refreshes: AtomicUsize::new(0),
            last_refresh_token: Mutex::new(None),
        }
    }

    pub fn reject_codes(mut self) -> Self {
        self.reject_codes = true;
        self
    }

    pub fn with_refresh(mut self, behavior: RefreshBehavior) -> Self {
        self.refresh = behavior;
        self
    }

    pub fn with_refresh_delay(mut self, delay: std::time::Duration) -> Self {
        self.refresh_delay = Some(delay);
        self
    }

    pub fn with_id_hits(mut self, provider: &str, id: &str, kind: SearchKind, json: &str) -> Self {
        let hits = serde_json::from_str(json).expect("search fixture");
        self.hits.insert(search_by_id_path(provider, id, kind), hits);
        self
    }

    pub fn with_text_hits(mut self, kind: SearchKind, query: &str, json: &str) -> Self {
        let hits = serde_json::from_str(json).expect("search fixture");
        self.hits.insert(search_by_text_path(kind, query), hits);
        self
    }

    pub fn with_seasons(mut self, show_id: u64, json: &str) -> Self {
        let seasons = serde_json::from_str(json).expect("seasons fixture");
        self.seasons.insert(show_seasons_path(show_id), seasons);
        self
    }

    /// Answer `path` with a 500
    pub fn failing(mut self, path: String) -> Self {
        self.failing.insert(path);
        self
    }

    pub fn grant(&self) -> TokenGrant {
        self.grant.clone()
    }

    pub fn exchanges(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn last_refresh_token(&self) -> Option<String> {
        self.last_refresh_token.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Submitted scrobbles as (action, JSON body, bearer token)
    pub fn scrobbles(&self) -> Vec<(ScrobbleAction, serde_json::Value, String)> {
        self.scrobbles.lock().unwrap().clone()
    }

    fn lookup_hits(&self, path: String) -> Result<Vec<SearchHit>, SourceError> {
        self.requests.lock().unwrap().push(path.clone());
        if self.failing.contains(&path) {
            return Err(status(&path, 500));
        }
        Ok(self.hits.get(&path).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl TrackingService for StubTracker {
    fn service_name(&self) -> &str {
        "stub"
    }

    async fn exchange_code(&self, _code: &str, _redirect_uri: &str) -> Result<TokenGrant, SourceError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        if self.reject_codes {
            return Err(status("/oauth/token", 401));
        }
        Ok(self.grant.clone())
    }

    async fn refresh_token(&self, refresh_token: &str, _redirect_uri: &str) -> Result<TokenGrant, SourceError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        *self.last_refresh_token.lock().unwrap() = Some(refresh_token.to_string());
        if let Some(delay) = self.refresh_delay {
            tokio::time::sleep(delay).await;
        }
        match self.refresh {
            RefreshBehavior::Grant => Ok(self.grant.clone()),
            RefreshBehavior::Reject => Err(status("/oauth/token", 401)),
            RefreshBehavior::Unavailable => Err(status("/oauth/token", 503)),
        }
    }

    async fn search_by_id(&self, provider: &str, id: &str, kind: SearchKind) -> Result<Vec<SearchHit>, SourceError> {
        self.lookup_hits(search_by_id_path(provider, id, kind))
    }

    async fn search_by_text(&self, kind: SearchKind, query: &str) -> Result<Vec<SearchHit>, SourceError> {
        self.lookup_hits(search_by_text_path(kind, query))
    }

    async fn show_seasons(&self, show_id: u64) -> Result<Vec<Season>, SourceError> {
        let path = show_seasons_path(show_id);
        self.requests.lock().unwrap().push(path.clone());
        if self.failing.contains(&path) {
            return Err(status(&path, 500));
        }
        Ok(self.seasons.get(&path).cloned().unwrap_or_default())
    }

    async fn scrobble(&self, access_token: &str, action: ScrobbleAction, body: &ScrobbleBody) -> Result<(), SourceError> {
        let json = serde_json::to_value(body).expect("scrobble body serializes");
        self.scrobbles
            .lock()
            .unwrap()
            .push((action, json, access_token.to_string()));
        Ok(())
    }
}

// Catalog fixtures

pub const SEVERANCE_SHOW_SEARCH: &str = r#"[
  {"type":"show","score":1000,"show":{"title":"Severance","year":2022,"ids":{"trakt":154997,"slug":"severance","tvdb":371980,"imdb":"tt11280740","tmdb":95396}}}
]"#;

pub const SEVERANCE_SEASONS: &str = r#"[
  {"number":1,"ids":{"trakt":200001},"episodes":[
    {"season":1,"number":1,"title":"Good News About Hell","ids":{"trakt":5104211,"tvdb":8550881,"imdb":"tt11650328","tmdb":1951006}}
  ]},
  {"number":2,"ids":{"trakt":300002},"episodes":[
    {"season":2,"number":1,"title":"Hello, Ms. Cobel","ids":{"trakt":12103027,"tvdb":10592758}},
    {"season":2,"number":2,"title":"Goodbye, Mrs. Selvig","ids":{"trakt":12103028,"tvdb":10592759}},
    {"season":2,"number":3,"title":"Who Is Alive?","ids":{"trakt":12103029,"tvdb":10592760,"imdb":"tt15241840","tmdb":5469117}}
  ]}
]"#;

pub const SEVERANCE_EPISODE_HIT: &str = r#"[
  {"type":"episode","score":1000,
   "episode":{"season":2,"number":3,"title":"Who Is Alive?","ids":{"trakt":12103029,"tvdb":10592760,"imdb":"tt15241840","tmdb":5469117}},
   "show":{"title":"Severance","year":2022,"ids":{"trakt":154997}}}
]"#;

pub const THIRTY_SEVEN_SHOW_SEARCH: &str = r#"[
  {"type":"show","score":1000,"show":{"title":"37 secondes","year":2025,"ids":{"trakt":232082,"slug":"37-secondes"}}}
]"#;

pub const THIRTY_SEVEN_SEASONS: &str = r#"[
  {"number":1,"ids":{"trakt":400001},"episodes":[
    {"season":1,"number":4,"title":"Episode 4","ids":{"trakt":11722091,"tmdb":5322129}},
    {"season":1,"number":5,"title":"Episode 5","ids":{"trakt":11722092,"tmdb":5322130}}
  ]}
]"#;

pub const APOLLO_13_HIT: &str = r#"[
  {"type":"movie","score":1000,"movie":{"title":"Apollo 13","year":1995,"ids":{"trakt":448,"slug":"apollo-13-1995","imdb":"tt0112384","tmdb":568}}}
]"#;
