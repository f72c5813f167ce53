use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use scrobble_core::{EventRelay, RelayError, RelayOutcome, SkipReason};
use scrobble_models::identity::normalize_username;
use scrobble_sources::{authorize_url, parse_webhook, redirect_uri};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Plex attaches a thumbnail to the webhook payload
const MAX_WEBHOOK_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<EventRelay>,
    pub client_id: Arc<str>,
    /// Empty allows every host
    pub allowed_hosts: Arc<[String]>,
}

#[derive(Debug, Deserialize)]
struct LandingQuery {
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthorizeQuery {
    username: String,
    code: String,
}

#[derive(Debug, Deserialize)]
struct WebhookQuery {
    id: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/authorize", get(authorize))
        .route("/api", post(webhook))
        .route("/healthcheck", get(healthcheck))
        .layer(DefaultBodyLimit::max(MAX_WEBHOOK_BYTES))
        .layer(middleware::from_fn_with_state(state.clone(), host_guard))
        .with_state(state)
}

pub async fn serve(state: AppState, listen: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", listen, e))?;

    info!(operation = "server_started", listen, "Listening for webhooks");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!(operation = "server_stopped", "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// `<scheme>://<host>` as the client reached us, honoring `X-Forwarded-Proto`
pub fn public_root(headers: &HeaderMap) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    format!("{}://{}", scheme, host)
}

fn host_allowed(allowed: &[String], headers: &HeaderMap) -> bool {
    if allowed.is_empty() {
        return true;
    }
    let Some(host) = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_lowercase)
    else {
        return false;
    };
    let bare = host.split(':').next().unwrap_or(&host);
    allowed.iter().any(|candidate| *candidate == host || candidate == bare)
}

async fn host_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if request.uri().path() == "/healthcheck" || host_allowed(&state.allowed_hosts, request.headers()) {
        return next.run(request).await;
    }

    warn!(
        host = ?request.headers().get(header::HOST),
        path = request.uri().path(),
        "Rejected request for unlisted host"
    );
    (StatusCode::UNAUTHORIZED, "Oh no!").into_response()
}

pub fn status_for(error: &RelayError) -> StatusCode {
    match error {
        RelayError::NotFound(_) => StatusCode::NOT_FOUND,
        RelayError::Unauthorized(_) | RelayError::RefreshRejected { .. } | RelayError::AuthFailed(_) => {
            StatusCode::UNAUTHORIZED
        }
        RelayError::ResolutionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RelayError::Store(_) | RelayError::Tracking(_) => StatusCode::BAD_GATEWAY,
    }
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><h1>{title}</h1>{body}</body></html>",
        title = escape_html(title),
        body = body
    ))
}

async fn landing(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<LandingQuery>,
) -> Response {
    let root = public_root(&headers);
    let username = query
        .username
        .map(|name| normalize_username(&name))
        .filter(|name| !name.is_empty());

    match username {
        Some(username) => {
            let target = authorize_url(&state.client_id, &redirect_uri(&root, &username));
            Redirect::to(&target).into_response()
        }
        None => page(
            "Rewind",
            "<p>Enter your Plex username to link your Trakt account.</p>\
             <form method=\"get\" action=\"/\">\
             <input name=\"username\" placeholder=\"Plex username\" required>\
             <button type=\"submit\">Authorize with Trakt</button></form>",
        )
        .into_response(),
    }
}

async fn authorize(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AuthorizeQuery>,
) -> Response {
    let root = public_root(&headers);

    match state.relay.link(&root, &query.username, &query.code).await {
        Ok(record) => {
            let webhook = format!("{}/api?id={}", root, record.id());
            page(
                "Account linked",
                &format!(
                    "<p>Trakt is now linked for <b>{}</b>.</p>\
                     <p>Add this URL as a webhook in your Plex server settings:</p>\
                     <pre>{}</pre>",
                    escape_html(record.username()),
                    escape_html(&webhook)
                ),
            )
            .into_response()
        }
        Err(e) => {
            warn!(username = %query.username, "Linking failed: {}", e);
            (
                status_for(&e),
                page("Linking failed", &format!("<p>{}</p>", escape_html(&e.to_string()))),
            )
                .into_response()
        }
    }
}

fn skip_reason(reason: &SkipReason) -> String {
    match reason {
        SkipReason::AccountMismatch { account } => format!("event for account '{}'", account),
        SkipReason::NoAction { event } => format!("no action for {}", event),
        SkipReason::UnsupportedLibrary { section } => format!("library section '{}' not tracked", section),
    }
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
}

/// Plex posts `multipart/form-data` with the event in the `payload` field and
/// an optional `thumb` image. Any other content type is read as bare JSON.
async fn webhook_payload(state: &AppState, request: Request) -> Result<Bytes, String> {
    if !is_multipart(request.headers()) {
        return Bytes::from_request(request, state)
            .await
            .map_err(|e| e.body_text());
    }

    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|e| e.body_text())?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("multipart error: {e}"))?
    {
        if field.name() == Some("payload") {
            return field
                .bytes()
                .await
                .map_err(|e| format!("read payload field: {e}"));
        }
    }
    Err("multipart body has no payload field".to_string())
}

async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WebhookQuery>,
    request: Request,
) -> Response {
    let body = match webhook_payload(&state, request).await {
        Ok(body) => body,
        Err(e) => {
            warn!(id = %query.id, "Unreadable webhook body: {}", e);
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": e }))).into_response();
        }
    };

    let event = match parse_webhook(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!(id = %query.id, "Unreadable webhook: {}", e);
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response();
        }
    };

    let root = public_root(&headers);
    match state.relay.handle_at(&root, &query.id, &event).await {
        Ok(RelayOutcome::Scrobbled { action, progress, item }) => Json(json!({
            "status": "scrobbled",
            "action": action.as_str(),
            "progress": progress,
            "item": item,
        }))
        .into_response(),
        Ok(RelayOutcome::Skipped(reason)) => Json(json!({
            "status": "skipped",
            "reason": skip_reason(&reason),
        }))
        .into_response(),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                error!(id = %query.id, event = event.kind.as_str(), "Webhook failed: {}", e);
            } else {
                warn!(id = %query.id, event = event.kind.as_str(), "Webhook rejected: {}", e);
            }
            (status, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

async fn healthcheck(State(state): State<AppState>) -> Response {
    let store = state.relay.store();
    match store.health_check().await {
        Ok(()) => Json(json!({ "status": "ok", "backend": store.backend_name() })).into_response(),
        Err(e) => {
            error!(backend = store.backend_name(), "Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "backend": store.backend_name(),
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}
