use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use redis::{aio::ConnectionManager, AsyncCommands};
use scrobble_models::Identity;
use std::collections::HashMap;
use std::fmt;
use tracing::info;
use crate::error::StoreError;
use crate::store::CredentialStore;

const KEY_PREFIX: &str = "rewind:user:";

/// One hash per identity: `rewind:user:<id>` with fields `username`,
/// `access`, `refresh` and `expires_at` (RFC 3339, microsecond precision)
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("connection", &"ConnectionManager")
            .finish()
    }
}

fn key(id: &str) -> String {
    format!("{}{}", KEY_PREFIX, id)
}

/// Accepts either a full `redis://` URL or a bare `host:port` plus an
/// optional password
fn connection_url(uri: &str, password: Option<&str>) -> String {
    if uri.starts_with("redis://") || uri.starts_with("rediss://") {
        return uri.to_string();
    }
    match password.filter(|p| !p.is_empty()) {
        Some(password) => format!("redis://:{}@{}", urlencoding::encode(password), uri),
        None => format!("redis://{}", uri),
    }
}

fn to_fields(identity: &Identity) -> [(&'static str, String); 4] {
    [
        ("username", identity.username.clone()),
        ("access", identity.access_token.clone()),
        ("refresh", identity.refresh_token.clone()),
        (
            "expires_at",
            identity
                .token_expires_at
                .to_rfc3339_opts(SecondsFormat::Micros, true),
        ),
    ]
}

fn from_fields(id: &str, mut fields: HashMap<String, String>) -> Result<Identity, StoreError> {
    let mut take = |name: &str| {
        fields.remove(name).ok_or_else(|| StoreError::Serialization {
            id: id.to_string(),
            message: format!("missing field '{}'", name),
        })
    };

    let username = take("username")?;
    let access = take("access")?;
    let refresh = take("refresh")?;
    let expires_at = take("expires_at")?;
    let expires_at = DateTime::parse_from_rfc3339(&expires_at)
        .map_err(|e| StoreError::Serialization {
            id: id.to_string(),
            message: format!("bad expires_at '{}': {}", expires_at, e),
        })?
        .with_timezone(&Utc);

    Ok(Identity::new(id, &username, access, refresh, expires_at))
}

impl RedisStore {
    pub async fn connect(uri: &str, password: Option<&str>) -> Result<Self, StoreError> {
        info!("Connecting to Redis credential store at {}", uri);

        let client = redis::Client::open(connection_url(uri, password))
            .map_err(|e| StoreError::backend("redis", e))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::backend("redis", e))?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl CredentialStore for RedisStore {
    fn backend_name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, id: &str) -> Result<Option<Identity>, StoreError> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn
            .hgetall(key(id))
            .await
            .map_err(|e| StoreError::backend("redis", e))?;

        if fields.is_empty() {
            return Ok(None);
        }
        from_fields(id, fields).map(Some)
    }

    async fn put(&self, identity: &Identity) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let identity = identity.clone().normalized();
        let _: () = conn
            .hset_multiple(key(&identity.id), &to_fields(&identity))
            .await
            .map_err(|e| StoreError::backend("redis", e))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn
            .del(key(id))
            .await
            .map_err(|e| StoreError::backend("redis", e))?;
        Ok(removed > 0)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| StoreError::backend("redis", e))
    }
}
