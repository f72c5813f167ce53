use async_trait::async_trait;
use rewind_config::StorageConfig;
use scrobble_models::Identity;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use crate::error::StoreError;

pub mod disk;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "redis")]
pub mod redis;

pub use disk::DiskStore;
pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
#[cfg(feature = "redis")]
pub use redis::RedisStore;

/// Durable mapping from identity id to identity.
///
/// `put` is an upsert and `get` returns exactly what was last put, with the
/// username lowercased. Deleting an absent id is not an error.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn get(&self, id: &str) -> Result<Option<Identity>, StoreError>;
    async fn put(&self, identity: &Identity) -> Result<(), StoreError>;
    /// Returns whether a record was removed
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Open the backend selected by configuration. `keystore_dir` is used by the
/// disk backend when the configuration names no path.
pub async fn open_store(
    config: &StorageConfig,
    keystore_dir: &Path,
) -> Result<Arc<dyn CredentialStore>, StoreError> {
    let store: Arc<dyn CredentialStore> = match config {
        StorageConfig::Disk { path } => {
            let dir = path.clone().unwrap_or_else(|| keystore_dir.to_path_buf());
            Arc::new(DiskStore::open(dir).await?)
        }
        StorageConfig::Memory => Arc::new(MemoryStore::new()),
        #[cfg(feature = "redis")]
        StorageConfig::Redis { uri, password } => {
            Arc::new(RedisStore::connect(uri, password.as_deref()).await?)
        }
        #[cfg(not(feature = "redis"))]
        StorageConfig::Redis { .. } => return Err(StoreError::Unavailable("redis")),
        #[cfg(feature = "postgres")]
        StorageConfig::Postgres { url } => Arc::new(PostgresStore::connect(url).await?),
        #[cfg(not(feature = "postgres"))]
        StorageConfig::Postgres { .. } => return Err(StoreError::Unavailable("postgres")),
    };

    info!(backend = store.backend_name(), "Credential store ready");
    Ok(store)
}
