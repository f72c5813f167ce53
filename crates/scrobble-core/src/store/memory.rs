use async_trait::async_trait;
use scrobble_models::Identity;
use std::collections::HashMap;
use tokio::sync::RwLock;
use crate::error::StoreError;
use crate::store::CredentialStore;

/// Process-local store; nothing survives a restart
#[derive(Debug, Default)]
pub struct MemoryStore {
    identities: RwLock<HashMap<String, Identity>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, id: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self.identities.read().await.get(id).cloned())
    }

    async fn put(&self, identity: &Identity) -> Result<(), StoreError> {
        self.identities
            .write()
            .await
            .insert(identity.id.clone(), identity.clone().normalized());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.identities.write().await.remove(id).is_some())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
