use async_trait::async_trait;
use scrobble_models::Identity;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use crate::error::StoreError;
use crate::store::CredentialStore;

/// One TOML file per identity under a single directory
#[derive(Debug, Clone)]
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    /// Create the directory if needed
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        debug!("Disk credential store at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ids become file names, so anything but `[A-Za-z0-9_-]` is refused
    fn is_valid_id(id: &str) -> bool {
        !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.toml", id))
    }
}

#[async_trait]
impl CredentialStore for DiskStore {
    fn backend_name(&self) -> &'static str {
        "disk"
    }

    async fn get(&self, id: &str) -> Result<Option<Identity>, StoreError> {
        if !Self::is_valid_id(id) {
            debug!("Refusing lookup of malformed identity id {:?}", id);
            return Ok(None);
        }

        let content = match tokio::fs::read_to_string(self.record_path(id)).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut identity: Identity =
            toml::from_str(&content).map_err(|e| StoreError::Serialization {
                id: id.to_string(),
                message: e.to_string(),
            })?;
        if identity.id != id {
            warn!("Identity file {} names id {}, using the file name", id, identity.id);
            identity.id = id.to_string();
        }
        Ok(Some(identity.normalized()))
    }

    async fn put(&self, identity: &Identity) -> Result<(), StoreError> {
        if !Self::is_valid_id(&identity.id) {
            return Err(StoreError::InvalidId(identity.id.clone()));
        }

        let content = toml::to_string_pretty(&identity.clone().normalized()).map_err(|e| {
            StoreError::Serialization {
                id: identity.id.clone(),
                message: e.to_string(),
            }
        })?;

        // Atomic write: write to temp file, then rename
        let path = self.record_path(&identity.id);
        let temp_path = path.with_extension("toml.tmp");
        tokio::fs::write(&temp_path, content).await?;
        tokio::fs::rename(&temp_path, &path).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        if !Self::is_valid_id(id) {
            return Ok(false);
        }

        match tokio::fs::remove_file(self.record_path(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let metadata = tokio::fs::metadata(&self.dir).await?;
        if !metadata.is_dir() {
            return Err(StoreError::Io(std::io::Error::new(
                ErrorKind::NotFound,
                format!("{} is not a directory", self.dir.display()),
            )));
        }
        Ok(())
    }
}
