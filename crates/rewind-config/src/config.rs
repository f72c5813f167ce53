use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const PLACEHOLDER_CLIENT_ID: &str = "YOUR_CLIENT_ID";
const PLACEHOLDER_CLIENT_SECRET: &str = "YOUR_CLIENT_SECRET";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub trakt: TraktConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraktConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Per-request timeout for every Trakt call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Hostnames allowed in the `Host` header. Empty allows every host.
    #[serde(default)]
    pub allowed_hostnames: Vec<String>,
}

/// Credential store backend, chosen once at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// One file per identity; `path` defaults to the keystore directory
    Disk {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    Redis {
        uri: String,
        #[serde(default)]
        password: Option<String>,
    },
    Postgres {
        url: String,
    },
    /// Nothing survives a restart
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Force JSON (true) or plain (false) output; unset picks JSON when stdout is not a terminal
    #[serde(default)]
    pub json: Option<bool>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_api_url() -> String {
    "https://api.trakt.tv".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_listen() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TraktConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            allowed_hostnames: Vec::new(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Disk { path: None }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: None,
            file: None,
        }
    }
}

impl StorageConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            StorageConfig::Disk { .. } => "disk",
            StorageConfig::Redis { .. } => "redis",
            StorageConfig::Postgres { .. } => "postgres",
            StorageConfig::Memory => "memory",
        }
    }
}

/// Normalize a comma separated host list: scheme prefixes and whitespace are
/// dropped, everything is lowercased.
pub fn parse_hostnames(raw: &str) -> Vec<String> {
    raw.to_lowercase()
        .replace("https://", "")
        .replace("http://", "")
        .split(',')
        .map(|host| host.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        .filter(|host| !host.is_empty())
        .collect()
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load the file when it exists (defaults otherwise), then apply process environment overrides
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            Self::load_from_file(path)
                .map_err(|e| anyhow::anyhow!("Failed to load config from {}: {}", path.display(), e))?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok().filter(|value| !value.is_empty()));
        Ok(config)
    }

    /// Apply environment overrides through `lookup` (injected for tests).
    ///
    /// Storage precedence: `POSTGRESQL_URL`, then `REDIS_URI`, then whatever the
    /// file configured. The legacy `REDIRECT_URI` host list wins over `ALLOWED_HOSTNAMES`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(client_id) = lookup("TRAKT_ID") {
            self.trakt.client_id = client_id;
        }
        if let Some(client_secret) = lookup("TRAKT_SECRET") {
            self.trakt.client_secret = client_secret;
        }
        if let Some(api_url) = lookup("TRAKT_API_URL") {
            self.trakt.api_url = api_url;
        }
        if let Some(listen) = lookup("LISTEN") {
            self.server.listen = listen;
        }

        if let Some(hosts) = lookup("REDIRECT_URI").or_else(|| lookup("ALLOWED_HOSTNAMES")) {
            self.server.allowed_hostnames = parse_hostnames(&hosts);
        }

        if let Some(url) = lookup("POSTGRESQL_URL") {
            self.storage = StorageConfig::Postgres { url };
        } else if let Some(uri) = lookup("REDIS_URI") {
            self.storage = StorageConfig::Redis {
                uri,
                password: lookup("REDIS_PASSWORD"),
            };
        } else if let Some(path) = lookup("KEYSTORE_PATH") {
            self.storage = StorageConfig::Disk {
                path: Some(PathBuf::from(path)),
            };
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.is_trakt_configured() {
            return Err(anyhow::anyhow!(
                "Trakt client_id and client_secret must be set (config file or TRAKT_ID / TRAKT_SECRET)"
            ));
        }
        if self.trakt.timeout_secs == 0 {
            return Err(anyhow::anyhow!("trakt.timeout_secs must be greater than zero"));
        }
        if let StorageConfig::Redis { uri, .. } = &self.storage {
            if uri.is_empty() {
                return Err(anyhow::anyhow!("storage.uri is required for the redis backend"));
            }
        }
        if let StorageConfig::Postgres { url } = &self.storage {
            if url.is_empty() {
                return Err(anyhow::anyhow!("storage.url is required for the postgres backend"));
            }
        }
        Ok(())
    }

    pub fn is_trakt_configured(&self) -> bool {
        !self.trakt.client_id.is_empty()
            && self.trakt.client_id != PLACEHOLDER_CLIENT_ID
            && !self.trakt.client_secret.is_empty()
            && self.trakt.client_secret != PLACEHOLDER_CLIENT_SECRET
    }
}
