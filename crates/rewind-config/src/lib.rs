pub mod config;
pub mod paths;

pub use config::{parse_hostnames, Config, LoggingConfig, ServerConfig, StorageConfig, TraktConfig};
pub use paths::{container_base_path, PathManager};
