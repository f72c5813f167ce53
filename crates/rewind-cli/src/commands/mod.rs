use color_eyre::eyre::eyre;
use color_eyre::Result;
use rewind_config::{Config, PathManager};
use std::path::Path;

pub mod health;
pub mod identity;
pub mod serve;

/// Load configuration from `config_path` or the default location, then apply
/// environment overrides. A relative log file lands in the log directory.
pub fn load_config(config_path: Option<&Path>) -> Result<(Config, PathManager)> {
    let paths = PathManager::default();
    let config_file = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| paths.config_file());

    let mut config = Config::load(&config_file).map_err(|e| eyre!("{}", e))?;
    let relative_log = config
        .logging
        .file
        .as_ref()
        .filter(|file| file.is_relative())
        .map(|file| paths.log_dir().join(file));
    if let Some(file) = relative_log {
        config.logging.file = Some(file);
    }
    Ok((config, paths))
}
