use anyhow::Result;
use rewind_config::LoggingConfig;
use std::io;
use std::io::IsTerminal;
use std::path::Path;
use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry,
};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

/// Filter directives for the command line flags.
/// 0 = configured level, 1 = debug (hyper quieted), 2+ = trace
fn filter_directives(verbose_level: u8, quiet: bool, configured: &str) -> String {
    if quiet {
        return "error".to_string();
    }
    match verbose_level {
        0 => configured.to_string(),
        1 => "debug,hyper=warn,hyper_util=warn,reqwest=info".to_string(),
        _ => "trace".to_string(),
    }
}

/// `RUST_LOG_JSON` wins, then the config file, then "JSON unless stdout is a terminal"
fn use_json(config: &LoggingConfig) -> bool {
    match std::env::var("RUST_LOG_JSON") {
        Ok(value) => value == "true",
        Err(_) => config.json.unwrap_or_else(|| !io::stdout().is_terminal()),
    }
}

fn rolling_appender(log_path: &Path) -> Result<RollingFileAppender> {
    let log_dir = log_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Log file path has no parent directory"))?;
    std::fs::create_dir_all(log_dir)?;

    let log_filename = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid log filename"))?;

    // rewind.log rotates to rewind.<date>
    let log_prefix = log_filename
        .rsplit_once('.')
        .map(|(prefix, _)| prefix)
        .unwrap_or(log_filename);

    Ok(RollingFileAppender::new(Rotation::DAILY, log_dir, log_prefix))
}

pub fn init_logging(verbose_level: u8, quiet: bool, config: &LoggingConfig) -> Result<()> {
    let directives = filter_directives(verbose_level, quiet, &config.level);
    let filter = if quiet {
        EnvFilter::new(directives)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives))
    };

    let json = use_json(config);
    let registry = Registry::default().with(filter);

    if let Some(log_path) = &config.file {
        let file_appender = rolling_appender(log_path)?;
        if json {
            let json_layer = fmt::layer()
                .json()
                .with_timer(ChronoUtc::rfc_3339())
                .with_writer(file_appender);
            registry.with(json_layer).init();
        } else {
            let fmt_layer = fmt::layer()
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(false)
                .with_writer(file_appender);
            registry.with(fmt_layer).init();
        }
    } else if json {
        let json_layer = fmt::layer()
            .json()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr);
        registry.with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr);
        registry.with(fmt_layer).init();
    }

    Ok(())
}
