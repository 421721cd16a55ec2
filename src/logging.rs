//! Logging initialization for updater-export.
//!
//! Installs a `tracing-subscriber` registry writing to stderr, since stdout
//! may carry the exported snapshot.

use anyhow::Result;
use std::str::FromStr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_LEVEL: &str = "warn";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Output format of the tracing layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!(
                "Invalid log format: {}. Please specify 'pretty' or 'json'",
                s
            )),
        }
    }
}

/// Whether `level` is one of the plain level names.
pub fn is_known_level(level: &str) -> bool {
    LOG_LEVELS.contains(&level.to_lowercase().as_str())
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set. Must be called at
/// most once per process.
pub fn init_tracing(level: &str, format: LogFormat) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialize JSON tracing subscriber: {}", e)),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| {
                anyhow::anyhow!("failed to initialize pretty tracing subscriber: {}", e)
            }),
    }
}
