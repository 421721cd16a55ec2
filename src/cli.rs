use clap::Parser;
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Run vulnerability updaters and export the accumulated update operations
#[derive(Parser, Debug)]
#[command(name = "updater-export")]
#[command(version)]
#[command(about = "Run vulnerability updaters and export the accumulated update operations as a single snapshot", long_about = None)]
pub struct Args {
    /// Output file path (if not specified, outputs to stdout)
    #[arg(value_name = "OUT")]
    pub output: Option<PathBuf>,

    /// Exit with a non-zero status when any updater reports an error
    #[arg(long)]
    pub strict: bool,

    /// Path to the configuration file
    /// (defaults to updater-export.config.yml in the current directory)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Previously exported snapshot to load before running, so prior
    /// fingerprints are honoured and the export keeps the full history
    #[arg(long, value_name = "SNAPSHOT")]
    pub resume: Option<PathBuf>,

    /// Run deadline in seconds; in-flight updaters are cancelled on expiry
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Log level: trace, debug, info, warn or error (overrides config file)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Log format: pretty or json (overrides config file)
    #[arg(long, value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Number of updaters run in parallel (overrides config file)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub concurrency: Option<u64>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
