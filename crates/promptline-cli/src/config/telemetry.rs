//! Logging configuration.

use clap::Args;
use strum::{AsRefStr, Display, EnumString};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging options. Logs are always written to stderr.
#[derive(Debug, Clone, Args)]
pub struct TelemetryConfig {
    /// Log output format (`text` or `json`).
    #[arg(long, env = "PROMPTLINE_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,

    /// Disable ANSI colors in text logs.
    #[arg(long, env = "NO_COLOR", value_parser = clap::builder::FalseyValueParser::new())]
    pub no_color: bool,
}
