//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── rig: RigConfig              # provider, model, API keys, HTTP
//! ├── telemetry: TelemetryConfig  # log format
//! └── command: Command            # run | search | scrape | example
//! ```
//!
//! All configuration can be provided via CLI arguments or environment
//! variables. Use `--help` to see all available options.

mod command;
mod telemetry;

use std::process;

use anyhow::Context;
use clap::Parser;
pub use command::{Command, OutputFormat, RunArgs, ScrapeArgs, SearchArgs};
use promptline_rig::RigConfig;
pub use telemetry::{LogFormat, TelemetryConfig};

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "promptline")]
#[command(about = "Run sequential prompt pipelines against LLM providers")]
#[command(version)]
pub struct Cli {
    /// Provider, model and credential configuration.
    #[clap(flatten)]
    pub rig: RigConfig,

    /// Logging configuration.
    #[clap(flatten)]
    pub telemetry: TelemetryConfig,

    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses
    /// CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is
    /// enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.rig.validate().context("invalid provider configuration")?;
        Ok(())
    }

    /// Logs configuration at startup (no secrets).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            provider = %self.rig.provider,
            model = %self.rig.model,
            temperature = ?self.rig.temperature,
            max_tokens = self.rig.max_tokens,
            openai_key = self.rig.openai_api_key.is_some(),
            anthropic_key = self.rig.anthropic_api_key.is_some(),
            serpapi_key = self.rig.serpapi_api_key.is_some(),
            http_timeout_secs = self.rig.http_timeout_secs,
            "Provider configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
