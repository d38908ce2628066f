#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
pub mod provider;
pub mod web;

pub use config::RigConfig;
pub use provider::{
    AnthropicModel, ApiKeyCredentials, CompletionModel, CompletionProvider, CompletionSettings,
    Credentials, OpenAiModel, ProviderKind,
};
pub use web::{HttpConfig, PageFetcher, SerpApiSearch};

/// Tracing target for completion providers.
pub const TRACING_TARGET_COMPLETION: &str = "promptline_rig::completion";

/// Tracing target for web search and fetch.
pub const TRACING_TARGET_WEB: &str = "promptline_rig::web";
