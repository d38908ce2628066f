#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for core operations.
pub const TRACING_TARGET: &str = "promptline_core";

/// Tracing target for capability provider calls.
pub const TRACING_TARGET_PROVIDER: &str = "promptline_core::provider";

mod data;
mod error;
mod reference;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;
pub mod provider;
pub mod template;

pub use data::{WorkflowData, stringify, task_output_key};
pub use error::{Error, Result};
pub use reference::{Reference, ReferenceKind, ReferenceRegistry};
pub use template::{PromptMessages, Segment, Template};
