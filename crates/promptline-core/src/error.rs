//! Error types for promptline-core.

use std::fmt;

/// Result type alias for promptline operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while building or running a pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Placeholder syntax is unbalanced or invalid.
    #[error("malformed template at byte {position}: {reason}")]
    MalformedTemplate { position: usize, reason: String },

    /// A required placeholder has no value at final render time.
    #[error("unresolved placeholder: {{{key}}}")]
    UnresolvedPlaceholder { key: String },

    /// A generation, search or fetch collaborator failed.
    #[error("capability error: {capability}: {message}")]
    Capability { capability: String, message: String },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Creates a malformed template error.
    pub fn malformed(position: usize, reason: impl fmt::Display) -> Self {
        Self::MalformedTemplate {
            position,
            reason: reason.to_string(),
        }
    }

    /// Creates an unresolved placeholder error.
    pub fn unresolved(key: impl Into<String>) -> Self {
        Self::UnresolvedPlaceholder { key: key.into() }
    }

    /// Creates a capability error.
    pub fn capability(capability: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Capability {
            capability: capability.to_string(),
            message: message.to_string(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl fmt::Display) -> Self {
        Self::Config(message.to_string())
    }

    /// Returns true if the error was raised by an external collaborator.
    pub fn is_capability(&self) -> bool {
        matches!(self, Self::Capability { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_names_the_key() {
        let error = Error::unresolved("task_1_output");
        assert_eq!(error.to_string(), "unresolved placeholder: {task_1_output}");
    }

    #[test]
    fn capability_errors_are_flagged() {
        assert!(Error::capability("openai", "rate limited").is_capability());
        assert!(!Error::config("no tasks").is_capability());
    }
}
