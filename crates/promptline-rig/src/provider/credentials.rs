//! Provider credentials.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

/// API key credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyCredentials {
    /// API key.
    pub api_key: String,
}

impl ApiKeyCredentials {
    /// Wraps `api_key`.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

impl fmt::Debug for ApiKeyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyCredentials")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Credentials for a completion provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "provider", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Credentials {
    /// OpenAI credentials.
    #[serde(rename = "openai")]
    #[strum(serialize = "openai")]
    OpenAi(ApiKeyCredentials),
    /// Anthropic credentials.
    Anthropic(ApiKeyCredentials),
}

impl Credentials {
    /// Returns the provider name.
    pub fn provider(&self) -> &'static str {
        self.into()
    }
}
