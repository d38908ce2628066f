//! Shared HTTP client configuration.

use std::time::Duration;

use promptline_core::{Error, Result};
use reqwest::Client;

/// Default timeout for HTTP requests: 30 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the HTTP client used by search and fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Timeout of a whole request.
    pub timeout: Duration,
    /// User-Agent header to send with requests.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("promptline/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(Error::config("timeout cannot be zero"));
        }
        if self.user_agent.is_empty() {
            return Err(Error::config("user_agent cannot be empty"));
        }
        Ok(())
    }

    /// Builds a client from this configuration.
    pub(crate) fn build_client(&self) -> Result<Client> {
        self.validate()?;
        Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("promptline/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_timeout_and_empty_agent() {
        let config = HttpConfig::default().with_timeout(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = HttpConfig::default().with_user_agent("");
        assert!(config.build_client().is_err());
    }
}
