//! Configuration for the remote endpoint.

use std::time::Duration;

/// Configuration for talking to the remote entity store.
///
/// No retry settings live here: the pipeline never retries internally,
/// so retry policy belongs to the caller.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the remote store (e.g. "https://api.example.com").
    pub base_url: String,
    /// Request timeout, enforced by the HTTP client implementation.
    pub timeout: Duration,
}

impl SyncConfig {
    /// Creates a configuration for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_timeout() {
        let config = SyncConfig::new("https://api.example.com")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
