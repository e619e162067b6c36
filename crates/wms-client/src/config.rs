//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::transport::Credentials;

/// Largest image (width * height) a single GetMap may request.
pub const DEFAULT_MAX_PIXELS: u64 = 64_000_000;

/// Configuration shared by the transport, fetcher and batch orchestrator.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound for `width * height` of one request
    pub max_pixels: u64,
    /// Number of GetMap requests in flight at once
    pub max_concurrent_fetches: usize,
    /// HTTP request timeout
    pub request_timeout: Duration,
    /// Directory batch output is written to
    pub output_dir: PathBuf,
    /// HTTP basic auth, sent only when the user name is non-empty
    pub credentials: Option<Credentials>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_pixels: DEFAULT_MAX_PIXELS,
            max_concurrent_fetches: 8,
            request_timeout: Duration::from_secs(120),
            output_dir: PathBuf::from("output"),
            credentials: None,
            user_agent: concat!("wms-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    /// Values below one are raised to one.
    pub fn with_max_concurrent_fetches(mut self, n: usize) -> Self {
        self.max_concurrent_fetches = n.max(1);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.max_pixels, 64_000_000);
        assert_eq!(config.max_concurrent_fetches, 8);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert!(config.credentials.is_none());
        assert!(config.user_agent.starts_with("wms-client/"));
    }

    #[test]
    fn test_builders() {
        let config = ClientConfig::default()
            .with_max_pixels(100)
            .with_max_concurrent_fetches(0)
            .with_output_dir("/tmp/maps")
            .with_credentials(Credentials::new("user", "secret"));
        assert_eq!(config.max_pixels, 100);
        assert_eq!(config.max_concurrent_fetches, 1);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/maps"));
        assert_eq!(config.credentials.unwrap().user, "user");
    }
}
