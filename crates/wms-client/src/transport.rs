//! HTTP transport seam.
//!
//! All network access goes through [`MapTransport`], so sessions and batch
//! runs can be driven by the production [`HttpTransport`] or by anything
//! else that can answer a GET.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ClientConfig;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Network-level failures. Non-200 responses are not errors at this layer.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
}

/// Something that can perform an HTTP GET.
#[async_trait]
pub trait MapTransport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError>;
}

/// HTTP basic auth credentials.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// [`MapTransport`] backed by `reqwest`.
pub struct HttpTransport {
    client: Client,
    credentials: Option<Credentials>,
}

impl HttpTransport {
    /// Build a transport using the timeout, user agent and credentials of `config`.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .pool_max_idle_per_host(config.max_concurrent_fetches)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            client,
            credentials: config.credentials.clone().filter(|c| !c.user.is_empty()),
        })
    }
}

#[async_trait]
impl MapTransport for HttpTransport {
    #[instrument(skip(self), fields(url = %url))]
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        let request_error = |e: reqwest::Error| TransportError::Request {
            url: url.to_string(),
            message: e.to_string(),
        };

        let mut request = self.client.get(url.clone());
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.user, Some(&credentials.password));
        }

        let response = request.send().await.map_err(request_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(request_error)?;

        debug!(status, size = body.len(), "Received response");
        Ok(HttpResponse { status, body })
    }
}
