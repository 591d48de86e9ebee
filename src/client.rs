//! HTTP client configuration for the annotation service.

use std::time::Duration;

/// A pooled HTTP client shared by every dispatcher worker.
///
/// Cloning is cheap (`reqwest::Client` is `Arc`-backed internally), so each
/// dispatcher task clones it rather than locking a single shared instance.
#[derive(Clone)]
pub struct Client {
    pub(crate) inner: reqwest::Client,
}

impl Client {
    /// Create a client builder for customization.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

/// Builder for configuring the annotation-service HTTP client.
#[must_use = "builders do nothing unless you call .build()"]
pub struct ClientBuilder {
    timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Create a new client builder.
    pub fn new() -> Self {
        Self { timeout: None }
    }

    /// Set the per-request timeout.
    ///
    /// Unset by default, delegating to the HTTP client's own defaults.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    ///
    /// Returns an error if the underlying HTTP client fails to build, e.g.
    /// due to TLS configuration issues.
    pub fn build(self) -> Result<Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90));

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let inner = builder.build()?;
        Ok(Client { inner })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
