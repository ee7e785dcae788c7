//! HTTP client settings shared by the catalog client and the archive fetcher.

use std::time::Duration;

use reqwest::Client;

/// Network bounds for a restore run.
///
/// Every request gets a connect timeout and a read (idle) timeout, so a
/// stalled transfer fails instead of blocking the run forever.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Maximum time to wait for a connection to be established.
    pub connect_timeout: Duration,
    /// Maximum time between two reads of a response body.
    pub read_timeout: Duration,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl FetchSettings {
    /// Default connect timeout.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
    /// Default read (idle) timeout.
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

    /// Override the read (idle) timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Override the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Build an HTTP client honouring these settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn client(&self) -> Result<Client, reqwest::Error> {
        Client::builder()
            .user_agent(&self.user_agent)
            .connect_timeout(self.connect_timeout)
            .read_timeout(self.read_timeout)
            .build()
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            read_timeout: Self::DEFAULT_READ_TIMEOUT,
            user_agent: crate::USER_AGENT.to_string(),
        }
    }
}
