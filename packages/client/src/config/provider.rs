//! Provider API configuration
//!
//! Connection settings for the zone/record HTTP API, including the bearer token.

use std::fmt;
use std::time::Duration;

use url::Url;
use zeroize::Zeroizing;

/// Base URL of the Cloudflare v4 API
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Settings for talking to the DNS-hosting provider
#[derive(Clone)]
pub struct ProviderConfig {
    pub api_base: Url,
    pub token: Zeroizing<String>,
    pub timeout: Duration,
    pub user_agent: String,
    /// Add the platform trust store to the bundled webpki roots
    pub use_native_certs: bool,
}

impl ProviderConfig {
    /// Configuration for the public Cloudflare API with the given token
    #[must_use]
    pub fn cloudflare(token: impl Into<String>) -> Self {
        Self {
            token: Zeroizing::new(token.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: Url) -> Self {
        self.api_base = api_base;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate configuration parameters
    ///
    /// # Errors
    ///
    /// Returns an error string if the token is empty, the timeout is zero or the
    /// API base is not an http(s) URL with a host.
    pub fn validate(&self) -> Result<(), String> {
        if self.token.trim().is_empty() {
            return Err("API token must not be empty".to_string());
        }

        if self.timeout.is_zero() {
            return Err("request timeout must be greater than 0".to_string());
        }

        match self.api_base.scheme() {
            "https" | "http" => {}
            other => return Err(format!("unsupported API scheme '{other}'")),
        }

        if self.api_base.host_str().is_none() {
            return Err("API base URL has no host".to_string());
        }

        Ok(())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: Url::parse(CLOUDFLARE_API_BASE).expect("Cloudflare API base URL should always parse"),
            token: Zeroizing::new(String::new()),
            timeout: Duration::from_secs(30),
            user_agent: concat!("tlsaflare/", env!("CARGO_PKG_VERSION")).to_string(),
            use_native_certs: false,
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_base", &self.api_base.as_str())
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("use_native_certs", &self.use_native_certs)
            .finish()
    }
}
