use crate::error::{AdminError, Result};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use url::Url;

/// Default upper bound on pages fetched by a single pagination loop
pub const DEFAULT_MAX_PAGES: u32 = 1000;

/// Create the HTTP client for admin API requests.
///
/// No request timeout is set unless the configuration asks for one; a hung
/// request otherwise waits for the transport.
pub fn create_rest_client(config: &Config) -> Result<Client> {
    let mut builder = ClientBuilder::new()
        .pool_max_idle_per_host(50)
        .connect_timeout(Duration::from_secs(10));

    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }

    Ok(builder.build()?)
}

/// Configuration for the admin API client
#[derive(Debug, Clone)]
pub struct Config {
    /// Normalized blog origin, no trailing slash
    base_url: String,
    /// Maximum pages a pagination loop may request
    pub max_pages: u32,
    /// Optional transport timeout
    pub timeout: Option<Duration>,
}

impl Config {
    /// Create a configuration from a blog URL.
    ///
    /// A single trailing slash is stripped. The remainder must parse as an
    /// absolute URL with the `https` scheme.
    pub fn new(blog_url: &str) -> Result<Self> {
        let normalized = blog_url.strip_suffix('/').unwrap_or(blog_url);

        let parsed = Url::parse(normalized)
            .map_err(|_| AdminError::Configuration("invalid blog URL format".to_string()))?;

        if parsed.scheme() != "https" {
            return Err(AdminError::Configuration(
                "blog URL must use HTTPS for a secure connection".to_string(),
            ));
        }

        Ok(Config {
            base_url: normalized.to_string(),
            max_pages: DEFAULT_MAX_PAGES,
            timeout: None,
        })
    }

    /// Build a configuration without scheme validation, for plain-HTTP mock servers
    #[cfg(test)]
    pub(crate) fn unchecked(base_url: &str) -> Self {
        Config {
            base_url: base_url.trim_end_matches('/').to_string(),
            max_pages: DEFAULT_MAX_PAGES,
            timeout: None,
        }
    }

    /// Set the pagination safety bound
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Set a transport timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Get the blog base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the admin API root
    pub fn api_url(&self) -> String {
        format!("{}/ghost/api/admin", self.base_url)
    }
}
