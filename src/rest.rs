use crate::client::{create_rest_client, Config};
use crate::credential::AdminKey;
use crate::error::{AdminError, Result};
use crate::model::{BulkDeleteResult, FailedDelete};
use crate::response::{ApiResponse, ErrorBody};
use crate::token::{Clock, SystemClock, Token, TokenCache};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default page size for paginated list calls; the admin API caps pages at 100
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Authenticated client for the Ghost Admin API.
///
/// The client owns the blog origin and the admin key, derives short-lived
/// tokens on demand, and is cheap to clone (clones share the token cache).
#[derive(Clone)]
pub struct GhostApi {
    client: Client,
    config: Config,
    admin_key: String,
    clock: Arc<dyn Clock>,
    tokens: Arc<TokenCache>,
}

impl GhostApi {
    /// Create a client for the blog at `blog_url` using an `id:secret` admin key.
    ///
    /// Fails with [`AdminError::Configuration`] if the URL is malformed or not
    /// HTTPS. The key itself is validated on first use.
    pub fn new(blog_url: &str, admin_key: impl Into<String>) -> Result<Self> {
        Self::with_config(Config::new(blog_url)?, admin_key)
    }

    /// Create a client with custom configuration
    pub fn with_config(config: Config, admin_key: impl Into<String>) -> Result<Self> {
        Ok(GhostApi {
            client: create_rest_client(&config)?,
            config,
            admin_key: admin_key.into(),
            clock: Arc::new(SystemClock),
            tokens: Arc::new(TokenCache::new()),
        })
    }

    /// Replace the time source used for token timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the normalized blog URL
    pub fn base_url(&self) -> &str {
        self.config.base_url()
    }

    /// Current time according to the client's clock
    pub(crate) fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.clock.now(), 0).unwrap_or_else(Utc::now)
    }

    /// Return a token valid for at least the refresh margin, deriving a new
    /// one if none is cached or the cached one is about to expire.
    pub fn ensure_token(&self) -> Result<String> {
        let now = self.clock.now();
        if let Some(token) = self.tokens.get_fresh(now) {
            return Ok(token.value);
        }

        let key = AdminKey::parse(&self.admin_key)?;
        let token = Token::derive(&key, now)?;
        info!(kid = %key.key_id, expires_at = token.expires_at, "derived admin API token");

        let value = token.value.clone();
        self.tokens.store(token);
        Ok(value)
    }

    /// Make an admin API request and return the decoded body.
    ///
    /// # Arguments
    /// * `path` - Endpoint path below `/ghost/api/admin`, including any query
    /// * `method` - HTTP method (GET, POST, PUT, DELETE)
    /// * `body` - Optional JSON body
    ///
    /// # Returns
    /// `None` for 204 or empty responses, the parsed JSON otherwise
    pub async fn request(&self, path: &str, method: &str, body: Option<&Value>) -> Result<Option<Value>> {
        self.request_with_headers(path, method, body, &[]).await
    }

    /// Same as [`GhostApi::request`], with extra headers applied over the
    /// defaults; an extra header with a default's name replaces it
    pub async fn request_with_headers(
        &self,
        path: &str,
        method: &str,
        body: Option<&Value>,
        extra_headers: &[(&str, &str)],
    ) -> Result<Option<Value>> {
        let token = self.ensure_token()?;
        let url = format!("{}{}", self.config.api_url(), path);

        let http_method = Method::from_bytes(method.as_bytes())
            .map_err(|_| AdminError::InvalidInput(format!("invalid HTTP method: {}", method)))?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, header_value(&format!("Ghost {}", token))?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // Extra headers replace defaults of the same name
        for (name, value) in extra_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| AdminError::InvalidInput(format!("invalid header name: {}", name)))?;
            headers.insert(name, header_value(value)?);
        }

        let mut request = self.client.request(http_method, &url).headers(headers);

        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let start = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        debug!(
            %method,
            path,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "admin API request"
        );

        if !status.is_success() {
            let message = ErrorBody::message_for(&bytes, status.as_u16());
            return Err(AdminError::request(message, status.as_u16()));
        }

        if status == StatusCode::NO_CONTENT || bytes.is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Make a request and deserialize the body into the target type
    pub async fn request_json<T>(&self, path: &str, method: &str, body: Option<&Value>) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let value = self.request(path, method, body).await?;
        Ok(serde_json::from_value(value.unwrap_or(Value::Null))?)
    }

    /// GET a path and wrap the body; an empty body becomes `null`
    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        let value = self.request(path, "GET", None).await?;
        Ok(ApiResponse::new(value.unwrap_or(Value::Null)))
    }

    /// Fetch every page of a list endpoint and concatenate the items under `key`.
    ///
    /// Pages are requested one after another, starting at 1, until
    /// `meta.pagination.next` is null or absent. A page without `key` adds
    /// nothing. Fails with [`AdminError::PaginationLimit`] after
    /// `Config::max_pages` pages.
    pub async fn fetch_all_pages(&self, path_template: &str, key: &str, page_size: u32) -> Result<Vec<Value>> {
        let separator = if path_template.contains('?') { '&' } else { '?' };
        let mut items = Vec::new();
        let mut page: u32 = 1;

        loop {
            if page > self.config.max_pages {
                return Err(AdminError::PaginationLimit {
                    pages: self.config.max_pages,
                });
            }

            let path = format!("{}{}limit={}&page={}", path_template, separator, page_size, page);
            let response = self.get(&path).await?;
            let has_next = response.has_next_page();
            items.extend(response.into_items(key));

            if !has_next {
                break;
            }
            page += 1;
        }

        debug!(key, pages = page, count = items.len(), "fetched all pages");
        Ok(items)
    }

    /// Fetch the current revision marker (`updated_at`) of a resource
    pub async fn revision_marker(&self, collection: &str, id: &str) -> Result<String> {
        let response = self
            .get(&format!("/{}/{}/?fields=id,updated_at", collection, id))
            .await?;
        let path = format!("{}/0/updated_at", collection);
        response
            .get_string(&path)
            .ok_or(AdminError::MissingField(path))
    }

    /// Update a resource under the optimistic-concurrency rule.
    ///
    /// Reads the resource's current `updated_at`, then PUTs `fields` with that
    /// marker merged in. Returns the resource as reported by the server.
    pub async fn update_with_revision_check(&self, collection: &str, id: &str, fields: Value) -> Result<Value> {
        let Value::Object(mut fields) = fields else {
            return Err(AdminError::InvalidInput(
                "update fields must be a JSON object".to_string(),
            ));
        };

        let updated_at = self.revision_marker(collection, id).await?;
        fields.insert("updated_at".to_string(), Value::String(updated_at));

        let mut body = serde_json::Map::new();
        body.insert(collection.to_string(), Value::Array(vec![Value::Object(fields)]));
        let body = Value::Object(body);

        let response = self
            .request(&format!("/{}/{}/", collection, id), "PUT", Some(&body))
            .await?;

        let path = format!("{}/0", collection);
        ApiResponse::new(response.unwrap_or(Value::Null))
            .get(&path)
            .cloned()
            .ok_or(AdminError::MissingField(path))
    }

    /// Delete a single resource
    pub async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.request(&format!("/{}/{}/", collection, id), "DELETE", None)
            .await?;
        Ok(())
    }

    /// Delete resources one at a time.
    ///
    /// A failure is recorded against its id and the batch continues.
    pub async fn delete_many<I, S>(&self, collection: &str, ids: I) -> BulkDeleteResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut result = BulkDeleteResult::default();

        for id in ids {
            let id = id.as_ref();
            match self.delete(collection, id).await {
                Ok(()) => result.deleted.push(id.to_string()),
                Err(e) => {
                    warn!(collection, id, error = %e, "delete failed");
                    result.failed.push(FailedDelete {
                        id: id.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        result
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| AdminError::InvalidInput(format!("invalid header value: {}", value)))
}

impl std::fmt::Debug for GhostApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GhostApi")
            .field("base_url", &self.config.base_url())
            .field("admin_key", &"<redacted>")
            .finish()
    }
}
