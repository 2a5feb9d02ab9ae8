use thiserror::Error;

/// Main error type for Ghost Admin API operations
#[derive(Debug, Error)]
pub enum AdminError {
    /// Malformed or insecure blog URL, raised at construction
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Admin key is not in `id:secret` form
    #[error("invalid API key format, expected id:secret")]
    InvalidCredentialFormat,

    /// Admin key secret is not even-length hex
    #[error("invalid secret in API key: {0}")]
    InvalidSecretFormat(String),

    /// Non-success HTTP response from the admin API
    #[error("{message}")]
    Request { message: String, status: u16 },

    /// Pagination did not terminate within the configured bound
    #[error("pagination exceeded {pages} pages")]
    PaginationLimit { pages: u32 },

    /// A field the protocol relies on was absent from a response
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Caller supplied input the protocol cannot carry
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Blog URL or admin key not configured
    #[error("settings not configured: {0}")]
    SettingsMissing(String),

    /// Error reported by the OpenRouter API
    #[error("OpenRouter error: {0}")]
    OpenRouter(String),

    /// Streaming operation cancelled by the caller
    #[error("operation cancelled")]
    Cancelled,

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Hex decoding error
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}

impl AdminError {
    /// Create a new request error
    pub fn request(message: impl Into<String>, status: u16) -> Self {
        AdminError::Request {
            message: message.into(),
            status,
        }
    }

    /// Get the HTTP status code if this is a request error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AdminError::Request { status, .. } => Some(*status),
            AdminError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, AdminError::Request { status: 404, .. })
    }

    /// Check if the server rejected a stale revision marker (409)
    pub fn is_conflict(&self) -> bool {
        matches!(self, AdminError::Request { status: 409, .. })
    }
}

/// Result type for Ghost Admin API operations
pub type Result<T> = std::result::Result<T, AdminError>;
