use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured error body returned by the admin API on failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub errors: Vec<ErrorItem>,
}

/// A single entry of an error body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorItem {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

impl ErrorBody {
    /// Extract the message for a failed response body, falling back to `HTTP <status>`
    pub fn message_for(body: &[u8], status: u16) -> String {
        serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.errors.into_iter().next())
            .and_then(|e| e.message)
            .unwrap_or_else(|| format!("HTTP {}", status))
    }
}

/// Pagination metadata from `meta.pagination`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<Value>,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub next: Option<u32>,
    #[serde(default)]
    pub prev: Option<u32>,
}

/// ApiResponse wraps a decoded JSON body and provides path-based access.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse(pub Value);

impl ApiResponse {
    pub fn new(value: Value) -> Self {
        ApiResponse(value)
    }

    /// Get the raw body
    pub fn raw(&self) -> &Value {
        &self.0
    }

    /// Get a value by a slash-separated path.
    /// For example, "posts/0/updated_at" reads the first post's revision marker.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.0;

        for part in path.split('/').filter(|s| !s.is_empty()) {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(arr) => {
                    let index: usize = part.parse().ok()?;
                    arr.get(index)?
                }
                _ => return None,
            };
        }

        Some(current)
    }

    /// Get a string value by a slash-separated path
    pub fn get_string(&self, path: &str) -> Option<String> {
        self.get(path).and_then(|v| v.as_str().map(|s| s.to_string()))
    }

    /// Items of a collection key; absent or non-array values count as empty
    pub fn items(&self, key: &str) -> Vec<Value> {
        match self.0.get(key) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// Consume the response and take the items of a collection key
    pub fn into_items(self, key: &str) -> Vec<Value> {
        match self.0 {
            Value::Object(mut map) => match map.remove(key) {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// Pagination metadata, if the body carries any
    pub fn pagination(&self) -> Option<Pagination> {
        self.get("meta/pagination")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Whether another page follows this one.
    ///
    /// Only a present, non-null `meta.pagination.next` continues the loop.
    pub fn has_next_page(&self) -> bool {
        matches!(self.get("meta/pagination/next"), Some(v) if !v.is_null())
    }
}
