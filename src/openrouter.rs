//! OpenRouter client used to draft SEO descriptions for tags.
//!
//! Model listings are cached in memory for three hours. Description
//! generation streams server-sent events and reports each text delta to a
//! callback as it arrives.

use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{AdminError, Result};
use crate::model::Post;

pub const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1";

/// How long a fetched model list stays valid
pub const MODELS_CACHE_TTL: Duration = Duration::from_secs(3 * 60 * 60);

const MAX_TOKENS: u32 = 300;
const REFERER: &str = "https://github.com/ghost-calendar-extension";
const TITLE: &str = "Ghost Calendar Extension";

/// Models offered without querying the API
pub const RECOMMENDED_MODELS: &[(&str, &str)] = &[
    ("google/gemini-2.0-flash-exp:free", "Gemini 2.0 Flash (free)"),
    ("meta-llama/llama-3.1-8b-instruct:free", "Llama 3.1 8B (free)"),
    ("google/gemma-2-9b-it:free", "Gemma 2 9B (free)"),
    ("openai/gpt-4o-mini", "GPT-4o Mini"),
    ("anthropic/claude-3-haiku", "Claude 3 Haiku"),
    ("mistralai/mistral-7b-instruct:free", "Mistral 7B (free)"),
];

/// Model id and display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
}

/// Per-token prices as decimal strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub completion: Option<String>,
}

/// Model entry from `GET /models`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteModel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pricing: Option<Pricing>,
}

impl RemoteModel {
    pub fn is_free(&self) -> bool {
        self.pricing.as_ref().is_some_and(|p| {
            p.prompt.as_deref() == Some("0") && p.completion.as_deref() == Some("0")
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelFilter {
    #[default]
    Recommended,
    Free,
    All,
}

/// Title and short description of a post used as prompt context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSummary {
    pub title: String,
    pub description: Option<String>,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        PostSummary {
            title: post.title.clone().unwrap_or_default(),
            description: post
                .meta_description
                .clone()
                .or_else(|| post.custom_excerpt.clone())
                .filter(|d| !d.is_empty()),
        }
    }
}

/// Parameters for one description generation
#[derive(Debug, Clone)]
pub struct DescriptionRequest<'a> {
    pub model: &'a str,
    pub tag_name: &'a str,
    pub posts: &'a [PostSummary],
    pub language: &'a str,
    pub custom_prompt: Option<&'a str>,
}

/// Build the system prompt for a tag description
pub fn build_system_prompt(
    tag_name: &str,
    posts: &[PostSummary],
    language: &str,
    custom_prompt: Option<&str>,
) -> String {
    let context = posts
        .iter()
        .map(|p| match &p.description {
            Some(d) => format!("- {}: {}", p.title, d),
            None => format!("- {}", p.title),
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = format!(
        "You are an SEO specialist writing tag descriptions for a blog.

Task: Write a concise description for the tag \"{}\".

Requirements:
- Maximum 500 characters
- Language: {}
- SEO-optimized: include relevant keywords naturally
- Describe what readers will find in this category
- Do not use quotes around the text
- Do not include the tag name at the very beginning",
        tag_name, language
    );

    if let Some(custom) = custom_prompt.filter(|c| !c.is_empty()) {
        prompt.push_str(&format!("\n\nAdditional instructions: {}", custom));
    }

    prompt.push_str(&format!("\n\nContext - recent posts in this tag:\n{}", context));
    prompt
}

/// Incremental decoder for the completion event stream.
///
/// Bytes are buffered until a full line is available, so events and UTF-8
/// sequences split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the content deltas of every completed line
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut deltas = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(delta) = parse_line(&line) {
                deltas.push(delta);
            }
        }

        deltas
    }

    /// Decode whatever is left once the stream ends
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&rest)
    }
}

fn parse_line(line: &[u8]) -> Option<String> {
    let line = std::str::from_utf8(line).ok()?.trim_end_matches(['\r', '\n']);
    let data = line.strip_prefix("data: ")?;
    if data == "[DONE]" {
        return None;
    }

    // Keep-alives and malformed events are skipped
    let parsed: Value = serde_json::from_str(data).ok()?;
    parsed
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// OpenRouter API client
pub struct OpenRouterApi {
    client: Client,
    api_key: String,
    base_url: String,
    models_cache: Mutex<Option<(Instant, Vec<RemoteModel>)>>,
}

impl OpenRouterApi {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(OpenRouterApi {
            client: Client::builder().build()?,
            api_key: api_key.into(),
            base_url: OPENROUTER_API_URL.to_string(),
            models_cache: Mutex::new(None),
        })
    }

    /// Point the client at another API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Fetch every model the API offers
    pub async fn fetch_models(&self) -> Result<Vec<RemoteModel>> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdminError::OpenRouter(format!(
                "failed to fetch models: {}",
                status.as_u16()
            )));
        }

        let body: Value = response.json().await?;
        match body.get("data") {
            Some(data) => Ok(serde_json::from_value(data.clone())?),
            None => Ok(Vec::new()),
        }
    }

    /// List models for a picker.
    ///
    /// `Recommended` needs no network. `Free` and `All` read through the cache.
    pub async fn models(&self, filter: ModelFilter) -> Result<Vec<ModelInfo>> {
        if filter == ModelFilter::Recommended {
            return Ok(RECOMMENDED_MODELS
                .iter()
                .map(|(id, name)| ModelInfo {
                    id: id.to_string(),
                    name: name.to_string(),
                })
                .collect());
        }

        let models = match self.cached_models() {
            Some(models) => models,
            None => {
                let models = self.fetch_models().await?;
                debug!(count = models.len(), "refreshed OpenRouter model cache");
                let mut cache = self.models_cache.lock().unwrap_or_else(|e| e.into_inner());
                *cache = Some((Instant::now(), models.clone()));
                models
            }
        };

        Ok(models
            .into_iter()
            .filter(|m| filter == ModelFilter::All || m.is_free())
            .map(|m| ModelInfo {
                name: m.name.unwrap_or_else(|| m.id.clone()),
                id: m.id,
            })
            .collect())
    }

    fn cached_models(&self) -> Option<Vec<RemoteModel>> {
        let cache = self.models_cache.lock().unwrap_or_else(|e| e.into_inner());
        cache
            .as_ref()
            .filter(|(fetched_at, _)| fetched_at.elapsed() < MODELS_CACHE_TTL)
            .map(|(_, models)| models.clone())
    }

    /// Stream a tag description, calling `on_chunk(delta, full_text)` for each
    /// piece of text. Returns the full text, or [`AdminError::Cancelled`] once
    /// `cancel` fires.
    pub async fn generate_description<F>(
        &self,
        request: &DescriptionRequest<'_>,
        mut on_chunk: F,
        cancel: &CancellationToken,
    ) -> Result<String>
    where
        F: FnMut(&str, &str),
    {
        let system_prompt = build_system_prompt(
            request.tag_name,
            request.posts,
            request.language,
            request.custom_prompt,
        );

        let body = json!({
            "model": request.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": "Generate the description."}
            ],
            "stream": true,
            "max_tokens": MAX_TOKENS
        });

        let send = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
            .json(&body)
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AdminError::Cancelled),
            response = send => response?,
        };

        let status = response.status();
        if !status.is_success() {
            let bytes = response.bytes().await.unwrap_or_default();
            let message = serde_json::from_slice::<Value>(&bytes)
                .ok()
                .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(AdminError::OpenRouter(message));
        }

        let mut stream = response.bytes_stream();
        let mut decoder = SseDecoder::new();
        let mut full_text = String::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AdminError::Cancelled),
                next = stream.next() => next,
            };

            let Some(bytes) = next else {
                break;
            };

            for delta in decoder.push(&bytes?) {
                full_text.push_str(&delta);
                on_chunk(&delta, &full_text);
            }
        }

        if let Some(delta) = decoder.finish() {
            full_text.push_str(&delta);
            on_chunk(&delta, &full_text);
        }

        debug!(model = request.model, chars = full_text.len(), "generated tag description");
        Ok(full_text)
    }
}

impl std::fmt::Debug for OpenRouterApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterApi")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn summaries() -> Vec<PostSummary> {
        vec![
            PostSummary {
                title: "Getting started with Rust".to_string(),
                description: Some("Install the toolchain".to_string()),
            },
            PostSummary {
                title: "Ownership explained".to_string(),
                description: None,
            },
        ]
    }

    fn event(content: &str) -> String {
        format!(
            "data: {}\n\n",
            json!({"choices": [{"delta": {"content": content}}]})
        )
    }

    #[test]
    fn test_system_prompt() {
        let prompt = build_system_prompt("rust", &summaries(), "English", Some("Be playful"));
        assert!(prompt.contains("description for the tag \"rust\""));
        assert!(prompt.contains("- Language: English"));
        assert!(prompt.contains("Maximum 500 characters"));
        assert!(prompt.contains("Additional instructions: Be playful"));
        assert!(prompt.ends_with(
            "Context - recent posts in this tag:\n- Getting started with Rust: Install the toolchain\n- Ownership explained"
        ));

        let prompt = build_system_prompt("rust", &[], "German", None);
        assert!(!prompt.contains("Additional instructions"));
    }

    #[test]
    fn test_post_summary_prefers_meta_description() {
        let post: Post = serde_json::from_value(json!({
            "id": "p1",
            "title": "Hello",
            "meta_description": "Meta",
            "custom_excerpt": "Excerpt"
        }))
        .unwrap();
        assert_eq!(PostSummary::from(&post).description.as_deref(), Some("Meta"));
    }

    #[test]
    fn test_sse_decoder_handles_split_events() {
        let stream = format!("{}{}data: [DONE]\n\n", event("Héllo"), event(" world"));
        let bytes = stream.as_bytes();

        let mut decoder = SseDecoder::new();
        let mut deltas = Vec::new();
        // One byte at a time splits both lines and the UTF-8 sequence
        for b in bytes {
            deltas.extend(decoder.push(std::slice::from_ref(b)));
        }
        assert_eq!(decoder.finish(), None);
        assert_eq!(deltas, vec!["Héllo".to_string(), " world".to_string()]);
    }

    #[test]
    fn test_sse_decoder_skips_noise() {
        let mut decoder = SseDecoder::new();
        let deltas = decoder.push(b": OPENROUTER PROCESSING\n\ndata: {not json}\ndata: {\"choices\":[]}\n");
        assert!(deltas.is_empty());
    }

    #[test]
    fn test_remote_model_is_free() {
        let free: RemoteModel = serde_json::from_value(json!({
            "id": "a", "pricing": {"prompt": "0", "completion": "0"}
        }))
        .unwrap();
        let paid: RemoteModel = serde_json::from_value(json!({
            "id": "b", "pricing": {"prompt": "0.000001", "completion": "0"}
        }))
        .unwrap();
        let unknown: RemoteModel = serde_json::from_value(json!({"id": "c"})).unwrap();
        assert!(free.is_free());
        assert!(!paid.is_free());
        assert!(!unknown.is_free());
    }

    #[tokio::test]
    async fn test_recommended_models_need_no_network() {
        let api = OpenRouterApi::new("key").unwrap().with_base_url("http://127.0.0.1:9");
        let models = api.models(ModelFilter::Recommended).await.unwrap();
        assert_eq!(models.len(), 6);
        assert_eq!(models[0].id, "google/gemini-2.0-flash-exp:free");
    }

    #[tokio::test]
    async fn test_models_filtered_and_cached() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("Authorization", "Bearer key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"id": "free/model", "name": "Free", "pricing": {"prompt": "0", "completion": "0"}},
                    {"id": "paid/model", "name": "Paid", "pricing": {"prompt": "0.1", "completion": "0.2"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = OpenRouterApi::new("key").unwrap().with_base_url(server.uri());
        let free = api.models(ModelFilter::Free).await.unwrap();
        assert_eq!(free, vec![ModelInfo { id: "free/model".to_string(), name: "Free".to_string() }]);

        // Served from cache
        let all = api.models(ModelFilter::All).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_models_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let api = OpenRouterApi::new("bad").unwrap().with_base_url(server.uri());
        let err = api.fetch_models().await.unwrap_err();
        assert!(matches!(err, AdminError::OpenRouter(ref m) if m == "failed to fetch models: 401"));
    }

    #[tokio::test]
    async fn test_generate_description_streams_chunks() {
        let server = MockServer::start().await;

        let body = format!("{}{}data: [DONE]\n\n", event("Tutorials"), event(" on Rust."));
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("X-Title", TITLE))
            .and(body_partial_json(json!({"model": "m", "stream": true, "max_tokens": 300})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .expect(1)
            .mount(&server)
            .await;

        let api = OpenRouterApi::new("key").unwrap().with_base_url(server.uri());
        let posts = summaries();
        let request = DescriptionRequest {
            model: "m",
            tag_name: "rust",
            posts: &posts,
            language: "English",
            custom_prompt: None,
        };

        let mut seen = Vec::new();
        let text = api
            .generate_description(&request, |delta, full| seen.push((delta.to_string(), full.to_string())), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(text, "Tutorials on Rust.");
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1], (" on Rust.".to_string(), "Tutorials on Rust.".to_string()));
    }

    #[tokio::test]
    async fn test_generate_description_error_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "error": {"message": "Insufficient credits"}
            })))
            .mount(&server)
            .await;

        let api = OpenRouterApi::new("key").unwrap().with_base_url(server.uri());
        let request = DescriptionRequest {
            model: "m",
            tag_name: "rust",
            posts: &[],
            language: "English",
            custom_prompt: None,
        };
        let err = api
            .generate_description(&request, |_, _| {}, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::OpenRouter(ref m) if m == "Insufficient credits"));
    }

    #[tokio::test]
    async fn test_generate_description_cancelled() {
        let api = OpenRouterApi::new("key").unwrap().with_base_url("http://127.0.0.1:9");
        let request = DescriptionRequest {
            model: "m",
            tag_name: "rust",
            posts: &[],
            language: "English",
            custom_prompt: None,
        };
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = api
            .generate_description(&request, |_, _| {}, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Cancelled));
    }
}
