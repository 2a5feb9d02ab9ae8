//! # ghost-admin - Ghost Admin API client for Rust
//!
//! An async client for the admin REST API of a self-hosted Ghost blog,
//! covering what a scheduling and tagging front end needs: listing scheduled
//! and published posts, moving posts between days, retagging, and tag CRUD.
//!
//! ## Features
//!
//! - HS256 admin tokens derived from an `id:secret` key, refreshed lazily
//!   30 seconds before they expire
//! - Structured error extraction from failed responses
//! - Transparent, bounded pagination of list endpoints
//! - Read-before-write updates carrying the resource's `updated_at`
//! - Sequential bulk delete with per-item failure reporting
//! - Client-side post and tag filtering helpers
//! - OpenRouter integration for drafting tag descriptions
//!
//! ## Basic Usage
//!
//! ```no_run
//! use ghost_admin::{GhostApi, TagInput};
//!
//! # async fn run() -> ghost_admin::Result<()> {
//! let api = GhostApi::new("https://blog.example.com", "6489a1b2c3d4e5f6a7b8c9d0:aabbccdd")?;
//!
//! for post in api.scheduled_posts().await? {
//!     println!("{} at {:?}", post.id, post.published_at);
//! }
//!
//! let tags: Vec<TagInput> = vec!["rust".into(), "guides".into()];
//! api.update_post_tags("6489a1b2c3d4e5f6a7b8c9d1", &tags).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Bulk delete
//!
//! ```no_run
//! # async fn run(api: ghost_admin::GhostApi) {
//! let result = api.delete_tags(["t1", "t2", "t3"]).await;
//! for failure in &result.failed {
//!     eprintln!("could not delete {}: {}", failure.id, failure.error);
//! }
//! # }
//! ```

pub mod client;
pub mod credential;
pub mod error;
pub mod filter;
pub mod model;
pub mod openrouter;
pub mod posts;
pub mod response;
pub mod rest;
pub mod settings;
pub mod tags;
pub mod time;
pub mod token;

// Re-export main types for convenience
pub use client::Config;
pub use credential::AdminKey;
pub use error::{AdminError, Result};
pub use filter::{FilterMode, TagTab};
pub use model::{BulkDeleteResult, FailedDelete, Post, PostTag, Tag, TagData, TagInput};
pub use openrouter::{DescriptionRequest, ModelFilter, OpenRouterApi, PostSummary};
pub use response::ApiResponse;
pub use rest::{GhostApi, DEFAULT_PAGE_SIZE};
pub use settings::{OpenRouterSettings, Settings};
pub use time::Timestamp;
pub use token::{Clock, ManualClock, SystemClock, Token};

// Re-export serde_json for convenience
pub use serde_json::json;
