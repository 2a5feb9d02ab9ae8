use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use url::form_urlencoded;

use crate::error::Result;
use crate::model::{Post, TagInput, WireTag};
use crate::rest::GhostApi;
use crate::time::{start_of_day, start_of_month, to_iso_millis};

/// Fields requested for posts shown in the list and calendar
pub const POST_LIST_FIELDS: &str =
    "id,title,slug,status,published_at,feature_image,custom_excerpt,updated_at";

const POSTS_BY_TAG_FIELDS: &str = "id,title,meta_description,custom_excerpt";

pub const DEFAULT_POSTS_BY_TAG_LIMIT: u32 = 10;
pub const DEFAULT_RECENT_POSTS_LIMIT: u32 = 15;

fn encode(filter: &str) -> String {
    form_urlencoded::byte_serialize(filter.as_bytes()).collect()
}

/// Filter selecting published posts on or after `since`
pub fn published_since_filter(since: DateTime<Utc>) -> String {
    format!(
        "status:published+published_at:>='{}'",
        to_iso_millis(since)
    )
}

fn posts_from(value: Option<Value>) -> Result<Vec<Post>> {
    match value.as_ref().and_then(|v| v.get("posts")) {
        Some(posts) => Ok(serde_json::from_value(posts.clone())?),
        None => Ok(Vec::new()),
    }
}

impl GhostApi {
    /// Get every scheduled post, oldest first, with tags
    pub async fn scheduled_posts(&self) -> Result<Vec<Post>> {
        let path = format!(
            "/posts/?filter=status:scheduled&order=published_at%20asc&fields={}&include=tags&limit=all",
            POST_LIST_FIELDS
        );
        posts_from(self.request(&path, "GET", None).await?)
    }

    /// Get published posts from the start of `since`'s day, oldest first.
    ///
    /// Without `since`, the first day of the current month (by the client's
    /// clock) is used.
    pub async fn published_posts(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Post>> {
        let since = start_of_day(since.unwrap_or_else(|| start_of_month(self.now())));
        let path = format!(
            "/posts/?filter={}&order=published_at%20asc&fields={}&include=tags&limit=all",
            encode(&published_since_filter(since)),
            POST_LIST_FIELDS
        );
        posts_from(self.request(&path, "GET", None).await?)
    }

    /// Get the newest posts carrying a tag, by tag slug
    pub async fn posts_by_tag(&self, tag_slug: &str, limit: u32) -> Result<Vec<Post>> {
        let path = format!(
            "/posts/?filter={}&order=published_at%20desc&fields={}&limit={}",
            encode(&format!("tag:{}", tag_slug)),
            POSTS_BY_TAG_FIELDS,
            limit
        );
        posts_from(self.request(&path, "GET", None).await?)
    }

    /// Get the newest posts of any status
    pub async fn recent_posts(&self, limit: u32) -> Result<Vec<Post>> {
        let path = format!(
            "/posts/?order=published_at%20desc&fields=id,title,slug,status,published_at&limit={}",
            limit
        );
        posts_from(self.request(&path, "GET", None).await?)
    }

    /// Get the current revision marker of a post
    pub async fn post_updated_at(&self, post_id: &str) -> Result<String> {
        self.revision_marker("posts", post_id).await
    }

    /// Move a post to a new publication date
    pub async fn update_post_date(&self, post_id: &str, new_date: DateTime<Utc>) -> Result<Post> {
        let updated = self
            .update_with_revision_check(
                "posts",
                post_id,
                json!({ "published_at": to_iso_millis(new_date) }),
            )
            .await?;
        Ok(serde_json::from_value(updated)?)
    }

    /// Replace a post's tags.
    ///
    /// Bare names are sent as `{name}`; tag references pass through as `{id, name}`.
    pub async fn update_post_tags(&self, post_id: &str, tags: &[TagInput]) -> Result<Post> {
        let wire: Vec<WireTag> = tags.iter().map(TagInput::to_wire).collect();
        let updated = self
            .update_with_revision_check("posts", post_id, json!({ "tags": wire }))
            .await?;
        Ok(serde_json::from_value(updated)?)
    }

    /// URL of the post in the admin editor
    pub fn editor_url(&self, post_id: &str) -> String {
        format!("{}/ghost/#/editor/post/{}", self.base_url(), post_id)
    }
}
