use serde_json::{json, Value};

use crate::error::{AdminError, Result};
use crate::model::{BulkDeleteResult, Tag, TagData};
use crate::response::ApiResponse;
use crate::rest::{GhostApi, DEFAULT_PAGE_SIZE};

fn tags_from(items: Vec<Value>) -> Result<Vec<Tag>> {
    Ok(serde_json::from_value(Value::Array(items))?)
}

fn first_tag(response: Option<Value>) -> Result<Tag> {
    let tag = ApiResponse::new(response.unwrap_or(Value::Null))
        .get("tags/0")
        .cloned()
        .ok_or_else(|| AdminError::MissingField("tags/0".to_string()))?;
    Ok(serde_json::from_value(tag)?)
}

impl GhostApi {
    /// Get every tag with id, name and slug
    pub async fn all_tags(&self) -> Result<Vec<Tag>> {
        let items = self
            .fetch_all_pages("/tags/?fields=id,name,slug", "tags", DEFAULT_PAGE_SIZE)
            .await?;
        tags_from(items)
    }

    /// Get every tag with its post count
    pub async fn tags_with_count(&self) -> Result<Vec<Tag>> {
        let items = self
            .fetch_all_pages("/tags/?include=count.posts", "tags", DEFAULT_PAGE_SIZE)
            .await?;
        tags_from(items)
    }

    /// Create a tag
    pub async fn create_tag(&self, data: &TagData) -> Result<Tag> {
        let body = json!({ "tags": [data] });
        first_tag(self.request("/tags/", "POST", Some(&body)).await?)
    }

    /// Update a tag's name, slug or description
    pub async fn update_tag(&self, tag_id: &str, data: &TagData) -> Result<Tag> {
        let body = json!({ "tags": [data] });
        first_tag(
            self.request(&format!("/tags/{}/", tag_id), "PUT", Some(&body))
                .await?,
        )
    }

    pub async fn delete_tag(&self, tag_id: &str) -> Result<()> {
        self.delete("tags", tag_id).await
    }

    /// Delete several tags, one at a time, collecting per-tag failures
    pub async fn delete_tags<I, S>(&self, tag_ids: I) -> BulkDeleteResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.delete_many("tags", tag_ids).await
    }
}
