use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// Tag as embedded in a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostTag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl PostTag {
    pub fn named(name: impl Into<String>) -> Self {
        PostTag {
            id: None,
            name: name.into(),
            slug: None,
        }
    }
}

/// Post as returned by the list and update endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub published_at: Option<Timestamp>,
    #[serde(default)]
    pub feature_image: Option<String>,
    #[serde(default)]
    pub custom_excerpt: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub tags: Vec<PostTag>,
}

impl Post {
    pub fn is_scheduled(&self) -> bool {
        self.status.as_deref() == Some("scheduled")
    }

    /// Names of the post's tags in order
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|t| t.name.as_str())
    }
}

/// Post counts included with `include=count.posts`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    #[serde(default)]
    pub posts: u64,
}

/// Tag as returned by the tag endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub count: Option<TagCount>,
}

impl Tag {
    /// Tags whose name starts with `#` are internal
    pub fn is_internal(&self) -> bool {
        self.name.starts_with('#')
    }

    pub fn post_count(&self) -> u64 {
        self.count.map(|c| c.posts).unwrap_or(0)
    }
}

/// Fields sent when creating or updating a tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TagData {
    pub fn named(name: impl Into<String>) -> Self {
        TagData {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Tag reference accepted when retagging a post.
///
/// A bare name asks the server to match or create the tag by name; a
/// reference carries an existing tag through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagInput {
    Ref { id: String, name: String },
    Name(String),
}

/// Wire shape of a tag entry in a post update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireTag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

impl TagInput {
    pub fn to_wire(&self) -> WireTag {
        match self {
            TagInput::Name(name) => WireTag {
                id: None,
                name: name.clone(),
            },
            TagInput::Ref { id, name } => WireTag {
                id: Some(id.clone()),
                name: name.clone(),
            },
        }
    }
}

impl From<&str> for TagInput {
    fn from(name: &str) -> Self {
        TagInput::Name(name.to_string())
    }
}

impl From<String> for TagInput {
    fn from(name: String) -> Self {
        TagInput::Name(name)
    }
}

impl From<&PostTag> for TagInput {
    fn from(tag: &PostTag) -> Self {
        match &tag.id {
            Some(id) => TagInput::Ref {
                id: id.clone(),
                name: tag.name.clone(),
            },
            None => TagInput::Name(tag.name.clone()),
        }
    }
}

/// One failed item of a bulk delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDelete {
    pub id: String,
    pub error: String,
}

/// Outcome of a bulk delete
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDeleteResult {
    pub deleted: Vec<String>,
    pub failed: Vec<FailedDelete>,
}

impl BulkDeleteResult {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tag_input_wire_shape() {
        let tags: Vec<TagInput> = vec!["ai".into(), "guide".into()];
        let wire: Vec<WireTag> = tags.iter().map(TagInput::to_wire).collect();
        assert_eq!(
            serde_json::to_value(&wire).unwrap(),
            json!([{"name": "ai"}, {"name": "guide"}])
        );

        let tags = vec![TagInput::Ref {
            id: "t1".to_string(),
            name: "ai".to_string(),
        }];
        let wire: Vec<WireTag> = tags.iter().map(TagInput::to_wire).collect();
        assert_eq!(
            serde_json::to_value(&wire).unwrap(),
            json!([{"id": "t1", "name": "ai"}])
        );
    }

    #[test]
    fn test_tag_input_deserializes_both_forms() {
        let tags: Vec<TagInput> =
            serde_json::from_value(json!(["ai", {"id": "t1", "name": "guide"}])).unwrap();
        assert_eq!(tags[0], TagInput::Name("ai".to_string()));
        assert_eq!(
            tags[1],
            TagInput::Ref {
                id: "t1".to_string(),
                name: "guide".to_string()
            }
        );
    }

    #[test]
    fn test_post_deserialization_tolerates_sparse_fields() {
        let post: Post = serde_json::from_value(json!({
            "id": "p1",
            "status": "scheduled",
            "tags": [{"id": "t1", "name": "news", "slug": "news"}],
            "unknown": 1
        }))
        .unwrap();
        assert!(post.is_scheduled());
        assert_eq!(post.tag_names().collect::<Vec<_>>(), vec!["news"]);
        assert!(post.published_at.is_none());
    }

    #[test]
    fn test_tag_internal_and_count() {
        let tag: Tag = serde_json::from_value(json!({
            "id": "t1", "name": "#hidden", "count": {"posts": 4}
        }))
        .unwrap();
        assert!(tag.is_internal());
        assert_eq!(tag.post_count(), 4);
    }

    #[test]
    fn test_tag_data_skips_unset_fields() {
        let data = TagData::named("Rust").with_description("Systems language");
        assert_eq!(
            serde_json::to_value(&data).unwrap(),
            json!({"name": "Rust", "description": "Systems language"})
        );
    }
}
