//! Client-side views over fetched posts and tags: tag filtering, common tags
//! of a selection, internal/public tag tabs, slugs and day grouping.

use chrono::{Days, NaiveDate};
use std::collections::{BTreeMap, HashSet};

use crate::model::{Post, Tag};

/// How a set of selected tags is matched against a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Post carries at least one selected tag
    #[default]
    Any,
    /// Post carries every selected tag
    All,
}

/// Filter posts by tag names, preserving order. No selected tags keeps every post.
pub fn filter_posts<'a, S: AsRef<str>>(posts: &'a [Post], selected: &[S], mode: FilterMode) -> Vec<&'a Post> {
    if selected.is_empty() {
        return posts.iter().collect();
    }

    let wanted: HashSet<&str> = selected.iter().map(|s| s.as_ref()).collect();

    posts
        .iter()
        .filter(|post| {
            let names: HashSet<&str> = post.tag_names().collect();
            match mode {
                FilterMode::Any => names.iter().any(|n| wanted.contains(n)),
                FilterMode::All => wanted.iter().all(|n| names.contains(n)),
            }
        })
        .collect()
}

/// Tag names shared by every selected post, in the first selected post's order
pub fn common_tags<S: AsRef<str>>(posts: &[Post], selected_ids: &[S]) -> Vec<String> {
    let ids: HashSet<&str> = selected_ids.iter().map(|s| s.as_ref()).collect();
    let mut selected = posts.iter().filter(|p| ids.contains(p.id.as_str()));

    let Some(first) = selected.next() else {
        return Vec::new();
    };

    let mut common: Vec<String> = Vec::new();
    for name in first.tag_names() {
        if !common.iter().any(|c| c == name) {
            common.push(name.to_string());
        }
    }

    for post in selected {
        let names: HashSet<&str> = post.tag_names().collect();
        common.retain(|c| names.contains(c.as_str()));
    }

    common
}

/// Tag listing tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagTab {
    #[default]
    Public,
    Internal,
}

/// Tags on the given tab matching `query` by name or slug, sorted by name.
/// Matching and sorting are case-insensitive.
pub fn filter_tags<'a>(tags: &'a [Tag], tab: TagTab, query: &str) -> Vec<&'a Tag> {
    let query = query.trim().to_lowercase();

    let mut filtered: Vec<&Tag> = tags
        .iter()
        .filter(|tag| tag.is_internal() == (tab == TagTab::Internal))
        .filter(|tag| {
            query.is_empty()
                || tag.name.to_lowercase().contains(&query)
                || tag
                    .slug
                    .as_deref()
                    .is_some_and(|s| s.to_lowercase().contains(&query))
        })
        .collect();

    filtered.sort_by_key(|tag| tag.name.to_lowercase());
    filtered
}

/// Derive a URL slug from a tag name
pub fn generate_slug(name: &str) -> String {
    let lower = name.to_lowercase();
    let lower = lower.strip_prefix('#').unwrap_or(&lower);

    let mut slug = String::with_capacity(lower.len());
    let mut pending_dash = false;

    for c in lower.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Group posts by the UTC day of publication. Posts without a date are skipped.
pub fn group_by_day(posts: &[Post]) -> BTreeMap<NaiveDate, Vec<&Post>> {
    let mut groups: BTreeMap<NaiveDate, Vec<&Post>> = BTreeMap::new();
    for post in posts {
        if let Some(published_at) = post.published_at {
            groups.entry(published_at.date()).or_default().push(post);
        }
    }
    groups
}

/// Append posts not already present by id, then sort by publication date.
/// Undated posts sort first.
pub fn merge_posts(existing: &mut Vec<Post>, incoming: Vec<Post>) {
    let known: HashSet<String> = existing.iter().map(|p| p.id.clone()).collect();
    existing.extend(incoming.into_iter().filter(|p| !known.contains(&p.id)));
    existing.sort_by_key(|p| p.published_at);
}

/// Posts shown in the list view: all scheduled posts plus anything published
/// since the day before `today`.
pub fn list_view_posts(posts: &[Post], today: NaiveDate) -> Vec<&Post> {
    let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    posts
        .iter()
        .filter(|post| {
            post.is_scheduled()
                || post
                    .published_at
                    .is_some_and(|published_at| published_at.date() >= yesterday)
        })
        .collect()
}
