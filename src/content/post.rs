//! Post models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A blog post as normalized by a content source.
///
/// `title` and `body` are optional because upstream records may omit them;
/// the assembler refuses to build a page without them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Slug (URL-friendly name), unique per source
    pub slug: String,

    /// Post title
    pub title: Option<String>,

    /// Raw markdown body
    pub body: Option<String>,

    /// Publication date
    pub date: Option<DateTime<Utc>>,

    /// Short summary shown in listings
    pub excerpt: Option<String>,

    /// Cover image URL
    pub cover_image: Option<String>,

    /// Category the post is filed under
    pub category: Option<String>,

    /// Post tags
    pub tags: Vec<String>,
}

impl Post {
    /// Create a post with only a slug set
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: None,
            body: None,
            date: None,
            excerpt: None,
            cover_image: None,
            category: None,
            tags: Vec::new(),
        }
    }

    /// Listing projection of this post
    pub fn summary(&self) -> PostSummary {
        PostSummary {
            slug: self.slug.clone(),
            title: self.title.clone().unwrap_or_default(),
            date: self.date,
            excerpt: self.excerpt.clone(),
            cover_image: self.cover_image.clone(),
        }
    }
}

/// The listing projection of a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    pub date: Option<DateTime<Utc>>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
}

/// Listing order: newest first, undated last, ties broken by slug
pub fn newest_first(a: &PostSummary, b: &PostSummary) -> Ordering {
    match (a.date, b.date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.slug.cmp(&b.slug))
}

/// A listing request against a content source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingQuery {
    /// Only posts filed under this category
    pub category: Option<String>,
    /// Slug after which results start
    pub cursor: Option<String>,
    /// Maximum number of results
    pub limit: Option<usize>,
}

impl ListingQuery {
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn after(mut self, slug: impl Into<String>) -> Self {
        self.cursor = Some(slug.into());
        self
    }

    /// Sort newest first, then apply the cursor and limit
    pub fn apply(&self, mut posts: Vec<PostSummary>) -> Vec<PostSummary> {
        posts.sort_by(newest_first);

        let start = match &self.cursor {
            Some(cursor) => posts
                .iter()
                .position(|p| &p.slug == cursor)
                .map(|i| i + 1)
                .unwrap_or(posts.len()),
            None => 0,
        };

        let mut page: Vec<_> = posts.into_iter().skip(start).collect();
        if let Some(limit) = self.limit {
            page.truncate(limit);
        }
        page
    }
}
