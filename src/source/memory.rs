//! In-memory content source, used for fixtures and previews

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use super::{Backing, ContentSource};
use crate::content::{ListingQuery, Post, PostSummary};
use crate::error::ContentError;

const SOURCE_NAME: &str = "memory";

/// A fixed set of posts held in memory
#[derive(Debug)]
pub struct MemorySource {
    posts: Vec<Post>,
    backing: Backing,
    unavailable: AtomicBool,
    latency: Option<Duration>,
    calls: AtomicUsize,
}

impl MemorySource {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            posts,
            backing: Backing::Api,
            unavailable: AtomicBool::new(false),
            latency: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_backing(mut self, backing: Backing) -> Self {
        self.backing = backing;
        self
    }

    /// Delay every call, simulating a slow upstream
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every subsequent call fail with `ContentError::Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of calls served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Result<(), ContentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ContentError::unavailable(SOURCE_NAME, "upstream timed out"));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn backing(&self) -> Backing {
        self.backing
    }

    async fn get_post_by_slug(&self, slug: &str) -> Result<Post, ContentError> {
        self.enter().await?;
        self.posts
            .iter()
            .find(|p| p.slug == slug)
            .cloned()
            .ok_or_else(|| ContentError::NotFound {
                slug: slug.to_string(),
            })
    }

    async fn get_all_slugs(&self) -> Result<Vec<String>, ContentError> {
        self.enter().await?;
        Ok(self.posts.iter().map(|p| p.slug.clone()).collect())
    }

    async fn list_posts(&self, query: &ListingQuery) -> Result<Vec<PostSummary>, ContentError> {
        self.enter().await?;
        let summaries = self
            .posts
            .iter()
            .filter(|p| match &query.category {
                Some(category) => p.category.as_deref().map_or(true, |c| c == category),
                None => true,
            })
            .map(Post::summary)
            .collect();
        Ok(query.apply(summaries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(slug: &str) -> Post {
        let mut post = Post::new(slug);
        post.title = Some(slug.to_string());
        post.body = Some("body".to_string());
        post
    }

    #[tokio::test]
    async fn test_every_listed_slug_resolves() {
        let source = MemorySource::new(vec![post("a"), post("b"), post("c")]);
        for slug in source.get_all_slugs().await.unwrap() {
            let fetched = source.get_post_by_slug(&slug).await.unwrap();
            assert_eq!(fetched.slug, slug);
        }
    }

    #[tokio::test]
    async fn test_unavailable_fails_every_call() {
        let source = MemorySource::new(vec![post("a")]);
        source.set_unavailable(true);
        assert!(source.get_all_slugs().await.unwrap_err().is_unavailable());
        assert!(source.get_post_by_slug("a").await.unwrap_err().is_unavailable());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_category_filter() {
        let mut other = post("x");
        other.category = Some("notes".to_string());
        let source = MemorySource::new(vec![post("a"), other]);
        let listed = source
            .list_posts(&ListingQuery::category("notes"))
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);

        let mut filed = post("b");
        filed.category = Some("blog".to_string());
        let source = MemorySource::new(vec![filed, post("c")]);
        let listed = source
            .list_posts(&ListingQuery::category("notes"))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].slug, "c");
    }
}
