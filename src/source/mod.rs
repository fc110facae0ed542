//! Content sources - the call contract between the build and wherever posts live
//!
//! Every source answers the same three questions: which slugs exist, what a
//! single post looks like, and which posts a listing shows. Each call is a
//! single attempt; failures surface as [`ContentError`] and are never retried
//! here.

mod graph;
mod local;
mod memory;

use async_trait::async_trait;

use crate::content::{ListingQuery, Post, PostSummary};
use crate::error::ContentError;

pub use graph::GraphSource;
pub use local::LocalSource;
pub use memory::MemorySource;

/// Where a source's data comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backing {
    /// Remote content API; pages built from it are periodically regenerated
    Api,
    /// Files shipped with the site
    Local,
}

/// Unified content source interface
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Source name used in logs and errors
    fn name(&self) -> &str;

    fn backing(&self) -> Backing;

    /// Fetch one post; `ContentError::NotFound` when the slug does not exist
    async fn get_post_by_slug(&self, slug: &str) -> Result<Post, ContentError>;

    /// Every slug the source knows about
    async fn get_all_slugs(&self) -> Result<Vec<String>, ContentError>;

    /// Post summaries, newest first
    async fn list_posts(&self, query: &ListingQuery) -> Result<Vec<PostSummary>, ContentError>;
}
