//! Local content source - markdown/MDX files with front-matter

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use walkdir::WalkDir;

use super::{Backing, ContentSource};
use crate::content::{FrontMatter, ListingQuery, Post, PostSummary};
use crate::error::ContentError;

const SOURCE_NAME: &str = "local";

/// Loads posts from `<content_dir>/<category>/` and pages from `<content_dir>/`.
///
/// The configured category is scanned at most once per instance; a build
/// creates a fresh source, so later builds see new files.
#[derive(Debug)]
pub struct LocalSource {
    content_dir: PathBuf,
    /// Category whose posts back the single-post routes
    category: String,
    render_drafts: bool,
    posts: OnceCell<Arc<Vec<Post>>>,
    scans: AtomicUsize,
}

impl LocalSource {
    /// Create a new local source
    pub fn new<P: AsRef<Path>>(content_dir: P, category: &str, render_drafts: bool) -> Self {
        Self {
            content_dir: content_dir.as_ref().to_path_buf(),
            category: category.to_string(),
            render_drafts,
            posts: OnceCell::new(),
            scans: AtomicUsize::new(0),
        }
    }

    /// Number of directory scans performed so far
    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    /// All published posts filed under a category
    async fn posts_in(&self, category: &str) -> Result<Arc<Vec<Post>>, ContentError> {
        if category == self.category {
            let posts = self.posts.get_or_try_init(|| self.scan(category)).await?;
            Ok(Arc::clone(posts))
        } else {
            self.scan(category).await
        }
    }

    /// Walk a category directory on the blocking pool
    async fn scan(&self, category: &str) -> Result<Arc<Vec<Post>>, ContentError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        let posts_dir = self.content_dir.join(category);
        let category = category.to_string();
        let render_drafts = self.render_drafts;

        tokio::task::spawn_blocking(move || load_posts(&posts_dir, &category, render_drafts))
            .await
            .map_err(|e| ContentError::unavailable(SOURCE_NAME, e))?
            .map(Arc::new)
    }

    /// Load a standalone page such as `about`
    pub fn load_page(&self, name: &str) -> Result<Post, ContentError> {
        let path = ["md", "mdx"]
            .iter()
            .map(|ext| self.content_dir.join(format!("{}.{}", name, ext)))
            .find(|p| p.is_file())
            .ok_or_else(|| ContentError::NotFound {
                slug: name.to_string(),
            })?;

        let content =
            fs::read_to_string(&path).map_err(|e| ContentError::unavailable(SOURCE_NAME, e))?;
        let (fm, body) = FrontMatter::parse(&content).map_err(|e| {
            ContentError::unavailable(SOURCE_NAME, format!("{}: {}", path.display(), e))
        })?;

        Ok(Post {
            slug: name.to_string(),
            title: fm.title.clone(),
            body: Some(body.to_string()),
            date: fm.parse_date(),
            excerpt: fm.excerpt.clone().or_else(|| fm.description.clone()),
            cover_image: fm.cover_image.clone(),
            category: None,
            tags: fm.tags,
        })
    }
}

#[async_trait]
impl ContentSource for LocalSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn backing(&self) -> Backing {
        Backing::Local
    }

    async fn get_post_by_slug(&self, slug: &str) -> Result<Post, ContentError> {
        self.posts_in(&self.category)
            .await?
            .iter()
            .find(|p| p.slug == slug)
            .cloned()
            .ok_or_else(|| ContentError::NotFound {
                slug: slug.to_string(),
            })
    }

    async fn get_all_slugs(&self) -> Result<Vec<String>, ContentError> {
        Ok(self
            .posts_in(&self.category)
            .await?
            .iter()
            .map(|p| p.slug.clone())
            .collect())
    }

    async fn list_posts(&self, query: &ListingQuery) -> Result<Vec<PostSummary>, ContentError> {
        let category = query.category.as_deref().unwrap_or(&self.category);
        let summaries = self
            .posts_in(category)
            .await?
            .iter()
            .map(Post::summary)
            .collect();
        Ok(query.apply(summaries))
    }
}

/// Load all published posts under `posts_dir`
fn load_posts(
    posts_dir: &Path,
    category: &str,
    render_drafts: bool,
) -> Result<Vec<Post>, ContentError> {
    if !posts_dir.exists() {
        tracing::debug!("No posts directory at {:?}", posts_dir);
        return Ok(Vec::new());
    }

    let mut posts = Vec::new();

    for entry in WalkDir::new(posts_dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| ContentError::unavailable(SOURCE_NAME, e))?;
        let path = entry.path();
        if !path.is_file() || !is_markdown_file(path) {
            continue;
        }

        match load_post(path, category, render_drafts)? {
            Some(post) => posts.push(post),
            None => tracing::debug!("Skipping unpublished post {:?}", path),
        }
    }

    Ok(posts)
}

/// Load a single post; `None` when it is a draft and drafts are hidden
fn load_post(
    path: &Path,
    category: &str,
    render_drafts: bool,
) -> Result<Option<Post>, ContentError> {
    let content =
        fs::read_to_string(path).map_err(|e| ContentError::unavailable(SOURCE_NAME, e))?;

    let (fm, body) = match FrontMatter::parse(&content) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Failed to load post {:?}: {}", path, e);
            return Ok(None);
        }
    };

    if !fm.is_published() && !render_drafts {
        return Ok(None);
    }

    let slug = fm.slug.clone().unwrap_or_else(|| file_stem(path));

    Ok(Some(Post {
        slug,
        title: fm.title.clone(),
        body: Some(body.to_string()),
        date: fm.parse_date(),
        excerpt: fm.excerpt.clone().or_else(|| fm.description.clone()),
        cover_image: fm.cover_image.clone(),
        category: fm.category.clone().or_else(|| Some(category.to_string())),
        tags: fm.tags,
    }))
}

/// Check if a file is a markdown or MDX file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e, "md" | "mdx" | "markdown"))
        .unwrap_or(false)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> TempDir {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "blog/first-post.mdx",
            "---\ntitle: First\ndate: 2022-01-01\n---\nHello there\n",
        );
        write(
            tmp.path(),
            "blog/second-post.md",
            "---\ntitle: Second\ndate: 2022-02-01\nsummary: Short\n---\nMore words\n",
        );
        write(
            tmp.path(),
            "blog/wip.md",
            "---\ntitle: Wip\ndate: 2022-03-01\ndraft: true\n---\nNot yet\n",
        );
        write(tmp.path(), "blog/notes.txt", "ignored");
        write(tmp.path(), "about.mdx", "---\ntitle: About Me\n---\nI write code.\n");
        tmp
    }

    #[tokio::test]
    async fn test_slugs_skip_drafts() {
        let tmp = fixture();
        let source = LocalSource::new(tmp.path(), "blog", false);
        let mut slugs = source.get_all_slugs().await.unwrap();
        slugs.sort();
        assert_eq!(slugs, vec!["first-post", "second-post"]);
    }

    #[tokio::test]
    async fn test_render_drafts_includes_drafts() {
        let tmp = fixture();
        let source = LocalSource::new(tmp.path(), "blog", true);
        assert_eq!(source.get_all_slugs().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_get_post_by_slug() {
        let tmp = fixture();
        let source = LocalSource::new(tmp.path(), "blog", false);
        let post = source.get_post_by_slug("second-post").await.unwrap();
        assert_eq!(post.slug, "second-post");
        assert_eq!(post.title.as_deref(), Some("Second"));
        assert_eq!(post.excerpt.as_deref(), Some("Short"));
        assert_eq!(post.category.as_deref(), Some("blog"));
        assert!(post.body.unwrap().contains("More words"));
    }

    #[tokio::test]
    async fn test_missing_slug_is_not_found() {
        let tmp = fixture();
        let source = LocalSource::new(tmp.path(), "blog", false);
        let err = source.get_post_by_slug("nope").await.unwrap_err();
        assert_eq!(
            err,
            ContentError::NotFound {
                slug: "nope".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_list_posts_newest_first() {
        let tmp = fixture();
        let source = LocalSource::new(tmp.path(), "blog", false);
        let posts = source
            .list_posts(&ListingQuery::category("blog"))
            .await
            .unwrap();
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["second-post", "first-post"]);
    }

    #[tokio::test]
    async fn test_category_is_scanned_once() {
        let tmp = fixture();
        let source = LocalSource::new(tmp.path(), "blog", false);
        for slug in source.get_all_slugs().await.unwrap() {
            source.get_post_by_slug(&slug).await.unwrap();
            source
                .list_posts(&ListingQuery::category("blog"))
                .await
                .unwrap();
        }
        assert_eq!(source.scans(), 1);

        source
            .list_posts(&ListingQuery::category("notes"))
            .await
            .unwrap();
        assert_eq!(source.scans(), 2);
    }

    #[tokio::test]
    async fn test_missing_category_is_empty() {
        let tmp = TempDir::new().unwrap();
        let source = LocalSource::new(tmp.path(), "blog", false);
        assert!(source.get_all_slugs().await.unwrap().is_empty());
    }

    #[test]
    fn test_load_page() {
        let tmp = fixture();
        let source = LocalSource::new(tmp.path(), "blog", false);
        let about = source.load_page("about").unwrap();
        assert_eq!(about.title.as_deref(), Some("About Me"));
        assert!(matches!(
            source.load_page("contact"),
            Err(ContentError::NotFound { .. })
        ));
    }
}
