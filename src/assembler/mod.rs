//! Page data assembler - the only writer of page props
//!
//! For each planned path the assembler fetches what the page needs, derives
//! reading time and SEO metadata, and decides whether the page carries a
//! revalidation interval. Required content fields are never defaulted.

mod reading_time;
mod seo;

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::SiteConfig;
use crate::content::{ListingQuery, MarkdownRenderer, Post, PostSummary};
use crate::error::{AssemblyError, BuildError, ContentError};
use crate::planner::{PageKind, PlannedPath};
use crate::source::{Backing, ContentSource, LocalSource};

pub use reading_time::{count_words, reading_time, ReadingTime};
pub use seo::{canonical_url, OgImage, OpenGraph, SeoMetadata, TwitterCard};

/// Serializable payload for one page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PageProps(Map<String, Value>);

impl PageProps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize `value` into the props under `key`
    fn insert<T: Serialize + ?Sized>(
        &mut self,
        path: &str,
        key: &str,
        value: &T,
    ) -> Result<(), AssemblyError> {
        let value = serde_json::to_value(value).map_err(|source| AssemblyError::Serialize {
            path: path.to_string(),
            source,
        })?;
        self.0.insert(key.to_string(), value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}

/// Everything produced for one concrete path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageArtifact {
    pub path: String,
    pub route: String,
    pub page: PageKind,
    pub props: PageProps,
    pub seo: SeoMetadata,
    /// Seconds a pre-rendered copy may be served before regeneration
    pub revalidate: Option<u64>,
    /// Rendered fragments keyed by file name, filled in by the presentation layer
    #[serde(skip)]
    pub fragments: BTreeMap<String, String>,
}

/// Post fields exposed to the single-post page
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PostProps<'a> {
    slug: &'a str,
    title: &'a str,
    date: Option<chrono::DateTime<chrono::Utc>>,
    excerpt: Option<&'a str>,
    cover_image: Option<&'a str>,
    tags: &'a [String],
    reading_time: ReadingTime,
}

/// Builds page artifacts from planned paths
pub struct PageAssembler {
    config: Arc<SiteConfig>,
    renderer: Arc<MarkdownRenderer>,
    /// Source backing the blog listing and single-post pages
    posts: Arc<dyn ContentSource>,
    /// Local files backing the home and about pages
    local: Arc<LocalSource>,
}

impl PageAssembler {
    pub fn new(
        config: Arc<SiteConfig>,
        renderer: Arc<MarkdownRenderer>,
        posts: Arc<dyn ContentSource>,
        local: Arc<LocalSource>,
    ) -> Self {
        Self {
            config,
            renderer,
            posts,
            local,
        }
    }

    /// Fetch, derive and package the props for one path
    pub async fn assemble(&self, planned: &PlannedPath) -> Result<PageArtifact, BuildError> {
        tracing::debug!("Assembling {}", planned.path);
        match planned.page {
            PageKind::Home => self.home(planned).await,
            PageKind::About => self.about(planned),
            PageKind::BlogIndex => self.blog_index(planned).await,
            PageKind::BlogPost => self.blog_post(planned).await,
        }
    }

    async fn home(&self, planned: &PlannedPath) -> Result<PageArtifact, BuildError> {
        let query = ListingQuery::category(&self.config.listing.category)
            .with_limit(self.config.listing.preview_count);
        let posts = self
            .local
            .list_posts(&query)
            .await
            .map_err(|e| content_error(planned, e))?;
        require_titles(planned, &posts)?;

        let seo = SeoMetadata::for_page(&self.config, "Home", &planned.path);

        let mut props = PageProps::new();
        props.insert(&planned.path, "heading", &self.config.home.heading)?;
        props.insert(&planned.path, "intro", &self.config.home.intro)?;
        props.insert(&planned.path, "jobs", &self.config.jobs)?;
        props.insert(&planned.path, "posts", &posts)?;
        props.insert(&planned.path, "seo", &seo)?;

        Ok(artifact(planned, props, seo, None))
    }

    fn about(&self, planned: &PlannedPath) -> Result<PageArtifact, BuildError> {
        let page = self
            .local
            .load_page("about")
            .map_err(|e| content_error(planned, e))?;
        let (title, body) = require_content(planned, &page)?;
        let source = self.serialize(planned, &page.slug, body)?;

        let seo = SeoMetadata::for_page(&self.config, "About", &planned.path);

        let about = serde_json::json!({
            "frontMatter": {
                "title": title,
                "date": page.date,
                "excerpt": page.excerpt,
            },
            "mdxSource": source,
        });

        let mut props = PageProps::new();
        props.insert(&planned.path, "about", &about)?;
        props.insert(&planned.path, "seo", &seo)?;

        Ok(artifact(planned, props, seo, None))
    }

    async fn blog_index(&self, planned: &PlannedPath) -> Result<PageArtifact, BuildError> {
        let query = ListingQuery::category(&self.config.listing.category);
        let posts = self
            .posts
            .list_posts(&query)
            .await
            .map_err(|e| content_error(planned, e))?;
        require_titles(planned, &posts)?;

        let seo = SeoMetadata::for_page(&self.config, "Blog", &planned.path);

        let mut props = PageProps::new();
        props.insert(&planned.path, "posts", &posts)?;
        props.insert(&planned.path, "seo", &seo)?;

        Ok(artifact(planned, props, seo, self.revalidate()))
    }

    async fn blog_post(&self, planned: &PlannedPath) -> Result<PageArtifact, BuildError> {
        let slug = planned
            .slug
            .as_deref()
            .ok_or_else(|| AssemblyError::MissingField {
                path: planned.path.clone(),
                slug: String::new(),
                field: "slug",
            })?;

        let post = self
            .posts
            .get_post_by_slug(slug)
            .await
            .map_err(|e| content_error(planned, e))?;

        if post.slug != slug {
            return Err(AssemblyError::SlugMismatch {
                path: planned.path.clone(),
                requested: slug.to_string(),
                returned: post.slug,
            }
            .into());
        }

        let (title, body) = require_content(planned, &post)?;
        let source = self.serialize(planned, slug, body)?;

        let all_posts = self
            .posts
            .list_posts(&ListingQuery::category(&self.config.listing.category))
            .await
            .map_err(|e| content_error(planned, e))?;

        let seo = SeoMetadata::for_post(
            &self.config,
            title,
            post.excerpt.as_deref(),
            &planned.path,
            post.cover_image.as_deref(),
        );

        let post_props = PostProps {
            slug,
            title,
            date: post.date,
            excerpt: post.excerpt.as_deref(),
            cover_image: post.cover_image.as_deref(),
            tags: &post.tags,
            reading_time: reading_time(body, self.config.words_per_minute),
        };

        let mut props = PageProps::new();
        props.insert(&planned.path, "post", &post_props)?;
        props.insert(&planned.path, "allPosts", &all_posts)?;
        props.insert(&planned.path, "source", &source)?;
        props.insert(&planned.path, "seo", &seo)?;

        Ok(artifact(planned, props, seo, self.revalidate()))
    }

    fn serialize(
        &self,
        planned: &PlannedPath,
        slug: &str,
        body: &str,
    ) -> Result<crate::content::RenderedSource, AssemblyError> {
        self.renderer
            .serialize(body)
            .map_err(|e| AssemblyError::Render {
                path: planned.path.clone(),
                slug: slug.to_string(),
                reason: e.to_string(),
            })
    }

    /// Only pages backed by the content API are regenerated
    fn revalidate(&self) -> Option<u64> {
        match self.posts.backing() {
            Backing::Api => Some(self.config.revalidate_seconds),
            Backing::Local => None,
        }
    }
}

fn artifact(
    planned: &PlannedPath,
    props: PageProps,
    seo: SeoMetadata,
    revalidate: Option<u64>,
) -> PageArtifact {
    PageArtifact {
        path: planned.path.clone(),
        route: planned.route.clone(),
        page: planned.page,
        props,
        seo,
        revalidate,
        fragments: BTreeMap::new(),
    }
}

fn content_error(planned: &PlannedPath, source: ContentError) -> BuildError {
    BuildError::Content {
        route: planned.route.clone(),
        slug: planned.slug.clone(),
        source,
    }
}

/// Title and body, or the first one missing
fn require_content<'a>(
    planned: &PlannedPath,
    post: &'a Post,
) -> Result<(&'a str, &'a str), AssemblyError> {
    let missing = |field| AssemblyError::MissingField {
        path: planned.path.clone(),
        slug: post.slug.clone(),
        field,
    };

    if post.slug.trim().is_empty() {
        return Err(missing("slug"));
    }
    let title = post
        .title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| missing("title"))?;
    let body = post.body.as_deref().ok_or_else(|| missing("body"))?;
    Ok((title, body))
}

fn require_titles(planned: &PlannedPath, posts: &[PostSummary]) -> Result<(), AssemblyError> {
    match posts.iter().find(|p| p.title.trim().is_empty()) {
        Some(untitled) => Err(AssemblyError::MissingField {
            path: planned.path.clone(),
            slug: untitled.slug.clone(),
            field: "title",
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use chrono::{TimeZone, Utc};
    use std::fs;
    use tempfile::TempDir;

    fn post(slug: &str, day: u32) -> Post {
        let mut post = Post::new(slug);
        post.title = Some(format!("Title {}", slug));
        post.body = Some("one two three four five".to_string());
        post.date = Some(Utc.with_ymd_and_hms(2022, 1, day, 0, 0, 0).unwrap());
        post
    }

    fn planned(page: PageKind, route: &str, path: &str, slug: Option<&str>) -> PlannedPath {
        PlannedPath {
            route: route.to_string(),
            page,
            path: path.to_string(),
            slug: slug.map(str::to_string),
        }
    }

    fn post_path(slug: &str) -> PlannedPath {
        planned(
            PageKind::BlogPost,
            "/blog/[slug]",
            &format!("/blog/{}", slug),
            Some(slug),
        )
    }

    fn assembler(dir: &TempDir, posts: MemorySource) -> PageAssembler {
        let config = SiteConfig::default();
        let local = LocalSource::new(dir.path(), &config.listing.category, false);
        PageAssembler::new(
            Arc::new(config),
            Arc::new(MarkdownRenderer::new()),
            Arc::new(posts),
            Arc::new(local),
        )
    }

    #[tokio::test]
    async fn test_blog_post_props() {
        let tmp = TempDir::new().unwrap();
        let asm = assembler(&tmp, MemorySource::new(vec![post("a", 1), post("b", 2)]));

        let artifact = asm.assemble(&post_path("a")).await.unwrap();
        assert_eq!(artifact.revalidate, Some(300));
        assert_eq!(artifact.props.get("post").unwrap()["slug"], "a");
        assert_eq!(
            artifact.props.get("post").unwrap()["readingTime"]["words"],
            5
        );
        assert_eq!(artifact.props.get("allPosts").unwrap().as_array().unwrap().len(), 2);
        assert!(artifact.props.get("source").unwrap()["compiledSource"]
            .as_str()
            .unwrap()
            .contains("one two"));
        assert_eq!(artifact.seo.canonical, "https://sergiobarria.com/blog/a");
    }

    #[tokio::test]
    async fn test_local_backing_has_no_revalidate() {
        let tmp = TempDir::new().unwrap();
        let source = MemorySource::new(vec![post("a", 1)]).with_backing(Backing::Local);
        let artifact = assembler(&tmp, source)
            .assemble(&post_path("a"))
            .await
            .unwrap();
        assert_eq!(artifact.revalidate, None);
    }

    #[tokio::test]
    async fn test_missing_body_is_assembly_error() {
        let tmp = TempDir::new().unwrap();
        let mut bodiless = post("a", 1);
        bodiless.body = None;
        let err = assembler(&tmp, MemorySource::new(vec![bodiless]))
            .assemble(&post_path("a"))
            .await
            .unwrap_err();
        match err {
            BuildError::Assembly(AssemblyError::MissingField { path, slug, field }) => {
                assert_eq!(path, "/blog/a");
                assert_eq!(slug, "a");
                assert_eq!(field, "body");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_title_is_not_defaulted() {
        let tmp = TempDir::new().unwrap();
        let mut untitled = post("a", 1);
        untitled.title = Some("   ".to_string());
        let err = assembler(&tmp, MemorySource::new(vec![untitled]))
            .assemble(&post_path("a"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("`title`"));
    }

    #[tokio::test]
    async fn test_unknown_slug_is_content_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = assembler(&tmp, MemorySource::new(vec![post("a", 1)]))
            .assemble(&post_path("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.content_error(),
            Some(ContentError::NotFound { .. })
        ));
        assert!(err.to_string().contains("slug `ghost`"));
    }

    #[tokio::test]
    async fn test_home_truncates_to_preview_count() {
        let tmp = TempDir::new().unwrap();
        let blog = tmp.path().join("blog");
        fs::create_dir_all(&blog).unwrap();
        for day in 1..=10 {
            fs::write(
                blog.join(format!("post-{:02}.mdx", day)),
                format!("---\ntitle: Post {day}\ndate: 2022-01-{day:02}\n---\nBody\n"),
            )
            .unwrap();
        }

        let artifact = assembler(&tmp, MemorySource::new(vec![]))
            .assemble(&planned(PageKind::Home, "/", "/", None))
            .await
            .unwrap();

        let posts = artifact.props.get("posts").unwrap().as_array().unwrap();
        let slugs: Vec<_> = posts.iter().map(|p| p["slug"].as_str().unwrap()).collect();
        assert_eq!(slugs, vec!["post-10", "post-09", "post-08", "post-07"]);
        assert_eq!(artifact.revalidate, None);
        assert_eq!(artifact.props.get("jobs").unwrap()[0]["category"], "frontend");
    }

    #[tokio::test]
    async fn test_about_page() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("about.mdx"),
            "---\ntitle: About Me\n---\nCivil engineer turned developer.\n",
        )
        .unwrap();

        let artifact = assembler(&tmp, MemorySource::new(vec![]))
            .assemble(&planned(PageKind::About, "/about", "/about", None))
            .await
            .unwrap();
        let about = artifact.props.get("about").unwrap();
        assert_eq!(about["frontMatter"]["title"], "About Me");
        assert!(about["mdxSource"]["compiledSource"]
            .as_str()
            .unwrap()
            .contains("Civil engineer"));
        assert_eq!(artifact.seo.title, "About | Sergio Barria");
    }

    #[tokio::test]
    async fn test_blog_index_lists_everything() {
        let tmp = TempDir::new().unwrap();
        let posts = (1..=10).map(|d| post(&format!("p{:02}", d), d)).collect();
        let artifact = assembler(&tmp, MemorySource::new(posts))
            .assemble(&planned(PageKind::BlogIndex, "/blog", "/blog", None))
            .await
            .unwrap();
        let listed = artifact.props.get("posts").unwrap().as_array().unwrap();
        assert_eq!(listed.len(), 10);
        assert_eq!(listed[0]["slug"], "p10");
        assert_eq!(artifact.revalidate, Some(300));
    }

    #[test]
    fn test_props_keep_insertion_order() {
        let mut props = PageProps::new();
        props.insert("/", "b", &1).unwrap();
        props.insert("/", "a", &2).unwrap();
        let keys: Vec<_> = props.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
