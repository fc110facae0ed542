//! Static build planner - decides which concrete paths get pre-rendered

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::error::BuildError;
use crate::source::ContentSource;

/// Which page a route renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageKind {
    Home,
    About,
    BlogIndex,
    BlogPost,
}

/// How a route expands into concrete paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteKind {
    /// Exactly one path, no parameters
    Static,
    /// Exactly one path; pagination happens client-side
    Listing,
    /// One path per identifier from the content source
    Item,
}

/// A declared route pattern, e.g. `/about` or `/blog/[slug]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRoute {
    pub pattern: String,
    pub page: PageKind,
    pub kind: RouteKind,
}

impl PageRoute {
    pub fn new(pattern: &str, page: PageKind, kind: RouteKind) -> Self {
        Self {
            pattern: pattern.to_string(),
            page,
            kind,
        }
    }

    /// Parameter segments like `[slug]`
    fn params(&self) -> Vec<&str> {
        self.pattern
            .split('/')
            .filter_map(|seg| seg.strip_prefix('[').and_then(|s| s.strip_suffix(']')))
            .collect()
    }

    fn validate(&self) -> Result<(), BuildError> {
        let invalid = |reason: &str| BuildError::InvalidRoute {
            pattern: self.pattern.clone(),
            reason: reason.to_string(),
        };

        if !self.pattern.starts_with('/') {
            return Err(invalid("pattern must start with `/`"));
        }

        let params = self.params();
        match self.kind {
            RouteKind::Item if params.len() != 1 => {
                Err(invalid("item routes need exactly one `[param]` segment"))
            }
            RouteKind::Item if params[0].is_empty() => Err(invalid("empty `[]` parameter")),
            RouteKind::Static | RouteKind::Listing if !params.is_empty() => {
                Err(invalid("only item routes take parameters"))
            }
            _ => Ok(()),
        }
    }

    /// Substitute the route parameter
    fn expand(&self, slug: &str) -> String {
        let mut path = String::with_capacity(self.pattern.len() + slug.len());
        for (i, seg) in self.pattern.split('/').enumerate() {
            if i > 0 {
                path.push('/');
            }
            if seg.starts_with('[') && seg.ends_with(']') {
                path.push_str(slug);
            } else {
                path.push_str(seg);
            }
        }
        path
    }
}

/// The routes every site build declares
pub fn site_routes() -> Vec<PageRoute> {
    vec![
        PageRoute::new("/", PageKind::Home, RouteKind::Listing),
        PageRoute::new("/about", PageKind::About, RouteKind::Static),
        PageRoute::new("/blog", PageKind::BlogIndex, RouteKind::Listing),
        PageRoute::new("/blog/[slug]", PageKind::BlogPost, RouteKind::Item),
    ]
}

/// One concrete path to pre-render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedPath {
    pub route: String,
    pub page: PageKind,
    pub path: String,
    pub slug: Option<String>,
}

/// Enumerates concrete paths for a set of routes
pub struct BuildPlanner<'a> {
    routes: &'a [PageRoute],
}

impl<'a> BuildPlanner<'a> {
    pub fn new(routes: &'a [PageRoute]) -> Self {
        Self { routes }
    }

    /// Expand every route. Item routes are resolved against `source`.
    ///
    /// Paths come out in route declaration order, identifiers sorted within
    /// a route. An unavailable source fails the whole plan; an empty
    /// identifier set only yields no paths for that route.
    pub async fn plan(&self, source: &dyn ContentSource) -> Result<Vec<PlannedPath>, BuildError> {
        let mut seen = HashSet::new();
        for route in self.routes {
            route.validate()?;
            if !seen.insert(route.pattern.as_str()) {
                return Err(BuildError::InvalidRoute {
                    pattern: route.pattern.clone(),
                    reason: "declared more than once".to_string(),
                });
            }
        }

        let mut planned = Vec::new();

        for route in self.routes {
            match route.kind {
                RouteKind::Static | RouteKind::Listing => planned.push(PlannedPath {
                    route: route.pattern.clone(),
                    page: route.page,
                    path: route.pattern.clone(),
                    slug: None,
                }),
                RouteKind::Item => {
                    let slugs = self.resolve(route, source).await?;
                    if slugs.is_empty() {
                        tracing::info!("Route {} has no content yet", route.pattern);
                    }
                    planned.extend(slugs.into_iter().map(|slug| PlannedPath {
                        route: route.pattern.clone(),
                        page: route.page,
                        path: route.expand(&slug),
                        slug: Some(slug),
                    }));
                }
            }
        }

        tracing::debug!("Planned {} paths", planned.len());
        Ok(planned)
    }

    /// Deduplicated, sorted identifiers for an item route
    async fn resolve(
        &self,
        route: &PageRoute,
        source: &dyn ContentSource,
    ) -> Result<BTreeSet<String>, BuildError> {
        let slugs = source
            .get_all_slugs()
            .await
            .map_err(|e| BuildError::Content {
                route: route.pattern.clone(),
                slug: None,
                source: e,
            })?;

        let mut unique = BTreeSet::new();
        for slug in slugs {
            if !is_url_safe(&slug) {
                return Err(BuildError::InvalidSlug {
                    route: route.pattern.clone(),
                    slug,
                });
            }
            unique.insert(slug);
        }
        Ok(unique)
    }
}

/// A slug that can be dropped into a path segment as-is
pub fn is_url_safe(slug: &str) -> bool {
    !slug.is_empty()
        && slug != "."
        && slug != ".."
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'))
}
