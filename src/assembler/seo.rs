//! SEO metadata projection

use serde::Serialize;

use crate::config::SiteConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoMetadata {
    pub title: String,
    pub description: String,
    pub canonical: String,
    pub open_graph: OpenGraph,
    pub twitter: TwitterCard,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenGraph {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub locale: String,
    pub images: Vec<OgImage>,
    pub site_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OgImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TwitterCard {
    pub handle: String,
    pub site: String,
    pub card_type: String,
}

impl SeoMetadata {
    /// Metadata for a blog post at `path`
    pub fn for_post(
        config: &SiteConfig,
        title: &str,
        description: Option<&str>,
        path: &str,
        cover_image: Option<&str>,
    ) -> Self {
        let og_title = format!("{}{}", title, config.seo.og_title_suffix);
        project(config, title, og_title, description, path, cover_image)
    }

    /// Metadata for a static page, titled "<label> | <author>"
    pub fn for_page(config: &SiteConfig, label: &str, path: &str) -> Self {
        let title = format!("{} | {}", label, config.author);
        project(config, &title, title.clone(), None, path, None)
    }
}

fn project(
    config: &SiteConfig,
    title: &str,
    og_title: String,
    description: Option<&str>,
    path: &str,
    image: Option<&str>,
) -> SeoMetadata {
    let description = description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(&config.description)
        .to_string();
    let canonical = canonical_url(config, path);
    let image = image
        .filter(|i| !i.trim().is_empty())
        .unwrap_or(&config.seo.fallback_image)
        .to_string();

    SeoMetadata {
        title: title.to_string(),
        description: description.clone(),
        canonical: canonical.clone(),
        open_graph: OpenGraph {
            kind: "website".to_string(),
            url: canonical,
            title: og_title,
            description,
            locale: config.seo.locale.clone(),
            images: vec![OgImage {
                url: image,
                width: config.seo.image_width,
                height: config.seo.image_height,
                alt: format!("hero image for {}", title),
            }],
            site_name: config.seo.site_name.clone(),
        },
        twitter: TwitterCard {
            handle: config.seo.twitter_handle.clone(),
            site: config.seo.twitter_site.clone(),
            card_type: config.seo.card_type.clone(),
        },
    }
}

/// Absolute URL for a site path; the home page keeps no trailing slash
pub fn canonical_url(config: &SiteConfig, path: &str) -> String {
    let path = path.trim_matches('/');
    if path.is_empty() {
        config.base_url().to_string()
    } else {
        format!("{}/{}", config.base_url(), path)
    }
}
