//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::ConfigError;
use crate::presentation::{Job, JobCategory};

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,

    // URL
    pub url: String,

    // Directory
    pub content_dir: String,
    pub output_dir: String,

    // Writing
    pub render_drafts: bool,
    pub words_per_minute: u32,

    // Regeneration
    pub revalidate_seconds: u64,

    #[serde(default)]
    pub home: HomeConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub seo: SeoConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub content_api: ContentApiConfig,

    /// "What I do" cards on the home page
    pub jobs: Vec<Job>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Sergio Barria".to_string(),
            description: "Sergio Barria engineer, developer, writer. Sharing my journey as I transition from Civil Engineer to Web Developer".to_string(),
            author: "Sergio Barria".to_string(),
            language: "en".to_string(),

            url: "https://sergiobarria.com".to_string(),

            content_dir: "content".to_string(),
            output_dir: "public".to_string(),

            render_drafts: false,
            words_per_minute: 200,

            revalidate_seconds: 60 * 5,

            home: HomeConfig::default(),
            listing: ListingConfig::default(),
            seo: SeoConfig::default(),
            analytics: AnalyticsConfig::default(),
            content_api: ContentApiConfig::default(),

            jobs: default_jobs(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the build cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Validation("`url` must not be empty".into()));
        }
        if self.listing.preview_count == 0 {
            return Err(ConfigError::Validation(
                "`listing.preview_count` must be at least 1".into(),
            ));
        }
        if self.words_per_minute == 0 {
            return Err(ConfigError::Validation(
                "`words_per_minute` must be at least 1".into(),
            ));
        }
        if self.content_api.max_concurrency == 0 {
            return Err(ConfigError::Validation(
                "`content_api.max_concurrency` must be at least 1".into(),
            ));
        }
        if let Some(endpoint) = &self.content_api.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(ConfigError::Validation(format!(
                    "`content_api.endpoint` is not an http(s) URL: {}",
                    endpoint
                )));
            }
        }
        Ok(())
    }

    /// Site URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// Home page copy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeConfig {
    pub heading: String,
    pub intro: String,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            heading: "Hey, I'm Sergio".to_string(),
            intro: "I'm an Engineer, developer and writer. I created this small space on the internet to share my journey and try to help others who are also starting to learn how to code.".to_string(),
        }
    }
}

/// Listing pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Content category the blog lives under
    pub category: String,
    /// Number of posts previewed on the home page
    pub preview_count: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            category: "blog".to_string(),
            preview_count: 4,
        }
    }
}

/// SEO defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoConfig {
    pub fallback_image: String,
    pub image_width: u32,
    pub image_height: u32,
    pub locale: String,
    pub site_name: String,
    pub og_title_suffix: String,
    pub twitter_handle: String,
    pub twitter_site: String,
    pub card_type: String,
}

impl Default for SeoConfig {
    fn default() -> Self {
        Self {
            fallback_image: "https://www.sergiobarria.com/static/images/banner.png".to_string(),
            image_width: 1600,
            image_height: 882,
            locale: "en_EN".to_string(),
            site_name: "sergiobarria.com".to_string(),
            og_title_suffix: " | Originally posted on sergiobarria.com".to_string(),
            twitter_handle: "@sergioBarria01".to_string(),
            twitter_site: "https://twitter.com/sergioBarria01".to_string(),
            card_type: "summary_large_image".to_string(),
        }
    }
}

/// Analytics wiring
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Site-wide tracking identifier (gtag). No snippet is emitted when unset.
    pub tracking_id: Option<String>,
}

/// Headless content API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentApiConfig {
    /// GraphQL endpoint; posts come from local files when unset
    pub endpoint: Option<String>,
    /// Name of the environment variable holding the bearer token
    pub token_env: String,
    pub timeout_secs: u64,
    pub max_concurrency: usize,
}

impl Default for ContentApiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            token_env: "GRAPHCMS_TOKEN".to_string(),
            timeout_secs: 10,
            max_concurrency: 8,
        }
    }
}

fn default_jobs() -> Vec<Job> {
    let job = |title: &str, category, description: &str, stack: &[&str]| Job {
        title: title.to_string(),
        category,
        description: description.to_string(),
        tech_stack: stack.iter().map(|s| s.to_string()).collect(),
    };

    vec![
        job(
            "Frontend Development",
            JobCategory::Frontend,
            "I build UI and scalable SPA with HTML, CSS and JavaScript",
            &["JavaScript", "Vue", "React"],
        ),
        job(
            "Backend Development",
            JobCategory::Backend,
            "Connection with the frontend, databases and security",
            &["Node", "Django", "Mongo", "Firebase"],
        ),
        job(
            "JAM Stack Development",
            JobCategory::Jamstack,
            "SSR and SSG development for better performance & SEO Optimization",
            &["Next js", "Gatsby"],
        ),
        job(
            "Mobile Development",
            JobCategory::Mobile,
            "Cross platform mobile development for iOS and Android phones",
            &["Flutter"],
        ),
    ]
}
