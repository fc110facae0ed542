//! folio-rs: static generation core for a personal blog and portfolio
//!
//! Decides which pages exist, fetches what each one needs from the content
//! API or local markdown files, and publishes serializable page props with
//! SEO and analytics head fragments for the presentation layer.

pub mod assembler;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod output;
pub mod planner;
pub mod presentation;
pub mod source;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use source::{ContentSource, GraphSource, LocalSource};

/// The sources a build reads from
pub struct Sources {
    /// Blog listing and single-post pages
    pub posts: Arc<dyn ContentSource>,
    /// Home and about pages
    pub local: Arc<LocalSource>,
}

/// The main application
#[derive(Clone)]
pub struct Folio {
    /// Site configuration
    pub config: Arc<config::SiteConfig>,
    /// Base directory
    pub base_dir: PathBuf,
    /// Local content directory
    pub content_dir: PathBuf,
    /// Output directory
    pub output_dir: PathBuf,
}

impl Folio {
    /// Create a new instance from a site directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config_path = base_dir.as_ref().join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Create an instance with an already loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let content_dir = base_dir.join(&config.content_dir);
        let output_dir = base_dir.join(&config.output_dir);

        Self {
            config: Arc::new(config),
            base_dir,
            content_dir,
            output_dir,
        }
    }

    /// Content sources per configuration: the content API when an endpoint
    /// is set, local files otherwise
    pub fn sources(&self) -> Result<Sources> {
        let local = Arc::new(LocalSource::new(
            &self.content_dir,
            &self.config.listing.category,
            self.config.render_drafts,
        ));

        let posts: Arc<dyn ContentSource> =
            if let Some(graph) = GraphSource::from_config(&self.config.content_api)? {
                Arc::new(graph)
            } else {
                local.clone()
            };

        Ok(Sources { posts, local })
    }

    /// Build the static site
    pub async fn build(&self) -> Result<commands::build::BuildReport> {
        commands::build::run(self).await
    }

    /// Remove the output directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Scaffold a new local post
    pub fn new_post(&self, title: &str) -> Result<PathBuf> {
        commands::new::create_post(self, title)
    }
}
