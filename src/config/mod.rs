//! Configuration module

mod site;

use thiserror::Error;

pub use site::AnalyticsConfig;
pub use site::ContentApiConfig;
pub use site::HomeConfig;
pub use site::ListingConfig;
pub use site::SeoConfig;
pub use site::SiteConfig;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config validation error: {0}")]
    Validation(String),
}
