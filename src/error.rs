//! Error types shared by the content sources, the planner and the assembler

use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by a content source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("content not found: {slug}")]
    NotFound { slug: String },

    #[error("content source `{source_name}` unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },
}

impl ContentError {
    pub fn unavailable(source_name: &str, reason: impl ToString) -> Self {
        ContentError::Unavailable {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, ContentError::Unavailable { .. })
    }
}

/// Errors raised while turning fetched content into page props
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("{path}: required field `{field}` missing for `{slug}`")]
    MissingField {
        path: String,
        slug: String,
        field: &'static str,
    },

    #[error("{path}: requested `{requested}` but the source returned `{returned}`")]
    SlugMismatch {
        path: String,
        requested: String,
        returned: String,
    },

    #[error("{path}: markdown for `{slug}` could not be serialized: {reason}")]
    Render {
        path: String,
        slug: String,
        reason: String,
    },

    #[error("{path}: props are not serializable")]
    Serialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A fatal build failure
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("route `{route}`{}: {source}", slug_suffix(.slug))]
    Content {
        route: String,
        slug: Option<String>,
        #[source]
        source: ContentError,
    },

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error("invalid route `{pattern}`: {reason}")]
    InvalidRoute { pattern: String, reason: String },

    #[error("route `{route}` resolved to an invalid slug {slug:?}")]
    InvalidSlug { route: String, slug: String },

    #[error("path build task failed: {0}")]
    Task(String),

    #[error("IO error when writing `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

impl BuildError {
    /// The content error behind this failure, if any
    pub fn content_error(&self) -> Option<&ContentError> {
        match self {
            BuildError::Content { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn slug_suffix(slug: &Option<String>) -> String {
    slug.as_ref()
        .map(|s| format!(" (slug `{}`)", s))
        .unwrap_or_default()
}
