//! Content module - post models, front-matter and markdown serialization

mod frontmatter;
mod markdown;
mod post;

pub use frontmatter::{parse_date_string, FrontMatter};
pub(crate) use markdown::html_escape;
pub use markdown::{MarkdownRenderer, RenderedSource};
pub use post::{newest_first, ListingQuery, Post, PostSummary};
