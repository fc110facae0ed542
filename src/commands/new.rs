//! Create a new local post

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::Folio;

/// Scaffold `<content_dir>/<category>/<slug>.mdx` and return its path
pub fn create_post(folio: &Folio, title: &str) -> Result<PathBuf> {
    let slug = slug::slugify(title);
    if slug.is_empty() {
        anyhow::bail!("Title {:?} does not produce a usable slug", title);
    }

    let target_dir = folio.content_dir.join(&folio.config.listing.category);
    fs::create_dir_all(&target_dir)?;

    let file_path = target_dir.join(format!("{}.mdx", slug));
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let now = chrono::Local::now();
    let content = format!(
        "---\ntitle: {}\ndate: \"{}\"\nexcerpt: \"\"\ncategory: {}\ndraft: true\n---\n",
        yaml_string(title),
        now.format("%Y-%m-%d %H:%M:%S"),
        folio.config.listing.category,
    );

    fs::write(&file_path, content)?;
    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}

/// Quote a title so YAML reads it back verbatim
fn yaml_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
