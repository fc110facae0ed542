//! Build output - props, fragments and the manifest
//!
//! Everything is written to a staging directory next to the output directory
//! and swapped in only once every file is on disk, so a failed build leaves
//! the previous output untouched.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::assembler::PageArtifact;
use crate::config::SiteConfig;
use crate::error::BuildError;
use crate::planner::PageKind;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const PROPS_FILE: &str = "props.json";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Manifest<'a> {
    site: SiteInfo<'a>,
    pages: Vec<ManifestEntry<'a>>,
}

/// Site-wide values the presentation layer needs on every page
#[derive(Debug, Serialize)]
struct SiteInfo<'a> {
    title: &'a str,
    /// `lang` attribute of the document
    language: &'a str,
    url: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ManifestEntry<'a> {
    path: &'a str,
    route: &'a str,
    page: PageKind,
    /// Seconds; absent for pages never regenerated
    #[serde(skip_serializing_if = "Option::is_none")]
    revalidate: Option<u64>,
    files: Vec<String>,
}

/// Directory (relative to the output root) holding a path's files
pub fn artifact_dir(path: &str) -> PathBuf {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        PathBuf::new()
    } else {
        trimmed.split('/').collect()
    }
}

/// Write all artifacts and swap them into `output_dir`
pub fn publish(
    output_dir: &Path,
    config: &SiteConfig,
    artifacts: &[PageArtifact],
) -> Result<(), BuildError> {
    let staging = staging_dir(output_dir);
    if staging.exists() {
        fs::remove_dir_all(&staging).map_err(|e| BuildError::Io(staging.clone(), e))?;
    }

    if let Err(e) = write_tree(&staging, config, artifacts) {
        let _ = fs::remove_dir_all(&staging);
        return Err(e);
    }

    if let Err(e) = swap_in(&staging, output_dir) {
        let _ = fs::remove_dir_all(&staging);
        return Err(e);
    }

    tracing::debug!("Published {} pages to {:?}", artifacts.len(), output_dir);
    Ok(())
}

/// Move `staging` into place. The current output is set aside first and
/// restored if the move fails.
fn swap_in(staging: &Path, output_dir: &Path) -> Result<(), BuildError> {
    let previous = previous_dir(output_dir);
    if previous.exists() {
        fs::remove_dir_all(&previous).map_err(|e| BuildError::Io(previous.clone(), e))?;
    }

    let had_output = output_dir.exists();
    if had_output {
        fs::rename(output_dir, &previous)
            .map_err(|e| BuildError::Io(output_dir.to_path_buf(), e))?;
    }

    if let Err(e) = fs::rename(staging, output_dir) {
        if had_output {
            if let Err(restore) = fs::rename(&previous, output_dir) {
                tracing::error!("Could not restore {:?}: {}", output_dir, restore);
            }
        }
        return Err(BuildError::Io(output_dir.to_path_buf(), e));
    }

    if had_output {
        if let Err(e) = fs::remove_dir_all(&previous) {
            tracing::warn!("Could not remove {:?}: {}", previous, e);
        }
    }
    Ok(())
}

fn write_tree(
    root: &Path,
    config: &SiteConfig,
    artifacts: &[PageArtifact],
) -> Result<(), BuildError> {
    let mut pages = Vec::with_capacity(artifacts.len());

    for artifact in artifacts {
        let rel_dir = artifact_dir(&artifact.path);
        let dir = root.join(&rel_dir);
        fs::create_dir_all(&dir).map_err(|e| BuildError::Io(dir.clone(), e))?;

        let mut files = Vec::new();

        let props = serde_json::to_string_pretty(&artifact.props).map_err(|source| {
            crate::error::AssemblyError::Serialize {
                path: artifact.path.clone(),
                source,
            }
        })?;
        write_file(&dir.join(PROPS_FILE), &props)?;
        files.push(relative_file(&rel_dir, PROPS_FILE));

        for (name, content) in &artifact.fragments {
            write_file(&dir.join(name), content)?;
            files.push(relative_file(&rel_dir, name));
        }

        pages.push(ManifestEntry {
            path: &artifact.path,
            route: &artifact.route,
            page: artifact.page,
            revalidate: artifact.revalidate,
            files,
        });
    }

    let site = SiteInfo {
        title: &config.title,
        language: &config.language,
        url: config.base_url(),
    };
    let manifest = serde_json::to_string_pretty(&Manifest { site, pages }).map_err(|source| {
        crate::error::AssemblyError::Serialize {
            path: MANIFEST_FILE.to_string(),
            source,
        }
    })?;
    write_file(&root.join(MANIFEST_FILE), &manifest)
}

fn write_file(path: &Path, content: &str) -> Result<(), BuildError> {
    fs::write(path, content).map_err(|e| BuildError::Io(path.to_path_buf(), e))
}

/// Forward-slash path for the manifest, independent of platform
fn relative_file(dir: &Path, name: &str) -> String {
    let mut parts: Vec<String> = dir
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    parts.push(name.to_string());
    parts.join("/")
}

/// Where the next output is assembled before it is swapped in
pub fn staging_dir(output_dir: &Path) -> PathBuf {
    sibling(output_dir, "staging")
}

/// Where the current output waits while a new one is swapped in
pub fn previous_dir(output_dir: &Path) -> PathBuf {
    sibling(output_dir, "previous")
}

fn sibling(output_dir: &Path, suffix: &str) -> PathBuf {
    let name = output_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "public".to_string());
    output_dir.with_file_name(format!(".{}.{}", name, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::{PageProps, SeoMetadata};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn artifact(path: &str, page: PageKind, revalidate: Option<u64>) -> PageArtifact {
        let mut fragments = BTreeMap::new();
        fragments.insert("head.html".to_string(), "<title>x</title>".to_string());
        PageArtifact {
            path: path.to_string(),
            route: path.to_string(),
            page,
            props: PageProps::new(),
            seo: SeoMetadata::for_page(&SiteConfig::default(), "X", path),
            revalidate,
            fragments,
        }
    }

    #[test]
    fn test_artifact_dir() {
        assert_eq!(artifact_dir("/"), PathBuf::new());
        assert_eq!(artifact_dir("/blog/hello"), PathBuf::from("blog").join("hello"));
    }

    #[test]
    fn test_publish_writes_tree_and_manifest() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("public");
        let artifacts = vec![
            artifact("/", PageKind::Home, None),
            artifact("/blog/a", PageKind::BlogPost, Some(300)),
        ];

        publish(&out, &SiteConfig::default(), &artifacts).unwrap();

        assert!(out.join("props.json").is_file());
        assert!(out.join("head.html").is_file());
        assert!(out.join("blog/a/props.json").is_file());
        assert!(!tmp.path().join(".public.staging").exists());

        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join(MANIFEST_FILE)).unwrap()).unwrap();
        let pages = manifest["pages"].as_array().unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].get("revalidate").is_none());
        assert_eq!(pages[1]["revalidate"], 300);
        assert_eq!(pages[1]["page"], "blog-post");
        assert_eq!(pages[1]["files"][0], "blog/a/props.json");
        assert_eq!(manifest["site"]["title"], "Sergio Barria");
        assert_eq!(manifest["site"]["language"], "en");
        assert_eq!(manifest["site"]["url"], "https://sergiobarria.com");
    }

    #[test]
    fn test_publish_replaces_previous_output() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("public");
        fs::create_dir_all(out.join("stale")).unwrap();
        fs::write(out.join("stale/props.json"), "{}").unwrap();

        let artifacts = [artifact("/about", PageKind::About, None)];
        publish(&out, &SiteConfig::default(), &artifacts).unwrap();

        assert!(!out.join("stale").exists());
        assert!(out.join("about/props.json").is_file());
    }

    #[test]
    fn test_failed_swap_restores_previous_output() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("public");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("props.json"), "{\"old\":true}").unwrap();

        let missing = tmp.path().join(".public.staging");
        assert!(swap_in(&missing, &out).is_err());

        assert_eq!(
            fs::read_to_string(out.join("props.json")).unwrap(),
            "{\"old\":true}"
        );
        assert!(!previous_dir(&out).exists());
    }

    #[test]
    fn test_swap_leaves_no_previous_dir() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("public");
        fs::create_dir_all(&out).unwrap();

        let artifacts = [artifact("/", PageKind::Home, None)];
        publish(&out, &SiteConfig::default(), &artifacts).unwrap();

        assert!(out.join("props.json").is_file());
        assert!(!previous_dir(&out).exists());
        assert!(!staging_dir(&out).exists());
    }
}
