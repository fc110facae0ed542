//! Build the static site

use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

use crate::assembler::{PageArtifact, PageAssembler};
use crate::content::MarkdownRenderer;
use crate::error::BuildError;
use crate::output;
use crate::planner::{site_routes, BuildPlanner, PageKind, PlannedPath};
use crate::presentation::Presentation;
use crate::source::{ContentSource, LocalSource};
use crate::Folio;

/// What a successful build produced
#[derive(Debug)]
pub struct BuildReport {
    pub artifacts: Vec<PageArtifact>,
    pub elapsed: Duration,
}

impl BuildReport {
    pub fn paths(&self) -> Vec<&str> {
        self.artifacts.iter().map(|a| a.path.as_str()).collect()
    }
}

/// Build the site from its configured sources
pub async fn run(folio: &Folio) -> Result<BuildReport> {
    let sources = folio.sources()?;
    tracing::info!("Building with posts from the {} source", sources.posts.name());
    Ok(build_with(folio, sources.posts, sources.local).await?)
}

/// Plan, assemble every path concurrently, then publish.
///
/// The first failing path aborts the others and nothing is published.
pub async fn build_with(
    folio: &Folio,
    posts: Arc<dyn ContentSource>,
    local: Arc<LocalSource>,
) -> Result<BuildReport, BuildError> {
    let start = Instant::now();

    let routes = site_routes();
    let planned = BuildPlanner::new(&routes).plan(posts.as_ref()).await?;
    tracing::info!("Planned {} paths", planned.len());

    let assembler = Arc::new(PageAssembler::new(
        Arc::clone(&folio.config),
        Arc::new(MarkdownRenderer::new()),
        posts,
        local,
    ));

    let mut artifacts = assemble_all(assembler, planned).await?;

    let presentation = Presentation::new(&folio.config.analytics);
    for artifact in &mut artifacts {
        artifact.fragments.insert(
            "head.html".to_string(),
            presentation.render_head(&artifact.seo),
        );
        if artifact.page == PageKind::Home {
            artifact.fragments.insert(
                "jobs.html".to_string(),
                presentation.render_jobs(&folio.config.jobs),
            );
        }
    }

    output::publish(&folio.output_dir, &folio.config, &artifacts)?;

    let elapsed = start.elapsed();
    tracing::info!(
        "Built {} pages in {:.2}s",
        artifacts.len(),
        elapsed.as_secs_f64()
    );

    Ok(BuildReport { artifacts, elapsed })
}

/// Assemble every planned path as its own task, keeping plan order
async fn assemble_all(
    assembler: Arc<PageAssembler>,
    planned: Vec<PlannedPath>,
) -> Result<Vec<PageArtifact>, BuildError> {
    let total = planned.len();
    let mut tasks = JoinSet::new();

    for (index, path) in planned.into_iter().enumerate() {
        let assembler = Arc::clone(&assembler);
        tasks.spawn(async move { (index, assembler.assemble(&path).await) });
    }

    let mut slots: Vec<Option<PageArtifact>> = (0..total).map(|_| None).collect();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(artifact))) => slots[index] = Some(artifact),
            Ok((_, Err(e))) => {
                tasks.abort_all();
                tracing::error!("Build failed: {}", e);
                return Err(e);
            }
            Err(e) => {
                tasks.abort_all();
                return Err(BuildError::Task(e.to_string()));
            }
        }
    }

    Ok(slots.into_iter().flatten().collect())
}

/// Rebuild every `revalidate_seconds` until interrupted.
///
/// A failed re-run is logged and the previous output keeps being served.
pub async fn revalidate(folio: &Folio) -> Result<()> {
    let period = Duration::from_secs(folio.config.revalidate_seconds.max(1));
    let mut ticker = tokio::time::interval(period);
    // The first tick completes immediately; the initial build already ran
    ticker.tick().await;

    tracing::info!(
        "Revalidating every {}s. Press Ctrl+C to stop.",
        period.as_secs()
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tracing::info!("Revalidating...");
                if let Err(e) = run(folio).await {
                    tracing::error!("Revalidation failed, keeping previous output: {:#}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping revalidation");
                break;
            }
        }
    }

    Ok(())
}
