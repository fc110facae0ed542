//! Print the build plan

use anyhow::Result;

use crate::planner::{site_routes, BuildPlanner};
use crate::Folio;

/// Resolve and print every path the next build would produce
pub async fn run(folio: &Folio) -> Result<()> {
    let sources = folio.sources()?;
    let routes = site_routes();
    let planned = BuildPlanner::new(&routes).plan(sources.posts.as_ref()).await?;

    println!("Routes ({}):", routes.len());
    for route in &routes {
        println!("  {} [{:?}]", route.pattern, route.kind);
    }

    println!("Paths ({}):", planned.len());
    for path in planned {
        match path.slug {
            Some(slug) => println!("  {} - {}", path.path, slug),
            None => println!("  {}", path.path),
        }
    }

    Ok(())
}
