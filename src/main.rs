//! CLI entry point for folio-rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "Static generation core for a personal blog and portfolio", long_about = None)]
struct Cli {
    /// Set the site directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan, assemble and publish every page
    #[command(alias = "b")]
    Build {
        /// Keep running and rebuild API-backed pages every `revalidate_seconds`
        #[arg(short, long)]
        revalidate: bool,
    },

    /// Show the routes and the concrete paths the next build would produce
    Routes,

    /// Scaffold a new local post
    New {
        /// Title of the new post
        title: String,
    },

    /// Remove the output directory
    Clean,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        "folio_rs=debug,info"
    } else {
        "folio_rs=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Build { revalidate } => {
            let folio = folio_rs::Folio::new(&base_dir)?;
            tracing::info!("Building site in {:?}", base_dir);

            let report = folio.build().await?;
            println!(
                "Built {} pages into {:?}",
                report.artifacts.len(),
                folio.output_dir
            );

            if revalidate {
                folio_rs::commands::build::revalidate(&folio).await?;
            }
        }

        Commands::Routes => {
            let folio = folio_rs::Folio::new(&base_dir)?;
            folio_rs::commands::routes::run(&folio).await?;
        }

        Commands::New { title } => {
            let folio = folio_rs::Folio::new(&base_dir)?;
            let path = folio.new_post(&title)?;
            println!("Created: {:?}", path);
        }

        Commands::Clean => {
            let folio = folio_rs::Folio::new(&base_dir)?;
            tracing::info!("Cleaning output folder...");
            folio.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::Version => {
            println!("folio-rs version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
