//! Clean the output directory

use anyhow::Result;
use std::fs;

use crate::output;
use crate::Folio;

/// Remove the output directory and any staging leftovers
pub fn run(folio: &Folio) -> Result<()> {
    if folio.output_dir.exists() {
        fs::remove_dir_all(&folio.output_dir)?;
        tracing::info!("Deleted: {:?}", folio.output_dir);
    }

    // A build interrupted mid-publish leaves these behind
    for leftover in [
        output::staging_dir(&folio.output_dir),
        output::previous_dir(&folio.output_dir),
    ] {
        if leftover.exists() {
            fs::remove_dir_all(&leftover)?;
            tracing::info!("Deleted: {:?}", leftover);
        }
    }

    Ok(())
}
