//! Build the feed and display metadata

use anyhow::{Context, Result};

use crate::generator::BuildReport;
use crate::Site;

/// Run the full pipeline once
pub fn run(site: &Site) -> Result<BuildReport> {
    let start = std::time::Instant::now();

    tracing::info!(
        "Loading {} from {:?}",
        site.config
            .categories
            .iter()
            .map(|c| c.folder())
            .collect::<Vec<_>>()
            .join(", "),
        site.content_dir
    );

    let report = site.build().context("Build failed")?;

    let duration = start.elapsed();
    tracing::info!("Built in {:.2}s", duration.as_secs_f64());

    Ok(report)
}
