//! Clean the generated outputs

use anyhow::Result;
use std::fs;

use crate::Site;

/// Remove the feed and display metadata written by a build
pub fn run(site: &Site) -> Result<()> {
    for name in [&site.config.feed_path, &site.config.items_path] {
        let path = site.public_dir.join(name);
        if path.exists() {
            fs::remove_file(&path)?;
            tracing::info!("Deleted: {:?}", path);
        }
    }

    Ok(())
}
