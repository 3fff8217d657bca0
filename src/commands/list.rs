//! List site content

use anyhow::Result;

use crate::aggregate::aggregate;
use crate::content::{Category, ContentLoader, FsSource};
use crate::Site;

/// List loaded entries in feed order
pub fn run(site: &Site, content_type: &str) -> Result<()> {
    let categories: Vec<Category> = match content_type {
        "all" => site.config.categories.clone(),
        other => vec![other.parse::<Category>().map_err(anyhow::Error::msg)?],
    };

    let source = FsSource::new(&site.content_dir);
    let loader = ContentLoader::new(&source, site.config.schema_version);
    let content = loader.load(&categories)?;
    let timeline = aggregate(&content.sets);

    println!("Entries ({}):", timeline.len());
    for entry in timeline.iter() {
        println!(
            "  {} - {} [{}] {}",
            entry.frontmatter.published.format("%Y-%m-%d"),
            entry.frontmatter.title,
            entry.category,
            entry.canonical_path()
        );
    }

    Ok(())
}
