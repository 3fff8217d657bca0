//! bytefeed: aggregates blog posts and tips into an RSS feed
//!
//! Content entries are loaded from typed collections, validated against a
//! versioned front-matter schema, merged into one newest-first timeline and
//! serialized as an RSS 2.0 document plus per-item display metadata.

pub mod aggregate;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod server;

use anyhow::Result;
use std::path::{Path, PathBuf};

pub use error::PipelineError;

use content::{ContentLoader, FsSource};
use generator::{BuildReport, Generator};

/// A site handle, created once per run and passed explicitly
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Content root holding the collection folders
    pub content_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Site {
    /// Create a site from a directory, reading `_config.yml` and the environment
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a site from an already built configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let content_dir = base_dir.join(&config.content_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            content_dir,
            public_dir,
        }
    }

    /// Run the pipeline: load, aggregate, serialize, write
    pub fn build(&self) -> Result<BuildReport, PipelineError> {
        let source = FsSource::new(&self.content_dir);
        let loader = ContentLoader::new(&source, self.config.schema_version);
        let content = loader.load(&self.config.categories)?;

        Generator::new(self).generate(&content)
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
