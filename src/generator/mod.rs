//! Generator module - writes the feed and display metadata for a loaded site

mod display;
mod feed;

pub use display::{render_items, DisplayMeta};
pub use feed::{feed_items, render_feed, FeedItem, FeedMeta};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::aggregate::aggregate;
use crate::content::LoadedContent;
use crate::error::PipelineError;
use crate::Site;

/// An aggregated item could not be serialized; nothing is written
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializationError {
    #[error("item `{item}` is missing required field `{field}`")]
    MissingField { item: String, field: &'static str },

    #[error("item `{item}` has a `{field}` the feed cannot represent: {value}")]
    InvalidField {
        item: String,
        field: &'static str,
        value: String,
    },

    #[error("feed is missing channel field `{0}`")]
    MissingChannelField(&'static str),

    #[error("items `{first}` and `{second}` both resolve to {link}")]
    DuplicateLink {
        link: String,
        first: String,
        second: String,
    },

    #[error("failed to write feed XML: {0}")]
    Xml(String),

    #[error("failed to encode display metadata: {0}")]
    Json(String),
}

/// Files written by a build
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub feed_items: usize,
    pub display_items: usize,
    pub feed_path: PathBuf,
    pub items_path: PathBuf,
}

/// Writes the build outputs into the public directory
pub struct Generator<'a> {
    site: &'a Site,
}

impl<'a> Generator<'a> {
    pub fn new(site: &'a Site) -> Self {
        Self { site }
    }

    /// Aggregate, serialize, then write
    ///
    /// Both documents are rendered before anything touches the disk, then
    /// staged next to their targets and only moved into place once both
    /// staged writes succeeded.
    pub fn generate(&self, content: &LoadedContent) -> Result<BuildReport, PipelineError> {
        let config = &self.site.config;

        let timeline = aggregate(&content.sets);
        let items_json = render_items(&timeline, &content.authors, &config.url)?;

        let mut feed_timeline = timeline.clone();
        if let Some(limit) = config.feed_limit {
            feed_timeline.truncate(limit);
        }
        let feed_xml = render_feed(&FeedMeta::from_config(config), &feed_timeline)?;

        fs::create_dir_all(&self.site.public_dir)?;

        let feed_path = self.site.public_dir.join(&config.feed_path);
        let items_path = self.site.public_dir.join(&config.items_path);
        for path in [&feed_path, &items_path] {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
        }

        let staged = [
            stage(&feed_path, feed_xml.as_bytes())?,
            stage(&items_path, items_json.as_bytes()).inspect_err(|_| {
                let _ = fs::remove_file(staged_path(&feed_path));
            })?,
        ];
        commit(&staged).inspect_err(|_| {
            for (tmp, _) in &staged {
                let _ = fs::remove_file(tmp);
            }
        })?;

        tracing::info!("Generated {} ({} items)", config.feed_path, feed_timeline.len());
        tracing::info!("Generated {} ({} items)", config.items_path, timeline.len());

        Ok(BuildReport {
            feed_items: feed_timeline.len(),
            display_items: timeline.len(),
            feed_path,
            items_path,
        })
    }
}

/// Sibling path a document is written to before it replaces `target`
fn staged_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    target.with_file_name(name)
}

/// Write `contents` next to `target`; returns (staged, target)
fn stage(target: &Path, contents: &[u8]) -> io::Result<(PathBuf, PathBuf)> {
    let tmp = staged_path(target);
    fs::write(&tmp, contents)?;
    Ok((tmp, target.to_path_buf()))
}

/// Move every staged file over its target
///
/// All targets are checked first, so a target that cannot be replaced
/// leaves every existing output as it was.
fn commit(staged: &[(PathBuf, PathBuf)]) -> io::Result<()> {
    for (_, target) in staged {
        if target.is_dir() {
            return Err(io::Error::other(format!(
                "{} is a directory",
                target.display()
            )));
        }
    }
    for (tmp, target) in staged {
        fs::rename(tmp, target)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_path_is_a_sibling() {
        let staged = staged_path(Path::new("public/feeds/rss.xml"));
        assert_eq!(staged, Path::new("public/feeds/rss.xml.tmp"));
    }

    #[test]
    fn test_commit_checks_every_target_first() {
        let dir = tempfile::tempdir().unwrap();
        let feed = dir.path().join("rss.xml");
        let items = dir.path().join("items.json");
        fs::write(&feed, "OLD").unwrap();
        fs::create_dir(&items).unwrap();

        let staged = [stage(&feed, b"NEW").unwrap(), stage(&items, b"[]").unwrap()];
        assert!(commit(&staged).is_err());
        assert_eq!(fs::read_to_string(&feed).unwrap(), "OLD");
    }
}
