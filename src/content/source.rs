//! Content sources
//!
//! A source enumerates the files of a collection folder and reads each one
//! into a raw metadata record plus body. The loader does not care where the
//! records come from.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use super::frontmatter::{self, FrontMatterError};
use super::schema::SchemaError;

/// A content file that has been read but not yet validated
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Storage path relative to the content root, `/`-separated
    pub source: String,
    pub metadata: serde_yaml::Mapping,
    pub body: String,
}

/// Underlying reason a single record could not be loaded
#[derive(Debug, Error)]
pub enum LoadCause {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Walk(#[from] walkdir::Error),

    #[error("{0}")]
    FrontMatter(#[from] FrontMatterError),

    #[error("{0}")]
    Schema(#[from] SchemaError),

    #[error("no such record")]
    NotFound,

    #[error("duplicate id `{0}`")]
    DuplicateId(String),
}

/// Read-only, enumerable collection of content records
pub trait ContentSource: Sync {
    /// Source paths of every record in a collection folder, sorted
    fn list(&self, folder: &str) -> Result<Vec<String>, LoadCause>;

    /// Read one record by source path
    fn read(&self, source: &str) -> Result<RawRecord, LoadCause>;
}

/// Content files on disk, one folder per collection
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ContentSource for FsSource {
    fn list(&self, folder: &str) -> Result<Vec<String>, LoadCause> {
        let dir = self.root.join(folder);
        if !dir.exists() {
            tracing::debug!("Content folder {:?} does not exist", dir);
            return Ok(Vec::new());
        }

        let mut sources = Vec::new();
        for entry in WalkDir::new(&dir).follow_links(true).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type().is_file() && is_content_file(path) {
                let relative = path.strip_prefix(&self.root).unwrap_or(path);
                sources.push(to_source_path(relative));
            }
        }

        sources.sort();
        Ok(sources)
    }

    fn read(&self, source: &str) -> Result<RawRecord, LoadCause> {
        let content = fs::read_to_string(self.root.join(source))?;
        let (metadata, body) = frontmatter::split(&content)?;

        Ok(RawRecord {
            source: source.to_string(),
            metadata,
            body: body.to_string(),
        })
    }
}

/// Content documents held in memory, keyed by source path
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a full document (front-matter block and body)
    pub fn insert(&mut self, source: impl Into<String>, document: impl Into<String>) {
        self.documents.insert(source.into(), document.into());
    }

    pub fn with(mut self, source: impl Into<String>, document: impl Into<String>) -> Self {
        self.insert(source, document);
        self
    }
}

impl ContentSource for MemorySource {
    fn list(&self, folder: &str) -> Result<Vec<String>, LoadCause> {
        let prefix = format!("{}/", folder.trim_end_matches('/'));
        Ok(self
            .documents
            .keys()
            .filter(|source| source.starts_with(&prefix))
            .cloned()
            .collect())
    }

    fn read(&self, source: &str) -> Result<RawRecord, LoadCause> {
        let document = self.documents.get(source).ok_or(LoadCause::NotFound)?;
        let (metadata, body) = frontmatter::split(document)?;

        Ok(RawRecord {
            source: source.to_string(),
            metadata,
            body: body.to_string(),
        })
    }
}

/// Check if a file holds markdown content
fn is_content_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "mdx" || e == "markdown")
        .unwrap_or(false)
}

fn to_source_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_source_lists_sorted_content_files() {
        let dir = tempfile::tempdir().unwrap();
        let posts = dir.path().join("posts");
        fs::create_dir_all(posts.join("2023")).unwrap();
        fs::write(posts.join("b.mdx"), "---\ntitle: B\n---\n").unwrap();
        fs::write(posts.join("a.md"), "---\ntitle: A\n---\n").unwrap();
        fs::write(posts.join("2023/old.md"), "---\ntitle: Old\n---\n").unwrap();
        fs::write(posts.join("cover.png"), [0u8; 4]).unwrap();

        let source = FsSource::new(dir.path());
        let listed = source.list("posts").unwrap();
        assert_eq!(listed, vec!["posts/2023/old.md", "posts/a.md", "posts/b.mdx"]);

        let record = source.read("posts/a.md").unwrap();
        assert_eq!(record.source, "posts/a.md");
        assert!(record.metadata.contains_key("title"));
    }

    #[test]
    fn test_fs_source_missing_folder_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsSource::new(dir.path());
        assert!(source.list("tips").unwrap().is_empty());
    }

    #[test]
    fn test_memory_source_filters_by_folder() {
        let source = MemorySource::new()
            .with("posts/a.md", "---\ntitle: A\n---\n")
            .with("postscript/b.md", "---\ntitle: B\n---\n")
            .with("tips/c.md", "---\ntitle: C\n---\n");

        assert_eq!(source.list("posts").unwrap(), vec!["posts/a.md"]);
        assert!(matches!(source.read("posts/zzz.md"), Err(LoadCause::NotFound)));
    }
}
