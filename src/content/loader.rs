//! Content loader - loads and validates every entry of the requested categories

use rayon::prelude::*;
use std::collections::BTreeMap;
use thiserror::Error;

use super::entry::{Category, ContentEntry};
use super::schema::{validate_author, Authors, SchemaVersion, Validator};
use super::source::{ContentSource, LoadCause};

/// Folder holding author records
pub const AUTHOR_FOLDER: &str = "author";

/// A record could not be loaded; the whole run fails
#[derive(Debug, Error)]
#[error("failed to load {collection} `{source_path}`: {cause}")]
pub struct LoadError {
    pub collection: String,
    pub source_path: String,
    #[source]
    pub cause: LoadCause,
}

impl LoadError {
    fn new(collection: impl Into<String>, source_path: impl Into<String>, cause: impl Into<LoadCause>) -> Self {
        Self {
            collection: collection.into(),
            source_path: source_path.into(),
            cause: cause.into(),
        }
    }
}

/// Every entry of one category, ordered by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySet {
    pub category: Category,
    entries: BTreeMap<String, ContentEntry>,
}

impl CategorySet {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ContentEntry> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of a complete load
#[derive(Debug, Clone)]
pub struct LoadedContent {
    pub authors: Authors,
    pub sets: Vec<CategorySet>,
}

impl LoadedContent {
    pub fn set(&self, category: Category) -> Option<&CategorySet> {
        self.sets.iter().find(|s| s.category == category)
    }

    /// Total number of entries across all categories
    pub fn entry_count(&self) -> usize {
        self.sets.iter().map(CategorySet::len).sum()
    }
}

/// Loads content from a source
pub struct ContentLoader<'a, S: ContentSource> {
    source: &'a S,
    version: SchemaVersion,
}

impl<'a, S: ContentSource> ContentLoader<'a, S> {
    /// Create a new content loader
    pub fn new(source: &'a S, version: SchemaVersion) -> Self {
        Self { source, version }
    }

    /// Load authors, then every requested category
    ///
    /// Categories are read in parallel. Any failure fails the whole load, so
    /// callers never observe a partially loaded category.
    pub fn load(&self, categories: &[Category]) -> Result<LoadedContent, LoadError> {
        let authors = self.load_authors()?;

        let mut requested: Vec<Category> = Vec::with_capacity(categories.len());
        for category in categories {
            if !requested.contains(category) {
                requested.push(*category);
            }
        }

        // Results stay in request order; the first failing category wins.
        let results: Vec<Result<CategorySet, LoadError>> = requested
            .par_iter()
            .map(|category| self.load_category(*category, &authors))
            .collect();
        let sets = results.into_iter().collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            "Loaded {} authors and {} entries",
            authors.len(),
            sets.iter().map(CategorySet::len).sum::<usize>()
        );

        Ok(LoadedContent { authors, sets })
    }

    /// Load every record of the author collection
    pub fn load_authors(&self) -> Result<Authors, LoadError> {
        let sources = self
            .source
            .list(AUTHOR_FOLDER)
            .map_err(|e| LoadError::new(AUTHOR_FOLDER, AUTHOR_FOLDER, e))?;

        let mut authors = Authors::new();
        for source in sources {
            let id = entry_id(AUTHOR_FOLDER, &source);
            let author = self
                .source
                .read(&source)
                .and_then(|raw| validate_author(&id, &raw.metadata).map_err(LoadCause::from))
                .map_err(|e| LoadError::new(AUTHOR_FOLDER, &source, e))?;

            if authors.insert(author).is_some() {
                return Err(LoadError::new(AUTHOR_FOLDER, &source, LoadCause::DuplicateId(id)));
            }
        }

        Ok(authors)
    }

    /// Load and validate every entry of one category
    pub fn load_category(
        &self,
        category: Category,
        authors: &Authors,
    ) -> Result<CategorySet, LoadError> {
        let folder = category.folder();
        let validator = Validator::new(self.version, authors);

        let sources = self
            .source
            .list(folder)
            .map_err(|e| LoadError::new(category.name(), folder, e))?;

        let mut set = CategorySet::new(category);
        for source in sources {
            let raw = self
                .source
                .read(&source)
                .map_err(|e| LoadError::new(category.name(), &source, e))?;
            let frontmatter = validator
                .validate_entry(category, &raw.metadata)
                .map_err(|e| LoadError::new(category.name(), &source, e))?;

            let id = entry_id(folder, &source);
            tracing::debug!("Loaded {} {}", category, id);

            let entry = ContentEntry {
                id: id.clone(),
                category,
                source: raw.source,
                frontmatter,
                body: raw.body,
            };
            if set.entries.insert(id.clone(), entry).is_some() {
                return Err(LoadError::new(category.name(), &source, LoadCause::DuplicateId(id)));
            }
        }

        Ok(set)
    }
}

/// Id of a record: its path inside the collection folder, without extension
fn entry_id(folder: &str, source: &str) -> String {
    let relative = source
        .strip_prefix(folder)
        .map(|rest| rest.trim_start_matches('/'))
        .unwrap_or(source);

    match relative.rfind('.') {
        Some(dot) if dot > 0 && !relative[dot..].contains('/') => relative[..dot].to_string(),
        _ => relative.to_string(),
    }
}
