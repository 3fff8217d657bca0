//! Per-item display metadata (items.json)

use serde::Serialize;

use super::SerializationError;
use crate::aggregate::Timeline;
use crate::content::{Author, Authors, Category, ContentEntry, Image};
use crate::helpers::{absolute_url, date_xml};

/// What a page needs to show an entry card or header
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayMeta<'a> {
    pub category: Category,
    pub id: &'a str,
    pub slug: String,
    pub path: String,
    pub url: String,
    pub title: &'a str,
    pub description: &'a str,
    pub tags: &'a [String],
    pub image: &'a Image,
    pub author: &'a Author,
    pub published: String,
    pub updated: String,
}

impl<'a> DisplayMeta<'a> {
    pub fn project(
        entry: &'a ContentEntry,
        authors: &'a Authors,
        site_url: &str,
    ) -> Result<Self, SerializationError> {
        let fm = &entry.frontmatter;
        let author = authors
            .get(&fm.author)
            .ok_or_else(|| SerializationError::MissingField {
                item: entry.source.clone(),
                field: "author",
            })?;

        let path = entry.canonical_path();
        Ok(Self {
            category: entry.category,
            id: &entry.id,
            slug: entry.slug(),
            url: absolute_url(site_url, &path),
            path,
            title: &fm.title,
            description: &fm.description,
            tags: &fm.tags,
            image: &fm.image,
            author,
            published: date_xml(&fm.published),
            updated: date_xml(&fm.updated),
        })
    }
}

/// Render display metadata for every timeline entry as a JSON array
pub fn render_items(
    timeline: &Timeline<'_>,
    authors: &Authors,
    site_url: &str,
) -> Result<String, SerializationError> {
    let items = timeline
        .iter()
        .map(|entry| DisplayMeta::project(entry, authors, site_url))
        .collect::<Result<Vec<_>, _>>()?;

    serde_json::to_string_pretty(&items).map_err(|e| SerializationError::Json(e.to_string()))
}
