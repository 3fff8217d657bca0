//! RSS feed serialization
//!
//! Items are written in timeline order. Every item is projected before any
//! XML is produced, so a single bad item aborts the feed instead of leaving
//! a truncated document behind.

use chrono::{DateTime, Datelike, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::HashMap;
use std::io::Cursor;

use super::SerializationError;
use crate::aggregate::Timeline;
use crate::config::SiteConfig;
use crate::content::ContentEntry;
use crate::helpers::{absolute_url, pub_date};

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Years an RFC 822 `pubDate` can spell with four digits
const PUB_DATE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Channel-level feed metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMeta {
    pub title: String,
    pub description: String,
    pub site_url: String,
    pub language: String,
    /// Raw XML copied into the channel unchanged
    pub custom_data: Option<String>,
}

impl FeedMeta {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            site_url: config.url.clone(),
            language: config.language.clone(),
            custom_data: config.custom_data.clone(),
        }
    }

    fn validate(&self) -> Result<(), SerializationError> {
        let required = [
            ("title", &self.title),
            ("description", &self.description),
            ("siteUrl", &self.site_url),
            ("language", &self.language),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(SerializationError::MissingChannelField(field));
            }
        }
        Ok(())
    }
}

/// Projection of an entry for syndication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub description: String,
    pub canonical_url: String,
    pub published_at: DateTime<Utc>,
}

impl FeedItem {
    /// Project an entry, failing on any missing required field
    pub fn project(entry: &ContentEntry, site_url: &str) -> Result<Self, SerializationError> {
        let missing = |field: &'static str| SerializationError::MissingField {
            item: entry.source.clone(),
            field,
        };

        let fm = &entry.frontmatter;
        if fm.title.trim().is_empty() {
            return Err(missing("title"));
        }
        if fm.description.trim().is_empty() {
            return Err(missing("description"));
        }
        if entry.slug().is_empty() {
            return Err(missing("link"));
        }
        if !PUB_DATE_YEARS.contains(&fm.published.year()) {
            return Err(SerializationError::InvalidField {
                item: entry.source.clone(),
                field: "pubDate",
                value: fm.published.to_rfc3339(),
            });
        }

        Ok(Self {
            title: fm.title.clone(),
            description: fm.description.clone(),
            canonical_url: absolute_url(site_url, &entry.canonical_path()),
            published_at: fm.published,
        })
    }
}

/// Project every timeline entry and reject duplicate links
pub fn feed_items(timeline: &Timeline<'_>, site_url: &str) -> Result<Vec<FeedItem>, SerializationError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    let mut items = Vec::with_capacity(timeline.len());

    for entry in timeline.iter() {
        let item = FeedItem::project(entry, site_url)?;
        if let Some(first) = seen.insert(item.canonical_url.clone(), entry.source.as_str()) {
            return Err(SerializationError::DuplicateLink {
                link: item.canonical_url,
                first: first.to_string(),
                second: entry.source.clone(),
            });
        }
        items.push(item);
    }

    Ok(items)
}

/// Render the timeline as an RSS 2.0 document
pub fn render_feed(meta: &FeedMeta, timeline: &Timeline<'_>) -> Result<String, SerializationError> {
    meta.validate()?;
    let items = feed_items(timeline, &meta.site_url)?;

    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    writer.write_event(Event::Start(rss)).map_err(xml_error)?;
    writer
        .write_event(Event::Start(BytesStart::new("channel")))
        .map_err(xml_error)?;

    write_text_element(&mut writer, "title", &meta.title)?;
    write_text_element(&mut writer, "description", &meta.description)?;
    write_text_element(&mut writer, "link", &meta.site_url)?;
    write_text_element(&mut writer, "language", &meta.language)?;

    if let Some(custom) = meta.custom_data.as_deref().filter(|c| !c.trim().is_empty()) {
        writer
            .write_event(Event::Text(BytesText::from_escaped(custom)))
            .map_err(xml_error)?;
    }

    for item in &items {
        write_item(&mut writer, item)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("channel")))
        .map_err(xml_error)?;
    writer
        .write_event(Event::End(BytesEnd::new("rss")))
        .map_err(xml_error)?;

    let mut xml = String::from_utf8(writer.into_inner().into_inner()).map_err(xml_error)?;
    xml.push('\n');
    Ok(xml)
}

fn write_item(writer: &mut XmlWriter, item: &FeedItem) -> Result<(), SerializationError> {
    writer
        .write_event(Event::Start(BytesStart::new("item")))
        .map_err(xml_error)?;

    write_text_element(writer, "title", &item.title)?;
    write_text_element(writer, "link", &item.canonical_url)?;

    let mut guid = BytesStart::new("guid");
    guid.push_attribute(("isPermaLink", "true"));
    writer.write_event(Event::Start(guid)).map_err(xml_error)?;
    writer
        .write_event(Event::Text(BytesText::new(&item.canonical_url)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::End(BytesEnd::new("guid")))
        .map_err(xml_error)?;

    write_text_element(writer, "description", &item.description)?;
    write_text_element(writer, "pubDate", &pub_date(&item.published_at))?;

    writer
        .write_event(Event::End(BytesEnd::new("item")))
        .map_err(xml_error)?;
    Ok(())
}

/// Write a text element: `<tag>text</tag>`
fn write_text_element(writer: &mut XmlWriter, tag: &str, text: &str) -> Result<(), SerializationError> {
    writer
        .write_event(Event::Start(BytesStart::new(tag)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(xml_error)?;
    Ok(())
}

fn xml_error<E: std::fmt::Display>(e: E) -> SerializationError {
    SerializationError::Xml(e.to_string())
}
