//! Aggregation - merges category sets into one timeline
//!
//! Category sets are not assumed to be ordered by date, so the timeline is a
//! full merge-then-sort: newest `published` first, ties broken by ascending
//! id (then category, for ids shared across categories).

use std::cmp::Ordering;

use crate::content::{CategorySet, ContentEntry};

/// Entries from all categories in feed order
#[derive(Debug, Clone, Default)]
pub struct Timeline<'a> {
    entries: Vec<&'a ContentEntry>,
}

impl<'a> Timeline<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &'a ContentEntry> + '_ {
        self.entries.iter().copied()
    }

    pub fn entries(&self) -> &[&'a ContentEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keep only the newest `limit` entries
    pub fn truncate(&mut self, limit: usize) {
        self.entries.truncate(limit);
    }
}

/// Merge category sets into a single timeline
pub fn aggregate<'a, I>(sets: I) -> Timeline<'a>
where
    I: IntoIterator<Item = &'a CategorySet>,
{
    let mut entries: Vec<&'a ContentEntry> = sets.into_iter().flat_map(CategorySet::iter).collect();
    entries.sort_by(|a, b| feed_order(a, b));

    tracing::debug!("Aggregated {} entries", entries.len());
    Timeline { entries }
}

/// Newest first, then ascending id, then category
pub fn feed_order(a: &ContentEntry, b: &ContentEntry) -> Ordering {
    b.frontmatter
        .published
        .cmp(&a.frontmatter.published)
        .then_with(|| a.id.cmp(&b.id))
        .then_with(|| a.category.cmp(&b.category))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Category, ContentLoader, MemorySource, SchemaVersion};

    const JANE: &str = "---\nname: Jane\nimage: /j.png\nwebsite: https://j.dev\nemail: {name: jane, host: j.dev}\ngithub: jane\n---\n";

    fn doc(published: &str) -> String {
        format!(
            "---\ntitle: T\ndescription: D\ntags: []\nauthor: jane\nimage: {{url: /i.png, alt: i}}\npublished: {published}\nupdated: {published}\n---\n"
        )
    }

    fn ids(timeline: &Timeline<'_>) -> Vec<String> {
        timeline
            .iter()
            .map(|e| format!("{}/{}", e.category, e.id))
            .collect()
    }

    #[test]
    fn test_newest_first_across_categories() {
        let source = MemorySource::new()
            .with("author/jane.md", JANE)
            .with("posts/day3.mdx", doc("2024-01-03"))
            .with("posts/day1.mdx", doc("2024-01-01"))
            .with("tips/day2.mdx", doc("2024-01-02"));
        let content = ContentLoader::new(&source, SchemaVersion::V3)
            .load(&Category::ALL)
            .unwrap();

        let timeline = aggregate(&content.sets);
        assert_eq!(ids(&timeline), vec!["post/day3", "tip/day2", "post/day1"]);
    }

    #[test]
    fn test_ties_break_by_id_then_category() {
        let source = MemorySource::new()
            .with("author/jane.md", JANE)
            .with("tips/b.mdx", doc("2024-01-01"))
            .with("posts/c.mdx", doc("2024-01-01"))
            .with("posts/a.mdx", doc("2024-01-01"))
            .with("tips/a.mdx", doc("2024-01-01"));
        let content = ContentLoader::new(&source, SchemaVersion::V3)
            .load(&[Category::Tip, Category::Post])
            .unwrap();

        let timeline = aggregate(&content.sets);
        assert_eq!(ids(&timeline), vec!["post/a", "tip/a", "tip/b", "post/c"]);
    }

    #[test]
    fn test_order_independent_of_set_order() {
        let source = MemorySource::new()
            .with("author/jane.md", JANE)
            .with("posts/x.mdx", doc("2024-03-01"))
            .with("posts/y.mdx", doc("2024-01-01"))
            .with("tips/z.mdx", doc("2024-02-01"));
        let content = ContentLoader::new(&source, SchemaVersion::V3)
            .load(&Category::ALL)
            .unwrap();

        let forward = ids(&aggregate(&content.sets));
        let backward = ids(&aggregate(content.sets.iter().rev()));
        assert_eq!(forward, backward);

        let timeline = aggregate(&content.sets);
        for pair in timeline.entries().windows(2) {
            assert_ne!(feed_order(pair[0], pair[1]), Ordering::Greater);
        }
    }

    #[test]
    fn test_truncate_keeps_newest() {
        let source = MemorySource::new()
            .with("author/jane.md", JANE)
            .with("posts/old.mdx", doc("2020-01-01"))
            .with("posts/new.mdx", doc("2024-01-01"));
        let content = ContentLoader::new(&source, SchemaVersion::V3)
            .load(&[Category::Post])
            .unwrap();

        let mut timeline = aggregate(&content.sets);
        timeline.truncate(1);
        assert_eq!(ids(&timeline), vec!["post/new"]);
    }

    #[test]
    fn test_empty_input() {
        let timeline = aggregate(std::iter::empty());
        assert!(timeline.is_empty());
    }
}
