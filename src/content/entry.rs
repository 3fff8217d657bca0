//! Content entry and author models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::helpers::{canonical_path, slug};

/// Content categories that can appear in the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Post,
    Tip,
}

impl Category {
    /// All known categories, in their default load order
    pub const ALL: [Category; 2] = [Category::Post, Category::Tip];

    /// Singular name used in configuration and error messages
    pub fn name(&self) -> &'static str {
        match self {
            Category::Post => "post",
            Category::Tip => "tip",
        }
    }

    /// Folder under the content directory holding this category
    pub fn folder(&self) -> &'static str {
        match self {
            Category::Post => "posts",
            Category::Tip => "tips",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "post" | "posts" => Ok(Category::Post),
            "tip" | "tips" => Ok(Category::Tip),
            other => Err(format!("unknown category `{}` (expected post or tip)", other)),
        }
    }
}

/// Identifier of an entry in the author collection
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(String);

impl AuthorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cover image of an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub alt: String,
}

/// Validated front-matter shared by posts and tips
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frontmatter {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub author: AuthorId,
    pub image: Image,
    pub published: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// One published post or tip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntry {
    /// Path of the entry inside its category folder, without extension
    pub id: String,

    pub category: Category,

    /// Storage path relative to the content root (e.g. `posts/foo.mdx`)
    pub source: String,

    pub frontmatter: Frontmatter,

    /// Unprocessed body text
    pub body: String,
}

impl ContentEntry {
    /// Canonical site path, e.g. `/posts/foo/`
    pub fn canonical_path(&self) -> String {
        canonical_path(&self.source)
    }

    /// Bare leaf slug, e.g. `foo`
    pub fn slug(&self) -> String {
        slug(&self.source)
    }
}

/// Email address kept split into name and host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub name: String,
    pub host: String,
}

impl EmailAddress {
    /// Join the parts back into a deliverable address
    pub fn address(&self) -> String {
        format!("{}@{}", self.name, self.host)
    }
}

/// An author referenced by entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    pub image: String,
    pub website: String,
    pub email: EmailAddress,
    pub social_handle: String,
}
