//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::content::{Category, SchemaVersion};

/// Environment variable overriding the site base URL
pub const ENV_SITE_URL: &str = "SITE_URL";

/// Environment variable holding the contact-list API key
pub const ENV_CONTACT_API_KEY: &str = "SENDGRID_KEY";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Feed channel
    pub title: String,
    pub description: String,
    pub url: String,
    pub language: String,
    /// Raw XML inserted into the feed channel as-is
    pub custom_data: Option<String>,
    /// Maximum number of feed items; all when unset
    pub feed_limit: Option<usize>,

    // Content
    pub content_dir: String,
    pub categories: Vec<Category>,
    pub schema_version: SchemaVersion,

    // Output
    pub public_dir: String,
    pub feed_path: String,
    pub items_path: String,

    pub relay: RelayConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "ByteofDev".to_string(),
            description: "Bite Sized articles for developers".to_string(),
            url: "http://example.com".to_string(),
            language: "en-us".to_string(),
            custom_data: None,
            feed_limit: None,

            content_dir: "src/content".to_string(),
            categories: Category::ALL.to_vec(),
            schema_version: SchemaVersion::default(),

            public_dir: "public".to_string(),
            feed_path: "rss.xml".to_string(),
            items_path: "items.json".to_string(),

            relay: RelayConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply deploy-time settings from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply deploy-time settings from a lookup function
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_SITE_URL).filter(|v| !v.trim().is_empty()) {
            tracing::debug!("Site URL overridden from {}", ENV_SITE_URL);
            self.url = url;
        }

        self.relay.contact_api_key = lookup(ENV_CONTACT_API_KEY).filter(|v| !v.trim().is_empty());
        if self.relay.contact_api_key.is_none() {
            tracing::debug!("{} is not set; signup relay disabled", ENV_CONTACT_API_KEY);
        }
    }
}

/// Upstream endpoints used by the relay server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub contact_api_url: String,
    pub event_api_url: String,
    /// Where a successful signup is redirected
    pub thanks_path: String,

    /// Bearer credential; only ever read from the environment
    #[serde(skip)]
    pub contact_api_key: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            contact_api_url: "https://api.sendgrid.com/v3/marketing/contacts".to_string(),
            event_api_url: "https://plausible.io/api/event".to_string(),
            thanks_path: "/thanks".to_string(),
            contact_api_key: None,
        }
    }
}
