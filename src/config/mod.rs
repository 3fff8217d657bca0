//! Configuration module

mod site;

pub use site::RelayConfig;
pub use site::SiteConfig;
pub use site::{ENV_CONTACT_API_KEY, ENV_SITE_URL};
