//! Helper functions shared by the feed pipeline and the relays

mod date;
mod url;

pub use date::*;
pub use url::*;
