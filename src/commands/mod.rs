//! Command implementations used by the CLI

pub mod build;
pub mod clean;
pub mod list;
