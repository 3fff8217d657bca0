//! Content module - entry models, front-matter schemas, sources and loading

mod entry;
pub mod frontmatter;
pub mod loader;
pub mod schema;
pub mod source;

pub use entry::{Author, AuthorId, Category, ContentEntry, EmailAddress, Frontmatter, Image};
pub use loader::{CategorySet, ContentLoader, LoadError, LoadedContent};
pub use schema::{Authors, Schema, SchemaError, SchemaVersion, Validator};
pub use source::{ContentSource, FsSource, LoadCause, MemorySource, RawRecord};
