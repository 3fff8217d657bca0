//! Front-matter splitting
//!
//! Separates the YAML block delimited by `---` lines from the body of a
//! content file. The split is strict: a file without a well-formed block
//! is an error, never a default record.

use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// Why a file's front-matter could not be read
#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("no front-matter block (file must start with `---`)")]
    Missing,

    #[error("front-matter block is not closed by a `---` line")]
    Unterminated,

    #[error("front-matter is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("front-matter must be a key/value mapping")]
    NotAMapping,
}

/// Split a content file into its raw metadata mapping and its body
pub fn split(content: &str) -> Result<(Mapping, &str), FrontMatterError> {
    let content = content.trim_start_matches('\u{feff}').trim_start();

    let rest = content
        .strip_prefix("---")
        .ok_or(FrontMatterError::Missing)?;
    let rest = rest.trim_start_matches([' ', '\t']);
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .ok_or(FrontMatterError::Missing)?;

    let (yaml, body) = find_closing(rest).ok_or(FrontMatterError::Unterminated)?;

    if yaml.trim().is_empty() {
        return Ok((Mapping::new(), body));
    }

    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Mapping(map) => Ok((map, body)),
        _ => Err(FrontMatterError::NotAMapping),
    }
}

/// Find the closing delimiter; returns (yaml, body)
fn find_closing(rest: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body.trim_start_matches(['\n', '\r'])));
        }
        offset += line.len();
    }
    None
}
