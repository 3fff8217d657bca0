//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left unescaped in query components
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// How a storage path is turned into a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlMode {
    /// `/<folder>/<leaf>/`
    Wrapped,
    /// `<leaf>` only, e.g. for query parameters
    Slug,
}

/// Derive a URL from a storage path
///
/// Only the last two path segments are kept (the collection folder and the
/// leaf file) and only the final extension of the leaf is removed.
///
/// # Examples
/// ```ignore
/// derive_url("src/content/posts/foo.mdx", UrlMode::Wrapped) // -> "/posts/foo/"
/// derive_url("posts/foo.mdx", UrlMode::Slug)                // -> "foo"
/// ```
pub fn derive_url(source: &str, mode: UrlMode) -> String {
    let segments: Vec<&str> = source.split('/').filter(|s| !s.is_empty()).collect();

    let (folder, leaf) = match segments.as_slice() {
        [.., folder, leaf] => (Some(*folder), strip_extension(leaf)),
        [leaf] => (None, strip_extension(leaf)),
        [] => (None, ""),
    };

    match mode {
        UrlMode::Slug => leaf.to_string(),
        UrlMode::Wrapped => match folder {
            Some(folder) => format!("/{}/{}/", folder, leaf),
            None if leaf.is_empty() => "/".to_string(),
            None => format!("/{}/", leaf),
        },
    }
}

/// Canonical path of a storage path, e.g. `/posts/foo/`
pub fn canonical_path(source: &str) -> String {
    derive_url(source, UrlMode::Wrapped)
}

/// Bare slug of a storage path, e.g. `foo`
pub fn slug(source: &str) -> String {
    derive_url(source, UrlMode::Slug)
}

/// Remove the final extension; dotfiles keep their name
fn strip_extension(leaf: &str) -> &str {
    match leaf.rfind('.') {
        Some(dot) if dot > 0 => &leaf[..dot],
        _ => leaf,
    }
}

/// Join the site base URL and a site path
///
/// # Examples
/// ```ignore
/// absolute_url("https://example.com/", "/posts/foo/") // -> "https://example.com/posts/foo/"
/// ```
pub fn absolute_url(site_url: &str, path: &str) -> String {
    let base = site_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}

/// Percent-encode a value for use inside a query string
pub fn encode_query_component(value: &str) -> String {
    utf8_percent_encode(value, QUERY_COMPONENT).to_string()
}
