//! Front-matter schemas
//!
//! Every raw metadata record passes through here before anything else may
//! read it. A schema version selects exactly one accepted representation per
//! field and maps it onto the canonical types in [`super::entry`]; values in
//! any other shape are rejected instead of coerced.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use super::entry::{Author, AuthorId, Category, EmailAddress, Frontmatter, Image};

/// Which collection a record is validated against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    Entry(Category),
    Author,
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Entry(category) => write!(f, "{}", category),
            Schema::Author => f.write_str("author"),
        }
    }
}

/// Historical shapes of the entry front-matter
///
/// | version | `author`                 | `published` / `updated`    |
/// |---------|--------------------------|----------------------------|
/// | `v1`    | author name (free text)  | integer epoch milliseconds |
/// | `v2`    | author id reference      | integer epoch milliseconds |
/// | `v3`    | author id reference      | calendar date string       |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    V1,
    V2,
    #[default]
    V3,
}

impl SchemaVersion {
    fn author_by_name(self) -> bool {
        matches!(self, SchemaVersion::V1)
    }

    fn epoch_timestamps(self) -> bool {
        matches!(self, SchemaVersion::V1 | SchemaVersion::V2)
    }
}

/// A front-matter field failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("{schema}: missing required field `{field}` (expected {expected})")]
    Missing {
        schema: Schema,
        field: String,
        expected: &'static str,
    },

    #[error("{schema}: field `{field}` must be {expected}, found {found}")]
    WrongType {
        schema: Schema,
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{schema}: field `{field}` must not be empty")]
    Empty { schema: Schema, field: String },

    #[error("{schema}: field `{field}` is not a valid {expected}: `{value}`")]
    InvalidValue {
        schema: Schema,
        field: String,
        expected: &'static str,
        value: String,
    },

    #[error("{schema}: unknown field `{field}`")]
    UnknownField { schema: Schema, field: String },

    #[error("{schema}: author `{reference}` does not match any loaded author")]
    DanglingAuthor { schema: Schema, reference: String },

    #[error("{schema}: `updated` ({updated}) is earlier than `published` ({published})")]
    UpdatedBeforePublished {
        schema: Schema,
        published: DateTime<Utc>,
        updated: DateTime<Utc>,
    },
}

impl SchemaError {
    /// Name of the field that failed
    pub fn field(&self) -> &str {
        match self {
            SchemaError::Missing { field, .. }
            | SchemaError::WrongType { field, .. }
            | SchemaError::Empty { field, .. }
            | SchemaError::InvalidValue { field, .. }
            | SchemaError::UnknownField { field, .. } => field,
            SchemaError::DanglingAuthor { .. } => "author",
            SchemaError::UpdatedBeforePublished { .. } => "updated",
        }
    }

    /// Collection the failing record belongs to
    pub fn schema(&self) -> Schema {
        match self {
            SchemaError::Missing { schema, .. }
            | SchemaError::WrongType { schema, .. }
            | SchemaError::Empty { schema, .. }
            | SchemaError::InvalidValue { schema, .. }
            | SchemaError::UnknownField { schema, .. }
            | SchemaError::DanglingAuthor { schema, .. }
            | SchemaError::UpdatedBeforePublished { schema, .. } => *schema,
        }
    }
}

const ENTRY_FIELDS: &[&str] = &[
    "title",
    "description",
    "tags",
    "author",
    "image",
    "published",
    "updated",
];
const IMAGE_FIELDS: &[&str] = &["url", "alt"];
const AUTHOR_FIELDS: &[&str] = &["name", "image", "website", "email", "github"];
const EMAIL_FIELDS: &[&str] = &["name", "host"];

/// Loaded authors, keyed by id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Authors {
    by_id: BTreeMap<AuthorId, Author>,
}

impl Authors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an author; returns the previous author with the same id
    pub fn insert(&mut self, author: Author) -> Option<Author> {
        self.by_id.insert(author.id.clone(), author)
    }

    pub fn get(&self, id: &AuthorId) -> Option<&Author> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(&AuthorId::new(id))
    }

    /// Look up an author by display name (legacy front-matter)
    pub fn find_by_name(&self, name: &str) -> Option<&Author> {
        self.by_id.values().find(|a| a.name == name)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Author> {
        self.by_id.values()
    }
}

/// Validates entry front-matter for one schema version
pub struct Validator<'a> {
    version: SchemaVersion,
    authors: &'a Authors,
}

impl<'a> Validator<'a> {
    pub fn new(version: SchemaVersion, authors: &'a Authors) -> Self {
        Self { version, authors }
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Validate the front-matter of a post or tip
    pub fn validate_entry(
        &self,
        category: Category,
        raw: &Mapping,
    ) -> Result<Frontmatter, SchemaError> {
        let fields = Fields::new(Schema::Entry(category), raw, "");

        let title = fields.non_empty_string("title")?;
        let description = fields.non_empty_string("description")?;
        let tags = fields.string_list("tags")?;
        let author = self.resolve_author(&fields)?;

        let image_fields = fields.object("image", "a mapping with `url` and `alt`")?;
        let image = Image {
            url: image_fields.string("url")?,
            alt: image_fields.string("alt")?,
        };
        image_fields.deny_unknown(IMAGE_FIELDS)?;

        let published = self.timestamp(&fields, "published")?;
        let updated = self.timestamp(&fields, "updated")?;
        fields.deny_unknown(ENTRY_FIELDS)?;

        if updated < published {
            return Err(SchemaError::UpdatedBeforePublished {
                schema: fields.schema,
                published,
                updated,
            });
        }

        Ok(Frontmatter {
            title,
            description,
            tags,
            author,
            image,
            published,
            updated,
        })
    }

    fn resolve_author(&self, fields: &Fields<'_>) -> Result<AuthorId, SchemaError> {
        let reference = fields.non_empty_string("author")?;

        let resolved = if self.version.author_by_name() {
            self.authors.find_by_name(&reference).map(|a| a.id.clone())
        } else {
            let id = AuthorId::new(reference.as_str());
            self.authors.get(&id).map(|a| a.id.clone())
        };

        resolved.ok_or(SchemaError::DanglingAuthor {
            schema: fields.schema,
            reference,
        })
    }

    fn timestamp(&self, fields: &Fields<'_>, key: &str) -> Result<DateTime<Utc>, SchemaError> {
        if self.version.epoch_timestamps() {
            fields.epoch_millis(key)
        } else {
            fields.calendar_date(key)
        }
    }
}

/// Validate an author record; the id comes from its storage path
pub fn validate_author(id: &str, raw: &Mapping) -> Result<Author, SchemaError> {
    let fields = Fields::new(Schema::Author, raw, "");

    let name = fields.non_empty_string("name")?;
    let image = fields.string("image")?;
    let website = fields.string("website")?;

    let email_fields = fields.object("email", "a mapping with `name` and `host`")?;
    let email = EmailAddress {
        name: email_fields.non_empty_string("name")?,
        host: email_fields.non_empty_string("host")?,
    };
    email_fields.deny_unknown(EMAIL_FIELDS)?;

    let social_handle = fields.string("github")?;
    fields.deny_unknown(AUTHOR_FIELDS)?;

    Ok(Author {
        id: AuthorId::new(id),
        name,
        image,
        website,
        email,
        social_handle,
    })
}

/// Typed field access over one mapping level
struct Fields<'a> {
    schema: Schema,
    map: &'a Mapping,
    prefix: String,
}

impl<'a> Fields<'a> {
    fn new(schema: Schema, map: &'a Mapping, prefix: &str) -> Self {
        Self {
            schema,
            map,
            prefix: prefix.to_string(),
        }
    }

    fn path(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn required(&self, key: &str, expected: &'static str) -> Result<&'a Value, SchemaError> {
        match self.map.get(key) {
            Some(Value::Null) | None => Err(SchemaError::Missing {
                schema: self.schema,
                field: self.path(key),
                expected,
            }),
            Some(value) => Ok(value),
        }
    }

    fn wrong_type(&self, key: &str, expected: &'static str, value: &Value) -> SchemaError {
        SchemaError::WrongType {
            schema: self.schema,
            field: self.path(key),
            expected,
            found: kind(value),
        }
    }

    fn string(&self, key: &str) -> Result<String, SchemaError> {
        const EXPECTED: &str = "a string";
        match self.required(key, EXPECTED)? {
            Value::String(s) => Ok(s.clone()),
            other => Err(self.wrong_type(key, EXPECTED, other)),
        }
    }

    fn non_empty_string(&self, key: &str) -> Result<String, SchemaError> {
        let value = self.string(key)?;
        if value.trim().is_empty() {
            return Err(SchemaError::Empty {
                schema: self.schema,
                field: self.path(key),
            });
        }
        Ok(value)
    }

    fn string_list(&self, key: &str) -> Result<Vec<String>, SchemaError> {
        const EXPECTED: &str = "a list of strings";
        match self.required(key, EXPECTED)? {
            Value::Sequence(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(self.wrong_type(&format!("{}[{}]", key, i), "a string", other)),
                })
                .collect(),
            other => Err(self.wrong_type(key, EXPECTED, other)),
        }
    }

    fn object(&self, key: &str, expected: &'static str) -> Result<Fields<'a>, SchemaError> {
        match self.required(key, expected)? {
            Value::Mapping(map) => Ok(Fields::new(self.schema, map, &format!("{}.", self.path(key)))),
            other => Err(self.wrong_type(key, expected, other)),
        }
    }

    fn epoch_millis(&self, key: &str) -> Result<DateTime<Utc>, SchemaError> {
        const EXPECTED: &str = "an integer epoch timestamp in milliseconds";
        match self.required(key, EXPECTED)? {
            Value::Number(n) => {
                let millis = n.as_i64().ok_or_else(|| SchemaError::InvalidValue {
                    schema: self.schema,
                    field: self.path(key),
                    expected: EXPECTED,
                    value: n.to_string(),
                })?;
                Utc.timestamp_millis_opt(millis)
                    .single()
                    .ok_or_else(|| SchemaError::InvalidValue {
                        schema: self.schema,
                        field: self.path(key),
                        expected: EXPECTED,
                        value: millis.to_string(),
                    })
            }
            other => Err(self.wrong_type(key, EXPECTED, other)),
        }
    }

    fn calendar_date(&self, key: &str) -> Result<DateTime<Utc>, SchemaError> {
        const EXPECTED: &str = "a calendar date (YYYY-MM-DD or RFC 3339)";
        match self.required(key, EXPECTED)? {
            Value::String(s) => {
                parse_calendar_date(s).ok_or_else(|| SchemaError::InvalidValue {
                    schema: self.schema,
                    field: self.path(key),
                    expected: EXPECTED,
                    value: s.clone(),
                })
            }
            other => Err(self.wrong_type(key, EXPECTED, other)),
        }
    }

    fn deny_unknown(&self, known: &[&str]) -> Result<(), SchemaError> {
        for key in self.map.keys() {
            let name = match key {
                Value::String(s) => s.as_str(),
                _ => {
                    return Err(SchemaError::UnknownField {
                        schema: self.schema,
                        field: self.path(&format!("{:?}", key)),
                    })
                }
            };
            if !known.contains(&name) {
                return Err(SchemaError::UnknownField {
                    schema: self.schema,
                    field: self.path(name),
                });
            }
        }
        Ok(())
    }
}

/// Parse `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp
fn parse_calendar_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(src: &str) -> Mapping {
        serde_yaml::from_str(src).unwrap()
    }

    fn authors() -> Authors {
        let mut authors = Authors::new();
        authors.insert(
            validate_author(
                "jane",
                &yaml(
                    r#"
name: Jane Doe
image: /img/jane.png
website: https://jane.dev
email:
  name: jane
  host: jane.dev
github: janedoe
"#,
                ),
            )
            .unwrap(),
        );
        authors
    }

    const V3_POST: &str = r#"
title: Hello
description: A first post
tags: [rust, feeds]
author: jane
image:
  url: /img/hello.png
  alt: A greeting
published: 2024-01-15
updated: 2024-02-01T10:00:00Z
"#;

    #[test]
    fn test_v3_entry() {
        let authors = authors();
        let validator = Validator::new(SchemaVersion::V3, &authors);
        let fm = validator
            .validate_entry(Category::Post, &yaml(V3_POST))
            .unwrap();

        assert_eq!(fm.title, "Hello");
        assert_eq!(fm.tags, vec!["rust", "feeds"]);
        assert_eq!(fm.author, AuthorId::new("jane"));
        assert_eq!(fm.published.to_rfc3339(), "2024-01-15T00:00:00+00:00");
        assert_eq!(fm.updated.to_rfc3339(), "2024-02-01T10:00:00+00:00");
    }

    #[test]
    fn test_v2_epoch_entry() {
        let authors = authors();
        let validator = Validator::new(SchemaVersion::V2, &authors);
        let raw = yaml(
            r#"
title: Epoch
description: Numeric dates
tags: []
author: jane
image: { url: /a.png, alt: "" }
published: 1700000000000
updated: 1700000000000
"#,
        );
        let fm = validator.validate_entry(Category::Tip, &raw).unwrap();
        assert_eq!(fm.published.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(fm.published, fm.updated);
    }

    #[test]
    fn test_updated_before_published_is_rejected() {
        let authors = authors();
        let validator = Validator::new(SchemaVersion::V2, &authors);
        let raw = yaml(
            r#"
title: Backwards
description: Edited before it existed
tags: []
author: jane
image: { url: /a.png, alt: a }
published: 100
updated: 50
"#,
        );
        let err = validator.validate_entry(Category::Post, &raw).unwrap_err();
        assert!(matches!(err, SchemaError::UpdatedBeforePublished { .. }));
        assert_eq!(err.field(), "updated");
        assert_eq!(err.schema(), Schema::Entry(Category::Post));
    }

    #[test]
    fn test_dangling_author_is_rejected() {
        let authors = authors();
        let validator = Validator::new(SchemaVersion::V3, &authors);
        let raw = yaml(&V3_POST.replace("author: jane", "author: nonexistent-id"));
        let err = validator.validate_entry(Category::Post, &raw).unwrap_err();
        assert_eq!(
            err,
            SchemaError::DanglingAuthor {
                schema: Schema::Entry(Category::Post),
                reference: "nonexistent-id".to_string(),
            }
        );
    }

    #[test]
    fn test_v1_resolves_author_by_name() {
        let authors = authors();
        let validator = Validator::new(SchemaVersion::V1, &authors);
        let raw = yaml(
            r#"
title: Legacy
description: Free-text author
tags: [old]
author: Jane Doe
image: { url: /a.png, alt: a }
published: 1600000000000
updated: 1600000000001
"#,
        );
        let fm = validator.validate_entry(Category::Post, &raw).unwrap();
        assert_eq!(fm.author, AuthorId::new("jane"));

        let by_id = yaml(&serde_yaml::to_string(&raw).unwrap().replace("Jane Doe", "jane"));
        assert!(matches!(
            validator.validate_entry(Category::Post, &by_id),
            Err(SchemaError::DanglingAuthor { .. })
        ));
    }

    #[test]
    fn test_epoch_is_not_coerced_into_calendar_schema() {
        let authors = authors();
        let validator = Validator::new(SchemaVersion::V3, &authors);
        let raw = yaml(&V3_POST.replace("published: 2024-01-15", "published: 1705276800000"));
        let err = validator.validate_entry(Category::Post, &raw).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::WrongType {
                found: "a number",
                ..
            }
        ));
        assert_eq!(err.field(), "published");
    }

    #[test]
    fn test_calendar_is_not_coerced_into_epoch_schema() {
        let authors = authors();
        let validator = Validator::new(SchemaVersion::V2, &authors);
        let err = validator
            .validate_entry(Category::Post, &yaml(V3_POST))
            .unwrap_err();
        assert_eq!(err.field(), "published");
        assert!(matches!(err, SchemaError::WrongType { found: "a string", .. }));
    }

    #[test]
    fn test_first_failing_field_is_reported() {
        let authors = authors();
        let validator = Validator::new(SchemaVersion::V3, &authors);
        let raw = yaml("title: Only a title\n");
        let err = validator.validate_entry(Category::Tip, &raw).unwrap_err();
        assert_eq!(err.field(), "description");
        assert!(matches!(err, SchemaError::Missing { .. }));
    }

    #[test]
    fn test_empty_title_is_rejected() {
        let authors = authors();
        let validator = Validator::new(SchemaVersion::V3, &authors);
        let raw = yaml(&V3_POST.replace("title: Hello", "title: \"  \""));
        let err = validator.validate_entry(Category::Post, &raw).unwrap_err();
        assert!(matches!(err, SchemaError::Empty { .. }));
        assert_eq!(err.field(), "title");
    }

    #[test]
    fn test_nested_field_path() {
        let authors = authors();
        let validator = Validator::new(SchemaVersion::V3, &authors);
        let raw = yaml(&V3_POST.replace("alt: A greeting", "alt: 3"));
        let err = validator.validate_entry(Category::Post, &raw).unwrap_err();
        assert_eq!(err.field(), "image.alt");
    }

    #[test]
    fn test_tags_must_be_strings() {
        let authors = authors();
        let validator = Validator::new(SchemaVersion::V3, &authors);
        let raw = yaml(&V3_POST.replace("tags: [rust, feeds]", "tags: rust"));
        let err = validator.validate_entry(Category::Post, &raw).unwrap_err();
        assert_eq!(err.field(), "tags");

        let raw = yaml(&V3_POST.replace("tags: [rust, feeds]", "tags: [rust, 7]"));
        let err = validator.validate_entry(Category::Post, &raw).unwrap_err();
        assert_eq!(err.field(), "tags[1]");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let authors = authors();
        let validator = Validator::new(SchemaVersion::V3, &authors);
        let raw = yaml(&format!("{}draft: true\n", V3_POST));
        let err = validator.validate_entry(Category::Post, &raw).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownField { .. }));
        assert_eq!(err.field(), "draft");
    }

    #[test]
    fn test_invalid_calendar_date() {
        let authors = authors();
        let validator = Validator::new(SchemaVersion::V3, &authors);
        let raw = yaml(&V3_POST.replace("published: 2024-01-15", "published: 2024-13-45"));
        let err = validator.validate_entry(Category::Post, &raw).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidValue { .. }));
    }

    #[test]
    fn test_author_requires_split_email() {
        let raw = yaml(
            r#"
name: Jane Doe
image: /img/jane.png
website: https://jane.dev
email: jane@jane.dev
github: janedoe
"#,
        );
        let err = validate_author("jane", &raw).unwrap_err();
        assert_eq!(err.field(), "email");
        assert_eq!(err.schema(), Schema::Author);
    }

    #[test]
    fn test_schema_version_from_config() {
        let version: SchemaVersion = serde_yaml::from_str("v1").unwrap();
        assert_eq!(version, SchemaVersion::V1);
        assert_eq!(SchemaVersion::default(), SchemaVersion::V3);
    }
}
