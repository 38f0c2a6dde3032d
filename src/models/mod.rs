//! Data models
//!
//! Content entities owned by the remote API (Article, Category, Tag, User,
//! Comment) plus the shared pieces needed to read its responses:
//! - `EntityId` for ids that arrive as numbers or strings
//! - `Page<T>` for list responses, paginated or bare
//! - lenient date parsing

mod article;
mod category;
mod comment;
mod site;
mod tag;
mod user;

pub use article::{Article, Author, AuthorProfile, Bookmark};
pub use category::Category;
pub use comment::Comment;
pub use site::SiteSettings;
pub use tag::Tag;
pub use user::User;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a remote entity
///
/// The API is not consistent about numeric vs string ids, so both are
/// accepted and kept in their textual form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Signed(i64),
            Unsigned(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Signed(n) => Self(n.to_string()),
            Raw::Unsigned(n) => Self(n.to_string()),
            Raw::Text(s) => Self(s),
        })
    }
}

/// One page of a list response
///
/// Accepts both the DRF envelope `{count, next, previous, results}` and a
/// bare JSON array.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub count: Option<u64>,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// A single page holding every item
    pub fn from_items(results: Vec<T>) -> Self {
        Self {
            count: Some(results.len() as u64),
            next: None,
            previous: None,
            results,
        }
    }

    /// Total item count, falling back to the size of this page
    pub fn total(&self) -> u64 {
        self.count.unwrap_or(self.results.len() as u64)
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_items(self) -> Vec<T> {
        self.results
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::from_items(Vec::new())
    }
}

impl<'de, T> Deserialize<'de> for Page<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Envelope<T> {
            Paged {
                #[serde(default)]
                count: Option<u64>,
                #[serde(default)]
                next: Option<String>,
                #[serde(default)]
                previous: Option<String>,
                results: Vec<T>,
            },
            Bare(Vec<T>),
        }

        Ok(match Envelope::deserialize(deserializer)? {
            Envelope::Paged { count, next, previous, results } => Page {
                count,
                next,
                previous,
                results,
            },
            Envelope::Bare(results) => Page::from_items(results),
        })
    }
}

/// Deserialize `null` as the type's default
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize an optional timestamp, turning malformed values into `None`
pub(crate) fn lenient_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => parse_api_date(&s),
        _ => None,
    })
}

/// Parse the timestamp formats the API emits
pub fn parse_api_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
