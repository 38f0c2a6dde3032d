//! Article model
//!
//! This module provides:
//! - `Article` as served by the content API
//! - `Author`, which the API sends either as a plain name or as an object
//! - `Bookmark`, a saved article in either of its wire shapes
//! - Display helpers used by the templates (reading time, date, author info)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient_date, null_default, Category, EntityId, Tag};

/// Characters of content per estimated minute of reading
const CHARS_PER_MINUTE: usize = 1000;

/// Reading time shown when the article has no content
const DEFAULT_READING_MINUTES: usize = 5;

const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Article entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier
    pub id: EntityId,
    /// URL-friendly slug
    #[serde(default, deserialize_with = "null_default")]
    pub slug: String,
    /// Article title
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    /// Short summary (HTML)
    #[serde(default, deserialize_with = "null_default")]
    pub excerpt: String,
    /// Full body (HTML)
    #[serde(default, deserialize_with = "null_default")]
    pub content: String,
    /// Cover image URL
    #[serde(default)]
    pub featured_image: Option<String>,
    /// Publication timestamp
    #[serde(default, deserialize_with = "lenient_date")]
    pub publish_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub author: Option<Author>,
    /// View count
    #[serde(default, deserialize_with = "null_default")]
    pub view_count: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub is_featured: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub is_hot: bool,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default, deserialize_with = "null_default")]
    pub tags: Vec<Tag>,
}

impl Article {
    /// Estimated reading time in minutes
    pub fn reading_minutes(&self) -> usize {
        match self.content.chars().count().div_ceil(CHARS_PER_MINUTE) {
            0 => DEFAULT_READING_MINUTES,
            minutes => minutes,
        }
    }

    /// Publication date as `dd.mm.yyyy`
    pub fn formatted_date(&self) -> Option<String> {
        self.publish_date.map(|date| date.format("%d.%m.%Y").to_string())
    }

    pub fn author_name(&self) -> String {
        match &self.author {
            Some(author) => author.name(),
            None => UNKNOWN_AUTHOR.to_string(),
        }
    }

    pub fn author_initials(&self) -> String {
        initials_for(&self.author_name())
    }

    pub fn author_avatar(&self) -> Option<String> {
        self.author.as_ref().and_then(Author::avatar)
    }

    pub fn category_slug(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.slug.as_str()).filter(|s| !s.is_empty())
    }
}

/// Article author
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Author {
    Name(String),
    Profile(AuthorProfile),
}

/// Author sent as an object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorProfile {
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

impl Author {
    /// Name shown on cards: username, then name, then first name
    pub fn name(&self) -> String {
        match self {
            Author::Name(name) if !name.is_empty() => name.clone(),
            Author::Name(_) => UNKNOWN_AUTHOR.to_string(),
            Author::Profile(profile) => [&profile.username, &profile.name, &profile.first_name]
                .into_iter()
                .flatten()
                .find(|value| !value.is_empty())
                .cloned()
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        }
    }

    pub fn initials(&self) -> String {
        initials_for(&self.name())
    }

    pub fn email(&self) -> Option<String> {
        match self {
            Author::Profile(profile) => profile.email.clone(),
            Author::Name(_) => None,
        }
    }

    pub fn avatar(&self) -> Option<String> {
        match self {
            Author::Profile(profile) => profile
                .avatar
                .clone()
                .filter(|s| !s.is_empty())
                .or_else(|| profile.profile_picture.clone().filter(|s| !s.is_empty())),
            Author::Name(_) => None,
        }
    }
}

fn initials_for(name: &str) -> String {
    if name == UNKNOWN_AUTHOR {
        return "A".to_string();
    }
    name.chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "A".to_string())
}

/// Saved article
///
/// The bookmarks endpoint returns either `{id, article: {...}}` records or
/// the articles themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bookmark {
    Record {
        #[serde(default)]
        id: Option<EntityId>,
        article: Article,
    },
    Article(Article),
}

impl Bookmark {
    pub fn article(&self) -> &Article {
        match self {
            Bookmark::Record { article, .. } => article,
            Bookmark::Article(article) => article,
        }
    }

    pub fn into_article(self) -> Article {
        match self {
            Bookmark::Record { article, .. } => article,
            Bookmark::Article(article) => article,
        }
    }
}
