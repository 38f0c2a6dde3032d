//! Category model

use serde::{Deserialize, Serialize};

use super::{null_default, EntityId};

/// Category entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier
    #[serde(default)]
    pub id: EntityId,
    /// Display name
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    /// URL-friendly slug
    #[serde(default, deserialize_with = "null_default")]
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Banner image URL
    #[serde(default)]
    pub featured_image: Option<String>,
}

impl Category {
    /// Category whose slug is known but whose record was not found
    pub fn from_slug(slug: &str) -> Self {
        Self {
            name: slug.replace('-', " "),
            slug: slug.to_string(),
            ..Self::default()
        }
    }
}
