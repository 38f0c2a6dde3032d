//! Tag model

use serde::{Deserialize, Serialize};

use super::{null_default, EntityId};

/// Tag entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default)]
    pub id: EntityId,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub slug: String,
}

impl Tag {
    pub fn from_slug(slug: &str) -> Self {
        Self {
            name: slug.to_string(),
            slug: slug.to_string(),
            ..Self::default()
        }
    }
}
