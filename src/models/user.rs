//! User model
//!
//! The account record returned by `auth/profile/` and embedded in comments,
//! with the display helpers the templates rely on.

use serde::{Deserialize, Serialize};

use super::{null_default, EntityId};

/// Avatar shown when the user has no profile picture
pub const PLACEHOLDER_AVATAR: &str = "/static/placeholder.svg";

/// User entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<EntityId>,
    /// Login name
    #[serde(default, deserialize_with = "null_default")]
    pub username: String,
    #[serde(default, deserialize_with = "null_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub last_name: String,
    /// Free-text biography
    #[serde(default)]
    pub bio: Option<String>,
    /// Avatar URL
    #[serde(default)]
    pub profile_picture: Option<String>,
    /// Role label assigned by the backend
    #[serde(default)]
    pub role: Option<String>,
    /// Only `true` counts as verified
    #[serde(default)]
    pub verified: Option<bool>,
}

impl User {
    /// Placeholder account used when the profile cannot be loaded after login
    pub fn minimal(username: &str) -> Self {
        Self {
            username: username.to_string(),
            ..Self::default()
        }
    }

    pub fn display_name(&self) -> String {
        if !self.first_name.is_empty() && !self.last_name.is_empty() {
            return format!("{} {}", self.first_name, self.last_name);
        }
        [&self.username, &self.email]
            .into_iter()
            .find(|value| !value.is_empty())
            .cloned()
            .unwrap_or_else(|| "User".to_string())
    }

    pub fn initials(&self) -> String {
        let first_letter = |s: &str| s.chars().next().map(|c| c.to_uppercase().collect::<String>());

        if let (Some(first), Some(last)) = (first_letter(&self.first_name), first_letter(&self.last_name)) {
            return format!("{first}{last}");
        }
        first_letter(&self.username)
            .or_else(|| first_letter(&self.email))
            .unwrap_or_else(|| "U".to_string())
    }

    pub fn avatar_url(&self) -> &str {
        self.profile_picture
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(PLACEHOLDER_AVATAR)
    }

    pub fn role_label(&self) -> &str {
        self.role.as_deref().filter(|r| !r.is_empty()).unwrap_or("User")
    }

    pub fn is_verified(&self) -> bool {
        self.verified == Some(true)
    }

    pub fn bio_text(&self) -> &str {
        self.bio.as_deref().unwrap_or("")
    }

    /// Whether both records describe the same account (by id, else username)
    pub fn is_same_account(&self, other: &User) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) if a == b => true,
            _ => !self.username.is_empty() && self.username == other.username,
        }
    }
}
