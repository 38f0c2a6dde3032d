//! Comment model
//!
//! Comments arrive as a tree: top-level comments carry their `replies`.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient_date, null_default, EntityId, User};

/// Comment entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier
    pub id: EntityId,
    /// Comment text
    #[serde(default, deserialize_with = "null_default")]
    pub content: String,
    /// Author of the comment
    #[serde(default)]
    pub user: Option<User>,
    /// Parent comment ID (for replies)
    #[serde(default)]
    pub parent: Option<EntityId>,
    /// Nested replies
    #[serde(default, deserialize_with = "null_default")]
    pub replies: Vec<Comment>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.parent.is_some()
    }

    /// Whether `viewer` wrote this comment
    pub fn is_owned_by(&self, viewer: &User) -> bool {
        self.user.as_ref().is_some_and(|author| viewer.is_same_account(author))
    }

    pub fn author_name(&self) -> String {
        self.user.as_ref().map(User::display_name).unwrap_or_else(|| "User".to_string())
    }

    /// Age of the comment relative to `now`
    ///
    /// "just now", "5m ago", "3h ago", then a short date ("Mar 5", or
    /// "Mar 5, 2023" for another year).
    pub fn relative_age(&self, now: DateTime<Utc>) -> String {
        match self.created_at {
            Some(created) => relative_age(created, now),
            None => String::new(),
        }
    }

    /// Count of this comment's replies, recursively
    pub fn reply_count(&self) -> usize {
        self.replies.iter().map(|r| 1 + r.reply_count()).sum()
    }
}

pub(crate) fn relative_age(created: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(created);
    let hours = elapsed.num_hours();

    if hours < 1 {
        let minutes = elapsed.num_minutes();
        if minutes < 1 {
            "just now".to_string()
        } else {
            format!("{minutes}m ago")
        }
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if created.year() == now.year() {
        created.format("%b %-d").to_string()
    } else {
        created.format("%b %-d, %Y").to_string()
    }
}
