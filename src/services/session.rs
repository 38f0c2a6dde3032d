//! Server-side sessions
//!
//! The browser only ever sees an opaque session id; the API token, refresh
//! token and the hydrated user live here. Sessions expire after the
//! configured idle time.

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::models::User;

/// Default maximum number of live sessions
const DEFAULT_MAX_SESSIONS: u64 = 100_000;

/// One signed-in browser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    /// Token sent as `Authorization: Token <token>`
    pub token: String,
    pub refresh: Option<String>,
    pub user: User,
}

/// Session store keyed by random session id
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<String, Session>,
    max_age: Duration,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.sessions.entry_count())
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_max_age(Duration::from_secs(config.max_age_seconds))
    }

    pub fn with_max_age(max_age: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(DEFAULT_MAX_SESSIONS)
            .time_to_idle(max_age)
            .build();
        Self { sessions, max_age }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Create a session and return it
    pub async fn create(&self, token: String, refresh: Option<String>, user: User) -> Session {
        let session = Session {
            id: Uuid::new_v4().to_string(),
            token,
            refresh,
            user,
        };
        self.sessions.insert(session.id.clone(), session.clone()).await;
        session
    }

    pub async fn get(&self, id: &str) -> Option<Session> {
        self.sessions.get(id).await
    }

    /// Replace the cached user of a session
    pub async fn update_user(&self, id: &str, user: User) -> Option<Session> {
        let mut session = self.sessions.get(id).await?;
        session.user = user;
        self.sessions.insert(id.to_string(), session.clone()).await;
        Some(session)
    }

    pub async fn remove(&self, id: &str) {
        self.sessions.invalidate(id).await;
    }
}
