//! In-memory cache implementation using moka
//!
//! Provides a fast, thread-safe in-memory cache with TTL support.
//!
//! # Features
//! - Per-entry TTL (each `set` decides how long the value lives)
//! - Glob-style pattern matching for bulk deletion
//! - Thread-safe concurrent access

use super::CacheLayer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default maximum cache capacity (number of entries)
const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// Cache entry wrapper that stores serialized JSON data along with its TTL
#[derive(Clone)]
struct CacheEntry {
    /// JSON-serialized value
    data: Arc<String>,
    ttl: Duration,
}

impl CacheEntry {
    fn new<T: Serialize>(value: &T, ttl: Duration) -> Result<Self> {
        let json = serde_json::to_string(value)
            .context("Failed to serialize cache value")?;
        Ok(Self {
            data: Arc::new(json),
            ttl,
        })
    }

    fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.data)
            .context("Failed to deserialize cache value")
    }
}

/// Expiry policy reading the TTL stored on each entry
struct EntryExpiry;

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(&self, _key: &String, value: &CacheEntry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory cache using moka
///
/// Values are stored as JSON strings to support generic types.
pub struct MemoryCache {
    cache: Cache<String, CacheEntry>,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

impl MemoryCache {
    /// Create a new memory cache holding up to 10,000 entries
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_CAPACITY)
    }

    /// Create a new memory cache with custom max capacity
    pub fn with_capacity(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryExpiry)
            .build();

        Self { cache }
    }

    /// Get the current number of entries in the cache
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Check if a pattern matches a key using glob-style matching
    ///
    /// Supports:
    /// - `*` matches any sequence of characters
    /// - `?` matches any single character
    fn pattern_matches(pattern: &str, key: &str) -> bool {
        let pattern_chars: Vec<char> = pattern.chars().collect();
        let key_chars: Vec<char> = key.chars().collect();
        Self::glob_match(&pattern_chars, &key_chars, 0, 0)
    }

    fn glob_match(pattern: &[char], key: &[char], pi: usize, ki: usize) -> bool {
        if pi == pattern.len() {
            return ki == key.len();
        }

        match pattern[pi] {
            '*' => {
                Self::glob_match(pattern, key, pi + 1, ki)
                    || (ki < key.len() && Self::glob_match(pattern, key, pi, ki + 1))
            }
            '?' => ki < key.len() && Self::glob_match(pattern, key, pi + 1, ki + 1),
            literal => {
                ki < key.len() && key[ki] == literal && Self::glob_match(pattern, key, pi + 1, ki + 1)
            }
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheLayer for MemoryCache {
    /// Returns `Ok(None)` if the key doesn't exist or has expired.
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self.cache.get(key).await {
            Some(entry) => Ok(Some(entry.deserialize()?)),
            None => Ok(None),
        }
    }

    /// Overwrites any existing value and resets its TTL.
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let entry = CacheEntry::new(value, ttl)?;
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    /// Delete all values matching a glob-style pattern
    ///
    /// - `GET http://api/articles/*` drops every cached article response
    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        let keys_to_delete: Vec<String> = self.cache
            .iter()
            .filter(|(key, _)| Self::pattern_matches(pattern, key.as_ref()))
            .map(|(key, _)| (*key).clone())
            .collect();

        for key in keys_to_delete {
            self.cache.invalidate(&key).await;
        }

        Ok(())
    }
}
