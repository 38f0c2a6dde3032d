//! Cache layer
//!
//! Response cache for public content fetched from the remote API.
//! Entries carry their own TTL so article lists can refresh every few
//! minutes while categories and tags live for an hour.
//!
//! # Usage
//!
//! ```rust,ignore
//! use cnews::cache::{create_cache, CacheLayer};
//! use cnews::config::CacheConfig;
//!
//! let cache = create_cache(&CacheConfig::default());
//! cache.set("key", &"value", Duration::from_secs(60)).await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

/// Cache layer trait
///
/// The generic methods keep this trait out of `dyn` position; callers hold
/// a concrete implementation.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>;

    /// Delete all values matching a pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;
}

pub use memory::MemoryCache;

/// Create the response cache from configuration
pub fn create_cache(config: &CacheConfig) -> Arc<MemoryCache> {
    Arc::new(MemoryCache::with_capacity(config.max_capacity))
}
