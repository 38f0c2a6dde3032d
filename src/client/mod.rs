//! Content API client
//!
//! Thin wrapper over `reqwest` for the remote REST API. Paths are relative
//! to the configured base URL (`articles/`, `auth/login/`, ...).
//!
//! Public GET responses go through the response cache with a per-entry TTL;
//! requests carrying a token never do.

mod auth;
mod community;
mod content;
pub mod error;

pub use auth::{LoginResponse, ProfilePatch, Registration};
pub use content::ArticleQuery;
pub use error::{extract_error_message, ClientError};

use reqwest::{header, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheLayer, MemoryCache};
use crate::config::{ApiConfig, CacheConfig};

pub type ClientResult<T> = Result<T, ClientError>;

/// TTLs for the different kinds of cached responses
#[derive(Debug, Clone, Copy)]
struct CacheTtls {
    articles: Duration,
    taxonomy: Duration,
    comments: Duration,
}

/// Client for the remote content API
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth_scheme: String,
    cache: Arc<MemoryCache>,
    ttls: CacheTtls,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ApiClient {
    /// Create a client from configuration, sharing the given response cache
    pub fn new(api: &ApiConfig, cache_config: &CacheConfig, cache: Arc<MemoryCache>) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(api.timeout())
            .user_agent(api.user_agent.clone())
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self {
            http,
            base_url: api.normalized_base_url(),
            auth_scheme: api.auth_scheme.clone(),
            cache,
            ttls: CacheTtls {
                articles: Duration::from_secs(cache_config.articles_ttl_seconds),
                taxonomy: Duration::from_secs(cache_config.taxonomy_ttl_seconds),
                comments: Duration::from_secs(cache_config.comments_ttl_seconds),
            },
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the API base
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    fn cache_key(&self, path: &str) -> String {
        format!("GET {}", self.url(path))
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let builder = self
            .http
            .request(method, self.url(path))
            .header(header::ACCEPT, "application/json");

        match token {
            Some(token) => builder.header(header::AUTHORIZATION, format!("{} {}", self.auth_scheme, token)),
            None => builder,
        }
    }

    /// Send a request and turn non-success statuses into `ClientError::Api`
    async fn send(&self, builder: RequestBuilder) -> ClientResult<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::Null);
        tracing::debug!(status = status.as_u16(), body = %text, "Content API returned an error");
        Err(ClientError::from_response(status.as_u16(), body))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> ClientResult<T> {
        let response = self.send(self.request(Method::GET, path, token)).await?;
        Self::decode(response).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, token: Option<&str>, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.request(method, path, token).json(body)).await?;
        Self::decode(response).await
    }

    /// Like `send_json` but ignores the response body
    async fn send_json_unit<B>(&self, method: Method, path: &str, token: Option<&str>, body: &B) -> ClientResult<()>
    where
        B: Serialize + ?Sized,
    {
        self.send(self.request(method, path, token).json(body)).await?;
        Ok(())
    }

    /// Anonymous GET through the response cache
    async fn get_cached<T>(&self, path: &str, ttl: Duration) -> ClientResult<T>
    where
        T: DeserializeOwned + Serialize + Send + Sync,
    {
        let key = self.cache_key(path);
        match self.cache.get::<T>(&key).await {
            Ok(Some(hit)) => return Ok(hit),
            Ok(None) => {}
            Err(e) => tracing::warn!("Cache read failed for {}: {}", key, e),
        }

        let value: T = self.get_json(path, None).await?;
        if let Err(e) = self.cache.set(&key, &value, ttl).await {
            tracing::warn!("Cache write failed for {}: {}", key, e);
        }
        Ok(value)
    }

    /// Drop cached responses whose path starts with `prefix`
    async fn invalidate(&self, prefix: &str) {
        let pattern = format!("{}*", self.cache_key(prefix));
        if let Err(e) = self.cache.delete_pattern(&pattern).await {
            tracing::warn!("Cache invalidation failed for {}: {}", pattern, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeApi;

    #[test]
    fn test_url_joins_under_base() {
        let api = ApiConfig {
            base_url: "http://localhost:9/api".to_string(),
            ..ApiConfig::default()
        };
        let client = ApiClient::new(&api, &CacheConfig::default(), Arc::new(MemoryCache::new())).unwrap();

        assert_eq!(client.base_url(), "http://localhost:9/api/");
        assert_eq!(client.url("articles/"), "http://localhost:9/api/articles/");
        assert_eq!(client.url("/tags/"), "http://localhost:9/api/tags/");
    }

    #[tokio::test]
    async fn test_cached_get_hits_upstream_once() {
        let api = FakeApi::start().await;
        let client = api.client();

        let first = client.categories().await.unwrap();
        let second = client.categories().await.unwrap();

        assert_eq!(first.len(), second.len());
        assert_eq!(api.hits("GET /api/categories/"), 1);
    }

    #[tokio::test]
    async fn test_authenticated_get_is_not_cached() {
        let api = FakeApi::start().await;
        let client = api.client();

        client.profile(crate::test_support::GOOD_TOKEN).await.unwrap();
        client.profile(crate::test_support::GOOD_TOKEN).await.unwrap();

        assert_eq!(api.hits("GET /api/auth/profile/"), 2);
    }

    #[tokio::test]
    async fn test_unreachable_api_is_network_error() {
        let api = ApiConfig {
            base_url: "http://127.0.0.1:9/api/".to_string(),
            timeout_secs: 2,
            ..ApiConfig::default()
        };
        let client = ApiClient::new(&api, &CacheConfig::default(), Arc::new(MemoryCache::new())).unwrap();

        let err = client.categories().await.unwrap_err();
        assert!(err.is_network());
    }
}
