//! In-process stand-in for the content API
//!
//! `FakeApi::start()` binds an axum router on `127.0.0.1:0` that answers the
//! endpoints the portal uses with canned data, and records every request so
//! tests can assert on traffic and request bodies.

use axum::{
    body::{Body, Bytes},
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::cache::MemoryCache;
use crate::client::ApiClient;
use crate::config::{ApiConfig, CacheConfig};

pub const GOOD_TOKEN: &str = "good-token";
pub const GOOD_PASSWORD: &str = "Correct-horse1";

/// Page size of the fake article list, as DRF's default
pub const FAKE_PAGE_SIZE: usize = 10;

#[derive(Clone, Default)]
struct FakeState {
    page_size: usize,
    requests: Arc<Mutex<Vec<String>>>,
    last_body: Arc<Mutex<Option<Value>>>,
    extra_comments: Arc<Mutex<Vec<Value>>>,
}

/// Running fake API
pub struct FakeApi {
    pub base_url: String,
    state: FakeState,
}

impl FakeApi {
    pub async fn start() -> Self {
        Self::start_with_page_size(FAKE_PAGE_SIZE).await
    }

    /// Fake whose article list pages hold `page_size` items
    pub async fn start_with_page_size(page_size: usize) -> Self {
        let state = FakeState {
            page_size: page_size.max(1),
            ..FakeState::default()
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api/", addr),
            state,
        }
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url.clone(),
            timeout_secs: 5,
            ..ApiConfig::default()
        }
    }

    /// Client with its own empty cache
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.api_config(), &CacheConfig::default(), Arc::new(MemoryCache::new())).unwrap()
    }

    /// Number of requests seen for `"<METHOD> <path?query>"`
    pub fn hits(&self, request: &str) -> usize {
        self.state
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.as_str() == request)
            .count()
    }

    /// JSON body of the most recent request that had one
    pub fn last_body(&self) -> Option<Value> {
        self.state.last_body.lock().unwrap().clone()
    }
}

fn router(state: FakeState) -> Router {
    Router::new()
        .route("/api/articles/", get(list_articles))
        .route("/api/articles/featured/", get(featured))
        .route("/api/articles/hot/", get(hot))
        .route("/api/articles/{slug}/", get(article))
        .route("/api/articles/{slug}/comments/", get(list_comments).post(create_comment))
        .route("/api/articles/{slug}/comments/{id}/", axum::routing::delete(delete_comment))
        .route("/api/articles/{slug}/comments/{id}/replies/", post(reply))
        .route("/api/categories/", get(categories))
        .route("/api/tags/", get(tags))
        .route("/api/settings/", get(settings))
        .route("/api/newsletter/", post(newsletter))
        .route("/api/bookmarks/", get(list_bookmarks).post(add_bookmark))
        .route("/api/bookmarks/{id}/", axum::routing::delete(remove_bookmark))
        .route("/api/auth/login/", post(login))
        .route("/api/auth/register/", post(register))
        .route("/api/auth/profile/", get(profile).patch(update_profile))
        .route("/api/auth/change-password/", put(change_password))
        .route("/api/auth/password-reset/", post(password_reset))
        .route("/api/auth/reset-password/{uid}/{token}/", post(reset_password))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

async fn record(State(state): State<FakeState>, request: Request, next: Next) -> Response {
    let target = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();
    state
        .requests
        .lock()
        .unwrap()
        .push(format!("{} {}", request.method(), target));

    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    if let Ok(value) = serde_json::from_slice::<Value>(&bytes) {
        *state.last_body.lock().unwrap() = Some(value);
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Token {}", GOOD_TOKEN))
        .unwrap_or(false)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Authentication credentials were not provided."})),
    )
        .into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response()
}

pub fn sample_articles() -> Vec<Value> {
    vec![
        json!({
            "id": 1,
            "slug": "rust-async",
            "title": "Rust async in practice",
            "excerpt": "<p>Futures, executors and you.</p>",
            "content": "<p>Async Rust body.</p>",
            "featured_image": "https://cdn.example.com/rust.png",
            "publish_date": "2024-05-01T09:00:00Z",
            "author": {"id": 7, "username": "ada"},
            "view_count": 10,
            "is_featured": true,
            "is_hot": false,
            "category": {"id": 1, "name": "Tech", "slug": "tech"},
            "tags": [{"id": 1, "name": "Rust", "slug": "rust"}]
        }),
        json!({
            "id": 2,
            "slug": "rust-tooling",
            "title": "Rust tooling roundup",
            "excerpt": "<p>Cargo and friends.</p>",
            "content": "",
            "publish_date": "2024-03-01T09:00:00Z",
            "author": "bob",
            "view_count": 5,
            "category": {"id": 1, "name": "Tech", "slug": "tech"},
            "tags": []
        }),
        json!({
            "id": 3,
            "slug": "world-cup",
            "title": "World cup final",
            "excerpt": "<p>What a match.</p>",
            "content": "<p>Match report.</p>",
            "publish_date": "2024-06-01T20:00:00Z",
            "view_count": 50,
            "is_hot": true,
            "category": {"id": 2, "name": "World", "slug": "world"},
            "tags": [{"id": 2, "name": "AI", "slug": "ai"}]
        }),
    ]
}

fn ada() -> Value {
    json!({
        "id": 7,
        "username": "ada",
        "email": "ada@example.com",
        "first_name": "Ada",
        "last_name": "Lovelace",
        "bio": "",
        "profile_picture": null,
        "role": "Editor",
        "verified": true
    })
}

/// DRF-style list: `count` covers every match, pages past the end are 404
async fn list_articles(State(state): State<FakeState>, Query(params): Query<HashMap<String, String>>) -> Response {
    let mut articles = sample_articles();
    if let Some(search) = params.get("search") {
        let needle = search.to_lowercase();
        articles.retain(|a| a["title"].as_str().unwrap_or("").to_lowercase().contains(&needle));
    }
    if let Some(category) = params.get("category") {
        articles.retain(|a| a["category"]["slug"] == category.as_str());
    }
    if let Some(tag) = params.get("tag") {
        articles.retain(|a| {
            a["tags"]
                .as_array()
                .is_some_and(|tags| tags.iter().any(|t| t["slug"] == tag.as_str()))
        });
    }

    let count = articles.len();
    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1).max(1);
    let start = (page - 1) * state.page_size;
    if page > 1 && start >= count {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Invalid page."}))).into_response();
    }
    let results: Vec<Value> = articles.into_iter().skip(start).take(state.page_size).collect();
    Json(json!({
        "count": count,
        "next": null,
        "previous": null,
        "results": results
    }))
    .into_response()
}

async fn featured() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
}

async fn hot() -> Json<Value> {
    Json(json!([sample_articles()[2]]))
}

async fn article(Path(slug): Path<String>) -> Response {
    match sample_articles().into_iter().find(|a| a["slug"] == slug.as_str()) {
        Some(article) => Json(article).into_response(),
        None => not_found(),
    }
}

async fn list_comments(State(state): State<FakeState>, Path(slug): Path<String>) -> Json<Value> {
    let mut comments = Vec::new();
    if slug == "rust-async" {
        comments.push(json!({
            "id": 10,
            "content": "First!",
            "user": {"id": 8, "username": "bob"},
            "parent": null,
            "created_at": "2024-05-01T10:00:00Z",
            "replies": [{
                "id": 11,
                "content": "Welcome",
                "user": {"id": 7, "username": "ada"},
                "parent": 10,
                "created_at": "2024-05-01T11:00:00Z",
                "replies": []
            }]
        }));
    }
    comments.extend(state.extra_comments.lock().unwrap().iter().cloned());
    Json(json!(comments))
}

async fn create_comment(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let content = body["content"].as_str().unwrap_or("").to_string();
    if content.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"content": ["This field may not be blank."]})),
        )
            .into_response();
    }
    let comment = json!({
        "id": 100,
        "content": content,
        "user": ada(),
        "parent": null,
        "created_at": chrono::Utc::now().to_rfc3339(),
        "replies": []
    });
    state.extra_comments.lock().unwrap().push(comment.clone());
    (StatusCode::CREATED, Json(comment)).into_response()
}

async fn reply(
    headers: HeaderMap,
    Path((_slug, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let reply = json!({
        "id": 101,
        "content": body["content"],
        "user": ada(),
        "parent": id,
        "replies": []
    });
    (StatusCode::CREATED, Json(reply)).into_response()
}

async fn delete_comment(headers: HeaderMap, Path((_slug, id)): Path<(String, String)>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    // Comment 10 belongs to bob
    if id == "10" {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"detail": "You do not have permission to perform this action."})),
        )
            .into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn categories() -> Json<Value> {
    Json(json!([
        {"id": 1, "name": "Tech", "slug": "tech", "description": "Technology news"},
        {"id": 2, "name": "World", "slug": "world"}
    ]))
}

async fn tags() -> Json<Value> {
    Json(json!({
        "count": 2,
        "results": [
            {"id": 1, "name": "Rust", "slug": "rust"},
            {"id": 2, "name": "AI", "slug": "ai"}
        ]
    }))
}

async fn settings() -> Json<Value> {
    Json(json!({"site_name": "Fake News", "site_description": null}))
}

async fn newsletter(Json(body): Json<Value>) -> Response {
    if body["email"] == "taken@example.com" {
        return (StatusCode::BAD_REQUEST, Json(json!({"detail": "Already subscribed."}))).into_response();
    }
    (StatusCode::CREATED, Json(json!({"email": body["email"]}))).into_response()
}

async fn list_bookmarks(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!([{"id": 1, "article": sample_articles()[0]}])).into_response()
}

async fn add_bookmark(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    (StatusCode::CREATED, Json(json!({"id": 2, "article": body["article"]}))).into_response()
}

async fn remove_bookmark(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or("");
    let password = body["password"].as_str().unwrap_or("");

    if password != GOOD_PASSWORD {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"non_field_errors": ["Unable to log in with provided credentials."]})),
        )
            .into_response();
    }
    match username {
        "ada" => Json(json!({"key": GOOD_TOKEN, "refresh": "refresh-1"})).into_response(),
        "notoken" => Json(json!({"user": {"username": "notoken"}})).into_response(),
        "noprofile" => Json(json!({"token": "orphan-token"})).into_response(),
        "locked" => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Account disabled."})),
        )
            .into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({"non_field_errors": ["Unable to log in with provided credentials."]})),
        )
            .into_response(),
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    if body["username"] == "taken" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"username": ["A user with that username already exists."]})),
        )
            .into_response();
    }
    (StatusCode::CREATED, Json(json!({"id": 99, "username": body["username"]}))).into_response()
}

async fn profile(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(ada()).into_response()
}

async fn update_profile(headers: HeaderMap, body: Bytes) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut user = ada();

    let is_multipart = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    if is_multipart {
        let raw = String::from_utf8_lossy(&body);
        let file_name = raw
            .split("filename=\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap_or("upload");
        user["profile_picture"] = json!(format!("https://cdn.example.com/media/{}", file_name));
    } else if let Ok(Value::Object(patch)) = serde_json::from_slice::<Value>(&body) {
        if patch.get("username") == Some(&json!("taken")) {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"username": ["A user with that username already exists."]})),
            )
                .into_response();
        }
        for (key, value) in patch {
            user[key.as_str()] = value;
        }
    }
    Json(user).into_response()
}

async fn change_password(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if body["old_password"] != GOOD_PASSWORD {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"old_password": ["Wrong password."]})),
        )
            .into_response();
    }
    Json(json!({"detail": "Password updated."})).into_response()
}

async fn password_reset(Json(body): Json<Value>) -> Response {
    if body["email"] == "nobody@example.com" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"email": ["No user with that email."]})),
        )
            .into_response();
    }
    Json(json!({"detail": "Password reset e-mail has been sent."})).into_response()
}

async fn reset_password(Path((_uid, token)): Path<(String, String)>) -> Response {
    if token == "bad" {
        return (StatusCode::BAD_REQUEST, Json(json!({"detail": "Invalid token."}))).into_response();
    }
    if token == "expired" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Invalid or expired token."})),
        )
            .into_response();
    }
    Json(json!({"detail": "Password has been reset."})).into_response()
}
