//! Static assets
//!
//! Files under `static/` are embedded in the binary. A configured theme
//! directory may ship its own `static/` folder, which takes precedence.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;
use std::path::{Component, Path as FsPath, PathBuf};
use tokio::fs;

use super::middleware::AppState;

#[derive(RustEmbed)]
#[folder = "static/"]
struct StaticAssets;

/// GET /static/{*path}
pub async fn serve_static(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    let Some(relative) = sanitize(&path) else {
        return not_found();
    };

    if let Some(theme_dir) = state.config.theme.path.as_deref() {
        let file = theme_dir.join("static").join(&relative);
        if let Ok(contents) = fs::read(&file).await {
            return build_response(&path, contents);
        }
    }

    match StaticAssets::get(&relative.to_string_lossy().replace('\\', "/")) {
        Some(content) => build_response(&path, content.data.into_owned()),
        None => not_found(),
    }
}

/// Relative path with only normal components
fn sanitize(path: &str) -> Option<PathBuf> {
    let candidate = FsPath::new(path.trim_start_matches('/'));
    let mut clean = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!clean.as_os_str().is_empty()).then_some(clean)
}

fn build_response(path: &str, data: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, get_content_type(path)),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        data,
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Not found",
    )
        .into_response()
}

/// Get content type from file extension
fn get_content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "webp" => "image/webp",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("app.css"), Some(PathBuf::from("app.css")));
        assert_eq!(sanitize("img/./logo.png"), Some(PathBuf::from("img/logo.png")));
        assert_eq!(sanitize("../secret"), None);
        assert_eq!(sanitize("img/../../secret"), None);
        assert_eq!(sanitize(""), None);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(get_content_type("app.css"), "text/css; charset=utf-8");
        assert_eq!(get_content_type("placeholder.svg"), "image/svg+xml");
        assert_eq!(get_content_type("blob"), "application/octet-stream");
    }

    #[test]
    fn test_embedded_assets() {
        assert!(StaticAssets::get("app.css").is_some());
        assert!(StaticAssets::get("app.js").is_some());
        assert!(StaticAssets::get("placeholder.svg").is_some());
    }
}
