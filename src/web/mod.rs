//! Web layer - HTTP handlers and routing
//!
//! Server-rendered pages in front of the content API:
//! - Public pages (home, lists, search, articles, taxonomy)
//! - Account pages (login, registration, password reset)
//! - Profile and bookmarks (need a session)
//! - Comment and newsletter forms
//! - Static assets

pub mod auth;
pub mod common;
pub mod community;
pub mod middleware;
pub mod pages;
pub mod profile;
pub mod static_files;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

pub use middleware::{AppState, CurrentSession, MaybeSession, WebError};

/// Routes that need a signed-in visitor
fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile::show).post(profile::update))
        .route("/profile/password", post(profile::change_password))
        .route(
            "/profile/picture",
            post(profile::upload_picture).layer(DefaultBodyLimit::max(profile::PICTURE_BODY_LIMIT)),
        )
        .route("/bookmarks", get(community::bookmarks).post(community::add_bookmark))
        .route("/bookmarks/{article}/delete", post(community::remove_bookmark))
        .route("/post/{slug}/comments", post(community::create_comment))
        .route("/post/{slug}/comments/{id}/replies", post(community::reply))
        .route("/post/{slug}/comments/{id}/delete", post(community::delete_comment))
        .route_layer(axum_middleware::from_fn(middleware::require_session))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/list", get(pages::list))
        .route("/search", get(pages::search))
        .route("/post/{slug}", get(pages::post))
        .route("/category/{slug}", get(pages::category))
        .route("/tag/{slug}", get(pages::tag))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/register", get(auth::register_page).post(auth::register))
        .route(
            "/forgot-password",
            get(auth::forgot_password_page).post(auth::forgot_password),
        )
        .route(
            "/reset-password/{uidb64}/{token}",
            get(auth::reset_password_page).post(auth::reset_password),
        )
        .route("/profil", get(profile::legacy_redirect))
        .route("/newsletter", post(community::subscribe))
        .route("/static/{*path}", get(static_files::serve_static))
        .route("/health", get(pages::health))
        .merge(account_routes())
        .fallback(pages::not_found)
        .layer(axum_middleware::from_fn_with_state(state.clone(), middleware::load_session))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
