//! Web middleware
//!
//! Contains:
//! - Application state shared by all handlers
//! - Session loading from the session cookie
//! - Login requirement for account pages
//! - The error type rendered as a themed error page

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::convert::Infallible;
use std::sync::Arc;
use thiserror::Error;

use crate::cache::create_cache;
use crate::client::{ApiClient, ClientError};
use crate::config::{Config, SessionConfig};
use crate::services::{AuthService, Session, SessionStore};
use crate::theme::{simple_error_page, ThemeEngine, ThemeError};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: ApiClient,
    pub auth: AuthService,
    pub theme: Arc<ThemeEngine>,
}

impl AppState {
    /// Wire the services described by `config`
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let cache = create_cache(&config.cache);
        let client = ApiClient::new(&config.api, &config.cache, cache)?;
        let sessions = SessionStore::new(&config.session);
        let auth = AuthService::new(client.clone(), sessions);
        let theme = ThemeEngine::new(config.theme.path.as_deref())?;

        Ok(Self {
            config: Arc::new(config),
            client,
            auth,
            theme: Arc::new(theme),
        })
    }
}

/// Session of the signed-in visitor, stored in request extensions
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

/// Session if the visitor is signed in
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<Session>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(
            parts.extensions.get::<CurrentSession>().map(|current| current.0.clone()),
        ))
    }
}

/// Extract the session id from the Cookie header
pub fn session_id_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let prefix = format!("{}=", cookie_name);
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| cookie.trim().strip_prefix(prefix.as_str()).map(str::to_string))
        .filter(|id| !id.is_empty())
}

/// `Set-Cookie` value opening a session
pub fn session_cookie(config: &SessionConfig, session_id: &str) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.cookie_name, session_id, config.max_age_seconds
    );
    if config.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value removing the session cookie
pub fn clear_session_cookie(config: &SessionConfig) -> String {
    let mut cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", config.cookie_name);
    if config.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Session loading middleware
///
/// Unknown or expired session ids are ignored; the visitor is anonymous.
pub async fn load_session(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    if let Some(id) = session_id_from_headers(request.headers(), &state.config.session.cookie_name) {
        match state.auth.session(&id).await {
            Some(session) => {
                request.extensions_mut().insert(CurrentSession(session));
            }
            None => tracing::debug!("Ignoring unknown session cookie"),
        }
    }
    next.run(request).await
}

/// Login requirement middleware
///
/// Anonymous visitors are sent to `/login?next=<path>`. For form posts the
/// page they came from is used as `next`.
pub async fn require_session(request: Request, next: Next) -> Response {
    if request.extensions().get::<CurrentSession>().is_some() {
        return next.run(request).await;
    }

    let return_to = if request.method() == Method::GET {
        request.uri().path_and_query().map(|pq| pq.as_str().to_string())
    } else {
        referer_path(request.headers())
    };
    Redirect::to(&login_url(return_to.as_deref())).into_response()
}

/// `/login` with an optional return path
pub fn login_url(return_to: Option<&str>) -> String {
    match return_to.filter(|path| is_local_path(path)) {
        Some(path) => format!("/login?next={}", urlencoding::encode(path)),
        None => "/login".to_string(),
    }
}

/// Only same-site absolute paths may be redirect targets
pub fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

/// Path and query of the Referer header
fn referer_path(headers: &HeaderMap) -> Option<String> {
    let referer = headers.get(header::REFERER)?.to_str().ok()?;
    let after_scheme = referer.split_once("://").map(|(_, rest)| rest)?;
    let path = &after_scheme[after_scheme.find('/')?..];
    Some(path.to_string())
}

/// Errors that end a page request
#[derive(Debug, Error)]
pub enum WebError {
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Theme(#[from] ThemeError),
}

impl WebError {
    pub fn not_found(message: impl Into<String>) -> Self {
        WebError::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            WebError::NotFound(_) => StatusCode::NOT_FOUND,
            WebError::Client(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            WebError::Client(_) => StatusCode::BAD_GATEWAY,
            WebError::Theme(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn title(&self) -> &'static str {
        match self.status() {
            StatusCode::NOT_FOUND => "Page not found",
            StatusCode::BAD_GATEWAY => "Service unavailable",
            _ => "Something went wrong",
        }
    }

    /// Text shown to the visitor
    pub fn public_message(&self) -> String {
        match self {
            WebError::NotFound(message) => message.clone(),
            WebError::Client(e) if e.is_not_found() => "The page you are looking for does not exist.".to_string(),
            WebError::Client(e) if e.is_network() => {
                "Cannot connect to the news server. Please try again in a moment.".to_string()
            }
            WebError::Client(_) => "The news server returned an error. Please try again later.".to_string(),
            WebError::Theme(_) => "This page could not be displayed.".to_string(),
        }
    }
}

/// Plain rendering for errors raised outside a themed page
impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Html(simple_error_page(self.title(), &self.public_message()))).into_response()
    }
}
