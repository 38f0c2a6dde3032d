//! Shared page helpers
//!
//! View structs flatten model data together with the display helpers the
//! templates need, and `View` carries the per-request template variables.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tera::Context as TeraContext;

use super::middleware::{clear_session_cookie, login_url, AppState, WebError};
use crate::models::{Article, Comment, SiteSettings, User};
use crate::services::{pagination::DEFAULT_WINDOW, Pagination, Session};
use crate::theme::{StandardTemplateVars, ThemeEngine};

/// Articles shown in the home page carousel
pub const FEATURED_LIMIT: usize = 5;
pub const HOT_LIMIT: usize = 5;
pub const RELATED_LIMIT: usize = 3;

/// Page number from a query string, 1 when absent or malformed
pub fn page_number(raw: Option<&str>) -> u32 {
    raw.and_then(|p| p.trim().parse::<u32>().ok())
        .filter(|p| *p > 0)
        .unwrap_or(1)
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<String>,
}

impl PageQuery {
    pub fn number(&self) -> u32 {
        page_number(self.page.as_deref())
    }
}

/// Article with its display fields
#[derive(Debug, Clone, Serialize)]
pub struct ArticleView {
    #[serde(flatten)]
    pub article: Article,
    pub date: Option<String>,
    pub reading_minutes: usize,
    pub author_name: String,
    pub author_initials: String,
    pub author_avatar: Option<String>,
}

impl From<Article> for ArticleView {
    fn from(article: Article) -> Self {
        Self {
            date: article.formatted_date(),
            reading_minutes: article.reading_minutes(),
            author_name: article.author_name(),
            author_initials: article.author_initials(),
            author_avatar: article.author_avatar(),
            article,
        }
    }
}

pub fn article_views(articles: Vec<Article>) -> Vec<ArticleView> {
    articles.into_iter().map(ArticleView::from).collect()
}

/// Comment tree node as rendered under an article
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: String,
    pub content: String,
    pub author_name: String,
    pub author_initials: String,
    pub age: String,
    pub is_reply: bool,
    pub can_delete: bool,
    pub replies: Vec<CommentView>,
}

impl CommentView {
    pub fn new(comment: &Comment, viewer: Option<&User>, now: DateTime<Utc>) -> Self {
        Self {
            id: comment.id.to_string(),
            content: comment.content.clone(),
            author_name: comment.author_name(),
            author_initials: comment.user.as_ref().map(User::initials).unwrap_or_else(|| "U".to_string()),
            age: comment.relative_age(now),
            is_reply: comment.is_reply(),
            can_delete: viewer.is_some_and(|v| comment.is_owned_by(v)),
            replies: comment
                .replies
                .iter()
                .map(|reply| CommentView::new(reply, viewer, now))
                .collect(),
        }
    }
}

/// Pagination links for a list page
#[derive(Debug, Clone, Serialize)]
pub struct Pager {
    pub current: u32,
    pub total_pages: u32,
    pub previous: Option<u32>,
    pub next: Option<u32>,
    pub pages: Vec<u32>,
    pub last_shown: u32,
    /// Link prefix; the template appends `page=N`
    pub href: String,
}

impl Pager {
    /// `base` is the page path, `params` the query parameters to keep
    pub fn new(pagination: &Pagination, base: &str, params: &[(&str, &str)]) -> Self {
        let pages = pagination.window(DEFAULT_WINDOW);
        let mut href = format!("{}?", base);
        for (name, value) in params {
            href.push_str(&format!("{}={}&", name, urlencoding::encode(value)));
        }

        Self {
            current: pagination.current,
            total_pages: pagination.total_pages,
            previous: pagination.previous(),
            next: pagination.next(),
            last_shown: pages.last().copied().unwrap_or(pagination.current),
            pages,
            href,
        }
    }
}

/// Template variables of one request plus the engine to render them
pub struct View {
    theme: Arc<ThemeEngine>,
    pub vars: StandardTemplateVars,
}

impl View {
    /// Load site settings and header categories for a page
    ///
    /// Both are cached; failures fall back to the configured site defaults
    /// so an unreachable API still yields a themed error page.
    pub async fn load(state: &AppState, session: Option<&Session>, request_path: &str) -> Self {
        let (settings, categories) = futures::join!(state.client.site_settings(), state.client.categories());

        let settings = settings.unwrap_or_else(|e| {
            tracing::debug!("Site settings unavailable: {}", e);
            SiteSettings::default()
        });
        let categories = categories.unwrap_or_else(|e| {
            tracing::debug!("Categories unavailable: {}", e);
            Vec::new()
        });

        let settings = settings.with_defaults(&state.config.site);
        let mut vars = StandardTemplateVars::new(&settings, request_path).with_categories(categories);
        if let Some(session) = session {
            vars = vars.with_user(&session.user);
        }

        Self {
            theme: state.theme.clone(),
            vars,
        }
    }

    pub fn render(&self, template: &str, context: &TeraContext) -> Response {
        self.render_status(StatusCode::OK, template, context)
    }

    /// Render with `status`; a broken template gives the 500 fallback page
    pub fn render_status(&self, status: StatusCode, template: &str, context: &TeraContext) -> Response {
        match self.theme.render_page(template, context, &self.vars) {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                tracing::warn!("Failed to render template '{}': {}", template, e);
                (StatusCode::INTERNAL_SERVER_ERROR, Html(self.theme.render_fallback(&self.vars))).into_response()
            }
        }
    }

    /// Themed error page with the error's status
    pub fn error(&self, err: WebError) -> Response {
        let status = err.status();
        if status.is_server_error() {
            tracing::warn!("Page failed with {}: {}", status, err);
        }

        let mut context = TeraContext::new();
        context.insert("status", &status.as_u16());
        context.insert("title", err.title());
        context.insert("message", &err.public_message());
        self.render_status(status, "error.html", &context)
    }
}

/// End a session the API no longer accepts and send the visitor to log in
pub async fn expire_session(state: &AppState, session: &Session, return_to: &str) -> Response {
    state.auth.logout(&session.id).await;
    (
        [(axum::http::header::SET_COOKIE, clear_session_cookie(&state.config.session))],
        Redirect::to(&login_url(Some(return_to))),
    )
        .into_response()
}
