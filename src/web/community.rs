//! Comments, newsletter and bookmarks
//!
//! - POST /post/{slug}/comments
//! - POST /post/{slug}/comments/{id}/replies
//! - POST /post/{slug}/comments/{id}/delete
//! - POST /newsletter
//! - GET|POST /bookmarks, POST /bookmarks/{article}/delete

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tera::Context as TeraContext;

use super::common::{article_views, expire_session, View};
use super::middleware::{AppState, CurrentSession, WebError};
use super::pages::render_post;
use crate::client::ClientError;
use crate::models::EntityId;
use crate::services::validation::{validate_comment, validate_email};
use crate::services::Session;
use crate::theme::Notice;

const BOOKMARKS_PATH: &str = "/bookmarks";

#[derive(Debug, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub content: String,
}

fn post_path(slug: &str) -> String {
    format!("/post/{}", urlencoding::encode(slug))
}

/// Re-render the article with a message above the comments
async fn comment_failed(state: &AppState, session: &Session, slug: &str, message: String) -> Response {
    let view = View::load(state, Some(session), &post_path(slug)).await;
    render_post(state, &view, Some(session), slug, Some(Notice::error(message))).await
}

/// Shared outcome handling for comment writes
async fn comment_outcome<T>(
    state: &AppState,
    session: &Session,
    slug: &str,
    result: Result<T, ClientError>,
    anchor: impl FnOnce(&T) -> String,
) -> Response {
    match result {
        Ok(value) => Redirect::to(&format!("{}#{}", post_path(slug), anchor(&value))).into_response(),
        Err(e) if e.is_unauthenticated() => expire_session(state, session, &post_path(slug)).await,
        Err(e) => {
            tracing::info!("Comment action on {} failed: {}", slug, e);
            comment_failed(state, session, slug, e.to_string()).await
        }
    }
}

/// POST /post/{slug}/comments
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(slug): Path<String>,
    Form(form): Form<CommentForm>,
) -> Response {
    if let Err(e) = validate_comment(&form.content) {
        return comment_failed(&state, &session, &slug, e.to_string()).await;
    }
    let result = state.client.create_comment(&session.token, &slug, &form.content).await;
    comment_outcome(&state, &session, &slug, result, |c| format!("comment-{}", c.id)).await
}

/// POST /post/{slug}/comments/{id}/replies
pub async fn reply(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path((slug, id)): Path<(String, String)>,
    Form(form): Form<CommentForm>,
) -> Response {
    if let Err(e) = validate_comment(&form.content) {
        return comment_failed(&state, &session, &slug, e.to_string()).await;
    }
    let parent = EntityId::from(id.as_str());
    let result = state
        .client
        .reply_to_comment(&session.token, &slug, &parent, &form.content)
        .await;
    comment_outcome(&state, &session, &slug, result, |_| format!("comment-{}", parent)).await
}

/// POST /post/{slug}/comments/{id}/delete
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path((slug, id)): Path<(String, String)>,
) -> Response {
    let result = state
        .client
        .delete_comment(&session.token, &slug, &EntityId::from(id.as_str()))
        .await;
    comment_outcome(&state, &session, &slug, result, |_| "comments".to_string()).await
}

#[derive(Debug, Default, Deserialize)]
pub struct NewsletterForm {
    #[serde(default)]
    pub email: String,
}

/// POST /newsletter
///
/// The form sits in the footer of every page; the outcome is shown in the
/// footer of the home page.
pub async fn subscribe(State(state): State<AppState>, Form(form): Form<NewsletterForm>) -> Redirect {
    let outcome = match validate_email(&form.email) {
        Err(e) => Err(e.to_string()),
        Ok(()) => state
            .client
            .subscribe_newsletter(&form.email)
            .await
            .map_err(|e| e.to_string()),
    };

    match outcome {
        Ok(()) => {
            tracing::info!("Newsletter subscription added");
            Redirect::to("/?newsletter=subscribed#newsletter")
        }
        Err(message) => Redirect::to(&format!(
            "/?newsletter_error={}#newsletter",
            urlencoding::encode(&message)
        )),
    }
}

async fn render_bookmarks(state: &AppState, session: &Session, notice: Option<Notice>) -> Response {
    let view = View::load(state, Some(session), BOOKMARKS_PATH).await;

    let (articles, notice) = match state.client.bookmarks(&session.token).await {
        Ok(articles) => (articles, notice),
        Err(e) if e.is_unauthorized() => return expire_session(state, session, BOOKMARKS_PATH).await,
        Err(e) if e.is_network() => return view.error(WebError::from(e)),
        Err(e) => {
            tracing::warn!("Bookmarks unavailable for {}: {}", session.user.username, e);
            (Vec::new(), notice.or_else(|| Some(Notice::error(e.to_string()))))
        }
    };

    let mut context = TeraContext::new();
    context.insert("articles", &article_views(articles));
    context.insert("notice", &notice);
    view.render("bookmarks.html", &context)
}

/// GET /bookmarks
pub async fn bookmarks(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Response {
    render_bookmarks(&state, &session, None).await
}

#[derive(Debug, Default, Deserialize)]
pub struct BookmarkForm {
    #[serde(default)]
    pub article: String,
}

/// POST /bookmarks
pub async fn add_bookmark(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Form(form): Form<BookmarkForm>,
) -> Response {
    let article = form.article.trim();
    if article.is_empty() {
        return render_bookmarks(&state, &session, Some(Notice::error("No article selected."))).await;
    }

    match state.client.add_bookmark(&session.token, &EntityId::from(article)).await {
        Ok(()) => Redirect::to(BOOKMARKS_PATH).into_response(),
        Err(e) if e.is_unauthorized() => expire_session(&state, &session, BOOKMARKS_PATH).await,
        Err(e) => render_bookmarks(&state, &session, Some(Notice::error(e.to_string()))).await,
    }
}

/// POST /bookmarks/{article}/delete
pub async fn remove_bookmark(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(article): Path<String>,
) -> Response {
    match state
        .client
        .remove_bookmark(&session.token, &EntityId::from(article.as_str()))
        .await
    {
        Ok(()) => Redirect::to(BOOKMARKS_PATH).into_response(),
        Err(e) if e.is_unauthorized() => expire_session(&state, &session, BOOKMARKS_PATH).await,
        Err(e) => render_bookmarks(&state, &session, Some(Notice::error(e.to_string()))).await,
    }
}
