//! Account pages
//!
//! - GET|POST /login, POST /logout
//! - GET|POST /register
//! - GET|POST /forgot-password
//! - GET|POST /reset-password/{uidb64}/{token}

use axum::{
    extract::{Path, Query, State},
    http::{header, Uri},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::{Deserialize, Serialize};
use tera::Context as TeraContext;

use super::common::View;
use super::middleware::{clear_session_cookie, is_local_path, session_cookie, AppState, MaybeSession};
use crate::client::Registration;
use crate::services::AuthError;
use crate::theme::Notice;

/// Where to go after login when no `next` was given
const DEFAULT_AFTER_LOGIN: &str = "/profile";

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub registered: Option<String>,
    #[serde(default)]
    pub reset: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

fn after_login(next: Option<&str>) -> String {
    next.filter(|path| is_local_path(path) && !path.starts_with("/login"))
        .unwrap_or(DEFAULT_AFTER_LOGIN)
        .to_string()
}

fn login_context(username: &str, next: &str, notice: Option<Notice>) -> TeraContext {
    let mut context = TeraContext::new();
    context.insert("username", username);
    context.insert("next", next);
    context.insert("notice", &notice);
    context
}

/// GET /login
pub async fn login_page(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Query(query): Query<LoginQuery>,
) -> Response {
    let next = after_login(query.next.as_deref());
    if session.is_some() {
        return Redirect::to(&next).into_response();
    }

    let notice = if query.registered.is_some() {
        Some(Notice::success("Registration successful. Please log in."))
    } else if query.reset.is_some() {
        Some(Notice::success("Your password has been reset. Please log in."))
    } else {
        None
    };

    let view = View::load(&state, None, "/login").await;
    view.render("login.html", &login_context("", &next, notice))
}

/// POST /login
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let next = after_login(form.next.as_deref());

    match state.auth.login(&form.username, &form.password).await {
        Ok(session) => (
            [(header::SET_COOKIE, session_cookie(&state.config.session, &session.id))],
            Redirect::to(&next),
        )
            .into_response(),
        Err(e) => {
            let view = View::load(&state, None, "/login").await;
            view.render(
                "login.html",
                &login_context(form.username.trim(), &next, Some(Notice::error(e.to_string()))),
            )
        }
    }
}

/// POST /logout
pub async fn logout(State(state): State<AppState>, MaybeSession(session): MaybeSession) -> Response {
    if let Some(session) = session {
        state.auth.logout(&session.id).await;
        tracing::info!("User logged out: {}", session.user.username);
    }
    (
        [(header::SET_COOKIE, clear_session_cookie(&state.config.session))],
        Redirect::to("/"),
    )
        .into_response()
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default, skip_serializing)]
    pub password2: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl From<&RegisterForm> for Registration {
    fn from(form: &RegisterForm) -> Self {
        Registration {
            username: form.username.clone(),
            email: form.email.clone(),
            password: form.password.clone(),
            password_confirm: form.password2.clone(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
        }
    }
}

fn register_context(form: &RegisterForm, notice: Option<Notice>) -> TeraContext {
    let mut context = TeraContext::new();
    context.insert("form", form);
    context.insert("notice", &notice);
    context
}

/// GET /register
pub async fn register_page(State(state): State<AppState>, MaybeSession(session): MaybeSession) -> Response {
    if session.is_some() {
        return Redirect::to(DEFAULT_AFTER_LOGIN).into_response();
    }
    let view = View::load(&state, None, "/register").await;
    view.render("register.html", &register_context(&RegisterForm::default(), None))
}

/// POST /register
pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Response {
    match state.auth.register(&Registration::from(&form)).await {
        Ok(()) => Redirect::to("/login?registered=1").into_response(),
        Err(e) => {
            let view = View::load(&state, None, "/register").await;
            view.render("register.html", &register_context(&form, Some(Notice::error(e.to_string()))))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ForgotPasswordForm {
    #[serde(default)]
    pub email: String,
}

fn forgot_context(email: &str, sent: bool, notice: Option<Notice>) -> TeraContext {
    let mut context = TeraContext::new();
    context.insert("email", email);
    context.insert("sent", &sent);
    context.insert("notice", &notice);
    context
}

/// GET /forgot-password
pub async fn forgot_password_page(State(state): State<AppState>, MaybeSession(session): MaybeSession) -> Response {
    let view = View::load(&state, session.as_ref(), "/forgot-password").await;
    view.render("forgot_password.html", &forgot_context("", false, None))
}

/// POST /forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Form(form): Form<ForgotPasswordForm>,
) -> Response {
    let view = View::load(&state, session.as_ref(), "/forgot-password").await;
    let email = form.email.trim();

    let context = match state.auth.request_password_reset(email).await {
        Ok(()) => forgot_context(
            email,
            true,
            Some(Notice::success(
                "Password reset link sent. Please check your email for instructions.",
            )),
        ),
        Err(e) => forgot_context(email, false, Some(Notice::error(e.to_string()))),
    };
    view.render("forgot_password.html", &context)
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetPasswordForm {
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

fn reset_context(uidb64: &str, token: &str, done: bool, expired: bool, notice: Option<Notice>) -> TeraContext {
    let mut context = TeraContext::new();
    context.insert("uidb64", uidb64);
    context.insert("token", token);
    context.insert("done", &done);
    context.insert("expired", &expired);
    context.insert("notice", &notice);
    context
}

/// GET /reset-password/{uidb64}/{token}
pub async fn reset_password_page(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Path((uidb64, token)): Path<(String, String)>,
    uri: Uri,
) -> Response {
    let view = View::load(&state, session.as_ref(), uri.path()).await;
    view.render("reset_password.html", &reset_context(&uidb64, &token, false, false, None))
}

/// POST /reset-password/{uidb64}/{token}
pub async fn reset_password(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Path((uidb64, token)): Path<(String, String)>,
    uri: Uri,
    Form(form): Form<ResetPasswordForm>,
) -> Response {
    let view = View::load(&state, session.as_ref(), uri.path()).await;

    let context = match state
        .auth
        .reset_password(&uidb64, &token, &form.new_password, &form.confirm_password)
        .await
    {
        Ok(()) => reset_context(
            &uidb64,
            &token,
            true,
            false,
            Some(Notice::success("Your password has been reset. You can now log in.")),
        ),
        Err(e @ AuthError::ResetLinkExpired) => {
            reset_context(&uidb64, &token, false, true, Some(Notice::error(e.to_string())))
        }
        Err(e) => reset_context(&uidb64, &token, false, false, Some(Notice::error(e.to_string()))),
    };
    view.render("reset_password.html", &context)
}
