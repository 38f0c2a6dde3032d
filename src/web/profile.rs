//! Profile pages
//!
//! - GET /profile (and the legacy /profil)
//! - POST /profile - username, email and bio
//! - POST /profile/password
//! - POST /profile/picture - multipart upload

use axum::{
    extract::{Multipart, State},
    response::{Redirect, Response},
    Extension, Form,
};
use serde::{Deserialize, Serialize};
use tera::Context as TeraContext;

use super::common::{expire_session, View};
use super::middleware::{AppState, CurrentSession};
use crate::models::User;
use crate::services::{AuthError, Session};
use crate::theme::Notice;

const PROFILE_PATH: &str = "/profile";

/// Upload limit for the picture route, a little above the 5 MB picture limit
pub const PICTURE_BODY_LIMIT: usize = 6 * 1024 * 1024;

/// Account as shown on the profile page
#[derive(Debug, Serialize)]
struct ProfileView {
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    display_name: String,
    initials: String,
    bio: String,
    avatar_url: String,
    role: String,
    verified: bool,
}

impl From<&User> for ProfileView {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            display_name: user.display_name(),
            initials: user.initials(),
            bio: user.bio_text().to_string(),
            avatar_url: user.avatar_url().to_string(),
            role: user.role_label().to_string(),
            verified: user.is_verified(),
        }
    }
}

/// Which form on the page a message belongs to
#[derive(Debug, Clone, Copy)]
enum Section {
    Profile,
    Password,
    Picture,
}

impl Section {
    fn key(self) -> &'static str {
        match self {
            Section::Profile => "profile_notice",
            Section::Password => "password_notice",
            Section::Picture => "picture_notice",
        }
    }
}

async fn render_profile(state: &AppState, session: &Session, message: Option<(Section, Notice)>) -> Response {
    let view = View::load(state, Some(session), PROFILE_PATH).await;

    let mut context = TeraContext::new();
    context.insert("user", &ProfileView::from(&session.user));
    for section in [Section::Profile, Section::Password, Section::Picture] {
        context.insert(section.key(), &None::<Notice>);
    }
    if let Some((section, notice)) = message {
        context.insert(section.key(), &Some(notice));
    }
    view.render("profile.html", &context)
}

/// Render the outcome of a profile action; an expired session logs out
async fn finish(
    state: &AppState,
    session: &Session,
    section: Section,
    result: Result<Session, AuthError>,
    success: &str,
) -> Response {
    match result {
        Ok(updated) => render_profile(state, &updated, Some((section, Notice::success(success)))).await,
        Err(AuthError::SessionExpired) => expire_session(state, session, PROFILE_PATH).await,
        Err(e) => render_profile(state, session, Some((section, Notice::error(e.to_string())))).await,
    }
}

/// GET /profile
pub async fn show(State(state): State<AppState>, Extension(CurrentSession(session)): Extension<CurrentSession>) -> Response {
    match state.auth.refresh_profile(&session).await {
        Ok(fresh) => render_profile(&state, &fresh, None).await,
        Err(AuthError::SessionExpired) => expire_session(&state, &session, PROFILE_PATH).await,
        Err(e) => {
            tracing::warn!("Could not refresh profile for {}: {}", session.user.username, e);
            let notice = Notice::error(format!("Could not load your latest profile: {}", e));
            render_profile(&state, &session, Some((Section::Profile, notice))).await
        }
    }
}

/// GET /profil
pub async fn legacy_redirect() -> Redirect {
    Redirect::permanent(PROFILE_PATH)
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub bio: String,
}

/// POST /profile
pub async fn update(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Form(form): Form<ProfileForm>,
) -> Response {
    let result = state
        .auth
        .update_profile(&session, &form.username, &form.email, &form.bio)
        .await;
    finish(&state, &session, Section::Profile, result, "Profile updated successfully.").await
}

#[derive(Debug, Default, Deserialize)]
pub struct PasswordForm {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// POST /profile/password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Form(form): Form<PasswordForm>,
) -> Response {
    let result = state
        .auth
        .change_password(&session, &form.current_password, &form.new_password, &form.confirm_password)
        .await
        .map(|()| session.clone());
    finish(&state, &session, Section::Password, result, "Password changed successfully.").await
}

/// Uploaded picture read from the multipart body
struct Upload {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

async fn read_picture(multipart: &mut Multipart) -> Result<Option<Upload>, String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Could not read the upload: {}", e.body_text()))?
    {
        if field.name() != Some("profile_picture") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("avatar").to_string();
        let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| format!("Could not read the upload: {}", e.body_text()))?;
        if bytes.is_empty() {
            return Ok(None);
        }
        return Ok(Some(Upload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}

/// POST /profile/picture
pub async fn upload_picture(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    mut multipart: Multipart,
) -> Response {
    let upload = match read_picture(&mut multipart).await {
        Ok(Some(upload)) => upload,
        Ok(None) => {
            let notice = Notice::error("Please choose an image to upload.");
            return render_profile(&state, &session, Some((Section::Picture, notice))).await;
        }
        Err(message) => {
            return render_profile(&state, &session, Some((Section::Picture, Notice::error(message)))).await;
        }
    };

    let result = state
        .auth
        .upload_picture(&session, upload.bytes, &upload.file_name, &upload.content_type)
        .await;
    finish(&state, &session, Section::Picture, result, "Profile picture updated successfully.").await
}
