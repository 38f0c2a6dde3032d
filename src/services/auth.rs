//! Authentication service
//!
//! Handles the account flows on behalf of a browser session:
//! - login (rate limited, token capture, profile hydration, session creation)
//! - logout and registration
//! - profile refresh, diff-based profile update and picture upload
//! - password change, forgotten-password request and reset

use thiserror::Error;

use super::rate_limiter::LoginRateLimiter;
use super::session::{Session, SessionStore};
use super::validation::{self, ValidationError};
use crate::client::{ApiClient, ClientError, ProfilePatch, Registration};
use crate::models::User;

/// Message phrases the API uses for bad credentials
const CREDENTIAL_PHRASES: [&str; 4] = [
    "unable to log in",
    "invalid credentials",
    "incorrect username",
    "incorrect password",
];

/// Error type for account operations
#[derive(Debug, Error)]
pub enum AuthError {
    /// Form input rejected before reaching the API
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Too many failed login attempts. Please try again in {minutes} minutes.")]
    RateLimited { minutes: i64 },

    /// Login rejected, with a message suitable for the login form
    #[error("{0}")]
    LoginFailed(String),

    /// The API no longer accepts the session's token
    #[error("Your session has expired. Please log in again.")]
    SessionExpired,

    #[error("No changes to save")]
    NoChanges,

    #[error("This password reset link has expired or is invalid. Please request a new one.")]
    ResetLinkExpired,

    /// Any other API failure
    #[error("{0}")]
    Api(#[from] ClientError),
}

/// Turn a failed login into the message shown on the form
pub fn classify_login_error(err: &ClientError) -> String {
    if err.is_network() {
        return "Cannot connect to the server. Please check your internet connection and try again.".to_string();
    }

    let api_message = err.api_message();
    let is_credentials = api_message.as_deref().is_some_and(|msg| {
        let lower = msg.to_lowercase();
        CREDENTIAL_PHRASES.iter().any(|phrase| lower.contains(phrase))
    });
    if is_credentials {
        return "Invalid username or password. Please check your credentials and try again.".to_string();
    }

    match err.status() {
        Some(401) => "Authentication failed. Please check your username and password.".to_string(),
        Some(400) => format!(
            "Request error: {}",
            api_message.unwrap_or_else(|| "Bad request".to_string())
        ),
        Some(404) => "Login service not found. Please contact support.".to_string(),
        Some(405) => "Login method not supported. Please contact support.".to_string(),
        Some(_) => api_message.unwrap_or_else(|| err.to_string()),
        None => "Login failed: the server did not return an access token.".to_string(),
    }
}

/// Account flows on top of the content API and the session store
#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
    sessions: SessionStore,
    limiter: LoginRateLimiter,
}

impl AuthService {
    pub fn new(client: ApiClient, sessions: SessionStore) -> Self {
        Self::with_limiter(client, sessions, LoginRateLimiter::new())
    }

    pub fn with_limiter(client: ApiClient, sessions: SessionStore, limiter: LoginRateLimiter) -> Self {
        Self { client, sessions, limiter }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn limiter(&self) -> &LoginRateLimiter {
        &self.limiter
    }

    /// Log in and open a session
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let username = username.trim();
        validation::validate_login(username, password)?;

        if self.limiter.is_limited(username).await {
            let minutes = self.limiter.minutes_until_reset(username).await.max(1);
            tracing::warn!("Login rate limited for {}", username);
            return Err(AuthError::RateLimited { minutes });
        }

        let response = match self.client.login(username, password).await {
            Ok(response) => response,
            Err(e) => {
                if !e.is_network() {
                    self.limiter.record_failure(username).await;
                }
                tracing::info!("Login failed for {}: {}", username, e);
                return Err(AuthError::LoginFailed(classify_login_error(&e)));
            }
        };
        self.limiter.clear(username).await;

        let user = match self.client.profile(&response.token).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("Could not load profile after login for {}: {}", username, e);
                response.user.clone().unwrap_or_else(|| User::minimal(username))
            }
        };

        let session = self.sessions.create(response.token, response.refresh, user).await;
        tracing::info!("User logged in: {}", session.user.username);
        Ok(session)
    }

    pub async fn logout(&self, session_id: &str) {
        self.sessions.remove(session_id).await;
    }

    pub async fn session(&self, session_id: &str) -> Option<Session> {
        self.sessions.get(session_id).await
    }

    pub async fn register(&self, form: &Registration) -> Result<(), AuthError> {
        let form = Registration {
            username: form.username.trim().to_string(),
            email: form.email.trim().to_string(),
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
            ..form.clone()
        };
        validation::validate_registration(&form)?;
        self.client.register(&form).await?;
        tracing::info!("Registered account: {}", form.username);
        Ok(())
    }

    /// Reload the user from the API; a rejected token ends the session
    pub async fn refresh_profile(&self, session: &Session) -> Result<Session, AuthError> {
        match self.client.profile(&session.token).await {
            Ok(user) => self
                .sessions
                .update_user(&session.id, user)
                .await
                .ok_or(AuthError::SessionExpired),
            Err(e) => Err(self.session_error(session, e).await),
        }
    }

    /// Send only the fields that differ from the session's user
    pub async fn update_profile(
        &self,
        session: &Session,
        username: &str,
        email: &str,
        bio: &str,
    ) -> Result<Session, AuthError> {
        let patch = profile_diff(&session.user, username, email, bio);
        if patch.is_empty() {
            return Err(AuthError::NoChanges);
        }
        if let Some(email) = &patch.email {
            validation::validate_email(email)?;
        }

        match self.client.update_profile(&session.token, &patch).await {
            Ok(user) => self
                .sessions
                .update_user(&session.id, user)
                .await
                .ok_or(AuthError::SessionExpired),
            Err(e) => Err(self.session_error(session, e).await),
        }
    }

    pub async fn upload_picture(
        &self,
        session: &Session,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<Session, AuthError> {
        validation::validate_picture(content_type, bytes.len())?;

        match self
            .client
            .upload_profile_picture(&session.token, bytes, file_name, content_type)
            .await
        {
            Ok(user) => self
                .sessions
                .update_user(&session.id, user)
                .await
                .ok_or(AuthError::SessionExpired),
            Err(e) => Err(self.session_error(session, e).await),
        }
    }

    pub async fn change_password(
        &self,
        session: &Session,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), AuthError> {
        validation::validate_password_change(current, new, confirm)?;
        match self.client.change_password(&session.token, current, new).await {
            Ok(()) => {
                tracing::info!("Password changed for {}", session.user.username);
                Ok(())
            }
            Err(e) => Err(self.session_error(session, e).await),
        }
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        validation::validate_email(email)?;
        self.client.request_password_reset(email.trim()).await?;
        Ok(())
    }

    pub async fn reset_password(
        &self,
        uidb64: &str,
        token: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), AuthError> {
        if uidb64.trim().is_empty() || token.trim().is_empty() {
            return Err(AuthError::ResetLinkExpired);
        }
        validation::validate_password_reset(new, confirm)?;

        self.client
            .reset_password(uidb64, token, new)
            .await
            .map_err(|e| {
                let message = e.to_string();
                let is_field_error = message.starts_with("New password:");
                let lower = message.to_lowercase();
                if !is_field_error && (lower.contains("expired") || lower.contains("invalid")) {
                    AuthError::ResetLinkExpired
                } else {
                    AuthError::Api(e)
                }
            })
    }

    /// Map an API failure on an authenticated call, dropping dead sessions
    async fn session_error(&self, session: &Session, err: ClientError) -> AuthError {
        if err.is_unauthorized() {
            tracing::info!("Dropping session for {}: token rejected", session.user.username);
            self.sessions.remove(&session.id).await;
            AuthError::SessionExpired
        } else {
            AuthError::Api(err)
        }
    }
}

/// Fields of the profile form that differ from `user`
///
/// Username and email are only sent when changed and non-blank; the bio is
/// sent whenever it changed, including to empty.
pub fn profile_diff(user: &User, username: &str, email: &str, bio: &str) -> ProfilePatch {
    let username = username.trim();
    let email = email.trim();

    ProfilePatch {
        username: (!username.is_empty() && username != user.username).then(|| username.to_string()),
        email: (!email.is_empty() && email != user.email).then(|| email.to_string()),
        bio: (bio != user.bio_text()).then(|| bio.to_string()),
    }
}
