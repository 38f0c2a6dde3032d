//! Account endpoints under `auth/`

use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApiClient, ClientError, ClientResult};
use crate::models::User;

/// Keys a login response may carry the access token under
const TOKEN_KEYS: [&str; 5] = ["token", "access", "access_token", "key", "auth_token"];
const REFRESH_KEYS: [&str; 2] = ["refresh", "refresh_token"];

/// Successful login
#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub token: String,
    pub refresh: Option<String>,
    /// User record, when the login response embeds one
    pub user: Option<User>,
}

impl LoginResponse {
    /// Read the token fields out of a login response body
    pub fn from_body(body: &Value) -> Option<Self> {
        let text = |key: &&str| {
            body.get(*key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let token = TOKEN_KEYS.iter().find_map(text)?;
        let refresh = REFRESH_KEYS.iter().find_map(text);
        let user = body
            .get("user")
            .filter(|u| u.is_object())
            .and_then(|u| serde_json::from_value(u.clone()).ok());

        Some(Self { token, refresh, user })
    }
}

/// Sign-up form as sent to `auth/register/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "password2")]
    pub password_confirm: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Partial profile update; only the set fields are sent
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.bio.is_none()
    }
}

const REGISTRATION_FIELDS: [(&str, &str); 5] = [
    ("username", "Username"),
    ("email", "Email"),
    ("password", "Password"),
    ("password1", "Password"),
    ("password2", "Password"),
];

const PROFILE_FIELDS: [(&str, &str); 3] = [
    ("username", "Username"),
    ("email", "Email"),
    ("bio", "Bio"),
];

const PASSWORD_FIELDS: [(&str, &str); 2] = [
    ("old_password", "Current password"),
    ("new_password", "New password"),
];

impl ApiClient {
    /// `POST auth/login/`
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        let body = serde_json::json!({ "username": username, "password": password });
        let response: Value = self.send_json(Method::POST, "auth/login/", None, &body).await?;

        LoginResponse::from_body(&response)
            .ok_or_else(|| ClientError::Decode("login response did not include a token".to_string()))
    }

    /// `POST auth/register/`
    pub async fn register(&self, registration: &Registration) -> ClientResult<()> {
        self.send_json_unit(Method::POST, "auth/register/", None, registration)
            .await
            .map_err(|e| e.with_field_fallback(&REGISTRATION_FIELDS))
    }

    /// `GET auth/profile/`
    pub async fn profile(&self, token: &str) -> ClientResult<User> {
        self.get_json("auth/profile/", Some(token)).await
    }

    /// `PATCH auth/profile/` with a JSON body
    pub async fn update_profile(&self, token: &str, patch: &ProfilePatch) -> ClientResult<User> {
        self.send_json(Method::PATCH, "auth/profile/", Some(token), patch)
            .await
            .map_err(|e| e.with_field_fallback(&PROFILE_FIELDS))
    }

    /// `PATCH auth/profile/` with a multipart `profile_picture` field
    pub async fn upload_profile_picture(
        &self,
        token: &str,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> ClientResult<User> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| ClientError::Decode(format!("invalid content type '{}': {}", content_type, e)))?;
        let form = Form::new().part("profile_picture", part);

        let response = self
            .send(self.request(Method::PATCH, "auth/profile/", Some(token)).multipart(form))
            .await?;
        Self::decode(response).await
    }

    /// `PUT auth/change-password/`
    pub async fn change_password(&self, token: &str, old_password: &str, new_password: &str) -> ClientResult<()> {
        let body = serde_json::json!({
            "old_password": old_password,
            "new_password": new_password,
        });
        self.send_json_unit(Method::PUT, "auth/change-password/", Some(token), &body)
            .await
            .map_err(|e| e.with_field_labels(&PASSWORD_FIELDS))
    }

    /// `POST auth/password-reset/`
    pub async fn request_password_reset(&self, email: &str) -> ClientResult<()> {
        let body = serde_json::json!({ "email": email.trim() });
        self.send_json_unit(Method::POST, "auth/password-reset/", None, &body)
            .await
            .map_err(|e| e.with_field_labels(&[("email", "Email")]))
    }

    /// `POST auth/reset-password/{uidb64}/{token}/`
    pub async fn reset_password(&self, uidb64: &str, reset_token: &str, new_password: &str) -> ClientResult<()> {
        let path = format!(
            "auth/reset-password/{}/{}/",
            urlencoding::encode(uidb64),
            urlencoding::encode(reset_token)
        );
        let body = serde_json::json!({
            "uidb64": uidb64,
            "token": reset_token,
            "new_password": new_password,
        });
        self.send_json_unit(Method::POST, &path, None, &body)
            .await
            .map_err(|e| e.with_field_labels(&[("new_password", "New password")]))
    }
}
