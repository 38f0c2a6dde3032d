//! Form validation
//!
//! Checks run before anything is sent to the content API. Each check stops
//! at the first problem and returns the message shown next to the form.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::client::Registration;

/// Largest accepted profile picture
pub const MAX_PICTURE_BYTES: usize = 5 * 1024 * 1024;

pub const MIN_USERNAME_CHARS: usize = 3;
pub const MIN_PASSWORD_CHARS: usize = 8;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// A rejected form field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn new(message: &str) -> Self {
        Self(message.to_string())
    }
}

pub type Validation = Result<(), ValidationError>;

fn require(value: &str, message: &str) -> Validation {
    if value.trim().is_empty() {
        Err(ValidationError::new(message))
    } else {
        Ok(())
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email.trim())
}

pub fn validate_email(email: &str) -> Validation {
    require(email, "Email is required")?;
    if !is_valid_email(email) {
        return Err(ValidationError::new("Please enter a valid email address"));
    }
    Ok(())
}

pub fn validate_login(username: &str, password: &str) -> Validation {
    require(username, "Please enter your username")?;
    require(password, "Please enter your password")
}

pub fn validate_registration(form: &Registration) -> Validation {
    require(&form.username, "Username is required")?;
    if form.username.trim().chars().count() < MIN_USERNAME_CHARS {
        return Err(ValidationError::new("Username must be at least 3 characters long"));
    }
    validate_email(&form.email)?;
    require(&form.password, "Password is required")?;
    if form.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ValidationError::new("Password must be at least 8 characters long"));
    }
    if form.password != form.password_confirm {
        return Err(ValidationError::new("Passwords do not match"));
    }
    Ok(())
}

pub fn validate_password_change(current: &str, new: &str, confirm: &str) -> Validation {
    require(current, "Current password is required")?;
    require(new, "New password is required")?;
    if new.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ValidationError::new("New password must be at least 8 characters long"));
    }
    if new != confirm {
        return Err(ValidationError::new("New passwords do not match"));
    }
    if new == current {
        return Err(ValidationError::new("New password must be different from current password"));
    }
    Ok(())
}

/// Reset passwords also need mixed case and a digit
pub fn validate_password_reset(new: &str, confirm: &str) -> Validation {
    require(new, "New password is required")?;
    if new.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ValidationError::new("Password must be at least 8 characters long"));
    }
    if new != confirm {
        return Err(ValidationError::new("Passwords do not match"));
    }
    let has_upper = new.chars().any(char::is_uppercase);
    let has_lower = new.chars().any(char::is_lowercase);
    let has_digit = new.chars().any(|c| c.is_ascii_digit());
    if !(has_upper && has_lower && has_digit) {
        return Err(ValidationError::new(
            "Password must contain at least one uppercase letter, one lowercase letter, and one number",
        ));
    }
    Ok(())
}

pub fn validate_comment(content: &str) -> Validation {
    require(content, "Please enter a comment")
}

pub fn validate_search_query(query: &str) -> Validation {
    require(query, "Please enter a search query.")
}

pub fn validate_picture(content_type: &str, size: usize) -> Validation {
    if !content_type.starts_with("image/") {
        return Err(ValidationError::new("Please select an image file"));
    }
    if size == 0 {
        return Err(ValidationError::new("The selected file is empty"));
    }
    if size > MAX_PICTURE_BYTES {
        return Err(ValidationError::new("File size must be less than 5MB"));
    }
    Ok(())
}
