//! Theme engine error types

use thiserror::Error;

/// Theme-specific errors
#[derive(Debug, Error)]
pub enum ThemeError {
    /// Template name not known to the engine
    #[error("Template not found: {0}")]
    NotFound(String),

    /// Template parsing or rendering error
    #[error("Template error: {0}")]
    TemplateError(String),

    /// Override directory could not be read
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
