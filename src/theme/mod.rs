//! Theme engine
//!
//! This module provides page rendering using Tera.
//! Features:
//! - Default templates embedded in the binary
//! - Optional theme directory overriding templates by name
//! - Standard template variables (site, user, request path)
//! - Fallback to the error template, then to a bare HTML page

use chrono::Datelike;
use rust_embed::RustEmbed;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context as TeraContext, Tera};

use crate::models::{Category, SiteSettings, User};

mod error;

pub use error::ThemeError;

/// Templates shipped with the binary
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct EmbeddedTemplates;

/// Theme engine for rendering templates
pub struct ThemeEngine {
    /// Tera template engine instance
    tera: Tera,
    /// Directory whose templates override the embedded ones
    override_path: Option<PathBuf>,
}

impl std::fmt::Debug for ThemeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeEngine")
            .field("override_path", &self.override_path)
            .field("templates", &self.template_names())
            .finish()
    }
}

impl ThemeEngine {
    /// Engine with only the embedded templates
    pub fn embedded() -> Result<Self, ThemeError> {
        Self::new(None)
    }

    /// Create a theme engine
    ///
    /// Templates found in `override_path` (recursively, `*.html`) replace
    /// embedded templates of the same relative name; new names are added.
    pub fn new(override_path: Option<&Path>) -> Result<Self, ThemeError> {
        let mut templates: BTreeMap<String, String> = BTreeMap::new();

        for name in EmbeddedTemplates::iter() {
            if let Some(file) = EmbeddedTemplates::get(&name) {
                let content = String::from_utf8_lossy(&file.data).into_owned();
                templates.insert(name.to_string(), content);
            }
        }

        if let Some(dir) = override_path {
            if dir.is_dir() {
                let mut overrides = Vec::new();
                collect_templates_from_dir(dir, dir, &mut overrides)?;
                for (name, content) in overrides {
                    tracing::debug!("Theme override: {}", name);
                    templates.insert(name, content);
                }
            } else {
                tracing::warn!("Theme directory {:?} does not exist, using embedded templates", dir);
            }
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(templates)
            .map_err(|e| ThemeError::TemplateError(describe(&e)))?;

        Ok(Self {
            tera,
            override_path: override_path.map(Path::to_path_buf),
        })
    }

    pub fn override_path(&self) -> Option<&Path> {
        self.override_path.as_deref()
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|t| t == name)
    }

    pub fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tera.get_template_names().map(str::to_string).collect();
        names.sort();
        names
    }

    /// Render a template
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String, ThemeError> {
        if !self.has_template(template) {
            return Err(ThemeError::NotFound(template.to_string()));
        }
        self.tera
            .render(template, context)
            .map_err(|e| ThemeError::TemplateError(format!("Failed to render '{}': {}", template, describe(&e))))
    }

    /// Render a template with standard variables added to the context
    pub fn render_page(
        &self,
        template: &str,
        context: &TeraContext,
        vars: &StandardTemplateVars,
    ) -> Result<String, ThemeError> {
        let mut full_context = context.clone();
        vars.insert_into(&mut full_context);
        self.render(template, &full_context)
    }

    /// Page shown when a template fails: `error.html`, then plain HTML
    pub fn render_fallback(&self, vars: &StandardTemplateVars) -> String {
        let mut error_context = TeraContext::new();
        error_context.insert("status", &500);
        error_context.insert("title", "Something went wrong");
        error_context.insert("message", "This page could not be displayed.");

        match self.render_page("error.html", &error_context, vars) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Failed to render error template: {}", e);
                simple_error_page("Something went wrong", "This page could not be displayed.")
            }
        }
    }
}

/// Collect `*.html` files under `current_path`, named relative to `base_path`
fn collect_templates_from_dir(
    base_path: &Path,
    current_path: &Path,
    templates: &mut Vec<(String, String)>,
) -> Result<(), ThemeError> {
    for entry in fs::read_dir(current_path)? {
        let path = entry?.path();

        if path.is_dir() {
            collect_templates_from_dir(base_path, &path, templates)?;
        } else if path.extension().is_some_and(|ext| ext == "html") {
            let relative_path = path
                .strip_prefix(base_path)
                .map_err(|_| ThemeError::TemplateError(format!("Failed to get relative path for {:?}", path)))?;
            let template_name = relative_path.to_string_lossy().replace('\\', "/");
            templates.push((template_name, fs::read_to_string(&path)?));
        }
    }
    Ok(())
}

/// Flatten a tera error and its causes into one line
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(s) = source {
        message.push_str(&format!(": {}", s));
        source = s.source();
    }
    message
}

/// Last-resort page when no template can be rendered
pub fn simple_error_page(title: &str, detail: &str) -> String {
    let escape = |s: &str| {
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 600px; margin: 50px auto; padding: 20px; }}
        .error-box {{ border-left: 4px solid #e74c3c; padding: 20px; }}
    </style>
</head>
<body>
    <div class="error-box">
        <h1>{title}</h1>
        <p>{detail}</p>
        <p><a href="/">Back to home</a></p>
    </div>
</body>
</html>"#,
        title = escape(title),
        detail = escape(detail)
    )
}

/// Variables every page receives
#[derive(Debug, Clone, Serialize)]
pub struct StandardTemplateVars {
    pub site_name: String,
    pub site_description: String,
    pub site_logo: Option<String>,
    pub contact_email: Option<String>,
    /// Current logged-in user (optional)
    pub current_user: Option<CurrentUser>,
    /// Categories linked from the header
    pub nav_categories: Vec<Category>,
    /// Query echoed into the header search box
    pub search_query: Option<String>,
    pub newsletter_notice: Option<Notice>,
    /// Current request path
    pub request_path: String,
    /// Current year (for copyright)
    pub year: i32,
}

impl StandardTemplateVars {
    pub fn new(settings: &SiteSettings, request_path: impl Into<String>) -> Self {
        Self {
            site_name: settings.name().to_string(),
            site_description: settings.site_description.clone().unwrap_or_default(),
            site_logo: settings.logo.clone(),
            contact_email: settings.contact_email.clone(),
            current_user: None,
            nav_categories: Vec::new(),
            search_query: None,
            newsletter_notice: None,
            request_path: request_path.into(),
            year: chrono::Utc::now().year(),
        }
    }

    pub fn with_user(mut self, user: &User) -> Self {
        self.current_user = Some(CurrentUser::from(user));
        self
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.nav_categories = categories;
        self
    }

    fn insert_into(&self, context: &mut TeraContext) {
        context.insert("site_name", &self.site_name);
        context.insert("site_description", &self.site_description);
        context.insert("site_logo", &self.site_logo);
        context.insert("contact_email", &self.contact_email);
        context.insert("request_path", &self.request_path);
        context.insert("year", &self.year);
        context.insert("current_user", &self.current_user);
        context.insert("nav_categories", &self.nav_categories);
        context.insert("search_query", &self.search_query);
        context.insert("newsletter_notice", &self.newsletter_notice);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// Inline message shown next to a form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Success, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Error, text: text.into() }
    }
}

/// Signed-in user as templates see it
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub username: String,
    pub display_name: String,
    pub initials: String,
    pub avatar_url: String,
    pub role: String,
    pub verified: bool,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            display_name: user.display_name(),
            initials: user.initials(),
            avatar_url: user.avatar_url().to_string(),
            role: user.role_label().to_string(),
            verified: user.is_verified(),
        }
    }
}

#[cfg(test)]
mod tests;
