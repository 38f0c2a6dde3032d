//! Tests for the theme engine

use super::*;
use crate::config::SiteConfig;
use std::fs;
use tempfile::TempDir;
use tera::Context as TeraContext;

const PAGES: [&str; 12] = [
    "index.html",
    "list.html",
    "search.html",
    "post.html",
    "taxonomy.html",
    "login.html",
    "register.html",
    "profile.html",
    "bookmarks.html",
    "forgot_password.html",
    "reset_password.html",
    "error.html",
];

fn vars() -> StandardTemplateVars {
    let settings = SiteSettings::default().with_defaults(&SiteConfig::default());
    StandardTemplateVars::new(&settings, "/")
}

/// Helper to create an override directory with the given templates
fn create_override_dir(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (name, content) in files {
        let path = temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    temp_dir
}

#[test]
fn test_embedded_templates_present() {
    let engine = ThemeEngine::embedded().unwrap();

    for page in PAGES {
        assert!(engine.has_template(page), "missing {}", page);
    }
    assert!(engine.has_template("base.html"));
    assert!(engine.has_template("macros.html"));
    assert!(engine.override_path().is_none());
}

#[test]
fn test_render_error_page() {
    let engine = ThemeEngine::embedded().unwrap();
    let mut context = TeraContext::new();
    context.insert("status", &404);
    context.insert("title", "Page not found");
    context.insert("message", "No such article");

    let html = engine.render_page("error.html", &context, &vars()).unwrap();

    assert!(html.contains("Page not found"));
    assert!(html.contains("No such article"));
    assert!(html.contains("C-News"));
    assert!(html.contains("404"));
}

#[test]
fn test_render_escapes_user_text() {
    let engine = ThemeEngine::embedded().unwrap();
    let mut context = TeraContext::new();
    context.insert("notice", &Some(Notice::error("<b>nope</b>")));
    context.insert("username", "ada");
    context.insert("next", "/profile");

    let html = engine.render_page("login.html", &context, &vars()).unwrap();

    assert!(html.contains("&lt;b&gt;nope&lt;&#x2F;b&gt;"));
    assert!(html.contains("notice error"));
    assert!(!html.contains("<b>nope</b>"));
}

#[test]
fn test_standard_vars_with_user() {
    let engine = ThemeEngine::embedded().unwrap();
    let user = User {
        username: "ada".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        ..User::default()
    };
    let vars = vars().with_user(&user);
    let current = vars.current_user.clone().unwrap();
    assert_eq!(current.display_name, "Ada Lovelace");
    assert_eq!(current.initials, "AL");
    assert_eq!(current.avatar_url, "/static/placeholder.svg");

    let mut context = TeraContext::new();
    context.insert("status", &500);
    context.insert("title", "Oops");
    context.insert("message", "Broken");
    let html = engine.render_page("error.html", &context, &vars).unwrap();

    assert!(html.contains("Ada Lovelace"));
    assert!(html.contains("Log out"));
    assert!(!html.contains("Sign up"));
}

#[test]
fn test_standard_vars_year() {
    let vars = vars();
    assert!(vars.year >= 2024);
    assert_eq!(vars.site_name, "C-News");
    assert!(vars.nav_categories.is_empty());
}

#[test]
fn test_override_replaces_embedded_template() {
    let dir = create_override_dir(&[(
        "index.html",
        r#"{% extends "base.html" %}{% block content %}<p class="custom">Custom {{ site_name }}</p>{% endblock content %}"#,
    )]);

    let engine = ThemeEngine::new(Some(dir.path())).unwrap();
    let html = engine.render_page("index.html", &TeraContext::new(), &vars()).unwrap();

    assert!(html.contains(r#"<p class="custom">Custom C-News</p>"#));
    assert_eq!(engine.override_path(), Some(dir.path()));
    // Untouched pages still come from the binary
    assert!(engine.has_template("login.html"));
}

#[test]
fn test_override_adds_nested_templates() {
    let dir = create_override_dir(&[("partials/banner.html", "<div>{{ text }}</div>")]);

    let engine = ThemeEngine::new(Some(dir.path())).unwrap();
    let mut context = TeraContext::new();
    context.insert("text", "Breaking");

    assert_eq!(engine.render("partials/banner.html", &context).unwrap(), "<div>Breaking</div>");
}

#[test]
fn test_missing_override_dir_uses_embedded() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope");

    let engine = ThemeEngine::new(Some(&missing)).unwrap();
    assert!(engine.has_template("index.html"));
}

#[test]
fn test_invalid_override_template_error() {
    let dir = create_override_dir(&[("index.html", "{% if %}")]);

    let result = ThemeEngine::new(Some(dir.path()));
    assert!(matches!(result, Err(ThemeError::TemplateError(_))));
}

#[test]
fn test_render_unknown_template() {
    let engine = ThemeEngine::embedded().unwrap();
    let result = engine.render("nope.html", &TeraContext::new());
    assert!(matches!(result, Err(ThemeError::NotFound(name)) if name == "nope.html"));
}

#[test]
fn test_render_fallback_uses_error_template() {
    let engine = ThemeEngine::embedded().unwrap();

    let html = engine.render_fallback(&vars());

    assert!(html.contains("Something went wrong"));
    assert!(html.contains("site-header"));
}

#[test]
fn test_render_fallback_to_simple_page() {
    let dir = create_override_dir(&[("error.html", "{{ missing_variable }}")]);
    let engine = ThemeEngine::new(Some(dir.path())).unwrap();

    let html = engine.render_fallback(&vars());

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("error-box"));
}

#[test]
fn test_simple_error_page_escapes() {
    let html = simple_error_page("<Oops>", "a & b");
    assert!(html.contains("&lt;Oops&gt;"));
    assert!(html.contains("a &amp; b"));
}

#[test]
fn test_notice_serialization() {
    let value = serde_json::to_value(Notice::success("Saved")).unwrap();
    assert_eq!(value, serde_json::json!({"kind": "success", "text": "Saved"}));
}
