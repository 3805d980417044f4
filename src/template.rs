//! Template collaborator: the rendering seam and its minijinja implementation.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use minijinja::Environment;
use serde_json::Value;
use std::path::Path;

pub trait TemplateRenderer: Send + Sync {
    fn render(&self, name: &str, context: &Value) -> Result<String, AppError>;
}

/// Templates loaded lazily from a directory, with the `datetime` filter registered.
pub struct MiniJinjaRenderer {
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        tracing::info!(path = %dir.display(), "set jinja2 template path");
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(dir));
        env.add_filter("datetime", datetime_filter);
        MiniJinjaRenderer { env }
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render(&self, name: &str, context: &Value) -> Result<String, AppError> {
        self.env
            .get_template(name)
            .map_err(|e| AppError::Template(format!("missing template {name}: {e}")))?
            .render(context)
            .map_err(|e| AppError::Template(format!("render {name} failed: {e}")))
    }
}

fn datetime_filter(t: f64) -> String {
    relative_time(t, Utc::now())
}

/// Epoch seconds as "N minutes ago" and so on; older than a week renders the calendar date.
pub fn relative_time(t: f64, now: DateTime<Utc>) -> String {
    let delta = (now.timestamp() as f64 - t) as i64;
    if delta < 60 {
        return "1 minute ago".to_string();
    }
    if delta < 3600 {
        return format!("{} minutes ago", delta / 60);
    }
    if delta < 86400 {
        return format!("{} hours ago", delta / 3600);
    }
    if delta < 604800 {
        return format!("{} days ago", delta / 86400);
    }
    match DateTime::from_timestamp(t as i64, 0) {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn relative_time_buckets() {
        let now = at(1_700_000_000);
        let t = 1_700_000_000.0;
        assert_eq!(relative_time(t - 5.0, now), "1 minute ago");
        assert_eq!(relative_time(t - 150.0, now), "2 minutes ago");
        assert_eq!(relative_time(t - 7200.0, now), "2 hours ago");
        assert_eq!(relative_time(t - 3.0 * 86400.0, now), "3 days ago");
        assert_eq!(relative_time(t - 30.0 * 86400.0, now), "2023-10-15");
    }

    #[test]
    fn missing_template_is_a_template_error() {
        let dir = std::env::temp_dir().join("blog-cms-no-templates");
        let r = MiniJinjaRenderer::new(&dir);
        assert!(matches!(r.render("nope.html", &json!({})), Err(AppError::Template(_))));
    }

    #[test]
    fn renders_from_directory_with_filter() {
        let dir = std::env::temp_dir().join(format!("blog-cms-tpl-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("hello.html"), "hi {{ name }} {{ when|datetime }}").unwrap();
        let r = MiniJinjaRenderer::new(&dir);
        let now = Utc::now().timestamp() as f64;
        let out = r.render("hello.html", &json!({"name": "ada", "when": now})).unwrap();
        assert_eq!(out, "hi ada 1 minute ago");
        std::fs::remove_dir_all(&dir).ok();
    }
}
