//! View rendering used for configured HTTP error pages.
//!
//! The recovery unit only depends on [`ViewRenderer`]. [`TemplateViews`] is
//! the stock implementation, a minijinja environment filled either from a
//! directory of templates or from in-memory sources.

use std::fs;
use std::path::Path;

use anyhow::Context;
use minijinja::Environment;
use serde_json::Value;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Renders a template identifier with a JSON context.
pub trait ViewRenderer: Send + Sync {
    fn render(&self, template: &str, context: &Value) -> anyhow::Result<String>;
}

/// minijinja-backed renderer.
///
/// Template names ending in `.html` are HTML-escaped.
pub struct TemplateViews {
    env: Environment<'static>,
}

impl Default for TemplateViews {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateViews {
    #[must_use]
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// Load every regular file under `dir` (recursively) as a template named
    /// by its path relative to `dir`, using `/` separators.
    ///
    /// Templates are compiled here, so syntax errors fail at boot rather than
    /// on the first error response.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        let mut views = Self::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry =
                entry.with_context(|| format!("reading template directory {}", dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry
                .path()
                .strip_prefix(dir)
                .with_context(|| format!("template {} outside {}", entry.path().display(), dir.display()))?
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            let source = fs::read_to_string(entry.path())
                .with_context(|| format!("reading template {}", entry.path().display()))?;
            debug!(template = %name, "Loaded template");
            views.add_template(name, source)?;
        }
        info!(dir = %dir.display(), "Template directory loaded");
        Ok(views)
    }

    /// Register a template from memory, replacing any template of that name.
    pub fn add_template(&mut self, name: impl Into<String>, source: impl Into<String>) -> anyhow::Result<()> {
        let name = name.into();
        self.env
            .add_template_owned(name.clone(), source.into())
            .with_context(|| format!("compiling template `{name}`"))
    }

    #[must_use]
    pub fn has_template(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }
}

impl ViewRenderer for TemplateViews {
    fn render(&self, template: &str, context: &Value) -> anyhow::Result<String> {
        let tpl = self
            .env
            .get_template(template)
            .with_context(|| format!("template `{template}` not found"))?;
        tpl.render(context)
            .with_context(|| format!("rendering template `{template}`"))
    }
}
