//! # Configuration Module
//!
//! Declarative description of a dispatcher, loaded from YAML or JSON.
//!
//! ```yaml
//! basePath: /
//! endpoints:
//!   /forum: echo
//!   /metrics: metrics
//! middlewares: [tracing, requestId]
//! headers:
//!   X-Frame-Options: DENY
//! httpErrors:
//!   404: errors/404.html
//! exposeErrors: false
//! router:
//!   class: notFound
//! blockSize: 8192
//! templates: ./templates
//! ```
//!
//! `endpoints` and `headers` keep document order: endpoint order decides
//! prefix resolution and header order is the emission order of defaults.
//! Handler, middleware and router names refer to a
//! [`Catalog`](crate::registry::Catalog).
//!
//! After parsing, [`RuntimeConfig`](crate::runtime_config::RuntimeConfig)
//! environment overrides are applied.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::runtime_config::RuntimeConfig;
use crate::server::{Headers, DEFAULT_BLOCK_SIZE};

/// Fallback router settings handed to a [`RouterFactory`](crate::registry::RouterFactory).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouterSettings {
    /// Catalog name of the router factory.
    pub class: Option<String>,
    pub primary_route: Option<String>,
    /// Route table in whatever shape the router class expects.
    pub routes: Value,
}

/// Complete dispatcher configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DispatcherConfig {
    pub base_path: String,
    pub endpoints: IndexMap<String, String>,
    pub middlewares: Vec<String>,
    pub headers: IndexMap<String, String>,
    pub http_errors: HashMap<u16, String>,
    pub expose_errors: bool,
    pub router: RouterSettings,
    pub block_size: usize,
    pub templates: Option<PathBuf>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            base_path: "/".to_string(),
            endpoints: IndexMap::new(),
            middlewares: Vec::new(),
            headers: IndexMap::new(),
            http_errors: HashMap::new(),
            expose_errors: false,
            router: RouterSettings::default(),
            block_size: DEFAULT_BLOCK_SIZE,
            templates: None,
        }
    }
}

impl DispatcherConfig {
    /// Load a config file and apply environment overrides.
    ///
    /// `.json` files are parsed as JSON, everything else as YAML. A relative
    /// `templates` directory is resolved against the config file's directory.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let mut config = if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
        .with_context(|| format!("invalid config file {}", path.display()))?;

        if let (Some(dir), Some(parent)) = (config.templates.as_mut(), path.parent()) {
            if dir.is_relative() {
                *dir = parent.join(&*dir);
            }
        }
        RuntimeConfig::from_env().apply(&mut config);
        debug!(
            path = %path.display(),
            endpoints = config.endpoints.len(),
            middlewares = config.middlewares.len(),
            "Loaded dispatcher config"
        );
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Default headers in configured order.
    #[must_use]
    pub fn default_headers(&self) -> Headers {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_keeps_endpoint_order() {
        let cfg = DispatcherConfig::from_yaml(
            "endpoints:\n  /zeta: echo\n  /alpha: echo\n  /: notFound\nheaders:\n  X-B: b\n  X-A: a\n",
        )
        .unwrap();
        let paths: Vec<_> = cfg.endpoints.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["/zeta", "/alpha", "/"]);
        let names: Vec<_> = cfg.default_headers().iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, vec!["X-B", "X-A"]);
    }

    #[test]
    fn test_json_keeps_header_order_on_round_trip() {
        let cfg = DispatcherConfig::from_json(
            r#"{"headers": {"X-Z": "z", "X-M": "m", "X-A": "a"}}"#,
        )
        .unwrap();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let again = DispatcherConfig::from_yaml(&yaml).unwrap();
        let names: Vec<_> = again.headers.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["X-Z", "X-M", "X-A"]);
        assert_eq!(again, cfg);
    }

    #[test]
    fn test_defaults() {
        let cfg = DispatcherConfig::from_yaml("{}").unwrap();
        assert_eq!(cfg.base_path, "/");
        assert_eq!(cfg.block_size, DEFAULT_BLOCK_SIZE);
        assert!(!cfg.expose_errors);
        assert!(cfg.router.class.is_none());
    }

    #[test]
    fn test_json_status_keys() {
        let cfg = DispatcherConfig::from_json(
            r#"{"httpErrors": {"404": "errors/404.html"}, "router": {"class": "echo", "primaryRoute": "home"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.http_errors.get(&404).map(String::as_str), Some("errors/404.html"));
        assert_eq!(cfg.router.primary_route.as_deref(), Some("home"));
    }
}
