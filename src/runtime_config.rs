//! # Runtime Configuration Module
//!
//! Environment variable overrides applied on top of a loaded
//! [`DispatcherConfig`].
//!
//! ## Environment Variables
//!
//! ### `BRRTD_EXPOSE_ERRORS`
//!
//! `1`/`true`/`yes`/`on` enables diagnostic error bodies, `0`/`false`/`no`/`off`
//! disables them. Anything else is ignored.
//!
//! ### `BRRTD_BLOCK_SIZE`
//!
//! Block size for streaming seekable bodies. Accepts decimal (`8192`) or
//! hexadecimal (`0x2000`). Zero and unparseable values are ignored.
//!
//! ### `BRRTD_BASE_PATH`
//!
//! Path of the fallback endpoint.
//!
//! ## Usage
//!
//! ```rust
//! use brrtdispatch::config::DispatcherConfig;
//! use brrtdispatch::runtime_config::RuntimeConfig;
//!
//! let mut config = DispatcherConfig::default();
//! RuntimeConfig::from_env().apply(&mut config);
//! ```

use std::env;

use tracing::{info, warn};

use crate::config::DispatcherConfig;

/// Overrides read from the environment; `None` leaves the config untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub expose_errors: Option<bool>,
    pub block_size: Option<usize>,
    pub base_path: Option<String>,
}

impl RuntimeConfig {
    /// Load overrides from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load overrides through an arbitrary lookup, e.g. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let expose_errors = lookup("BRRTD_EXPOSE_ERRORS").and_then(|v| {
            let parsed = parse_bool(&v);
            if parsed.is_none() {
                warn!(value = %v, "Ignoring invalid BRRTD_EXPOSE_ERRORS");
            }
            parsed
        });
        let block_size = lookup("BRRTD_BLOCK_SIZE").and_then(|v| {
            let parsed = parse_size(&v).filter(|n| *n > 0);
            if parsed.is_none() {
                warn!(value = %v, "Ignoring invalid BRRTD_BLOCK_SIZE");
            }
            parsed
        });
        let base_path = lookup("BRRTD_BASE_PATH").filter(|v| !v.trim().is_empty());
        RuntimeConfig {
            expose_errors,
            block_size,
            base_path,
        }
    }

    pub fn apply(&self, config: &mut DispatcherConfig) {
        if let Some(expose) = self.expose_errors {
            info!(expose_errors = expose, "Environment override");
            config.expose_errors = expose;
        }
        if let Some(size) = self.block_size {
            info!(block_size = size, "Environment override");
            config.block_size = size;
        }
        if let Some(path) = &self.base_path {
            info!(base_path = %path, "Environment override");
            config.base_path = path.clone();
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_size(value: &str) -> Option<usize> {
    let value = value.trim();
    match value.strip_prefix("0x") {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}
