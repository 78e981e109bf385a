use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::middleware::Handler;

/// Normalize an endpoint or request path.
///
/// Lower-cases, maps the empty string to `/`, and prepends a missing leading
/// `/`.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let lower = path.to_lowercase();
    if lower.starts_with('/') {
        lower
    } else {
        format!("/{lower}")
    }
}

/// Result of a successful resolution.
#[derive(Clone)]
pub struct Resolved {
    pub handler: Arc<dyn Handler>,
    /// Registered path that matched; recorded as the `activePath` attribute.
    pub matched_path: Arc<str>,
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolved")
            .field("matched_path", &self.matched_path)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
struct Endpoint {
    path: Arc<str>,
    handler: Arc<dyn Handler>,
}

/// Ordered mapping from normalized path prefix to handler.
///
/// Resolution tries an exact match first, then walks the endpoints in
/// registration order and takes the first whose path is a string prefix of
/// the request path. The first registered prefix wins, not the longest: with
/// `/` registered before `/forum`, `/forum/thread/1` resolves to `/`.
#[derive(Clone, Default)]
pub struct EndpointRegistry {
    endpoints: Vec<Endpoint>,
}

impl EndpointRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` at `path`.
    ///
    /// Re-registering a path replaces its handler and keeps its original
    /// position.
    pub fn register(&mut self, path: &str, handler: Arc<dyn Handler>) {
        let normalized = normalize_path(path);
        if let Some(existing) = self
            .endpoints
            .iter_mut()
            .find(|e| e.path.as_ref() == normalized)
        {
            warn!(path = %normalized, "Replaced existing endpoint handler");
            existing.handler = handler;
            return;
        }
        debug!(
            path = %normalized,
            total_endpoints = self.endpoints.len() + 1,
            "Endpoint registered"
        );
        self.endpoints.push(Endpoint {
            path: Arc::from(normalized),
            handler,
        });
    }

    #[must_use]
    pub fn with(mut self, path: &str, handler: Arc<dyn Handler>) -> Self {
        self.register(path, handler);
        self
    }

    /// Resolve a request path to its endpoint.
    #[must_use]
    pub fn resolve(&self, uri_path: &str) -> Option<Resolved> {
        let path = normalize_path(uri_path);
        let endpoint = self
            .endpoints
            .iter()
            .find(|e| e.path.as_ref() == path)
            .or_else(|| {
                self.endpoints
                    .iter()
                    .find(|e| path.starts_with(e.path.as_ref()))
            })?;
        debug!(path = %path, matched_path = %endpoint.path, "Endpoint resolved");
        Some(Resolved {
            handler: Arc::clone(&endpoint.handler),
            matched_path: Arc::clone(&endpoint.path),
        })
    }

    /// True when a handler is registered at exactly `path` (after
    /// normalization).
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.endpoints.iter().any(|e| e.path.as_ref() == path)
    }

    /// Registered paths in registration order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.endpoints.iter().map(|e| e.path.as_ref())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl fmt::Debug for EndpointRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.paths()).finish()
    }
}
