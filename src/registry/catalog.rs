use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::RouterSettings;
use crate::handlers::{EchoHandler, NotFoundHandler};
use crate::middleware::{
    CorsMiddleware, Handler, MetricsMiddleware, Middleware, RequestIdMiddleware, TracingMiddleware,
};
use crate::recovery::BootError;

/// Builds the fallback handler mounted at the base path.
pub type RouterFactory =
    Arc<dyn Fn(&RouterSettings) -> anyhow::Result<Arc<dyn Handler>> + Send + Sync>;

/// Box a closure as a [`RouterFactory`].
pub fn router_fn<F>(f: F) -> RouterFactory
where
    F: Fn(&RouterSettings) -> anyhow::Result<Arc<dyn Handler>> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Named handlers, middlewares and router classes that configuration files
/// refer to.
#[derive(Default, Clone)]
pub struct Catalog {
    handlers: HashMap<String, Arc<dyn Handler>>,
    middlewares: HashMap<String, Arc<dyn Middleware>>,
    routers: HashMap<String, RouterFactory>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog preloaded with the built-ins.
    ///
    /// | kind       | names                                           |
    /// |------------|-------------------------------------------------|
    /// | handler    | `echo`, `notFound`, `metrics`                   |
    /// | middleware | `tracing`, `requestId`, `cors`, `metrics`       |
    /// | router     | `echo`, `notFound`                              |
    ///
    /// The `metrics` handler reports the counters of the `metrics` middleware.
    #[must_use]
    pub fn with_builtins() -> Self {
        let metrics = Arc::new(MetricsMiddleware::new());
        let mut catalog = Self::new()
            .with_handler("echo", Arc::new(EchoHandler))
            .with_handler("notFound", Arc::new(NotFoundHandler))
            .with_handler("metrics", metrics.handler())
            .with_middleware("tracing", Arc::new(TracingMiddleware))
            .with_middleware("requestId", Arc::new(RequestIdMiddleware))
            .with_middleware("cors", Arc::new(CorsMiddleware::default()));
        catalog.middlewares.insert("metrics".to_string(), metrics);
        catalog
            .with_router(
                "echo",
                router_fn(|_| {
                    let echo: Arc<dyn Handler> = Arc::new(EchoHandler);
                    Ok(echo)
                }),
            )
            .with_router(
                "notFound",
                router_fn(|_| {
                    let not_found: Arc<dyn Handler> = Arc::new(NotFoundHandler);
                    Ok(not_found)
                }),
            )
    }

    #[must_use]
    pub fn with_handler(mut self, name: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    #[must_use]
    pub fn with_middleware(
        mut self,
        name: impl Into<String>,
        middleware: Arc<dyn Middleware>,
    ) -> Self {
        self.middlewares.insert(name.into(), middleware);
        self
    }

    #[must_use]
    pub fn with_router(mut self, class: impl Into<String>, factory: RouterFactory) -> Self {
        self.routers.insert(class.into(), factory);
        self
    }

    pub fn handler(&self, name: &str) -> Result<Arc<dyn Handler>, BootError> {
        self.handlers
            .get(name)
            .map(Arc::clone)
            .ok_or_else(|| BootError::UnknownHandler(name.to_string()))
    }

    pub fn middleware(&self, name: &str) -> Result<Arc<dyn Middleware>, BootError> {
        self.middlewares
            .get(name)
            .map(Arc::clone)
            .ok_or_else(|| BootError::UnknownMiddleware(name.to_string()))
    }

    pub fn router(&self, class: &str) -> Result<RouterFactory, BootError> {
        self.routers
            .get(class)
            .map(Arc::clone)
            .ok_or_else(|| BootError::UnknownRouter(class.to_string()))
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handlers: Vec<_> = self.handlers.keys().collect();
        let mut middlewares: Vec<_> = self.middlewares.keys().collect();
        let mut routers: Vec<_> = self.routers.keys().collect();
        handlers.sort();
        middlewares.sort();
        routers.sort();
        f.debug_struct("Catalog")
            .field("handlers", &handlers)
            .field("middlewares", &middlewares)
            .field("routers", &routers)
            .finish()
    }
}
