use std::sync::Arc;

use tracing::debug;

use crate::recovery::DispatchError;
use crate::server::{Request, Response};

/// The single request-handling capability.
///
/// Endpoints, fallback routers and composed pipelines all implement it.
/// Any `Fn(Request) -> Result<Response, DispatchError>` closure is a handler.
pub trait Handler: Send + Sync {
    fn handle(&self, request: Request) -> Result<Response, DispatchError>;
}

impl<F> Handler for F
where
    F: Fn(Request) -> Result<Response, DispatchError> + Send + Sync,
{
    fn handle(&self, request: Request) -> Result<Response, DispatchError> {
        self(request)
    }
}

/// A request/response filter wrapped around the next stage.
///
/// A middleware may call `next` and post-process the response, answer on its
/// own without calling `next`, or return an error. Any
/// `Fn(Request, &dyn Handler) -> Result<Response, DispatchError>` closure is a
/// middleware.
pub trait Middleware: Send + Sync {
    fn process(&self, request: Request, next: &dyn Handler) -> Result<Response, DispatchError>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<F> Middleware for F
where
    F: Fn(Request, &dyn Handler) -> Result<Response, DispatchError> + Send + Sync,
{
    fn process(&self, request: Request, next: &dyn Handler) -> Result<Response, DispatchError> {
        self(request, next)
    }
}

/// Box a closure as a shared handler.
///
/// Passing the closure through this bound lets the compiler infer its
/// argument and error types.
pub fn handler_fn<F>(f: F) -> Arc<dyn Handler>
where
    F: Fn(Request) -> Result<Response, DispatchError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Box a closure as a shared middleware.
pub fn middleware_fn<F>(f: F) -> Arc<dyn Middleware>
where
    F: Fn(Request, &dyn Handler) -> Result<Response, DispatchError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// One layer of the onion: a middleware bound to everything inside it.
struct Layer {
    middleware: Arc<dyn Middleware>,
    next: Arc<dyn Handler>,
}

impl Handler for Layer {
    fn handle(&self, request: Request) -> Result<Response, DispatchError> {
        self.middleware.process(request, self.next.as_ref())
    }
}

/// Ordered middleware list applied to every dispatched request.
///
/// `build` composes right-to-left, so the first middleware is the outermost
/// layer: its pre-logic runs first and its post-logic runs last.
#[derive(Clone, Default)]
pub struct Pipeline {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Pipeline {
    #[must_use]
    pub fn new(middlewares: Vec<Arc<dyn Middleware>>) -> Self {
        Self { middlewares }
    }

    /// Append a middleware; it becomes the innermost layer.
    pub fn add(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    #[must_use]
    pub fn with(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.add(middleware);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Wrap `target` in every middleware and return the composed handler.
    #[must_use]
    pub fn build(&self, target: Arc<dyn Handler>) -> Arc<dyn Handler> {
        debug!(
            middleware_count = self.middlewares.len(),
            middlewares = ?self.middlewares.iter().map(|m| m.name()).collect::<Vec<_>>(),
            "Building middleware pipeline"
        );
        self.middlewares
            .iter()
            .rev()
            .fold(target, |next, middleware| {
                let layer: Arc<dyn Handler> = Arc::new(Layer {
                    middleware: Arc::clone(middleware),
                    next,
                });
                layer
            })
    }
}
