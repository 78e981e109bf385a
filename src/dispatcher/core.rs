use std::any::Any;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use tracing::{debug, error, info};

use crate::config::{DispatcherConfig, RouterSettings};
use crate::handlers::NotFoundHandler;
use crate::middleware::{Handler, Pipeline};
use crate::recovery::{BootError, DispatchError, ErrorRecovery};
use crate::registry::{normalize_path, Catalog, EndpointRegistry, RouterFactory};
use crate::server::{
    Headers, Request, RequestHead, ResponseEmitter, TransportSink, ACTIVE_PATH_ATTR,
};
use crate::views::TemplateViews;

/// Message of the client failure raised when no endpoint matches.
const NO_ENDPOINT_MESSAGE: &str = "Unable to select endpoint";

/// Routes requests to endpoints and drives the response onto a sink.
///
/// `Dispatcher` is `Send + Sync`; request-time reads of the endpoint table are
/// lock-free. Registration is serialized and only allowed before start.
pub struct Dispatcher {
    base_path: String,
    default_headers: Headers,
    router_settings: RouterSettings,
    router_factory: Option<RouterFactory>,
    registry: ArcSwap<EndpointRegistry>,
    started: AtomicBool,
    boot: Mutex<()>,
    pipeline: Pipeline,
    emitter: ResponseEmitter,
    recovery: ErrorRecovery,
}

impl Dispatcher {
    /// Assemble a dispatcher from its collaborators.
    ///
    /// `config` supplies the base path, the default response headers and the
    /// fallback router settings.
    #[must_use]
    pub fn new(
        config: &DispatcherConfig,
        registry: EndpointRegistry,
        pipeline: Pipeline,
        emitter: ResponseEmitter,
        recovery: ErrorRecovery,
    ) -> Self {
        Self {
            base_path: normalize_path(&config.base_path),
            default_headers: config.default_headers(),
            router_settings: config.router.clone(),
            router_factory: None,
            registry: ArcSwap::from_pointee(registry),
            started: AtomicBool::new(false),
            boot: Mutex::new(()),
            pipeline,
            emitter,
            recovery,
        }
    }

    /// Use `factory` to build the base-path fallback on start.
    #[must_use]
    pub fn with_router_factory(mut self, factory: RouterFactory) -> Self {
        self.router_factory = Some(factory);
        self
    }

    /// Build a dispatcher whose endpoints, middlewares and router class are
    /// looked up by name in `catalog`.
    pub fn from_config(config: &DispatcherConfig, catalog: &Catalog) -> Result<Self, BootError> {
        let mut registry = EndpointRegistry::new();
        for (path, name) in &config.endpoints {
            registry.register(path, catalog.handler(name)?);
        }

        let mut pipeline = Pipeline::default();
        for name in &config.middlewares {
            pipeline.add(catalog.middleware(name)?);
        }

        let mut recovery = ErrorRecovery::new(config.expose_errors)
            .with_http_errors(config.http_errors.clone());
        if let Some(dir) = &config.templates {
            let views = TemplateViews::from_dir(dir).map_err(BootError::Templates)?;
            recovery = recovery.with_views(Arc::new(views));
        }

        let mut dispatcher = Self::new(
            config,
            registry,
            pipeline,
            ResponseEmitter::new(config.block_size),
            recovery,
        );
        if let Some(class) = &config.router.class {
            dispatcher = dispatcher.with_router_factory(catalog.router(class)?);
        }
        info!(
            base_path = %dispatcher.base_path,
            endpoints = config.endpoints.len(),
            middlewares = config.middlewares.len(),
            router = config.router.class.as_deref().unwrap_or("-"),
            expose_errors = config.expose_errors,
            "Dispatcher assembled from config"
        );
        Ok(dispatcher)
    }

    /// Register an endpoint. Fails once the dispatcher has started.
    pub fn add(&self, path: &str, handler: Arc<dyn Handler>) -> Result<(), BootError> {
        let _guard = self.boot.lock().unwrap_or_else(PoisonError::into_inner);
        if self.started.load(Ordering::Acquire) {
            return Err(BootError::Frozen {
                path: path.to_string(),
            });
        }
        let mut next = EndpointRegistry::clone(&self.registry.load());
        next.register(path, handler);
        self.registry.store(Arc::new(next));
        Ok(())
    }

    /// Mount the fallback endpoint if needed and freeze the registry.
    ///
    /// Idempotent. If the router factory fails the dispatcher stays
    /// unstarted.
    pub fn start(&self) -> Result<(), BootError> {
        if self.started.load(Ordering::Acquire) {
            return Ok(());
        }
        let _guard = self.boot.lock().unwrap_or_else(PoisonError::into_inner);
        if self.started.load(Ordering::Acquire) {
            return Ok(());
        }
        let current = self.registry.load_full();
        if !current.contains(&self.base_path) {
            let fallback: Arc<dyn Handler> = match &self.router_factory {
                Some(factory) => factory(&self.router_settings).map_err(BootError::Router)?,
                None => Arc::new(NotFoundHandler),
            };
            let mut next = EndpointRegistry::clone(&current);
            next.register(&self.base_path, fallback);
            self.registry.store(Arc::new(next));
            info!(
                base_path = %self.base_path,
                router = self.router_settings.class.as_deref().unwrap_or("notFound"),
                "Fallback endpoint registered"
            );
        }
        self.started.store(true, Ordering::Release);
        info!(
            endpoints = ?self.registry.load().paths().collect::<Vec<_>>(),
            "Dispatcher started"
        );
        Ok(())
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Current endpoint table.
    #[must_use]
    pub fn registry(&self) -> Arc<EndpointRegistry> {
        self.registry.load_full()
    }

    /// Dispatch one request and write the outcome to `sink`.
    ///
    /// Every handler failure is turned into a response; only transport write
    /// errors are returned.
    pub fn dispatch(&self, request: Request, sink: &mut dyn TransportSink) -> io::Result<()> {
        if let Err(e) = self.start() {
            error!(error = %e, "Dispatcher failed to start");
            let head = request.head().clone();
            return self.recover(DispatchError::internal(e), &head, sink);
        }

        let resolved = self.registry.load().resolve(request.path());
        let Some(resolved) = resolved else {
            let head = request.head().clone();
            return self.recover(DispatchError::client(500, NO_ENDPOINT_MESSAGE), &head, sink);
        };

        let request = request.with_attribute(ACTIVE_PATH_ATTR, &*resolved.matched_path);
        let head = request.head().clone();
        debug!(
            method = %head.method(),
            path = %head.path(),
            active_path = %resolved.matched_path,
            "Dispatching request"
        );
        let chain = self.pipeline.build(resolved.handler);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| chain.handle(request)));
        let result = outcome.unwrap_or_else(|payload| {
            let panic_message = panic_message(payload.as_ref());
            error!(
                path = %head.path(),
                active_path = %resolved.matched_path,
                panic_message = %panic_message,
                "Handler panicked"
            );
            Err(DispatchError::internal(anyhow::anyhow!(
                "handler panicked: {panic_message}"
            )))
        });

        match result {
            Ok(response) => self
                .emitter
                .dispatch(response, head.version(), &self.default_headers, sink),
            Err(e) => self.recover(e, &head, sink),
        }
    }

    fn recover(
        &self,
        error: DispatchError,
        head: &RequestHead,
        sink: &mut dyn TransportSink,
    ) -> io::Result<()> {
        self.recovery
            .recover(error, head, &self.emitter, &self.default_headers, sink)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("base_path", &self.base_path)
            .field("started", &self.is_started())
            .field("endpoints", &self.registry.load())
            .field("middlewares", &self.pipeline.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::handler_fn;
    use crate::server::{RecordingSink, Response};

    fn bare() -> Dispatcher {
        Dispatcher::new(
            &DispatcherConfig::default(),
            EndpointRegistry::new(),
            Pipeline::default(),
            ResponseEmitter::default(),
            ErrorRecovery::default(),
        )
    }

    #[test]
    fn test_start_registers_fallback_once() {
        let d = bare();
        d.start().unwrap();
        d.start().unwrap();
        assert_eq!(d.registry().paths().collect::<Vec<_>>(), vec!["/"]);
    }

    #[test]
    fn test_existing_base_endpoint_is_kept() {
        let d = bare();
        d.add("/", handler_fn(|_| Ok(Response::new(202)))).unwrap();
        let mut sink = RecordingSink::new();
        d.dispatch(Request::get("/anything").unwrap(), &mut sink).unwrap();
        assert_eq!(sink.status(), Some(202));
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
