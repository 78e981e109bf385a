//! # brrtdispatch
//!
//! **brrtdispatch** is a synchronous HTTP dispatch pipeline: it maps a request
//! to an endpoint by path prefix, runs the endpoint through an onion of
//! middleware, writes the response onto a transport with well-defined header
//! merge and streaming rules, and turns failures into client-appropriate
//! error responses.
//!
//! ## Architecture
//!
//! - **[`registry`]** - Ordered path-prefix → handler table and the named
//!   [`Catalog`](registry::Catalog) used by config files
//! - **[`middleware`]** - The [`Handler`](middleware::Handler) and
//!   [`Middleware`](middleware::Middleware) traits, pipeline composition and
//!   built-in middleware (tracing, request ids, CORS, auth, metrics)
//! - **[`server`]** - Request/response values, the
//!   [`ResponseEmitter`](server::ResponseEmitter), transport sinks and the
//!   blocking HTTP listener
//! - **[`recovery`]** - Failure classification and substitute responses
//! - **[`dispatcher`]** - Boot, freeze and per-request orchestration
//! - **[`config`]** / **[`runtime_config`]** - Declarative setup and
//!   environment overrides
//! - **[`views`]** - Template rendering for HTML error pages
//! - **[`logging`]** - `tracing-subscriber` setup
//!
//! ### Request flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant T as Transport
//!     participant D as Dispatcher
//!     participant R as EndpointRegistry
//!     participant P as Pipeline
//!     participant E as ResponseEmitter
//!     participant X as ErrorRecovery
//!
//!     T->>D: dispatch(request, sink)
//!     D->>D: start() if needed (mount fallback, freeze)
//!     D->>R: resolve(path)
//!     R-->>D: handler + matched path
//!     D->>P: build(handler)
//!     D->>P: handle(request + activePath)
//!     alt Ok(response)
//!         D->>E: dispatch(response)
//!     else Err or panic
//!         D->>X: recover(error)
//!         X->>E: dispatch(substitute)
//!     end
//!     E->>T: status line, headers, body blocks
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use brrtdispatch::config::DispatcherConfig;
//! use brrtdispatch::dispatcher::Dispatcher;
//! use brrtdispatch::middleware::{handler_fn, Pipeline, TracingMiddleware};
//! use brrtdispatch::recovery::ErrorRecovery;
//! use brrtdispatch::registry::EndpointRegistry;
//! use brrtdispatch::server::{RecordingSink, Request, Response, ResponseEmitter};
//! use std::sync::Arc;
//!
//! let dispatcher = Dispatcher::new(
//!     &DispatcherConfig::default(),
//!     EndpointRegistry::new(),
//!     Pipeline::default().with(Arc::new(TracingMiddleware)),
//!     ResponseEmitter::default(),
//!     ErrorRecovery::default(),
//! );
//! dispatcher
//!     .add("/forum", handler_fn(|_req| Ok(Response::ok().with_body("forum"))))
//!     .unwrap();
//!
//! let mut sink = RecordingSink::new();
//! dispatcher
//!     .dispatch(Request::get("/forum/thread/1").unwrap(), &mut sink)
//!     .unwrap();
//! assert_eq!(sink.status(), Some(200));
//! assert_eq!(sink.body_string(), "forum");
//! ```

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod recovery;
pub mod registry;
pub mod runtime_config;
pub mod server;
pub mod views;

pub use config::{DispatcherConfig, RouterSettings};
pub use dispatcher::Dispatcher;
pub use middleware::{Handler, Middleware, Pipeline};
pub use recovery::{BootError, DispatchError, ErrorRecovery};
pub use registry::{Catalog, EndpointRegistry};
pub use server::{Request, Response, ResponseEmitter, TransportSink};
