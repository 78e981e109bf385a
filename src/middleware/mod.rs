//! # Middleware Module
//!
//! Request/response filters composed around an endpoint as an onion.
//!
//! ## Composition
//!
//! A [`Pipeline`] holds middlewares in order and wraps a target [`Handler`]
//! right-to-left, so for `[a, b]` the call order is:
//!
//! ```text
//! a.pre -> b.pre -> endpoint -> b.post -> a.post
//! ```
//!
//! A middleware may short-circuit by answering without calling `next`, or
//! fail by returning `Err`; the error travels outward through every enclosing
//! layer untouched unless one of them handles it.
//!
//! ## Built-in middleware
//!
//! - [`TracingMiddleware`]: per-request span and completion log
//! - [`RequestIdMiddleware`]: ULID request ids via `x-request-id`
//! - [`CorsMiddleware`]: preflight answers and CORS headers
//! - [`AuthMiddleware`]: static token check, `401` short-circuit
//! - [`MetricsMiddleware`]: request, error and latency counters
//!
//! ## Example
//!
//! ```rust
//! use brrtdispatch::middleware::{handler_fn, middleware_fn, Handler, Pipeline, TracingMiddleware};
//! use brrtdispatch::server::{Request, Response};
//! use std::sync::Arc;
//!
//! let endpoint = handler_fn(|_req| Ok(Response::ok()));
//! let stamp = middleware_fn(|req, next| next.handle(req).map(|r| r.with_header("X-Stamp", "1")));
//! let chain = Pipeline::default()
//!     .with(Arc::new(TracingMiddleware))
//!     .with(stamp)
//!     .build(endpoint);
//! let resp = chain.handle(Request::get("/").unwrap()).unwrap();
//! assert_eq!(resp.header("x-stamp"), Some("1"));
//! ```

mod auth;
mod core;
mod cors;
mod metrics;
mod request_id;
mod tracing;

pub use self::core::{handler_fn, middleware_fn, Handler, Middleware, Pipeline};
pub use self::tracing::TracingMiddleware;
pub use auth::AuthMiddleware;
pub use cors::CorsMiddleware;
pub use metrics::{MetricsMiddleware, MetricsSnapshot};
pub use request_id::{RequestId, RequestIdMiddleware, REQUEST_ID_ATTR, REQUEST_ID_HEADER};
