use std::time::Instant;

use tracing::{info, info_span, warn};

use super::{Handler, Middleware};
use crate::recovery::DispatchError;
use crate::server::{Request, Response};

/// Opens an `info` span per request and logs completion with latency.
///
/// Runs the rest of the chain inside the span, so log events emitted by inner
/// middleware and the endpoint carry `method`, `path` and `active_path`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn process(&self, request: Request, next: &dyn Handler) -> Result<Response, DispatchError> {
        let span = info_span!(
            "request",
            method = %request.head().method(),
            path = %request.path(),
            active_path = request.active_path().unwrap_or("-"),
        );
        span.in_scope(|| {
            let start = Instant::now();
            let result = next.handle(request);
            let latency_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(response) => info!(status = response.status(), latency_ms, "Request completed"),
                Err(e) => warn!(
                    client_status = ?e.client_status(),
                    error = %e,
                    latency_ms,
                    "Request failed"
                ),
            }
            result
        })
    }

    fn name(&self) -> &'static str {
        "tracing"
    }
}
