use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::{handler_fn, Handler, Middleware};
use crate::recovery::DispatchError;
use crate::server::{Request, Response};

/// Request statistics collected with relaxed atomics.
///
/// A request counts as an error when the chain returns `Err` or a response
/// with status 500 or above.
#[derive(Debug, Default)]
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    error_count: AtomicUsize,
    total_latency_ns: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub request_count: usize,
    pub error_count: usize,
    pub average_latency_us: u64,
}

impl MetricsMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Mean processing time; zero before the first request.
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            request_count: self.request_count(),
            error_count: self.error_count(),
            average_latency_us: self.average_latency().as_micros() as u64,
        }
    }

    /// Endpoint answering with the current snapshot as JSON.
    #[must_use]
    pub fn handler(self: &Arc<Self>) -> Arc<dyn Handler> {
        let metrics = Arc::clone(self);
        handler_fn(move |_req| Ok(Response::json(200, &metrics.snapshot())?))
    }
}

impl Middleware for MetricsMiddleware {
    fn process(&self, request: Request, next: &dyn Handler) -> Result<Response, DispatchError> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        let start = Instant::now();
        let result = next.handle(request);
        self.total_latency_ns
            .fetch_add(start.elapsed().as_nanos() as u64, Ordering::Relaxed);
        let failed = match &result {
            Ok(response) => response.status() >= 500,
            Err(_) => true,
        };
        if failed {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    fn name(&self) -> &'static str {
        "metrics"
    }
}
