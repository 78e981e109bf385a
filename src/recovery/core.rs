use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{error, warn};

use super::context::{PeerAddr, RemoteAddr};
use super::error::DispatchError;
use super::snapshot::Snapshot;
use crate::server::{Headers, RequestHead, Response, ResponseEmitter, TransportSink};
use crate::views::ViewRenderer;

/// Placeholder logged when a client failure carries no message.
pub const EMPTY_MESSAGE_PLACEHOLDER: &str = "(no message)";

/// Turns a failed dispatch into exactly one substitute response.
///
/// Client-caused failures keep their status and are logged at `warn`.
/// Everything else becomes a 500, is logged at `error`, and is only described
/// to the client when `expose_errors` is on.
pub struct ErrorRecovery {
    expose_errors: bool,
    http_errors: HashMap<u16, String>,
    views: Option<Arc<dyn ViewRenderer>>,
    remote: Arc<dyn RemoteAddr>,
}

impl Default for ErrorRecovery {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ErrorRecovery {
    #[must_use]
    pub fn new(expose_errors: bool) -> Self {
        Self {
            expose_errors,
            http_errors: HashMap::new(),
            views: None,
            remote: Arc::new(PeerAddr),
        }
    }

    /// Status code → template identifier for HTML error pages.
    #[must_use]
    pub fn with_http_errors(mut self, http_errors: HashMap<u16, String>) -> Self {
        self.http_errors = http_errors;
        self
    }

    #[must_use]
    pub fn with_views(mut self, views: Arc<dyn ViewRenderer>) -> Self {
        self.views = Some(views);
        self
    }

    #[must_use]
    pub fn with_remote_addr(mut self, remote: Arc<dyn RemoteAddr>) -> Self {
        self.remote = remote;
        self
    }

    #[must_use]
    pub fn expose_errors(&self) -> bool {
        self.expose_errors
    }

    /// Classify `error`, log it, and emit the substitute response.
    pub fn recover(
        &self,
        error: DispatchError,
        head: &RequestHead,
        emitter: &ResponseEmitter,
        defaults: &Headers,
        sink: &mut dyn TransportSink,
    ) -> io::Result<()> {
        let response = self.respond(error, head);
        emitter.dispatch(response, head.version(), defaults, sink)
    }

    /// Classify `error`, log it, and build the substitute response.
    #[must_use]
    pub fn respond(&self, error: DispatchError, head: &RequestHead) -> Response {
        let snapshot = Snapshot::capture(error, head);
        match snapshot.status() {
            Some(status) => self.client_failure(&snapshot, status, head),
            None => self.internal_failure(&snapshot, head),
        }
    }

    fn client_failure(&self, snapshot: &Snapshot, status: u16, head: &RequestHead) -> Response {
        let message = snapshot.message();
        let message = if message.is_empty() {
            EMPTY_MESSAGE_PLACEHOLDER.to_string()
        } else {
            message
        };
        let remote_addr = self
            .remote
            .remote_addr(head)
            .unwrap_or_else(|| "-".to_string());
        warn!(
            scheme = %head.scheme(),
            host = %head.host().unwrap_or("-"),
            path = %head.path(),
            status,
            error_message = %message,
            remote_addr = %remote_addr,
            "Client error during dispatch"
        );
        self.minimal_response(status, &message, head)
    }

    fn internal_failure(&self, snapshot: &Snapshot, head: &RequestHead) -> Response {
        error!(
            path = %head.path(),
            error = %snapshot.error(),
            chain = ?snapshot.package()["error"]["chain"],
            exposed = self.expose_errors,
            "Unhandled error during dispatch"
        );
        if !self.expose_errors {
            return self.minimal_response(500, "Internal Server Error", head);
        }
        if head.wants_json() {
            let mut body = json!({ "status": 500 });
            if let (Value::Object(target), Value::Object(extra)) = (&mut body, snapshot.package()) {
                for (key, value) in extra {
                    target.entry(key.clone()).or_insert_with(|| value.clone());
                }
            }
            return json_response(500, &body);
        }
        match snapshot.render_html(500) {
            Ok(markup) => Response::html(500, markup),
            Err(e) => {
                error!(error = %e, "Failed to render diagnostic page");
                Response::new(500)
            }
        }
    }

    /// JSON status body, configured template, or empty body, in that order.
    fn minimal_response(&self, status: u16, message: &str, head: &RequestHead) -> Response {
        if head.wants_json() {
            return json_response(status, &json!({ "status": status }));
        }
        let (Some(template), Some(views)) = (self.http_errors.get(&status), self.views.as_ref()) else {
            return Response::new(status);
        };
        let context = json!({
            "status": status,
            "message": message,
            "request": head,
        });
        match views.render(template, &context) {
            Ok(markup) => Response::html(status, markup),
            Err(e) => {
                error!(status, template = %template, error = %e, "Failed to render error template");
                Response::new(status)
            }
        }
    }
}

fn json_response(status: u16, body: &Value) -> Response {
    Response::json(status, body).unwrap_or_else(|e| {
        error!(error = %e, "Failed to serialize error body");
        Response::new(status)
    })
}
