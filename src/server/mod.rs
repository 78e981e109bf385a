//! # Server Module
//!
//! Request and response values, the response emitter, transport sinks and the
//! blocking HTTP/1.x listener that feeds the dispatcher.

mod body;
mod emitter;
mod headers;
pub mod http_server;
mod request;
mod response;
pub mod sink;

pub use body::{Body, ReadSeek};
pub use emitter::{ResponseEmitter, DEFAULT_BLOCK_SIZE};
pub use headers::{Headers, MAX_INLINE_HEADERS};
pub use http_server::{HttpServer, ServerHandle};
pub use request::{version_str, Request, RequestBuilder, RequestHead, ACTIVE_PATH_ATTR};
pub use response::{status_reason, Response};
pub use sink::{RecordingSink, SinkEvent, TransportSink, WireSink};
