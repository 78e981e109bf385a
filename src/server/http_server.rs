use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use http::{Method, Version};
use tracing::{debug, info, warn};

use super::emitter::ResponseEmitter;
use super::headers::Headers;
use super::request::{Request, RequestBuilder};
use super::response::Response;
use super::sink::WireSink;
use crate::dispatcher::Dispatcher;

/// Blocking HTTP/1.x listener feeding a [`Dispatcher`].
///
/// Requests are served one at a time on the calling (or spawned) thread. Each
/// request body is read fully into memory before dispatch, so handlers see a
/// seekable body. The response is written through a [`WireSink`] over the raw
/// connection; `HEAD` requests get the head only.
pub struct HttpServer {
    server: Arc<tiny_http::Server>,
    addr: SocketAddr,
}

/// Handle to a server running on a background thread.
pub struct ServerHandle {
    addr: SocketAddr,
    server: Arc<tiny_http::Server>,
    stopping: Arc<AtomicBool>,
    handle: thread::JoinHandle<()>,
}

impl ServerHandle {
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting requests and wait for the serving thread to exit.
    pub fn stop(self) {
        self.stopping.store(true, Ordering::Release);
        self.server.unblock();
        if self.handle.join().is_err() {
            warn!(addr = %self.addr, "Server thread panicked during shutdown");
        }
    }

    /// Block until the serving thread exits.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

impl HttpServer {
    /// Bind a listener. Port `0` picks a free port; see [`HttpServer::local_addr`].
    pub fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let server = tiny_http::Server::http(addr).map_err(io::Error::other)?;
        let addr = server
            .server_addr()
            .to_ip()
            .ok_or_else(|| io::Error::other("listener is not bound to an IP address"))?;
        info!(addr = %addr, "HTTP listener bound");
        Ok(Self {
            server: Arc::new(server),
            addr,
        })
    }

    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve requests on the current thread until the listener is unblocked.
    pub fn serve(&self, dispatcher: &Dispatcher) {
        for request in self.server.incoming_requests() {
            handle_request(dispatcher, request);
        }
        info!(addr = %self.addr, "HTTP listener stopped");
    }

    /// Wait for and serve exactly one request.
    pub fn serve_one(&self, dispatcher: &Dispatcher) -> io::Result<()> {
        let request = self.server.recv()?;
        handle_request(dispatcher, request);
        Ok(())
    }

    /// Serve on a background thread.
    pub fn spawn(self, dispatcher: Arc<Dispatcher>) -> io::Result<ServerHandle> {
        let stopping = Arc::new(AtomicBool::new(false));
        let server = Arc::clone(&self.server);
        let flag = Arc::clone(&stopping);
        let handle = thread::Builder::new()
            .name("brrtdispatch-http".to_string())
            .spawn(move || {
                for request in server.incoming_requests() {
                    if flag.load(Ordering::Acquire) {
                        break;
                    }
                    handle_request(&dispatcher, request);
                }
                debug!("Serving thread exiting");
            })?;
        Ok(ServerHandle {
            addr: self.addr,
            server: self.server,
            stopping,
            handle,
        })
    }
}

fn wire_version(version: &tiny_http::HTTPVersion) -> Version {
    match (version.0, version.1) {
        (0, 9) => Version::HTTP_09,
        (1, 0) => Version::HTTP_10,
        (2, _) => Version::HTTP_2,
        _ => Version::HTTP_11,
    }
}

/// Convert a `tiny_http` request into a dispatchable [`Request`].
fn to_request(raw: &mut tiny_http::Request) -> Result<Request, String> {
    let method = Method::from_bytes(raw.method().as_str().as_bytes())
        .map_err(|e| format!("invalid method: {e}"))?;
    let mut builder = RequestBuilder::default()
        .method(method)
        .uri(raw.url())
        .version(wire_version(raw.http_version()));
    for header in raw.headers() {
        builder = builder.header(header.field.as_str().as_str(), header.value.as_str());
    }
    if let Some(peer) = raw.remote_addr() {
        builder = builder.remote_addr(*peer);
    }
    let mut body = Vec::new();
    raw.as_reader()
        .read_to_end(&mut body)
        .map_err(|e| format!("failed to read request body: {e}"))?;
    builder
        .body(body)
        .build()
        .map_err(|e| format!("invalid request target: {e}"))
}

fn handle_request(dispatcher: &Dispatcher, mut raw: tiny_http::Request) {
    let version = wire_version(raw.http_version());
    let head_only = *raw.method() == tiny_http::Method::Head;
    let converted = to_request(&mut raw);
    let mut sink = WireSink::new(raw.into_writer()).head_only(head_only);
    let result = match converted {
        Ok(request) => dispatcher.dispatch(request, &mut sink),
        Err(reason) => {
            warn!(reason = %reason, "Rejecting malformed request");
            ResponseEmitter::default().dispatch(
                Response::new(400),
                version,
                &Headers::new(),
                &mut sink,
            )
        }
    };
    if let Err(e) = result {
        warn!(error = %e, "Failed to write response");
    }
}
