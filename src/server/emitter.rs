use std::io;

use http::Version;
use tracing::{debug, warn};

use super::body::Body;
use super::headers::Headers;
use super::response::Response;
use super::sink::TransportSink;

/// Default size of a replayed body block.
pub const DEFAULT_BLOCK_SIZE: usize = 8192;

/// Writes a [`Response`] onto a [`TransportSink`].
///
/// Order of operations:
///
/// 1. status line, using the protocol version of the original request
/// 2. response headers: each name suppresses the matching default header; the
///    first value replaces, later values append
/// 3. default headers the response did not override, once each
/// 4. `204` stops here
/// 5. body: a non-seekable stream is drained and written as one unit; a
///    seekable one is rewound and replayed in `block_size` blocks
#[derive(Debug, Clone, Copy)]
pub struct ResponseEmitter {
    block_size: usize,
}

impl Default for ResponseEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE)
    }
}

impl ResponseEmitter {
    /// A zero block size falls back to [`DEFAULT_BLOCK_SIZE`].
    #[must_use]
    pub fn new(block_size: usize) -> Self {
        let block_size = if block_size == 0 {
            DEFAULT_BLOCK_SIZE
        } else {
            block_size
        };
        Self { block_size }
    }

    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Emit `response` in full.
    ///
    /// Write failures (including a peer that disconnected mid-stream) are
    /// returned as-is; nothing is retried.
    pub fn dispatch(
        &self,
        response: Response,
        version: Version,
        defaults: &Headers,
        sink: &mut dyn TransportSink,
    ) -> io::Result<()> {
        let (status, reason, headers, mut body) = response.into_parts();
        sink.send_status_line(version, status, &reason)?;

        let mut remaining = defaults.clone();
        for (name, values) in headers.iter() {
            remaining.remove(name);
            for (idx, value) in values.iter().enumerate() {
                sink.send_header(name, value, idx == 0)?;
            }
        }
        for (name, values) in remaining.iter() {
            if let Some(value) = values.first() {
                sink.send_header(name, value, true)?;
            }
        }

        if status == 204 {
            if !body.is_empty() {
                debug!(status, "Discarding body of 204 response");
            }
            return sink.finish();
        }

        let written = self.emit_body(&mut body, sink).inspect_err(|e| {
            warn!(status, error = %e, "Response body write failed");
        })?;
        debug!(status, bytes = written, "Response emitted");
        sink.finish()
    }

    fn emit_body(&self, body: &mut Body, sink: &mut dyn TransportSink) -> io::Result<usize> {
        match body {
            Body::Empty => Ok(0),
            Body::Stream(_) => {
                let content = body.read_all()?;
                if !content.is_empty() {
                    sink.write_body_chunk(&content)?;
                }
                Ok(content.len())
            }
            Body::Seekable(_) => {
                body.rewind()?;
                let mut buf = vec![0u8; self.block_size];
                let mut total = 0;
                loop {
                    let n = body.read_block(&mut buf)?;
                    if n == 0 {
                        break;
                    }
                    sink.write_body_chunk(&buf[..n])?;
                    total += n;
                    if n < buf.len() {
                        break;
                    }
                }
                Ok(total)
            }
        }
    }
}
