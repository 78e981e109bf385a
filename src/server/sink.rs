//! Transport sinks: the seam between the response emitter and the wire.
//!
//! The emitter never touches a socket directly. It talks to a
//! [`TransportSink`], which keeps it testable without a live connection.
//! Two adapters ship with the crate:
//!
//! - [`RecordingSink`] keeps every call in memory (tests, embedding)
//! - [`WireSink`] serializes HTTP/1.x onto any `io::Write`
//!
//! Header calls follow "replace or append" semantics: `replace = true` drops
//! any value already sent under the same name, `replace = false` adds another
//! line.

use std::io::{self, Write};

use http::Version;

use super::headers::Headers;
use super::request::version_str;

/// Outbound half of a connection.
pub trait TransportSink {
    fn send_status_line(&mut self, version: Version, status: u16, reason: &str) -> io::Result<()>;

    fn send_header(&mut self, name: &str, value: &str, replace: bool) -> io::Result<()>;

    fn write_body_chunk(&mut self, chunk: &[u8]) -> io::Result<()>;

    /// Called once after the last header or chunk.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// One recorded sink call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    StatusLine {
        version: Version,
        status: u16,
        reason: String,
    },
    Header {
        name: String,
        value: String,
        replace: bool,
    },
    Body(Vec<u8>),
    Finish,
}

/// In-memory sink that records calls in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Vec<SinkEvent>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }

    /// Status line as it would appear on the wire, e.g. `HTTP/1.0 200 OK`.
    #[must_use]
    pub fn status_line(&self) -> Option<String> {
        self.events.iter().find_map(|e| match e {
            SinkEvent::StatusLine {
                version,
                status,
                reason,
            } => Some(format!("{} {} {}", version_str(*version), status, reason)),
            _ => None,
        })
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.events.iter().find_map(|e| match e {
            SinkEvent::StatusLine { status, .. } => Some(*status),
            _ => None,
        })
    }

    /// Header state after applying every replace/append call in order.
    #[must_use]
    pub fn headers(&self) -> Headers {
        let mut headers = Headers::new();
        for event in &self.events {
            if let SinkEvent::Header {
                name,
                value,
                replace,
            } = event
            {
                if *replace {
                    headers.set(name.as_str(), value.as_str());
                } else {
                    headers.append(name.as_str(), value.as_str());
                }
            }
        }
        headers
    }

    /// Every body write, in order.
    #[must_use]
    pub fn chunks(&self) -> Vec<&[u8]> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Body(chunk) => Some(chunk.as_slice()),
                _ => None,
            })
            .collect()
    }

    /// Concatenated body.
    #[must_use]
    pub fn body(&self) -> Vec<u8> {
        self.chunks().concat()
    }

    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body()).into_owned()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.events.last() == Some(&SinkEvent::Finish)
    }
}

impl TransportSink for RecordingSink {
    fn send_status_line(&mut self, version: Version, status: u16, reason: &str) -> io::Result<()> {
        self.events.push(SinkEvent::StatusLine {
            version,
            status,
            reason: reason.to_string(),
        });
        Ok(())
    }

    fn send_header(&mut self, name: &str, value: &str, replace: bool) -> io::Result<()> {
        self.events.push(SinkEvent::Header {
            name: name.to_string(),
            value: value.to_string(),
            replace,
        });
        Ok(())
    }

    fn write_body_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.events.push(SinkEvent::Body(chunk.to_vec()));
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.events.push(SinkEvent::Finish);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    None,
    Raw,
    Chunked,
}

#[derive(Debug)]
struct PendingHead {
    version: Version,
    status: u16,
    reason: String,
    headers: Headers,
}

/// HTTP/1.x serializer over a byte stream.
///
/// Status line and headers are buffered until the first body chunk (or
/// [`TransportSink::finish`]) so replace semantics can still apply; after that
/// the head is on the wire and further header calls fail. Body framing:
///
/// - an explicit `content-length` is trusted as-is
/// - otherwise HTTP/1.1 uses chunked transfer coding
/// - otherwise the body is close-delimited and `connection: close` is added
///
/// 1xx, 204 and 304 responses get no framing at all. A sink built with
/// [`WireSink::head_only`] answers a `HEAD` request: the head, framing headers
/// included, is written as usual and body bytes are discarded.
///
/// Header names and values containing CR or LF are rejected.
///
/// There is no cancellation path: if the peer goes away mid-stream the write
/// error is returned to the caller.
#[derive(Debug)]
pub struct WireSink<W: Write> {
    writer: W,
    pending: Option<PendingHead>,
    framing: Option<Framing>,
    finished: bool,
    head_only: bool,
}

impl<W: Write> WireSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pending: None,
            framing: None,
            finished: false,
            head_only: false,
        }
    }

    /// Discard body bytes when `head_only` is set.
    #[must_use]
    pub fn head_only(mut self, head_only: bool) -> Self {
        self.head_only = head_only;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn headers_sent_error() -> io::Error {
        io::Error::other("response head already sent")
    }

    fn flush_head(&mut self) -> io::Result<Framing> {
        if let Some(framing) = self.framing {
            return Ok(framing);
        }
        let mut head = self
            .pending
            .take()
            .ok_or_else(|| io::Error::other("status line not sent"))?;

        let bodiless = head.status < 200 || head.status == 204 || head.status == 304;
        let framing = if bodiless {
            Framing::None
        } else if head.headers.contains("content-length") {
            Framing::Raw
        } else if head.version >= Version::HTTP_11 {
            head.headers.set("transfer-encoding", "chunked");
            Framing::Chunked
        } else {
            head.headers.set("connection", "close");
            Framing::Raw
        };

        let mut buf = Vec::with_capacity(256);
        buf.extend_from_slice(version_str(head.version).as_bytes());
        buf.extend_from_slice(format!(" {} {}\r\n", head.status, head.reason).as_bytes());
        for (name, value) in head.headers.pairs() {
            buf.extend_from_slice(name.as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(value.as_bytes());
            buf.extend_from_slice(b"\r\n");
        }
        buf.extend_from_slice(b"\r\n");
        self.writer.write_all(&buf)?;
        self.writer.flush()?;
        self.framing = Some(framing);
        Ok(framing)
    }
}

impl<W: Write> TransportSink for WireSink<W> {
    fn send_status_line(&mut self, version: Version, status: u16, reason: &str) -> io::Result<()> {
        if self.framing.is_some() {
            return Err(Self::headers_sent_error());
        }
        self.pending = Some(PendingHead {
            version,
            status,
            reason: reason.to_string(),
            headers: Headers::new(),
        });
        Ok(())
    }

    fn send_header(&mut self, name: &str, value: &str, replace: bool) -> io::Result<()> {
        let head = match (&self.framing, self.pending.as_mut()) {
            (None, Some(head)) => head,
            (Some(_), _) => return Err(Self::headers_sent_error()),
            (None, None) => return Err(io::Error::other("status line not sent")),
        };
        if [name, value].iter().any(|s| s.contains(['\r', '\n'])) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("header `{}` contains a line break", name.escape_debug()),
            ));
        }
        if replace {
            head.headers.set(name, value);
        } else {
            head.headers.append(name, value);
        }
        Ok(())
    }

    fn write_body_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        let framing = self.flush_head()?;
        if self.head_only {
            return Ok(());
        }
        match framing {
            Framing::None => return Ok(()),
            Framing::Raw => self.writer.write_all(chunk)?,
            Framing::Chunked => {
                self.writer
                    .write_all(format!("{:x}\r\n", chunk.len()).as_bytes())?;
                self.writer.write_all(chunk)?;
                self.writer.write_all(b"\r\n")?;
            }
        }
        self.writer.flush()
    }

    fn finish(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        if self.flush_head()? == Framing::Chunked && !self.head_only {
            self.writer.write_all(b"0\r\n\r\n")?;
        }
        self.finished = true;
        self.writer.flush()
    }
}
