use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

/// Anything that can be both read and repositioned.
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// Request or response body stream.
///
/// The emitter treats the two stream kinds differently: a seekable body is
/// rewound and replayed in fixed-size blocks, a non-seekable one is drained in
/// a single read.
#[derive(Default)]
pub enum Body {
    #[default]
    Empty,
    Seekable(Box<dyn ReadSeek>),
    Stream(Box<dyn Read + Send>),
}

impl Body {
    /// Wrap a seekable source such as a `File` or `Cursor`.
    pub fn seekable<R: Read + Seek + Send + 'static>(source: R) -> Self {
        Body::Seekable(Box::new(source))
    }

    /// Wrap a forward-only source such as a socket or pipe.
    pub fn stream<R: Read + Send + 'static>(source: R) -> Self {
        Body::Stream(Box::new(source))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }

    #[must_use]
    pub fn is_seekable(&self) -> bool {
        matches!(self, Body::Seekable(_))
    }

    /// Rewind a seekable body to its first byte. No-op for other kinds.
    pub fn rewind(&mut self) -> io::Result<()> {
        if let Body::Seekable(inner) = self {
            inner.seek(SeekFrom::Start(0))?;
        }
        Ok(())
    }

    /// Drain the remaining content into memory.
    pub fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        match self {
            Body::Empty => {}
            Body::Seekable(inner) => {
                inner.read_to_end(&mut buf)?;
            }
            Body::Stream(inner) => {
                inner.read_to_end(&mut buf)?;
            }
        }
        Ok(buf)
    }

    /// Read until `buf` is full or the stream ends; returns the byte count.
    ///
    /// Short reads from the underlying source are retried so every block but
    /// the last has exactly `buf.len()` bytes.
    pub fn read_block(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            filled += n;
        }
        Ok(filled)
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Body::Empty => Ok(0),
            Body::Seekable(inner) => inner.read(buf),
            Body::Stream(inner) => inner.read(buf),
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Body::Empty"),
            Body::Seekable(_) => f.write_str("Body::Seekable(..)"),
            Body::Stream(_) => f.write_str("Body::Stream(..)"),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        if bytes.is_empty() {
            Body::Empty
        } else {
            Body::seekable(Cursor::new(bytes))
        }
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::from(s.into_bytes())
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::from(s.as_bytes().to_vec())
    }
}
