use std::collections::BTreeMap;
use std::net::SocketAddr;

use http::{Method, Uri, Version};
use serde::Serialize;
use serde_json::Value;

use super::body::Body;
use super::headers::Headers;

/// Attribute key under which the dispatcher records the matched endpoint path.
pub const ACTIVE_PATH_ATTR: &str = "activePath";

/// Request metadata: everything except the body stream.
///
/// Cheap to clone, so the dispatcher keeps a copy for error recovery after the
/// pipeline has consumed the request itself.
#[derive(Debug, Clone, Serialize)]
pub struct RequestHead {
    #[serde(serialize_with = "serialize_method")]
    method: Method,
    scheme: String,
    host: Option<String>,
    path: String,
    query: Option<String>,
    #[serde(serialize_with = "serialize_version")]
    version: Version,
    headers: Headers,
    attributes: BTreeMap<String, Value>,
    #[serde(skip)]
    remote_addr: Option<SocketAddr>,
}

fn serialize_method<S: serde::Serializer>(m: &Method, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(m.as_str())
}

fn serialize_version<S: serde::Serializer>(v: &Version, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(version_str(*v))
}

/// Wire spelling of an HTTP version, as used in status and request lines.
#[must_use]
pub fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
}

impl RequestHead {
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Path component of the request URI, without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Protocol version declared by the client.
    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Peer address reported by the transport, if any.
    #[must_use]
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// True when the client asked for JSON and nothing else.
    #[must_use]
    pub fn wants_json(&self) -> bool {
        self.header("accept")
            .is_some_and(|v| v.trim() == "application/json")
    }
}

/// Inbound request handed to handlers and middleware.
///
/// The head is read-only; middleware annotates a request by producing a
/// derived one through [`Request::with_attribute`].
#[derive(Debug)]
pub struct Request {
    head: RequestHead,
    body: Body,
}

impl Request {
    #[must_use]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Shorthand for a `GET` request with no headers.
    pub fn get(uri: &str) -> Result<Self, http::uri::InvalidUri> {
        Request::builder().uri(uri).build()
    }

    #[must_use]
    pub fn head(&self) -> &RequestHead {
        &self.head
    }

    #[must_use]
    pub fn path(&self) -> &str {
        self.head.path()
    }

    #[must_use]
    pub fn version(&self) -> Version {
        self.head.version()
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.header(name)
    }

    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.head.attribute(key)
    }

    /// Path of the endpoint that matched this request, once dispatched.
    #[must_use]
    pub fn active_path(&self) -> Option<&str> {
        self.attribute(ACTIVE_PATH_ATTR).and_then(Value::as_str)
    }

    /// Derive a request carrying one more attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.head.attributes.insert(key.into(), value.into());
        self
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    #[must_use]
    pub fn into_parts(self) -> (RequestHead, Body) {
        (self.head, self.body)
    }
}

/// Builder for [`Request`]; transports and tests assemble requests through it.
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    uri: String,
    version: Version,
    headers: Headers,
    body: Body,
    remote_addr: Option<SocketAddr>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self {
            method: Method::GET,
            uri: "/".to_string(),
            version: Version::HTTP_11,
            headers: Headers::new(),
            body: Body::Empty,
            remote_addr: None,
        }
    }
}

impl RequestBuilder {
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Absolute (`http://host/path`) or origin-form (`/path?q`) target.
    #[must_use]
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    #[must_use]
    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Parse the target and assemble the request.
    ///
    /// Scheme defaults to `http`; host falls back to the `Host` header when
    /// the target is in origin form.
    pub fn build(self) -> Result<Request, http::uri::InvalidUri> {
        let target = if self.uri.is_empty() { "/" } else { self.uri.as_str() };
        let uri: Uri = target.parse()?;
        let host = uri
            .host()
            .map(str::to_string)
            .or_else(|| self.headers.get("host").map(str::to_string));
        let head = RequestHead {
            method: self.method,
            scheme: uri.scheme_str().unwrap_or("http").to_string(),
            host,
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            version: self.version,
            headers: self.headers,
            attributes: BTreeMap::new(),
            remote_addr: self.remote_addr,
        };
        Ok(Request {
            head,
            body: self.body,
        })
    }
}
