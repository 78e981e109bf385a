use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{Handler, Middleware};
use crate::recovery::DispatchError;
use crate::server::{Request, Response};

/// Header carrying the request id in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";
/// Request attribute holding the request id.
pub const REQUEST_ID_ATTR: &str = "requestId";

/// ULID-backed request identifier.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(ulid::Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Reuse a valid inbound id, otherwise mint a fresh one.
    #[must_use]
    pub fn from_header_or_new(header_value: Option<&str>) -> Self {
        header_value
            .and_then(|s| s.trim().parse::<RequestId>().ok())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn ulid(&self) -> ulid::Ulid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s).map(RequestId)
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<RequestId>()
            .map_err(|_| serde::de::Error::custom("invalid request id"))
    }
}

/// Tags every request with a [`RequestId`].
///
/// The id is stored under the `requestId` attribute and echoed in the
/// `x-request-id` response header. A well-formed inbound `x-request-id` is
/// propagated instead of minting a new one.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestIdMiddleware;

impl Middleware for RequestIdMiddleware {
    fn process(&self, request: Request, next: &dyn Handler) -> Result<Response, DispatchError> {
        let id = RequestId::from_header_or_new(request.header(REQUEST_ID_HEADER));
        let request = request.with_attribute(REQUEST_ID_ATTR, id.to_string());
        next.handle(request)
            .map(|response| response.with_header_replaced(REQUEST_ID_HEADER, id.to_string()))
    }

    fn name(&self) -> &'static str {
        "request_id"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::handler_fn;

    #[test]
    fn test_invalid_header_mints_new_id() {
        let id = RequestId::from_header_or_new(Some("not-a-ulid"));
        assert_eq!(id.to_string().len(), 26);
    }

    #[test]
    fn test_inbound_id_is_propagated() {
        let inbound = RequestId::new().to_string();
        let seen = inbound.clone();
        let target = handler_fn(move |req| {
            assert_eq!(req.attribute(REQUEST_ID_ATTR), Some(&serde_json::json!(seen)));
            Ok(Response::ok())
        });
        let req = Request::builder()
            .header("X-Request-Id", inbound.as_str())
            .build()
            .unwrap();
        let resp = RequestIdMiddleware.process(req, target.as_ref()).unwrap();
        assert_eq!(resp.header(REQUEST_ID_HEADER), Some(inbound.as_str()));
    }
}
