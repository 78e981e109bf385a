use serde_json::json;
use tracing::debug;

use super::{Handler, Middleware};
use crate::recovery::DispatchError;
use crate::server::{Request, Response};

/// Static token check on the `Authorization` header.
///
/// Accepts the bare token or `Bearer <token>`. Anything else is answered with
/// `401` and `{"error":"Unauthorized"}` without reaching the endpoint.
#[derive(Debug, Clone)]
pub struct AuthMiddleware {
    token: String,
}

impl AuthMiddleware {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    fn accepts(&self, header: &str) -> bool {
        let presented = header.strip_prefix("Bearer ").unwrap_or(header).trim();
        presented == self.token
    }
}

impl Middleware for AuthMiddleware {
    fn process(&self, request: Request, next: &dyn Handler) -> Result<Response, DispatchError> {
        let authorized = request
            .header("authorization")
            .is_some_and(|h| self.accepts(h));
        if authorized {
            return next.handle(request);
        }
        debug!(path = %request.path(), "Rejected unauthenticated request");
        Ok(Response::json(401, &json!({ "error": "Unauthorized" }))?)
    }

    fn name(&self) -> &'static str {
        "auth"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::handler_fn;

    #[test]
    fn test_bearer_and_bare_tokens() {
        let auth = AuthMiddleware::new("s3cret");
        let target = handler_fn(|_| Ok(Response::ok()));
        for value in ["s3cret", "Bearer s3cret"] {
            let req = Request::builder()
                .header("Authorization", value)
                .build()
                .unwrap();
            assert_eq!(auth.process(req, target.as_ref()).unwrap().status(), 200);
        }
        let req = Request::get("/").unwrap();
        assert_eq!(auth.process(req, target.as_ref()).unwrap().status(), 401);
    }
}
