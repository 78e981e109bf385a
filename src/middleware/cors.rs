use http::Method;

use super::{Handler, Middleware};
use crate::recovery::DispatchError;
use crate::server::{Request, Response};

/// CORS (Cross-Origin Resource Sharing) middleware.
///
/// Answers preflight requests (`OPTIONS` carrying
/// `Access-Control-Request-Method`) itself with `204` and the CORS headers;
/// the endpoint is never invoked for them. Every other response, plain
/// `OPTIONS` included, gets the same headers added after the endpoint ran.
///
/// With `*` among the allowed origins, `Access-Control-Allow-Origin: *` is
/// sent. Otherwise the request's `Origin` is echoed back only when it is in
/// the allow-list, together with `Vary: Origin`.
#[derive(Debug, Clone)]
pub struct CorsMiddleware {
    allowed_origins: Vec<String>,
    allowed_headers: Vec<String>,
    allowed_methods: Vec<Method>,
}

impl CorsMiddleware {
    #[must_use]
    pub fn new(
        allowed_origins: Vec<String>,
        allowed_headers: Vec<String>,
        allowed_methods: Vec<Method>,
    ) -> Self {
        Self {
            allowed_origins,
            allowed_headers,
            allowed_methods,
        }
    }

    fn allow_origin(&self, origin: Option<&str>) -> Option<String> {
        if self.allowed_origins.iter().any(|o| o == "*") {
            return Some("*".to_string());
        }
        let origin = origin?;
        self.allowed_origins
            .iter()
            .any(|o| o.eq_ignore_ascii_case(origin))
            .then(|| origin.to_string())
    }

    fn decorate(&self, response: Response, origin: Option<&str>) -> Response {
        let methods = self
            .allowed_methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let response = response
            .with_header_replaced("Access-Control-Allow-Headers", self.allowed_headers.join(", "))
            .with_header_replaced("Access-Control-Allow-Methods", methods);
        match self.allow_origin(origin) {
            Some(allowed) if allowed == "*" => {
                response.with_header_replaced("Access-Control-Allow-Origin", allowed)
            }
            Some(allowed) => response
                .with_header_replaced("Access-Control-Allow-Origin", allowed)
                .with_header("Vary", "Origin"),
            None => response,
        }
    }
}

/// Permissive policy: any origin, `Content-Type`/`Authorization` headers and
/// the common methods.
impl Default for CorsMiddleware {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".into()],
            allowed_headers: vec!["Content-Type".into(), "Authorization".into()],
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ],
        }
    }
}

impl Middleware for CorsMiddleware {
    fn process(&self, request: Request, next: &dyn Handler) -> Result<Response, DispatchError> {
        let origin = request.header("origin").map(str::to_string);
        let preflight = *request.head().method() == Method::OPTIONS
            && request.header("access-control-request-method").is_some();
        if preflight {
            return Ok(self.decorate(Response::new(204), origin.as_deref()));
        }
        next.handle(request)
            .map(|response| self.decorate(response, origin.as_deref()))
    }

    fn name(&self) -> &'static str {
        "cors"
    }
}
