//! Built-in endpoint handlers.

use serde_json::json;

use crate::middleware::Handler;
use crate::recovery::DispatchError;
use crate::server::{Request, Response};

/// Echoes the request back as JSON: method, path, query, active path,
/// attributes, headers and the body as UTF-8 (lossy).
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoHandler;

impl Handler for EchoHandler {
    fn handle(&self, request: Request) -> Result<Response, DispatchError> {
        let (head, mut body) = request.into_parts();
        let bytes = body.read_all()?;
        let body = json!({
            "method": head.method().as_str(),
            "path": head.path(),
            "query": head.query(),
            "activePath": head.attribute(crate::server::ACTIVE_PATH_ATTR),
            "attributes": head.attributes(),
            "headers": head.headers(),
            "body": String::from_utf8_lossy(&bytes),
        });
        Ok(Response::json(200, &body)?)
    }
}

/// Default base-path endpoint when no router class is configured: every
/// request is a client-caused 404.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotFoundHandler;

impl Handler for NotFoundHandler {
    fn handle(&self, request: Request) -> Result<Response, DispatchError> {
        Err(DispatchError::client(
            404,
            format!("No route found for \"{} {}\"", request.head().method(), request.path()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_reports_body_and_active_path() {
        let req = Request::builder()
            .uri("/forum/echo?x=1")
            .body("ping")
            .build()
            .unwrap()
            .with_attribute("activePath", "/forum");
        let resp = EchoHandler.handle(req).unwrap();
        let (_, _, _, mut body) = resp.into_parts();
        let value: serde_json::Value = serde_json::from_slice(&body.read_all().unwrap()).unwrap();
        assert_eq!(value["body"], "ping");
        assert_eq!(value["activePath"], "/forum");
        assert_eq!(value["query"], "x=1");
    }

    #[test]
    fn test_not_found_is_client_404() {
        let err = NotFoundHandler.handle(Request::get("/nope").unwrap()).unwrap_err();
        assert_eq!(err.client_status(), Some(404));
    }
}
