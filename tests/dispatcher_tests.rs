use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use brrtdispatch::config::DispatcherConfig;
use brrtdispatch::dispatcher::Dispatcher;
use brrtdispatch::middleware::{handler_fn, middleware_fn, Pipeline};
use brrtdispatch::recovery::{BootError, DispatchError, ErrorRecovery};
use brrtdispatch::registry::{router_fn, EndpointRegistry};
use brrtdispatch::server::{RecordingSink, Request, Response, ResponseEmitter};
use indexmap::IndexMap;
use serde_json::{json, Value};
use tracing::Level;

mod common;

use common::dispatch::{dispatcher, get, get_json, record};
use tracing_util::TestTracing;

fn active_path_echo() -> Arc<dyn brrtdispatch::Handler> {
    handler_fn(|req| {
        let active = req.active_path().unwrap_or("-").to_string();
        Ok(Response::ok().with_body(active))
    })
}

#[test]
fn test_active_path_attribute() {
    let d = dispatcher(vec![("/forum", active_path_echo())], vec![], ErrorRecovery::default());
    let sink = record(&d, get("/Forum/Thread/1"));
    assert_eq!(sink.status(), Some(200));
    assert_eq!(sink.body_string(), "/forum");
}

#[test]
fn test_active_path_visible_to_middleware() {
    let seen = middleware_fn(|req, next| {
        let active = req.active_path().map(str::to_string);
        next.handle(req).map(|r| r.with_header("X-Active", active.unwrap_or_default()))
    });
    let d = dispatcher(vec![("/forum", active_path_echo())], vec![seen], ErrorRecovery::default());
    let sink = record(&d, get("/forum/x"));
    assert_eq!(sink.headers().get("x-active"), Some("/forum"));
}

#[test]
fn test_fallback_answers_404_by_default() {
    let d = dispatcher(vec![("/forum", active_path_echo())], vec![], ErrorRecovery::default());
    let sink = record(&d, get_json("/about"));
    assert_eq!(sink.status(), Some(404));
    let body: Value = serde_json::from_str(&sink.body_string()).unwrap();
    assert_eq!(body, json!({ "status": 404 }));
}

#[test]
fn test_fallback_registered_once_at_base_path() {
    let config = DispatcherConfig {
        base_path: "/App".to_string(),
        ..DispatcherConfig::default()
    };
    let built = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&built);
    let d = Dispatcher::new(
        &config,
        EndpointRegistry::new(),
        Pipeline::default(),
        ResponseEmitter::default(),
        ErrorRecovery::default(),
    )
    .with_router_factory(router_fn(move |_settings| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(handler_fn(|_req| Ok(Response::new(203))))
    }));
    d.start().unwrap();
    d.start().unwrap();
    assert_eq!(record(&d, get("/app/page")).status(), Some(203));
    assert_eq!(built.load(Ordering::SeqCst), 1);
    assert_eq!(d.registry().paths().collect::<Vec<_>>(), vec!["/app"]);
}

#[test]
fn test_unresolvable_path_is_client_500() {
    let config = DispatcherConfig {
        base_path: "/app".to_string(),
        ..DispatcherConfig::default()
    };
    let d = Dispatcher::new(
        &config,
        EndpointRegistry::new(),
        Pipeline::default(),
        ResponseEmitter::default(),
        ErrorRecovery::default(),
    );
    let tracing = TestTracing::init();
    let sink = record(&d, get_json("/elsewhere"));
    assert_eq!(sink.status(), Some(500));
    let body: Value = serde_json::from_str(&sink.body_string()).unwrap();
    assert_eq!(body, json!({ "status": 500 }));
    let warning = tracing.find("Client error during dispatch").unwrap();
    assert_eq!(warning.level, Level::WARN);
    assert_eq!(warning.field("error_message"), Some("Unable to select endpoint"));
}

#[test]
fn test_add_after_start_is_rejected() {
    let d = dispatcher(vec![], vec![], ErrorRecovery::default());
    d.add("/forum", active_path_echo()).unwrap();
    d.start().unwrap();
    let err = d.add("/late", active_path_echo()).unwrap_err();
    assert!(matches!(err, BootError::Frozen { ref path } if path == "/late"));
    assert!(!d.registry().contains("/late"));
}

#[test]
fn test_dispatch_starts_implicitly() {
    let d = dispatcher(vec![], vec![], ErrorRecovery::default());
    assert!(!d.is_started());
    record(&d, get("/"));
    assert!(d.is_started());
    assert!(matches!(d.add("/x", active_path_echo()), Err(BootError::Frozen { .. })));
}

#[test]
fn test_handler_panic_becomes_500() {
    let boom = handler_fn(|_req| -> Result<Response, DispatchError> { panic!("kaboom") });
    let d = dispatcher(vec![("/boom", boom)], vec![], ErrorRecovery::new(false));
    let tracing = TestTracing::init();
    let sink = record(&d, get("/boom"));
    assert_eq!(sink.status(), Some(500));
    assert!(sink.body().is_empty());
    let panic_log = tracing.find("Handler panicked").unwrap();
    assert_eq!(panic_log.field("panic_message"), Some("kaboom"));
}

#[test]
fn test_exposed_panic_details() {
    let boom = handler_fn(|_req| -> Result<Response, DispatchError> { panic!("kaboom") });
    let d = dispatcher(vec![("/boom", boom)], vec![], ErrorRecovery::new(true));
    let sink = record(&d, get_json("/boom"));
    let body: Value = serde_json::from_str(&sink.body_string()).unwrap();
    assert_eq!(body["status"], 500);
    assert_eq!(body["error"]["message"], "handler panicked: kaboom");
    assert_eq!(body["request"]["attributes"]["activePath"], "/boom");
}

#[test]
fn test_failing_router_factory_recovers_as_internal() {
    let d = dispatcher(vec![], vec![], ErrorRecovery::new(false))
        .with_router_factory(router_fn(|_| Err(anyhow::anyhow!("no routes"))));
    assert!(matches!(d.start(), Err(BootError::Router(_))));
    let sink = record(&d, get("/"));
    assert_eq!(sink.status(), Some(500));
    assert!(!d.is_started());
}

#[test]
fn test_default_headers_applied_and_overridden() {
    let config = DispatcherConfig {
        headers: IndexMap::from([
            ("X-Frame-Options".to_string(), "DENY".to_string()),
            ("Cache-Control".to_string(), "no-store".to_string()),
        ]),
        ..DispatcherConfig::default()
    };
    let d = Dispatcher::new(
        &config,
        EndpointRegistry::new().with(
            "/",
            handler_fn(|_req| Ok(Response::ok().with_header("Cache-Control", "max-age=60"))),
        ),
        Pipeline::default(),
        ResponseEmitter::default(),
        ErrorRecovery::default(),
    );
    let headers = record(&d, get("/")).headers();
    assert_eq!(headers.get("cache-control"), Some("max-age=60"));
    assert_eq!(headers.get("x-frame-options"), Some("DENY"));
}

#[test]
fn test_default_headers_on_error_responses() {
    let config = DispatcherConfig {
        headers: IndexMap::from([("X-Frame-Options".to_string(), "DENY".to_string())]),
        ..DispatcherConfig::default()
    };
    let d = Dispatcher::new(
        &config,
        EndpointRegistry::new(),
        Pipeline::default(),
        ResponseEmitter::default(),
        ErrorRecovery::default(),
    );
    let sink = record(&d, get("/missing"));
    assert_eq!(sink.status(), Some(404));
    assert_eq!(sink.headers().get("x-frame-options"), Some("DENY"));
}

#[test]
fn test_http10_request_gets_http10_status_line() {
    let d = dispatcher(
        vec![("/", handler_fn(|_req| Ok(Response::ok())))],
        vec![],
        ErrorRecovery::default(),
    );
    let req = Request::builder().version(http::Version::HTTP_10).build().unwrap();
    let mut sink = RecordingSink::new();
    d.dispatch(req, &mut sink).unwrap();
    assert_eq!(sink.status_line().as_deref(), Some("HTTP/1.0 200 OK"));
}

#[test]
fn test_middleware_failure_is_recovered() {
    let deny = middleware_fn(|_req, _next| Err(DispatchError::forbidden()));
    let d = dispatcher(
        vec![("/", handler_fn(|_req| Ok(Response::ok())))],
        vec![deny],
        ErrorRecovery::default(),
    );
    let sink = record(&d, get_json("/"));
    assert_eq!(sink.status(), Some(403));
    assert_eq!(sink.body_string(), r#"{"status":403}"#);
}

#[test]
fn test_dispatcher_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Dispatcher>();
}
