use std::fs;

use brrtdispatch::config::DispatcherConfig;
use brrtdispatch::dispatcher::Dispatcher;
use brrtdispatch::recovery::BootError;
use brrtdispatch::registry::Catalog;
use brrtdispatch::server::{RecordingSink, Request};
use indexmap::IndexMap;
use serde_json::Value;

mod common;

use common::dispatch::{get, get_json, record};
use common::temp_files;

const FORUM_YAML: &str = r#"
basePath: /
endpoints:
  /forum/admin: notFound
  /forum: echo
  /metrics: metrics
middlewares: [tracing, requestId, metrics]
headers:
  X-Frame-Options: DENY
  Cache-Control: no-store
router:
  class: echo
"#;

#[test]
fn test_yaml_load_keeps_document_order() {
    let file = temp_files::yaml(FORUM_YAML);
    let config = DispatcherConfig::load(file.path()).unwrap();
    let endpoints: Vec<_> = config.endpoints.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(endpoints, vec!["/forum/admin", "/forum", "/metrics"]);
    assert_eq!(config.middlewares, vec!["tracing", "requestId", "metrics"]);
    let headers: Vec<_> = config.default_headers().pairs().map(|(n, _)| n.to_string()).collect();
    assert_eq!(headers, vec!["X-Frame-Options", "Cache-Control"]);
    assert_eq!(config.router.class.as_deref(), Some("echo"));
    assert!(!config.expose_errors);
}

#[test]
fn test_json_load() {
    let file = temp_files::json(
        r#"{
            "basePath": "/api",
            "endpoints": { "/api/echo": "echo" },
            "httpErrors": { "404": "404.html" },
            "exposeErrors": true,
            "blockSize": 4096
        }"#,
    );
    let config = DispatcherConfig::load(file.path()).unwrap();
    assert_eq!(config.base_path, "/api");
    assert_eq!(config.http_errors.get(&404).map(String::as_str), Some("404.html"));
    assert!(config.expose_errors);
    assert_eq!(config.block_size, 4096);
}

#[test]
fn test_missing_file_is_error() {
    let err = DispatcherConfig::load("/definitely/not/here.yaml").unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));
}

#[test]
fn test_invalid_yaml_is_error() {
    let file = temp_files::yaml("endpoints: [not, a, map");
    let err = DispatcherConfig::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("invalid config file"));
}

#[test]
fn test_relative_templates_dir_resolves_against_config() {
    let dir = temp_files::dir(&[
        ("app.yaml", "templates: views\nhttpErrors:\n  404: missing.html\n"),
        ("views/missing.html", "<h1>{{ status }}: {{ message }}</h1>"),
    ]);
    let config = DispatcherConfig::load(dir.path().join("app.yaml")).unwrap();
    assert_eq!(config.templates.as_deref(), Some(dir.path().join("views").as_path()));

    let dispatcher = Dispatcher::from_config(&config, &Catalog::with_builtins()).unwrap();
    let sink = record(&dispatcher, get("/nowhere"));
    assert_eq!(sink.status(), Some(404));
    let page = sink.body_string();
    assert!(page.starts_with("<h1>404: No route found for "));
    assert!(page.contains("nowhere"));
    assert!(!page.contains('"'));
    assert_eq!(sink.headers().get("content-type"), Some("text/html; charset=utf-8"));
}

#[test]
fn test_missing_templates_dir_fails_boot() {
    let dir = temp_files::dir(&[("app.yaml", "templates: absent\n")]);
    let config = DispatcherConfig::load(dir.path().join("app.yaml")).unwrap();
    let err = Dispatcher::from_config(&config, &Catalog::with_builtins()).unwrap_err();
    assert!(matches!(err, BootError::Templates(_)));
}

#[test]
fn test_from_config_wires_catalog() {
    let file = temp_files::yaml(FORUM_YAML);
    let config = DispatcherConfig::load(file.path()).unwrap();
    let dispatcher = Dispatcher::from_config(&config, &Catalog::with_builtins()).unwrap();

    let sink = record(&dispatcher, get("/forum/thread/7?page=2"));
    assert_eq!(sink.status(), Some(200));
    let body: Value = serde_json::from_str(&sink.body_string()).unwrap();
    assert_eq!(body["activePath"], "/forum");
    assert_eq!(body["query"], "page=2");
    assert!(body["attributes"]["requestId"].is_string());

    let headers = sink.headers();
    assert_eq!(headers.get("x-frame-options"), Some("DENY"));
    assert!(headers.get("x-request-id").is_some());

    let admin = record(&dispatcher, get_json("/forum/admin/users"));
    assert_eq!(admin.status(), Some(404));

    // The echo router class serves everything else.
    let fallback = record(&dispatcher, get("/about"));
    assert_eq!(fallback.status(), Some(200));
    let body: Value = serde_json::from_str(&fallback.body_string()).unwrap();
    assert_eq!(body["activePath"], "/");

    let metrics = record(&dispatcher, get("/metrics"));
    let snapshot: Value = serde_json::from_str(&metrics.body_string()).unwrap();
    // Counted on entry, so the metrics request itself is included.
    assert_eq!(snapshot["requestCount"], 4);
    assert_eq!(snapshot["errorCount"], 1);
}

#[test]
fn test_unknown_names_fail_boot() {
    let config = DispatcherConfig::from_yaml("endpoints:\n  /x: nope\n").unwrap();
    assert!(matches!(
        Dispatcher::from_config(&config, &Catalog::with_builtins()),
        Err(BootError::UnknownHandler(name)) if name == "nope"
    ));

    let config = DispatcherConfig::from_yaml("router:\n  class: symfony\n").unwrap();
    assert!(matches!(
        Dispatcher::from_config(&config, &Catalog::with_builtins()),
        Err(BootError::UnknownRouter(_))
    ));
}

#[test]
fn test_block_size_reaches_emitter() {
    let dir = temp_files::dir(&[("big.txt", "abcdefghij")]);
    let config = DispatcherConfig {
        block_size: 4,
        ..DispatcherConfig::default()
    };
    let path = dir.path().join("big.txt");
    let catalog = Catalog::new().with_handler(
        "file",
        brrtdispatch::middleware::handler_fn(move |_req| {
            let file = fs::File::open(&path).map_err(brrtdispatch::DispatchError::internal)?;
            Ok(brrtdispatch::Response::ok().with_body(brrtdispatch::server::Body::seekable(file)))
        }),
    );
    let config = DispatcherConfig {
        endpoints: IndexMap::from([("/".to_string(), "file".to_string())]),
        ..config
    };
    let dispatcher = Dispatcher::from_config(&config, &catalog).unwrap();
    let mut sink = RecordingSink::new();
    dispatcher.dispatch(Request::get("/").unwrap(), &mut sink).unwrap();
    assert_eq!(sink.chunks(), vec![&b"abcd"[..], b"efgh", b"ij"]);
}
