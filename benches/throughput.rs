use std::hint::black_box;
use std::io::Cursor;

use brrtdispatch::middleware::handler_fn;
use brrtdispatch::registry::EndpointRegistry;
use brrtdispatch::server::{Body, Headers, RecordingSink, Response, ResponseEmitter};
use criterion::{criterion_group, criterion_main, Criterion};
use http::Version;

fn example_registry() -> EndpointRegistry {
    let mut registry = EndpointRegistry::new();
    for path in [
        "/zoo/animals",
        "/zoo/health",
        "/inventory",
        "/forum",
        "/forum/admin",
        "/complex/a/b/c/d/e/f/g/h/i",
        "/",
    ] {
        registry.register(path, handler_fn(|_req| Ok(Response::ok())));
    }
    registry
}

fn bench_resolve(c: &mut Criterion) {
    let registry = example_registry();
    c.bench_function("resolve_prefix", |b| {
        let test_paths = [
            "/zoo/animals",
            "/zoo/animals/123/toys/456",
            "/Forum/Thread/1",
            "/complex/a/b/c/d/e/f/g/h/i/j",
            "/does/not/exist",
        ];
        b.iter(|| {
            for path in test_paths.iter() {
                let res = registry.resolve(path);
                black_box(&res);
            }
        })
    });
}

fn bench_emit(c: &mut Criterion) {
    let emitter = ResponseEmitter::default();
    let defaults: Headers = [("X-Frame-Options", "DENY"), ("Cache-Control", "no-store")]
        .into_iter()
        .collect();
    let payload = vec![b'x'; 64 * 1024];

    c.bench_function("emit_seekable_64k", |b| {
        b.iter(|| {
            let response = Response::ok()
                .with_header("Content-Type", "application/octet-stream")
                .with_body(Body::seekable(Cursor::new(payload.clone())));
            let mut sink = RecordingSink::new();
            emitter
                .dispatch(response, Version::HTTP_11, &defaults, &mut sink)
                .unwrap();
            black_box(sink.events().len());
        })
    });
}

criterion_group!(benches, bench_resolve, bench_emit);
criterion_main!(benches);
