use bytes::Bytes;
use chainrouter::dispatcher::Engine;
use chainrouter::middleware::{handler, logger, recovery};
use chainrouter::router::RouteTable;
use criterion::{criterion_group, criterion_main, Criterion};
use http::{Method, Request, StatusCode};
use std::hint::black_box;

const ROUTES: &[(&str, &str)] = &[
    ("GET", "/"),
    ("GET", "/zoo/animals"),
    ("POST", "/zoo/animals"),
    ("GET", "/zoo/animals/:id"),
    ("PUT", "/zoo/animals/:id"),
    ("PATCH", "/zoo/animals/:id"),
    ("DELETE", "/zoo/animals/:id"),
    ("GET", "/zoo/animals/:id/toys/:toy_id"),
    ("GET", "/zoo/:category/animals/:id/habitats/:habitat_id/sections/:section_id"),
    ("POST", "/inventory/:warehouse_id/feeds/:feed_id/items/:item_id/batches/:batch_id"),
    ("GET", "/complex/:a/:b/:c/:d/:e/:f/:g/:h/:i"),
    ("GET", "/static/*filepath"),
    ("HEAD", "/zoo/health"),
    ("OPTIONS", "/zoo/health"),
];

const PATHS: &[(Method, &str)] = &[
    (Method::GET, "/zoo/animals/123"),
    (Method::GET, "/zoo/animals/123/toys/456"),
    (Method::GET, "/zoo/cats/animals/123/habitats/88/sections/5"),
    (Method::POST, "/inventory/1/feeds/2/items/3/batches/4"),
    (Method::GET, "/complex/1/2/3/4/5/6/7/8/9"),
    (Method::GET, "/static/css/site/main.css"),
];

fn bench_route_match(c: &mut Criterion) {
    let mut table = RouteTable::new();
    for (method, pattern) in ROUTES {
        if let Err(e) = table.register(method, pattern, ()) {
            panic!("bench route {pattern} rejected: {e}");
        }
    }
    c.bench_function("route_match", |b| {
        b.iter(|| {
            for (method, path) in PATHS {
                black_box(table.resolve(method, path));
            }
        })
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let mut engine = Engine::new();
    engine.use_at("", [logger(), recovery()]);
    for (method, pattern) in ROUTES {
        let registered = engine.register(method, pattern, [handler(|c| {
            let n = c.params().len();
            c.string(StatusCode::OK, format!("{n} params"));
        })]);
        if let Err(e) = registered {
            panic!("bench route {pattern} rejected: {e}");
        }
    }
    let dispatcher = engine.build();

    c.bench_function("dispatch_full_chain", |b| {
        b.iter(|| {
            for (method, path) in PATHS {
                let request = Request::builder()
                    .method(method.clone())
                    .uri(*path)
                    .body(Bytes::new());
                if let Ok(request) = request {
                    black_box(dispatcher.serve(request));
                }
            }
        })
    });
}

criterion_group!(benches, bench_route_match, bench_dispatch);
criterion_main!(benches);
