use criterion::{criterion_group, criterion_main, Criterion};
use minihttpd::router::Router;
use minihttpd::server::read_request;
use std::hint::black_box;

const ECHO: &[u8] = b"GET /echo/hello HTTP/1.1\r\nHost: localhost:4221\r\nUser-Agent: curl/8.4.0\r\nAccept: */*\r\n\r\n";
const UPLOAD: &[u8] = b"POST /files/report.bin HTTP/1.1\r\nHost: localhost:4221\r\nContent-Length: 16\r\n\r\n0123456789abcdef";

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_echo_request", |b| {
        b.iter(|| {
            let mut raw = black_box(ECHO);
            read_request(&mut raw)
        })
    });
    c.bench_function("parse_upload_request", |b| {
        b.iter(|| {
            let mut raw = black_box(UPLOAD);
            read_request(&mut raw)
        })
    });
}

fn bench_route(c: &mut Criterion) {
    let router = Router::new();
    c.bench_function("route_lookup", |b| {
        b.iter(|| {
            router.route(black_box("POST"), black_box(b"/files/report.bin".as_slice()));
            router.route(black_box("GET"), black_box(b"/does/not/exist".as_slice()))
        })
    });
}

criterion_group!(benches, bench_parse, bench_route);
criterion_main!(benches);
