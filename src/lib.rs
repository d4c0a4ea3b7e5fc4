//! # minihttpd
//!
//! A minimal HTTP/1.1 server that parses requests by hand, routes them to a
//! small fixed set of behaviours and writes hand-formatted responses.
//!
//! ## Overview
//!
//! Each accepted TCP connection is handed to its own `may` coroutine, which
//! serves exactly one request and closes the socket:
//!
//! ```text
//! bytes → request line → headers (+ body) → route → handler → response bytes
//! ```
//!
//! | Method | Path             | Behaviour                                       |
//! |--------|------------------|-------------------------------------------------|
//! | GET    | `/`              | empty `200`                                     |
//! | GET    | `/echo/<text>`   | `200 text/plain`, body is `<text>`              |
//! | GET    | `/user-agent`    | `200 text/plain`, body is the `User-Agent`      |
//! | GET    | `/files/<name>`  | `200 application/octet-stream`, or `404`        |
//! | POST   | `/files/<name>`  | stores the body, `201`                          |
//! | other  |                  | `404`                                           |
//!
//! ## Architecture
//!
//! - **[`server::request`]** - request line parser, header reader, body reader
//! - **[`router`]** - ordered first-match-wins route table
//! - **[`handlers`]** - one function per route
//! - **[`server::response`]** - response serialization
//! - **[`server::connection`]** - per-connection state machine
//! - **[`server::http_server`]** - listener and coroutine-per-connection dispatch
//! - **[`static_files`]** - the flat file store behind `/files/`
//!
//! ## Error Handling
//!
//! Malformed requests close the connection without a response. Routing
//! misses and missing files are ordinary `404`s. Any other filesystem or
//! socket error is logged by the worker and ends only that connection.
//!
//! ## Quick Start
//!
//! ```no_run
//! use minihttpd::server::{HttpServer, ServerConfig};
//!
//! let handle = HttpServer::new(ServerConfig::new("/tmp"))
//!     .start("0.0.0.0:4221")
//!     .expect("bind");
//! handle.join().expect("listener");
//! ```
//!
//! ## Runtime Considerations
//!
//! Connection handlers run in `may` coroutines, not tokio tasks. Socket I/O
//! inside a coroutine yields to the scheduler instead of blocking an OS
//! thread. Coroutine stack size comes from `MINIHTTPD_STACK_SIZE`.

pub mod cli;
pub mod handlers;
pub mod ids;
pub mod otel;
pub mod router;
pub mod runtime_config;
pub mod server;
pub mod static_files;

pub use router::{Handler, Router};
pub use server::{HttpServer, ServerConfig, ServerHandle};
pub use static_files::FileStore;
