//! # Server Module
//!
//! Wire-level request handling and the connection accept loop.
//!
//! - [`request`] - request line, header block and body parsing
//! - [`response`] - status line and header serialization
//! - [`connection`] - one connection from accept to close
//! - [`http_server`] - listener, per-connection coroutines and [`ServerHandle`]

pub mod connection;
pub mod http_server;
pub mod request;
pub mod response;

pub use connection::{handle_connection, ConnectionError, ConnectionState};
pub use http_server::{HttpServer, ServerConfig, ServerHandle};
pub use request::{read_request, Headers, ParseError, Request, RequestLine};
pub use response::Response;
