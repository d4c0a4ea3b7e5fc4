//! # Router Module
//!
//! Maps a request's method and target onto one of a closed set of handlers.
//!
//! ## Overview
//!
//! The route table is a short ordered list built once at startup. Each row is
//! either an exact path or a path prefix, optionally restricted to one method.
//! Rows are tried top to bottom and the first match wins; a request that
//! matches nothing is routed to [`Handler::NotFound`], so routing never fails.
//!
//! | Method | Pattern          | Handler     |
//! |--------|------------------|-------------|
//! | any    | `/` (exact)      | `Root`      |
//! | GET    | `/files/` prefix | `FileGet`   |
//! | POST   | `/files/` prefix | `FilePost`  |
//! | any    | `/echo/` prefix  | `Echo`      |
//! | any    | `/user-agent`    | `UserAgent` |
//!
//! Prefix rows capture the rest of the path verbatim, further slashes
//! included. Nothing is percent-decoded or normalised.
//!
//! ## Example
//!
//! ```rust
//! use minihttpd::router::{Handler, Router};
//!
//! let router = Router::new();
//! let m = router.route("GET", b"/echo/abc");
//! assert_eq!(m.handler, Handler::Echo);
//! assert_eq!(m.capture, b"abc");
//! ```

mod core;

pub use core::{Handler, Pattern, Route, RouteMatch, Router};
