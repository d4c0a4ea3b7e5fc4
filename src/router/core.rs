//! Router core: a fixed, ordered route table evaluated first-match-wins.

use http::Method;
use tracing::{debug, info};

/// Handler a request is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handler {
    Root,
    Echo,
    UserAgent,
    FileGet,
    FilePost,
    NotFound,
}

impl Handler {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Handler::Root => "root",
            Handler::Echo => "echo",
            Handler::UserAgent => "user_agent",
            Handler::FileGet => "file_get",
            Handler::FilePost => "file_post",
            Handler::NotFound => "not_found",
        }
    }
}

/// Path shape of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Path must equal the string
    Exact(&'static str),
    /// Path must start with the string; the remainder is captured verbatim
    Prefix(&'static str),
}

impl Pattern {
    fn capture<'a>(self, path: &'a [u8]) -> Option<&'a [u8]> {
        match self {
            Pattern::Exact(p) => (path == p.as_bytes()).then_some(&[][..]),
            Pattern::Prefix(p) => path.strip_prefix(p.as_bytes()),
        }
    }
}

/// One row of the route table. `method: None` matches any method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: Option<Method>,
    pub pattern: Pattern,
    pub handler: Handler,
}

impl Route {
    fn matches<'a>(&self, method: &str, path: &'a [u8]) -> Option<&'a [u8]> {
        if let Some(m) = &self.method {
            if m.as_str() != method {
                return None;
            }
        }
        self.pattern.capture(path)
    }
}

/// Result of routing a request. Always present: misses resolve to
/// [`Handler::NotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub handler: Handler,
    /// Remainder of the path after a prefix pattern, as raw request bytes;
    /// empty for exact matches
    pub capture: &'a [u8],
}

/// Ordered, read-only route table.
#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<Route>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Build the server's route table.
    ///
    /// Order matters: `/` first, then the method-discriminated `/files/`
    /// routes, then `/echo/` and `/user-agent`.
    #[must_use]
    pub fn new() -> Self {
        let routes = vec![
            Route {
                method: None,
                pattern: Pattern::Exact("/"),
                handler: Handler::Root,
            },
            Route {
                method: Some(Method::GET),
                pattern: Pattern::Prefix("/files/"),
                handler: Handler::FileGet,
            },
            Route {
                method: Some(Method::POST),
                pattern: Pattern::Prefix("/files/"),
                handler: Handler::FilePost,
            },
            Route {
                method: None,
                pattern: Pattern::Prefix("/echo/"),
                handler: Handler::Echo,
            },
            Route {
                method: None,
                pattern: Pattern::Exact("/user-agent"),
                handler: Handler::UserAgent,
            },
        ];

        info!(
            routes_count = routes.len(),
            "Routing table loaded"
        );

        Self { routes }
    }

    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Resolve `method` + `path` to exactly one handler. Never fails.
    ///
    /// `path` is matched byte for byte; it need not be valid UTF-8.
    #[must_use]
    pub fn route<'a>(&self, method: &str, path: &'a [u8]) -> RouteMatch<'a> {
        let matched = self
            .routes
            .iter()
            .find_map(|r| {
                r.matches(method, path).map(|capture| RouteMatch {
                    handler: r.handler,
                    capture,
                })
            })
            .unwrap_or(RouteMatch {
                handler: Handler::NotFound,
                capture: &[],
            });

        debug!(
            method = %method,
            path = %String::from_utf8_lossy(path),
            handler = matched.handler.name(),
            "Route matched"
        );

        matched
    }
}
