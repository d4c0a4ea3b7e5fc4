//! Route handlers.
//!
//! Each handler turns a parsed request into a [`Response`]. Only the file
//! handlers can fail, and only on filesystem errors other than "not found".

use crate::router::{Handler, RouteMatch};
use crate::server::request::Request;
use crate::server::response::Response;
use crate::static_files::FileStore;
use http::StatusCode;
use std::io;

pub const TEXT_PLAIN: &str = "text/plain";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Run the handler selected by the router.
pub fn dispatch(route: &RouteMatch<'_>, request: &Request, store: &FileStore) -> io::Result<Response> {
    match route.handler {
        Handler::Root => Ok(root()),
        Handler::Echo => Ok(echo(route.capture)),
        Handler::UserAgent => Ok(user_agent(request)),
        Handler::FileGet => file_get(store, route.capture),
        Handler::FilePost => file_post(store, route.capture, &request.body),
        Handler::NotFound => Ok(not_found()),
    }
}

#[must_use]
pub fn root() -> Response {
    Response::empty(StatusCode::OK)
}

/// Reflect the captured path suffix byte for byte.
#[must_use]
pub fn echo(suffix: &[u8]) -> Response {
    Response::ok(TEXT_PLAIN, suffix.to_vec())
}

#[must_use]
pub fn user_agent(request: &Request) -> Response {
    Response::ok(TEXT_PLAIN, request.headers.user_agent().to_vec())
}

/// Serve a file from the store; a missing file is a plain 404.
pub fn file_get(store: &FileStore, name: &[u8]) -> io::Result<Response> {
    Ok(match store.read(name)? {
        Some(bytes) => Response::ok(OCTET_STREAM, bytes),
        None => not_found(),
    })
}

/// Store the request body under `name`, replacing any previous contents.
pub fn file_post(store: &FileStore, name: &[u8], body: &[u8]) -> io::Result<Response> {
    store.write(name, body)?;
    Ok(Response::created())
}

#[must_use]
pub fn not_found() -> Response {
    Response::not_found()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Router;
    use crate::server::request::{Headers, RequestLine};

    fn request(method: &str, target: &str, headers: &[(&str, &str)], body: &[u8]) -> Request {
        let mut h = Headers::new();
        for (k, v) in headers {
            h.insert(k, v.as_bytes());
        }
        Request {
            line: RequestLine {
                method: method.to_string(),
                target: target.as_bytes().to_vec(),
                version: "HTTP/1.1".to_string(),
            },
            headers: h,
            body: body.to_vec(),
        }
    }

    fn run(store: &FileStore, req: &Request) -> io::Result<Response> {
        let router = Router::new();
        let m = router.route(&req.line.method, &req.line.target);
        dispatch(&m, req, store)
    }

    #[test]
    fn test_root_is_empty_ok() {
        let res = root();
        assert_eq!(res.status, StatusCode::OK);
        assert!(res.headers.is_empty());
        assert!(res.body.is_empty());
    }

    #[test]
    fn test_echo_does_not_decode() {
        let res = echo(b"a%20b");
        assert_eq!(res.body, b"a%20b");
        assert_eq!(res.headers[0], ("Content-Type", TEXT_PLAIN.to_string()));
    }

    #[test]
    fn test_user_agent_reflected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let req = request("GET", "/user-agent", &[("User-Agent", "test-agent")], b"");
        let res = run(&store, &req).unwrap();
        assert_eq!(res.body, b"test-agent");
        assert_eq!(res.headers[1], ("Content-Length", "10".to_string()));
    }

    #[test]
    fn test_echo_keeps_invalid_utf8() {
        let res = echo(b"\xff\xfe");
        assert_eq!(res.body, b"\xff\xfe");
        assert_eq!(res.headers[1], ("Content-Length", "2".to_string()));
    }

    #[test]
    fn test_user_agent_absent_is_empty_body() {
        let req = request("GET", "/user-agent", &[], b"");
        let res = user_agent(&req);
        assert_eq!(res.status, StatusCode::OK);
        assert!(res.body.is_empty());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let post = request("POST", "/files/foo", &[("Content-Length", "3")], b"\x00\x01\x02");
        assert_eq!(run(&store, &post).unwrap().status, StatusCode::CREATED);

        let get = request("GET", "/files/foo", &[], b"");
        let res = run(&store, &get).unwrap();
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.headers[0], ("Content-Type", OCTET_STREAM.to_string()));
        assert_eq!(res.body, b"\x00\x01\x02");
    }

    #[test]
    fn test_file_get_missing_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let res = file_get(&store, b"never-created").unwrap();
        assert_eq!(res, Response::not_found());
    }

    #[test]
    fn test_file_get_directory_is_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let store = FileStore::new(dir.path());
        assert!(file_get(&store, b"sub").is_err());
    }

    #[test]
    fn test_file_post_failure_is_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(file_post(&store, b"no/such/dir/f", b"x").is_err());
    }

    #[test]
    fn test_unmatched_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let req = request("DELETE", "/files/foo", &[], b"");
        assert_eq!(run(&store, &req).unwrap().to_bytes(), b"HTTP/1.1 404 Not Found\r\n\r\n");
    }
}
