//! Per-connection lifecycle.
//!
//! `Accepted → ParsingRequestLine → ReadingHeaders → [ReadingBody] →
//! Dispatching → WritingResponse → Closed`
//!
//! The stream is moved into [`handle_connection`] and dropped when it
//! returns, which is the one and only place the connection is closed. Any
//! error jumps straight to that exit; nothing is retried.

use super::request::{read_request, ParseError};
use crate::handlers;
use crate::ids::ConnectionId;
use crate::router::Router;
use crate::static_files::FileStore;
use std::fmt;
use std::io::{self, BufReader, Read, Write};
use std::time::Instant;
use tracing::info;

/// Stage of the lifecycle a connection failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    ParsingRequestLine,
    ReadingHeaders,
    ReadingBody,
    Dispatching,
    WritingResponse,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::ParsingRequestLine => "parsing_request_line",
            ConnectionState::ReadingHeaders => "reading_headers",
            ConnectionState::ReadingBody => "reading_body",
            ConnectionState::Dispatching => "dispatching",
            ConnectionState::WritingResponse => "writing_response",
        };
        f.write_str(s)
    }
}

/// Failure that ended a connection.
#[derive(Debug)]
pub enum ConnectionError {
    /// The request could not be parsed; no response was written
    Parse(ParseError),
    /// A filesystem error other than "not found" inside a file handler
    FileStore(io::Error),
    /// The response could not be written back
    Write(io::Error),
}

impl ConnectionError {
    /// `true` for malformed or truncated requests, `false` for hard I/O errors.
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, ConnectionError::Parse(_))
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        match self {
            ConnectionError::Parse(
                ParseError::EmptyRequestLine
                | ParseError::MalformedRequestLine { .. }
                | ParseError::RequestLineRead(_),
            ) => ConnectionState::ParsingRequestLine,
            ConnectionError::Parse(
                ParseError::HeaderRead(_) | ParseError::InvalidContentLength { .. },
            ) => ConnectionState::ReadingHeaders,
            ConnectionError::Parse(ParseError::BodyRead(_)) => ConnectionState::ReadingBody,
            ConnectionError::FileStore(_) => ConnectionState::Dispatching,
            ConnectionError::Write(_) => ConnectionState::WritingResponse,
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::Parse(e) => write!(f, "{e}"),
            ConnectionError::FileStore(e) => write!(f, "file store error: {e}"),
            ConnectionError::Write(e) => write!(f, "failed to write response: {e}"),
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConnectionError::Parse(e) => Some(e),
            ConnectionError::FileStore(e) | ConnectionError::Write(e) => Some(e),
        }
    }
}

impl From<ParseError> for ConnectionError {
    fn from(e: ParseError) -> Self {
        ConnectionError::Parse(e)
    }
}

/// Serve exactly one request on `stream`, then close it.
///
/// # Errors
///
/// Parse failures return before anything is written. File store and write
/// failures are returned to the caller for logging; they affect only this
/// connection.
pub fn handle_connection<S: Read + Write>(
    stream: S,
    router: &Router,
    store: &FileStore,
    connection_id: ConnectionId,
) -> Result<(), ConnectionError> {
    let started = Instant::now();
    let mut reader = BufReader::new(stream);

    let request = read_request(&mut reader)?;
    let matched = router.route(&request.line.method, &request.line.target);
    let response =
        handlers::dispatch(&matched, &request, store).map_err(ConnectionError::FileStore)?;

    // Only one request is served per connection; anything buffered past the
    // body is discarded with the reader.
    let mut stream = reader.into_inner();
    response
        .write_to(&mut stream)
        .map_err(ConnectionError::Write)?;

    info!(
        connection_id = %connection_id,
        method = %request.line.method,
        target = %request.line.target_lossy(),
        handler = matched.handler.name(),
        status = response.status.as_u16(),
        body_size_bytes = response.body.len(),
        latency_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
        "Response written"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// In-memory duplex stream: reads from `input`, records writes.
    struct MockStream {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
        fail_writes: bool,
    }

    impl MockStream {
        fn new(input: &[u8]) -> Self {
            Self {
                input: Cursor::new(input.to_vec()),
                output: Vec::new(),
                fail_writes: false,
            }
        }
    }

    impl Read for MockStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for MockStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_writes {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"));
            }
            self.output.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn serve(store: &FileStore, raw: &[u8]) -> (Result<(), ConnectionError>, Vec<u8>) {
        let mut stream = MockStream::new(raw);
        let result = handle_connection(&mut stream, &Router::new(), store, ConnectionId::new());
        (result, stream.output)
    }

    fn temp_store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_echo_end_to_end() {
        let (_dir, store) = temp_store();
        let (result, out) = serve(&store, b"GET /echo/hello HTTP/1.1\r\nHost: x\r\n\r\n");
        result.unwrap();
        assert_eq!(
            out,
            b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\nhello"
        );
    }

    #[test]
    fn test_two_token_request_line_writes_nothing() {
        let (_dir, store) = temp_store();
        let (result, out) = serve(&store, b"GET /\r\n\r\n");
        let err = result.unwrap_err();
        assert!(err.is_protocol_error());
        assert_eq!(err.state(), ConnectionState::ParsingRequestLine);
        assert!(out.is_empty());
    }

    #[test]
    fn test_invalid_content_length_writes_nothing() {
        let (_dir, store) = temp_store();
        let (result, out) = serve(
            &store,
            b"POST /files/x HTTP/1.1\r\nContent-Length: lots\r\n\r\nabc",
        );
        assert_eq!(result.unwrap_err().state(), ConnectionState::ReadingHeaders);
        assert!(out.is_empty());
    }

    #[test]
    fn test_truncated_body_writes_nothing() {
        let (dir, store) = temp_store();
        let (result, out) = serve(
            &store,
            b"POST /files/x HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc",
        );
        assert_eq!(result.unwrap_err().state(), ConnectionState::ReadingBody);
        assert!(out.is_empty());
        assert!(!dir.path().join("x").exists());
    }

    #[test]
    fn test_post_then_get() {
        let (_dir, store) = temp_store();
        let (result, out) = serve(
            &store,
            b"POST /files/foo HTTP/1.1\r\nContent-Length: 4\r\n\r\nabcd",
        );
        result.unwrap();
        assert_eq!(out, b"HTTP/1.1 201 Created\r\n\r\n");

        let (result, out) = serve(&store, b"GET /files/foo HTTP/1.1\r\n\r\n");
        result.unwrap();
        assert_eq!(
            out,
            b"HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: 4\r\n\r\nabcd"
        );
    }

    #[test]
    fn test_zero_length_post() {
        let (dir, store) = temp_store();
        let (result, out) = serve(
            &store,
            b"POST /files/empty HTTP/1.1\r\nContent-Length: 0\r\n\r\n",
        );
        result.unwrap();
        assert_eq!(out, b"HTTP/1.1 201 Created\r\n\r\n");
        assert_eq!(std::fs::read(dir.path().join("empty")).unwrap(), b"");
    }

    #[test]
    fn test_file_store_error_is_hard_error() {
        let (_dir, store) = temp_store();
        let (result, out) = serve(
            &store,
            b"POST /files/missing/dir/f HTTP/1.1\r\nContent-Length: 1\r\n\r\nx",
        );
        let err = result.unwrap_err();
        assert!(!err.is_protocol_error());
        assert_eq!(err.state(), ConnectionState::Dispatching);
        assert!(out.is_empty());
    }

    #[test]
    fn test_write_failure_is_reported() {
        let (_dir, store) = temp_store();
        let mut stream = MockStream::new(b"GET / HTTP/1.1\r\n\r\n");
        stream.fail_writes = true;
        let err = handle_connection(&mut stream, &Router::new(), &store, ConnectionId::new())
            .unwrap_err();
        assert_eq!(err.state(), ConnectionState::WritingResponse);
    }

    #[test]
    fn test_non_utf8_bytes_reflected_exactly() {
        let (_dir, store) = temp_store();
        let (result, out) = serve(&store, b"GET /echo/\xff\xfe HTTP/1.1\r\n\r\n");
        result.unwrap();
        assert_eq!(
            out,
            b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 2\r\n\r\n\xff\xfe"
        );

        let (result, out) = serve(
            &store,
            b"GET /user-agent HTTP/1.1\r\nUser-Agent: a\xffb\r\n\r\n",
        );
        result.unwrap();
        assert!(out.ends_with(b"Content-Length: 3\r\n\r\na\xffb"));
    }

    #[test]
    fn test_root_response() {
        let (_dir, store) = temp_store();
        let (result, out) = serve(&store, b"GET / HTTP/1.1\r\n\r\n");
        result.unwrap();
        assert_eq!(out, b"HTTP/1.1 200 OK\r\n\r\n");
    }
}
