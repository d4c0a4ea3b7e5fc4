use std::collections::HashMap;
use std::fmt;
use std::io::{self, BufRead, Read};
use tracing::{debug, info};

/// First line of a request: `<METHOD> <TARGET> <VERSION>`.
///
/// The method and version are only ever compared, so they are held as text.
/// The target is echoed back to clients and keeps the exact wire bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// Method token, not validated here (the router decides what it means)
    pub method: String,
    /// Request target, kept verbatim (no decoding, no query splitting)
    pub target: Vec<u8>,
    /// Protocol version token
    pub version: String,
}

impl RequestLine {
    /// Split a request line on single spaces into exactly three tokens.
    ///
    /// # Errors
    ///
    /// - [`ParseError::EmptyRequestLine`] for the empty string
    /// - [`ParseError::MalformedRequestLine`] when the split does not yield three tokens
    pub fn parse(line: &[u8]) -> Result<Self, ParseError> {
        if line.is_empty() {
            return Err(ParseError::EmptyRequestLine);
        }

        let mut parts = line.split(|&b| b == b' ');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(method), Some(target), Some(version), None) => Ok(Self {
                method: String::from_utf8_lossy(method).into_owned(),
                target: target.to_vec(),
                version: String::from_utf8_lossy(version).into_owned(),
            }),
            _ => Err(ParseError::MalformedRequestLine {
                line: String::from_utf8_lossy(line).into_owned(),
            }),
        }
    }

    /// Target for log output; invalid UTF-8 is replaced, never echoed.
    #[must_use]
    pub fn target_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.target)
    }
}

/// Header block of a request.
///
/// Names are stored lowercased so lookups are case-insensitive. Values keep
/// their wire bytes. A repeated name keeps the last value seen on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    inner: HashMap<String, Vec<u8>>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: &[u8]) {
        self.inner
            .insert(name.to_ascii_lowercase(), value.to_vec());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.inner
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// `User-Agent` value, or empty when the client sent none.
    #[must_use]
    pub fn user_agent(&self) -> &[u8] {
        self.get("user-agent").unwrap_or_default()
    }

    /// Parsed `Content-Length`, `None` when the header is absent.
    ///
    /// # Errors
    ///
    /// [`ParseError::InvalidContentLength`] when the value is not a base-10
    /// non-negative integer.
    pub fn content_length(&self) -> Result<Option<usize>, ParseError> {
        match self.get("content-length") {
            None => Ok(None),
            Some(raw) => std::str::from_utf8(raw)
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .map(Some)
                .ok_or_else(|| ParseError::InvalidContentLength {
                    value: String::from_utf8_lossy(raw).into_owned(),
                }),
        }
    }
}

/// A fully read request. Built once per connection and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub line: RequestLine,
    pub headers: Headers,
    /// Exactly `Content-Length` bytes, or empty when the header was absent
    pub body: Vec<u8>,
}

/// Why a request could not be read off the wire.
///
/// Every variant ends the connection without a response.
#[derive(Debug)]
pub enum ParseError {
    /// The request line was empty, or the peer closed before sending one
    EmptyRequestLine,
    /// The request line did not split into exactly three tokens
    MalformedRequestLine { line: String },
    /// I/O failure while reading the request line
    RequestLineRead(io::Error),
    /// I/O failure, malformed line, or end of stream inside the header block
    HeaderRead(io::Error),
    /// `Content-Length` was present but not a non-negative integer
    InvalidContentLength { value: String },
    /// The body ended before `Content-Length` bytes arrived, or the read failed
    BodyRead(io::Error),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::EmptyRequestLine => write!(f, "empty request line"),
            ParseError::MalformedRequestLine { line } => {
                write!(f, "malformed request line '{line}'")
            }
            ParseError::RequestLineRead(e) => write!(f, "failed to read request line: {e}"),
            ParseError::HeaderRead(e) => write!(f, "failed to read headers: {e}"),
            ParseError::InvalidContentLength { value } => {
                write!(f, "invalid Content-Length '{value}'")
            }
            ParseError::BodyRead(e) => write!(f, "failed to read request body: {e}"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::RequestLineRead(e) | ParseError::HeaderRead(e) | ParseError::BodyRead(e) => {
                Some(e)
            }
            _ => None,
        }
    }
}

/// Read one line, stripping the trailing `\r\n` or `\n`.
///
/// Returns `Ok(None)` at end of stream.
fn read_line<R: BufRead>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(buf))
}

/// Read and parse the request line.
///
/// A peer that closes before sending anything is reported as
/// [`ParseError::EmptyRequestLine`].
pub fn read_request_line<R: BufRead>(reader: &mut R) -> Result<RequestLine, ParseError> {
    let line = read_line(reader)
        .map_err(ParseError::RequestLineRead)?
        .unwrap_or_default();
    RequestLine::parse(&line)
}

/// Read header lines up to the blank separator line.
pub fn read_headers<R: BufRead>(reader: &mut R) -> Result<Headers, ParseError> {
    let mut headers = Headers::new();
    loop {
        let line = read_line(reader)
            .map_err(ParseError::HeaderRead)?
            .ok_or_else(|| {
                ParseError::HeaderRead(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream ended before end of headers",
                ))
            })?;

        if line.is_empty() {
            return Ok(headers);
        }

        let colon = line.iter().position(|&b| b == b':').ok_or_else(|| {
            ParseError::HeaderRead(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("malformed header line '{}'", String::from_utf8_lossy(&line)),
            ))
        })?;
        let (name, value) = (&line[..colon], &line[colon + 1..]);
        headers.insert(
            &String::from_utf8_lossy(name.trim_ascii()),
            value.trim_ascii(),
        );
    }
}

/// Read exactly `len` body bytes.
pub fn read_body<R: Read>(reader: &mut R, len: usize) -> Result<Vec<u8>, ParseError> {
    // Grow with the data actually received rather than trusting the header up front.
    let mut body = Vec::new();
    reader
        .take(len as u64)
        .read_to_end(&mut body)
        .map_err(ParseError::BodyRead)?;
    if body.len() != len {
        return Err(ParseError::BodyRead(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {len} body bytes, got {}", body.len()),
        )));
    }
    Ok(body)
}

/// Read a whole request: request line, headers, then the body if
/// `Content-Length` was supplied.
pub fn read_request<R: BufRead>(reader: &mut R) -> Result<Request, ParseError> {
    let line = read_request_line(reader)?;
    let headers = read_headers(reader)?;

    debug!(
        header_count = headers.len(),
        "Headers extracted"
    );

    let body = match headers.content_length()? {
        Some(len) => read_body(reader, len)?,
        None => Vec::new(),
    };

    info!(
        method = %line.method,
        target = %line.target_lossy(),
        http_version = %line.version,
        headers_count = headers.len(),
        body_size_bytes = body.len(),
        "HTTP request parsed"
    );

    Ok(Request {
        line,
        headers,
        body,
    })
}
