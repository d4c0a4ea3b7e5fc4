use http::StatusCode;
use std::io::{self, Write};

/// Protocol version written on every status line.
pub const HTTP_VERSION: &str = "HTTP/1.1";

fn status_reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}

/// A response ready to be serialized onto the wire.
///
/// Headers are written in insertion order; nothing is added or reordered at
/// write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// Status line only, no headers, no body.
    #[must_use]
    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// `200 OK` carrying a typed body. `Content-Length` is the byte length.
    #[must_use]
    pub fn ok(content_type: &'static str, body: Vec<u8>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: vec![
                ("Content-Type", content_type.to_string()),
                ("Content-Length", body.len().to_string()),
            ],
            body,
        }
    }

    #[must_use]
    pub fn created() -> Self {
        Self::empty(StatusCode::CREATED)
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::empty(StatusCode::NOT_FOUND)
    }

    /// Serialize as `<version> <code> <reason>\r\n`, one `Name: Value\r\n`
    /// per header, a blank line, then the body.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "{HTTP_VERSION} {} {}\r\n",
            self.status.as_u16(),
            status_reason(self.status)
        );
        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");

        let mut out = head.into_bytes();
        out.extend_from_slice(&self.body);
        out
    }

    /// Write the whole response and flush. A short write surfaces as an error.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())?;
        writer.flush()
    }
}
