use std::fmt;

use crate::http::headers::Headers;
use crate::http::writer::{ResponseWriter, WriterError};

/// HTTP status codes.
///
/// Only the codes the server produces itself carry a reason phrase; any
/// other code is written with an empty one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 500 Internal Server Error
    InternalServerError,
    /// Any other numeric code
    Other(u16),
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use httpwire::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::Other(404).as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::InternalServerError => 500,
            StatusCode::Other(code) => *code,
        }
    }

    /// Returns the reason phrase, empty for codes without a fixed one.
    ///
    /// # Example
    ///
    /// ```
    /// # use httpwire::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::Other(404).reason_phrase(), "");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::Other(_) => "",
        }
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        match code {
            200 => StatusCode::Ok,
            400 => StatusCode::BadRequest,
            500 => StatusCode::InternalServerError,
            other => StatusCode::Other(other),
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// Fluent builder for response header blocks.
///
/// # Example
///
/// ```
/// # use httpwire::http::response::ResponseHeaders;
/// let headers = ResponseHeaders::new()
///     .content_length(5)
///     .content_type("text/plain")
///     .connection("")
///     .build();
/// assert_eq!(headers.get("Connection"), Some("close"));
/// ```
#[derive(Debug, Default)]
pub struct ResponseHeaders {
    headers: Headers,
}

impl ResponseHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.replace(key, value);
        self
    }

    pub fn content_length(self, len: usize) -> Self {
        self.header("Content-Length", len.to_string())
    }

    pub fn content_type(self, content_type: &str) -> Self {
        self.header("Content-Type", content_type)
    }

    pub fn transfer_encoding(self, encoding: &str) -> Self {
        self.header("Transfer-Encoding", encoding)
    }

    /// An empty value means `close`.
    pub fn connection(self, value: &str) -> Self {
        let value = if value.is_empty() { "close" } else { value };
        self.header("Connection", value)
    }

    /// Announces the trailer fields that follow a chunked body.
    pub fn trailer(self, names: &[&str]) -> Self {
        self.header("Trailer", names.join(", "))
    }

    pub fn build(self) -> Headers {
        self.headers
    }
}

/// Plain-text headers for a body of `content_len` bytes on a connection
/// that closes after the response.
pub fn default_headers(content_len: usize) -> Headers {
    ResponseHeaders::new()
        .content_length(content_len)
        .content_type("text/plain")
        .connection("close")
        .build()
}

/// An error that is answered with a plain-text response.
///
/// Produced by the connection when a request fails to parse (400) or by a
/// handler that gives up (usually 500).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} ({status})")]
pub struct HandlerError {
    pub message: String,
    pub status: StatusCode,
}

impl HandlerError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BadRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::InternalServerError, message)
    }

    /// Writes the error as a complete response into a fresh `writer`.
    pub fn write(&self, writer: &mut ResponseWriter) -> Result<(), WriterError> {
        writer.write_status_line(self.status)?;
        writer.write_headers(&default_headers(self.message.len()))?;
        writer.write_body(self.message.as_bytes())?;
        tracing::warn!(status = self.status.as_u16(), "handler error: {}", self.message);
        Ok(())
    }
}

impl From<WriterError> for HandlerError {
    fn from(err: WriterError) -> Self {
        HandlerError::internal(err.to_string())
    }
}
