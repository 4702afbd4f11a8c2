use tokio::io::{AsyncRead, AsyncReadExt};

use crate::http::headers::find_crlf;
use crate::http::request::{Method, ParseState, Request, RequestLine};

/// Size of the first read; the buffer doubles whenever it fills up.
pub const INITIAL_BUFFER_SIZE: usize = 8;

const HTTP_VERSION: &str = "HTTP/1.1";

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("malformed request line")]
    MalformedRequestLine,
    #[error("invalid method in request line")]
    InvalidMethod,
    #[error("invalid HTTP version in request line")]
    InvalidVersion,
    #[error("invalid header format")]
    InvalidHeaderFormat,
    #[error("invalid characters in header name")]
    DisallowedHeaderCharacters,
    #[error("invalid content-length header")]
    InvalidContentLength,
    #[error("body longer than content-length")]
    ContentLengthMismatch,
    #[error("connection closed before the request was complete")]
    UnexpectedEndOfStream,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parser driven in an unknown state")]
    UnknownParserState,
}

impl Request {
    /// Advances the parser with the bytes in `data`.
    ///
    /// Returns how many bytes from the front of `data` were consumed. Bytes
    /// that were not consumed must be offered again, with more appended, on
    /// the next call. Calling this once the request is done is an error.
    pub fn feed(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        if self.state == ParseState::Done {
            return Err(ParseError::UnknownParserState);
        }

        let mut total = 0;
        while self.state != ParseState::Done {
            let before = self.state;
            let n = self.parse_single(&data[total..])?;
            total += n;

            if n == 0 && self.state == before {
                break;
            }
        }

        Ok(total)
    }

    fn parse_single(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        match self.state {
            ParseState::Initialized => {
                let Some((line, n)) = parse_request_line(data)? else {
                    return Ok(0);
                };
                self.request_line = line;
                self.state = ParseState::ParsingHeaders;
                Ok(n)
            }

            ParseState::ParsingHeaders => {
                let (n, done) = self.headers.parse_line(data)?;
                if done {
                    self.state = if self.headers.contains("content-length") {
                        ParseState::ParsingBody
                    } else {
                        ParseState::Done
                    };
                }
                Ok(n)
            }

            ParseState::ParsingBody => {
                let declared: usize = self
                    .headers
                    .get("content-length")
                    .ok_or(ParseError::UnknownParserState)?
                    .parse()
                    .map_err(|_| ParseError::InvalidContentLength)?;

                self.body.extend_from_slice(data);
                if self.body.len() > declared {
                    return Err(ParseError::ContentLengthMismatch);
                }
                if self.body.len() == declared {
                    self.state = ParseState::Done;
                }
                Ok(data.len())
            }

            ParseState::Done => Err(ParseError::UnknownParserState),
        }
    }
}

/// Returns `None` until a full line is buffered.
fn parse_request_line(data: &[u8]) -> Result<Option<(RequestLine, usize)>, ParseError> {
    let Some(idx) = find_crlf(data) else {
        return Ok(None);
    };

    let line = std::str::from_utf8(&data[..idx]).map_err(|_| ParseError::MalformedRequestLine)?;

    let parts: Vec<&str> = line.split(' ').collect();
    let &[method, target, version] = parts.as_slice() else {
        return Err(ParseError::MalformedRequestLine);
    };

    let method = Method::from_str(method).ok_or(ParseError::InvalidMethod)?;

    if version != HTTP_VERSION {
        return Err(ParseError::InvalidVersion);
    }

    let request_line = RequestLine {
        method,
        request_target: target.to_string(),
        http_version: version.trim_start_matches("HTTP/").to_string(),
    };

    Ok(Some((request_line, idx + 2)))
}

/// Growable read buffer used while a request is being parsed.
///
/// Reads land after the bytes still pending; once full, the capacity doubles
/// before the next read. [`ReadBuffer::consume`] moves the unparsed tail back
/// to the front.
#[derive(Debug)]
pub struct ReadBuffer {
    buf: Vec<u8>,
    len: usize,
}

impl ReadBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity.max(1)],
            len: 0,
        }
    }

    /// Bytes read but not yet consumed.
    pub fn pending(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Appends one read from `reader`, returning the number of bytes read
    /// (`0` means end of stream).
    pub async fn read_from<R>(&mut self, reader: &mut R) -> std::io::Result<usize>
    where
        R: AsyncRead + Unpin,
    {
        if self.len == self.buf.len() {
            self.buf.resize(self.buf.len() * 2, 0);
        }

        let n = reader.read(&mut self.buf[self.len..]).await?;
        self.len += n;
        Ok(n)
    }

    /// Drops `n` bytes from the front.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.len);
        self.buf.copy_within(n..self.len, 0);
        self.len -= n;
    }
}

/// Reads one complete request from `reader`.
///
/// A request without `content-length` is complete as soon as its header
/// block ends; any other end of stream before completion is
/// [`ParseError::UnexpectedEndOfStream`].
pub async fn parse_request<R>(reader: &mut R) -> Result<Request, ParseError>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = ReadBuffer::new(INITIAL_BUFFER_SIZE);
    let mut request = Request::new();

    while !request.is_done() {
        let n = buffer.read_from(reader).await?;
        if n == 0 {
            tracing::debug!(state = ?request.state(), "stream ended mid-request");
            return Err(ParseError::UnexpectedEndOfStream);
        }

        let consumed = request.feed(buffer.pending())?;
        buffer.consume(consumed);
    }

    tracing::debug!(
        method = ?request.method(),
        target = %request.target(),
        body_len = request.body.len(),
        "request parsed"
    );

    Ok(request)
}
