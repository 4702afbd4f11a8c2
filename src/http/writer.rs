use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::headers::{Headers, canonical_name};
use crate::http::response::StatusCode;

const HTTP_VERSION: &str = "HTTP/1.1";
const CRLF: &[u8] = b"\r\n";

/// Where the writer is within the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterPhase {
    StatusLine,
    Headers,
    Body,
    Done,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WriterError {
    #[error("cannot write {operation} during the {phase:?} phase")]
    InvalidPhase {
        operation: &'static str,
        phase: WriterPhase,
    },
}

/// Buffers a serialized response until the connection flushes it.
///
/// Parts have to be written in wire order: status line, headers, then body
/// (plain or chunk frames). After the terminating chunk only trailers may
/// follow. Writes only ever append; [`ResponseWriter::reset`] discards
/// everything and starts over.
#[derive(Debug)]
pub struct ResponseWriter {
    buffer: Vec<u8>,
    phase: WriterPhase,
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            phase: WriterPhase::StatusLine,
        }
    }

    pub fn phase(&self) -> WriterPhase {
        self.phase
    }

    /// Everything written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn write_status_line(&mut self, status: StatusCode) -> Result<(), WriterError> {
        self.expect(WriterPhase::StatusLine, "status line")?;

        let status_line = format!(
            "{} {} {}\r\n",
            HTTP_VERSION,
            status.as_u16(),
            status.reason_phrase()
        );
        self.buffer.extend_from_slice(status_line.as_bytes());

        self.phase = WriterPhase::Headers;
        Ok(())
    }

    /// Writes every header followed by the blank line closing the block.
    pub fn write_headers(&mut self, headers: &Headers) -> Result<(), WriterError> {
        self.expect(WriterPhase::Headers, "headers")?;

        write_header_lines(&mut self.buffer, headers);
        self.buffer.extend_from_slice(CRLF);

        self.phase = WriterPhase::Body;
        Ok(())
    }

    pub fn write_body(&mut self, body: &[u8]) -> Result<(), WriterError> {
        self.expect(WriterPhase::Body, "body")?;
        self.buffer.extend_from_slice(body);
        Ok(())
    }

    /// Writes `data` as one chunk frame: `<hex len>\r\n<data>\r\n`.
    ///
    /// Returns the number of bytes the frame took.
    pub fn write_chunked_body(&mut self, data: &[u8]) -> Result<usize, WriterError> {
        self.expect(WriterPhase::Body, "chunk")?;

        let start = self.buffer.len();
        self.buffer
            .extend_from_slice(format!("{:x}\r\n", data.len()).as_bytes());
        self.buffer.extend_from_slice(data);
        self.buffer.extend_from_slice(CRLF);

        Ok(self.buffer.len() - start)
    }

    /// Writes the terminating `0\r\n\r\n` frame.
    pub fn write_chunked_body_done(&mut self) -> Result<usize, WriterError> {
        self.expect(WriterPhase::Body, "last chunk")?;

        const LAST_CHUNK: &[u8] = b"0\r\n\r\n";
        self.buffer.extend_from_slice(LAST_CHUNK);

        self.phase = WriterPhase::Done;
        Ok(LAST_CHUNK.len())
    }

    /// Appends raw trailer bytes followed by `\r\n`.
    pub fn write_trailers(&mut self, trailers: &[u8]) -> Result<usize, WriterError> {
        self.expect(WriterPhase::Done, "trailers")?;

        self.buffer.extend_from_slice(trailers);
        self.buffer.extend_from_slice(CRLF);
        Ok(trailers.len() + CRLF.len())
    }

    /// Serializes trailer fields as header lines and appends them.
    ///
    /// The lines land after the complete `0\r\n\r\n` frame written by
    /// [`ResponseWriter::write_chunked_body_done`], not between `0\r\n` and the
    /// final CRLF where RFC 9112 places a trailer section.
    pub fn write_trailer_headers(&mut self, trailers: &Headers) -> Result<usize, WriterError> {
        let mut lines = Vec::new();
        write_header_lines(&mut lines, trailers);
        // the final CRLF comes from write_trailers
        lines.truncate(lines.len().saturating_sub(CRLF.len()));
        self.write_trailers(&lines)
    }

    /// Drops everything written so far, back to the status line.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.phase = WriterPhase::StatusLine;
    }

    /// Sends the whole buffer to `stream`.
    pub async fn write_to_stream<W>(&self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        stream.write_all(&self.buffer).await?;
        stream.flush().await?;
        Ok(())
    }

    fn expect(&self, phase: WriterPhase, operation: &'static str) -> Result<(), WriterError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(WriterError::InvalidPhase {
                operation,
                phase: self.phase,
            })
        }
    }
}

fn write_header_lines(buf: &mut Vec<u8>, headers: &Headers) {
    for (name, value) in headers.iter() {
        buf.extend_from_slice(canonical_name(name).as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(value.as_bytes());
        buf.extend_from_slice(CRLF);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer_in_body() -> ResponseWriter {
        let mut writer = ResponseWriter::new();
        writer.write_status_line(StatusCode::Ok).unwrap();
        writer.write_headers(&Headers::new()).unwrap();
        writer
    }

    #[test]
    fn chunk_frame_is_hex_prefixed() {
        let mut writer = writer_in_body();
        let start = writer.as_bytes().len();

        let n = writer.write_chunked_body(b"abc").unwrap();

        assert_eq!(&writer.as_bytes()[start..], b"3\r\nabc\r\n");
        assert_eq!(n, 8);
    }

    #[test]
    fn chunk_length_uses_lowercase_hex() {
        let mut writer = writer_in_body();
        let start = writer.as_bytes().len();

        writer.write_chunked_body(&[b'x'; 26]).unwrap();

        assert!(writer.as_bytes()[start..].starts_with(b"1a\r\n"));
    }

    #[test]
    fn body_before_headers_is_rejected() {
        let mut writer = ResponseWriter::new();
        writer.write_status_line(StatusCode::Ok).unwrap();

        let err = writer.write_body(b"early").unwrap_err();
        assert_eq!(
            err,
            WriterError::InvalidPhase {
                operation: "body",
                phase: WriterPhase::Headers
            }
        );
    }

    #[test]
    fn reset_clears_buffer_and_phase() {
        let mut writer = writer_in_body();
        writer.write_chunked_body(b"partial").unwrap();

        writer.reset();

        assert!(writer.as_bytes().is_empty());
        assert_eq!(writer.phase(), WriterPhase::StatusLine);
        writer.write_status_line(StatusCode::InternalServerError).unwrap();
    }

    #[test]
    fn trailer_headers_follow_last_chunk() {
        let mut writer = writer_in_body();
        writer.write_chunked_body_done().unwrap();

        let mut trailers = Headers::new();
        trailers.set("X-Content-Length", "0");
        writer.write_trailer_headers(&trailers).unwrap();

        assert!(writer.as_bytes().ends_with(b"0\r\n\r\nX-Content-Length: 0\r\n"));
    }
}
