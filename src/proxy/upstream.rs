//! Streaming GET requests against a plain-HTTP upstream.
//!
//! Requests go out as HTTP/1.0 with `Connection: close`, so the upstream
//! answers without chunked framing: the body is either `Content-Length`
//! bytes or everything up to the end of the stream.

use anyhow::{Context, Result};
use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use url::Url;

use crate::http::headers::{Headers, find_crlf};

/// Upstream read size, also the largest chunk handed out.
const BUFFER_SIZE: usize = 1024;

/// Header blocks larger than this are refused.
const MAX_HEAD_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct Upstream {
    base: Url,
}

impl Upstream {
    pub fn new(base: Url) -> Result<Self> {
        if base.scheme() != "http" {
            anyhow::bail!("unsupported upstream scheme {}", base.scheme());
        }
        base.host_str().context("upstream url missing host")?;
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Sends `GET <path>` and reads the response head. `path` is resolved
    /// against the base url, so relative paths keep the base path.
    ///
    /// Fails on connection errors and on any non-2xx status.
    pub async fn get(&self, path: &str) -> Result<UpstreamBody> {
        let url = self.base.join(path).context("invalid upstream path")?;
        let host = url.host_str().context("upstream url missing host")?;
        let port = url.port_or_known_default().unwrap_or(80);

        let mut stream = TcpStream::connect((host, port))
            .await
            .with_context(|| format!("failed to connect to upstream {host}:{port}"))?;

        tracing::debug!(%url, "Connected to upstream");

        let request = build_http_request(&url);
        stream.write_all(&request).await?;
        stream.flush().await?;

        let mut buffer = BytesMut::with_capacity(BUFFER_SIZE);
        let (status, headers) = read_response_head(&mut stream, &mut buffer).await?;

        if !(200..300).contains(&status) {
            anyhow::bail!("upstream answered with status {status}");
        }

        let remaining = match headers.get("content-length") {
            Some(len) => Some(len.parse::<usize>().context("invalid upstream content-length")?),
            None => None,
        };

        Ok(UpstreamBody {
            stream,
            buffer,
            remaining,
        })
    }
}

/// Request bytes for a body-less GET of `url`.
pub fn build_http_request(url: &Url) -> Vec<u8> {
    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };

    format!("GET {target} HTTP/1.0\r\nHost: {host}\r\nConnection: close\r\n\r\n").into_bytes()
}

async fn read_response_head(
    stream: &mut TcpStream,
    buffer: &mut BytesMut,
) -> Result<(u16, Headers)> {
    // status line
    let status = loop {
        if let Some(idx) = find_crlf(buffer) {
            let line = buffer.split_to(idx + 2);
            break parse_status_line(&line[..idx])?;
        }
        read_more(stream, buffer).await?;
    };

    let mut headers = Headers::new();
    loop {
        let (n, done) = headers
            .parse_line(buffer)
            .context("invalid upstream header")?;
        buffer.advance(n);
        if done {
            return Ok((status, headers));
        }
        if n == 0 {
            read_more(stream, buffer).await?;
        }
    }
}

async fn read_more(stream: &mut TcpStream, buffer: &mut BytesMut) -> Result<()> {
    if buffer.len() > MAX_HEAD_SIZE {
        anyhow::bail!("upstream response head too large");
    }
    let n = stream.read_buf(buffer).await?;
    if n == 0 {
        anyhow::bail!("upstream closed before the response head was complete");
    }
    Ok(())
}

fn parse_status_line(line: &[u8]) -> Result<u16> {
    let line = std::str::from_utf8(line).context("invalid upstream status line")?;
    let mut parts = line.splitn(3, ' ');

    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/1.") {
        anyhow::bail!("invalid upstream status line: {line}");
    }

    parts
        .next()
        .and_then(|code| code.parse().ok())
        .with_context(|| format!("invalid upstream status line: {line}"))
}

/// The body of an upstream response, handed out read by read.
pub struct UpstreamBody {
    stream: TcpStream,
    buffer: BytesMut,
    /// `None` when the body runs to the end of the stream
    remaining: Option<usize>,
}

impl UpstreamBody {
    /// Returns the next piece of the body, or `None` once it is complete.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        if self.remaining == Some(0) {
            return Ok(None);
        }

        if self.buffer.is_empty() {
            self.buffer.reserve(BUFFER_SIZE);
            let n = self.stream.read_buf(&mut self.buffer).await?;
            if n == 0 {
                return match self.remaining {
                    None => Ok(None),
                    Some(left) => {
                        anyhow::bail!("upstream closed with {left} body bytes outstanding")
                    }
                };
            }
        }

        let take = match self.remaining {
            Some(left) => self.buffer.len().min(left).min(BUFFER_SIZE),
            None => self.buffer.len().min(BUFFER_SIZE),
        };
        if let Some(left) = self.remaining.as_mut() {
            *left -= take;
        }

        Ok(Some(self.buffer.split_to(take).freeze()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_targets_path_and_query() {
        let url = Url::parse("http://localhost:3000/stream/5?x=1").unwrap();
        let request = String::from_utf8(build_http_request(&url)).unwrap();

        assert_eq!(
            request,
            "GET /stream/5?x=1 HTTP/1.0\r\nHost: localhost:3000\r\nConnection: close\r\n\r\n"
        );
    }

    #[test]
    fn https_upstream_is_rejected() {
        let url = Url::parse("https://httpbin.org").unwrap();
        assert!(Upstream::new(url).is_err());
    }

    #[test]
    fn status_line_code() {
        assert_eq!(parse_status_line(b"HTTP/1.1 200 OK").unwrap(), 200);
        assert_eq!(parse_status_line(b"HTTP/1.0 404 Not Found").unwrap(), 404);
        assert!(parse_status_line(b"SIP/2.0 200 OK").is_err());
    }
}
