//! Demo application served by the `httpwire` binary.
//!
//! - `/yourproblem` answers 400,
//! - `/myproblem` answers 500,
//! - `/httpbin/stream/<n>` relays `<upstream>/stream/<n>` as a chunked body
//!   with `X-Content-SHA256` and `X-Content-Length` trailers,
//! - everything else answers 200.

use sha2::{Digest, Sha256};

use crate::http::connection::Handler;
use crate::http::headers::Headers;
use crate::http::request::Request;
use crate::http::response::{HandlerError, ResponseHeaders, StatusCode};
use crate::http::writer::ResponseWriter;
use crate::proxy::Upstream;

const BAD_REQUEST_PAGE: &str = "<html>
  <head>
    <title>400 Bad Request</title>
  </head>
  <body>
    <h1>Bad Request</h1>
    <p>Your request honestly kinda sucked.</p>
  </body>
</html>";

const INTERNAL_ERROR_PAGE: &str = "<html>
  <head>
    <title>500 Internal Server Error</title>
  </head>
  <body>
    <h1>Internal Server Error</h1>
    <p>Okay, you know what? This one is on me.</p>
  </body>
</html>";

const SUCCESS_PAGE: &str = "<html>
  <head>
    <title>200 OK</title>
  </head>
  <body>
    <h1>Success!</h1>
    <p>Your request was an absolute banger.</p>
  </body>
</html>";

const STREAM_PREFIX: &str = "/httpbin/stream/";

pub struct DemoHandler {
    upstream: Upstream,
}

impl DemoHandler {
    pub fn new(upstream: Upstream) -> Self {
        Self { upstream }
    }

    async fn relay_stream(
        &self,
        writer: &mut ResponseWriter,
        count: &str,
    ) -> Result<(), HandlerError> {
        let mut body = self
            .upstream
            .get(&format!("stream/{count}"))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "upstream request failed");
                HandlerError::internal("upstream request failed")
            })?;

        writer.write_status_line(StatusCode::Ok)?;
        writer.write_headers(
            &ResponseHeaders::new()
                .content_type("text/plain")
                .transfer_encoding("chunked")
                .trailer(&["X-Content-SHA256", "X-Content-Length"])
                .connection("")
                .build(),
        )?;

        let mut hasher = Sha256::new();
        let mut total = 0;
        loop {
            match body.next_chunk().await {
                Ok(Some(chunk)) => {
                    hasher.update(&chunk);
                    total += chunk.len();
                    writer.write_chunked_body(&chunk)?;
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, relayed = total, "upstream read failed");
                    writer.reset();
                    writer.write_status_line(StatusCode::InternalServerError)?;
                    writer.write_headers(&html_headers(0))?;
                    return Ok(());
                }
            }
        }

        writer.write_chunked_body_done()?;

        let digest: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        let mut trailers = Headers::new();
        trailers.set("X-Content-SHA256", &digest);
        trailers.set("X-Content-Length", &total.to_string());
        writer.write_trailer_headers(&trailers)?;

        tracing::debug!(bytes = total, "upstream stream relayed");
        Ok(())
    }
}

impl Handler for DemoHandler {
    async fn handle(
        &self,
        writer: &mut ResponseWriter,
        request: &Request,
    ) -> Result<(), HandlerError> {
        let target = request.target();

        if let Some(count) = target.strip_prefix(STREAM_PREFIX) {
            return self.relay_stream(writer, count).await;
        }

        let (status, page) = match target {
            "/yourproblem" => (StatusCode::BadRequest, BAD_REQUEST_PAGE),
            "/myproblem" => (StatusCode::InternalServerError, INTERNAL_ERROR_PAGE),
            _ => (StatusCode::Ok, SUCCESS_PAGE),
        };

        writer.write_status_line(status)?;
        writer.write_headers(&html_headers(page.len()))?;
        writer.write_body(page.as_bytes())?;
        Ok(())
    }
}

fn html_headers(content_len: usize) -> Headers {
    ResponseHeaders::new()
        .content_length(content_len)
        .content_type("text/html")
        .connection("")
        .build()
}
