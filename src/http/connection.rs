use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::http::parser::parse_request;
use crate::http::request::Request;
use crate::http::response::HandlerError;
use crate::http::writer::ResponseWriter;

/// Application logic invoked once per parsed request.
///
/// The handler fills `writer`; nothing reaches the socket until it returns.
/// Returning an error throws away whatever was written and answers with the
/// error instead.
pub trait Handler: Send + Sync + 'static {
    fn handle(
        &self,
        writer: &mut ResponseWriter,
        request: &Request,
    ) -> impl Future<Output = Result<(), HandlerError>> + Send;
}

pub enum ConnectionState {
    Parsing,
    Handling(Request),
    Flushing(ResponseWriter),
    Closed,
}

/// One accepted connection: a single request and a single response.
pub struct Connection<S, H> {
    stream: S,
    handler: Arc<H>,
    state: ConnectionState,
}

impl<S, H> Connection<S, H>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    H: Handler,
{
    pub fn new(stream: S, handler: Arc<H>) -> Self {
        Self {
            stream,
            handler,
            state: ConnectionState::Parsing,
        }
    }

    /// Drives the connection to completion. The stream is closed when this
    /// returns, whatever the outcome.
    pub async fn run(mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Parsing => match parse_request(&mut self.stream).await {
                    Ok(request) => {
                        self.state = ConnectionState::Handling(request);
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "could not parse request");

                        let mut writer = ResponseWriter::new();
                        HandlerError::bad_request(format!("could not parse request: {err}"))
                            .write(&mut writer)?;
                        self.state = ConnectionState::Flushing(writer);
                    }
                },

                ConnectionState::Handling(request) => {
                    let mut writer = ResponseWriter::new();

                    if let Err(err) = self.handler.handle(&mut writer, &request).await {
                        writer.reset();
                        err.write(&mut writer)?;
                    }

                    tracing::debug!(
                        method = ?request.method(),
                        target = %request.target(),
                        bytes = writer.as_bytes().len(),
                        "request handled"
                    );
                    self.state = ConnectionState::Flushing(writer);
                }

                ConnectionState::Flushing(writer) => {
                    writer.write_to_stream(&mut self.stream).await?;
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        // peer may already be gone
        let _ = self.stream.shutdown().await;

        Ok(())
    }
}
