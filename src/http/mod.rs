//! HTTP/1.1 protocol implementation.
//!
//! # Architecture
//!
//! - **`headers`**: case-insensitive header map and the header-line parser
//! - **`request`**: request line, request and parse-state types
//! - **`parser`**: the incremental request state machine and the socket read loop
//! - **`response`**: status codes, response header builders, `HandlerError`
//! - **`writer`**: buffers a serialized response, plain or chunked
//! - **`connection`**: drives one accepted socket through a single exchange
//!
//! # Connection State Machine
//!
//! Each accepted connection serves exactly one request:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Parsing   │ ← Read and feed bytes until the request is done
//!        └──────┬──────┘
//!               ├─ Parse error → 400 written into a fresh writer ─┐
//!               │ Request parsed                                  │
//!               ▼                                                 │
//!        ┌──────────────────┐                                     │
//!        │    Handling      │ ← Handler fills the ResponseWriter  │
//!        └──────┬───────────┘                                     │
//!               ▼                                                 │
//!        ┌──────────────────┐                                     │
//!        │    Flushing      │ ← Whole buffer written at once  ◄───┘
//!        └──────┬───────────┘
//!               ▼
//!            Closed
//! ```
//!
//! # Example
//!
//! ```no_run
//! use httpwire::http::connection::Handler;
//! use httpwire::http::request::Request;
//! use httpwire::http::response::{HandlerError, StatusCode, default_headers};
//! use httpwire::http::writer::ResponseWriter;
//! use httpwire::server::Server;
//!
//! struct Hello;
//!
//! impl Handler for Hello {
//!     async fn handle(
//!         &self,
//!         w: &mut ResponseWriter,
//!         _req: &Request,
//!     ) -> Result<(), HandlerError> {
//!         w.write_status_line(StatusCode::Ok)?;
//!         w.write_headers(&default_headers(5))?;
//!         w.write_body(b"hello")?;
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = Server::serve("127.0.0.1:8080", Hello).await?;
//!     tokio::signal::ctrl_c().await?;
//!     server.close().await
//! }
//! ```

pub mod connection;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
