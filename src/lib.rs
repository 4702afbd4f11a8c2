//! httpwire - HTTP/1.1 over raw TCP
//!
//! Incremental request parsing, buffered response writing (including chunked
//! bodies and trailers), and a task-per-connection server.

pub mod config;
pub mod http;
pub mod proxy;
pub mod routes;
pub mod server;

pub use http::connection::Handler;
pub use server::Server;
