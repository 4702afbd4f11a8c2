//! Relaying from an upstream HTTP server.
//!
//! Used by the demo routes to stream an upstream body back to the client as
//! a chunked response.

pub mod upstream;

pub use upstream::{Upstream, UpstreamBody};
