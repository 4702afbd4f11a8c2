//! TCP front of the server: binding, accepting, and shutting down.

pub mod listener;

pub use listener::Server;
