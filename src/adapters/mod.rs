//! Adapters - implementations of the ports against real infrastructure.

pub mod convert;
pub mod fetch;
pub mod files;
pub mod http;
pub mod qa;
pub mod session;
pub mod transport;
