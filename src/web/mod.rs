//! HTTP surface of the gateway: one endpoint, JSON commands in, JSON envelopes out.

pub mod command;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod routes;
pub mod status;

pub use routes::*;
