//! The request engine: per-request dispatch and the gateway listener.

mod handler;
mod server;

pub use handler::Engine;
pub use server::GatewayServer;
