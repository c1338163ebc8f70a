//! Admin API: rule-set replacement, trace inspection, health.

mod router;
mod server;

pub use router::route_request;
pub use server::AdminServer;
