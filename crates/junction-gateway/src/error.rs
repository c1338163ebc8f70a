//! Error taxonomy for the gateway engine.
//!
//! Every failure is scoped to a single request; nothing here is fatal to the
//! process. Terminal errors map to an HTTP status and a JSON error body,
//! transform errors are non-fatal and only skip the entry that failed.

use hyper::StatusCode;

/// Request-scoped gateway errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No incoming route claimed the request.
    #[error("no matching incoming route found")]
    NoRouteMatch,
    /// At least one route matched on method, path, and conditions, but its
    /// inbound authentication rejected the caller.
    #[error("incoming authentication failed")]
    AuthenticationFailed,
    /// A route references configuration that does not exist in the active
    /// snapshot (e.g. a dangling outgoing-route id).
    #[error("outgoing route with id {reference:?} not found")]
    MisconfiguredRoute { reference: String },
    /// The outbound call failed (connect error, timeout, bad response body).
    #[error("upstream request failed: {reason}")]
    UpstreamUnreachable { reason: String },
    /// A field-path expression failed during mapping or egress transforms.
    /// Non-fatal: the failing entry is skipped, the request continues.
    #[error("transform failed for path {path:?}: {reason}")]
    Transform { path: String, reason: String },
}

impl GatewayError {
    /// HTTP status surfaced to the caller for terminal errors.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NoRouteMatch => StatusCode::NOT_FOUND,
            GatewayError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            GatewayError::MisconfiguredRoute { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::UpstreamUnreachable { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::Transform { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable message for the JSON error body returned to the caller.
    /// Detail (reference ids, connect errors) stays in the trace record.
    pub fn client_message(&self) -> &'static str {
        match self {
            GatewayError::NoRouteMatch => "No matching incoming route found.",
            GatewayError::AuthenticationFailed => "Incoming authentication failed.",
            GatewayError::MisconfiguredRoute { .. } => {
                "Internal configuration error: Outgoing route not found."
            }
            GatewayError::UpstreamUnreachable { .. } => "Failed to fetch target URL.",
            GatewayError::Transform { .. } => "Transform failed.",
        }
    }
}
