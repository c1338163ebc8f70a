//! Upstream forwarding: the pooled HTTP client and the request/response
//! plumbing around one outbound call.

mod client;
mod forwarding;

pub use client::{create_http_client, HttpClient};
pub use forwarding::{
    build_outbound_request, error_response, is_hop_by_hop, relay_response, send_upstream,
    substitute_url_params, UpstreamResponse,
};
