//! Outbound request construction and upstream response handling.

use super::client::HttpClient;
use crate::error::GatewayError;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN};
use hyper::{HeaderMap, Method, Request, Response, StatusCode};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// `:param` placeholders in a target URL. Identifiers only, so scheme
/// separators and literal ports are left alone.
static URL_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([A-Za-z_]\w*)").expect("valid placeholder pattern"));

/// Headers that must not travel across the proxy hop in either direction.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h))
}

/// A fully collected upstream response.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// JSON error response for a terminal failure.
pub fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(Full::new(Bytes::from(body)))
        .expect("static error response parts are valid")
}

/// Replace `:param` placeholders in the target URL with values from the
/// original request's query string; a missing parameter substitutes as an
/// empty string.
pub fn substitute_url_params(target_url: &str, query: &HashMap<String, String>) -> String {
    URL_PARAM
        .replace_all(target_url, |caps: &regex::Captures<'_>| {
            query.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}

/// Build the outbound request: original method, caller headers minus the
/// ones the proxy owns, and the transformed body (if any).
pub fn build_outbound_request(
    method: &Method,
    url: &str,
    headers: &HeaderMap,
    body: Option<Bytes>,
) -> Result<Request<Full<Bytes>>, GatewayError> {
    let uri: hyper::Uri = url.parse().map_err(|e| GatewayError::UpstreamUnreachable {
        reason: format!("invalid target URL {url:?}: {e}"),
    })?;

    let mut builder = Request::builder().method(method.clone()).uri(uri);
    for (name, value) in headers.iter() {
        // Host is rewritten by the client for the new target; the length of
        // the body changed under mapping, so let hyper recompute it.
        if name == hyper::header::HOST
            || name == hyper::header::CONTENT_LENGTH
            || is_hop_by_hop(name.as_str())
        {
            continue;
        }
        builder = builder.header(name, value);
    }

    builder
        .body(Full::new(body.unwrap_or_default()))
        .map_err(|e| GatewayError::UpstreamUnreachable {
            reason: format!("failed to build outbound request: {e}"),
        })
}

/// Perform one outbound call, bounded by `timeout`, collecting the full
/// response body. Failures are surfaced once; there are no retries.
pub async fn send_upstream(
    client: &HttpClient,
    request: Request<Full<Bytes>>,
    timeout: Duration,
) -> Result<UpstreamResponse, GatewayError> {
    let target = request.uri().to_string();
    debug!("Forwarding to: {}", target);

    let response = tokio::time::timeout(timeout, client.request(request))
        .await
        .map_err(|_| GatewayError::UpstreamUnreachable {
            reason: format!("upstream call timed out after {}s", timeout.as_secs()),
        })?
        .map_err(|e| GatewayError::UpstreamUnreachable {
            reason: e.to_string(),
        })?;

    let (parts, body) = response.into_parts();
    let body = body
        .collect()
        .await
        .map_err(|e| GatewayError::UpstreamUnreachable {
            reason: format!("failed to read upstream response: {e}"),
        })?
        .to_bytes();

    Ok(UpstreamResponse {
        status: parts.status,
        headers: parts.headers,
        body,
    })
}

/// Relay an upstream response to the caller: status and headers preserved,
/// hop-by-hop headers stripped, permissive CORS added.
pub fn relay_response(upstream: UpstreamResponse) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(upstream.status);
    for (name, value) in upstream.headers.iter() {
        if name == hyper::header::CONTENT_LENGTH || is_hop_by_hop(name.as_str()) {
            continue;
        }
        builder = builder.header(name, value);
    }
    let mut response = builder
        .body(Full::new(upstream.body))
        .expect("upstream parts were already parsed as valid");
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}
