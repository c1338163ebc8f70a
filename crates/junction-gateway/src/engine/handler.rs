//! Per-request dispatch.
//!
//! Each request runs the same state machine: capture → route selection
//! (method + path, then conditions, then inbound auth) → mock or proxy →
//! respond. Exactly one trace record is emitted per request, whatever the
//! outcome.

use crate::auth::{apply_outgoing_auth, authenticate};
use crate::condition::{evaluate_group, parse_query_string, RequestProjection};
use crate::error::GatewayError;
use crate::matcher::CompiledRoute;
use crate::proxy::{
    build_outbound_request, error_response, relay_response, send_upstream, substitute_url_params,
    HttpClient,
};
use crate::rules::{CompiledRuleSet, IncomingRoute, ResponseMode, RuleStore};
use crate::trace::{TraceRecord, TraceRecorder, TracedRequest, TracedResponse};
use crate::transform::{apply_egress, apply_mapping};
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use hyper::{HeaderMap, Method, Request, Response, StatusCode};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// The dispatcher. Cheap to share across connections behind an `Arc`.
pub struct Engine {
    store: Arc<RuleStore>,
    recorder: TraceRecorder,
    client: HttpClient,
    upstream_timeout: Duration,
}

impl Engine {
    pub fn new(
        store: Arc<RuleStore>,
        recorder: TraceRecorder,
        client: HttpClient,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            store,
            recorder,
            client,
            upstream_timeout,
        }
    }

    /// Handle one request end to end. Never fails: every outcome is an
    /// HTTP response, and every outcome is traced.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        // The snapshot is taken once; a concurrent rule-set replacement
        // does not affect this request.
        let snapshot = self.store.snapshot();

        let (parts, body) = req.into_parts();
        let method = parts.method.clone();
        let path = parts.uri.path().to_string();
        let query = parse_query_string(parts.uri.query().unwrap_or(""));
        let headers: HashMap<String, String> = parts
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_lowercase(),
                    value.to_str().unwrap_or("").to_string(),
                )
            })
            .collect();

        let body_value = if method == Method::GET {
            json!({})
        } else {
            match body.collect().await {
                Ok(collected) => {
                    let bytes = collected.to_bytes();
                    if bytes.is_empty() {
                        json!({})
                    } else {
                        serde_json::from_slice(&bytes).unwrap_or_else(|_| json!({}))
                    }
                }
                Err(e) => {
                    debug!("failed to read request body: {e}");
                    json!({})
                }
            }
        };

        let projection = RequestProjection::new(body_value.clone(), headers.clone(), query);
        let mut trace = TraceRecord::begin(TracedRequest {
            url: parts.uri.to_string(),
            method: method.to_string(),
            headers,
            body: body_value,
        });

        let response = self
            .dispatch(&snapshot, &method, &path, &parts.headers, &projection, &mut trace)
            .await;

        // Recording is best-effort and happens after the response is built;
        // it can never change what the caller receives.
        self.recorder.emit(trace);
        response
    }

    async fn dispatch(
        &self,
        snapshot: &CompiledRuleSet,
        method: &Method,
        path: &str,
        original_headers: &HeaderMap,
        projection: &RequestProjection,
        trace: &mut TraceRecord,
    ) -> Response<Full<Bytes>> {
        let projection_value = projection.to_value();

        // First full match wins, in authoring order. An auth failure does
        // not end the scan: a later route may still claim the request, and
        // only a scan that ends with no selection turns into a 401.
        let mut auth_failed = false;
        let mut selected: Option<&CompiledRoute> = None;
        for compiled in &snapshot.routes {
            if !compiled.matches(method, path) {
                continue;
            }
            if !evaluate_group(&projection_value, &compiled.route.conditions) {
                continue;
            }
            if authenticate(projection, &compiled.route.authentication) {
                selected = Some(compiled);
                break;
            }
            auth_failed = true;
        }

        let Some(compiled) = selected else {
            let err = if auth_failed {
                GatewayError::AuthenticationFailed
            } else {
                GatewayError::NoRouteMatch
            };
            return self.fail(trace, err);
        };

        let route = Arc::clone(&compiled.route);
        trace.incoming_route_id = Some(route.id.clone());
        trace.incoming_route_name = Some(route.name.clone());
        debug!(route = %route.id, "incoming route matched");

        match route.response_mode {
            ResponseMode::Mock => self.mock_response(&route, trace),
            ResponseMode::Proxy => {
                match self
                    .proxy_request(snapshot, &route, method, original_headers, projection, trace)
                    .await
                {
                    Ok(response) => response,
                    Err(err) => self.fail(trace, err),
                }
            }
        }
    }

    /// Synthesize the configured mock response; no outbound call occurs.
    fn mock_response(&self, route: &IncomingRoute, trace: &mut TraceRecord) -> Response<Full<Bytes>> {
        let status = StatusCode::from_u16(route.mock_status).unwrap_or_else(|_| {
            warn!(
                "route {:?} has invalid mock status {}; using 200",
                route.id, route.mock_status
            );
            StatusCode::OK
        });

        let mut builder = Response::builder().status(status);
        for header in &route.mock_headers {
            if header.key.is_empty() {
                continue;
            }
            builder = builder.header(header.key.as_str(), header.value.as_str());
        }
        let mut response = match builder.body(Full::new(Bytes::from(route.mock_body.clone()))) {
            Ok(response) => response,
            Err(e) => {
                warn!("route {:?} has invalid mock headers: {e}", route.id);
                error_response(status, &route.mock_body)
            }
        };
        let headers = response.headers_mut();
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));

        trace.response = TracedResponse {
            status: Some(status.as_u16()),
            headers: Some(header_map(response.headers())),
            body: Some(parse_or_string(route.mock_body.as_bytes())),
        };
        response
    }

    /// Forward through the referenced outgoing route: map, transform,
    /// substitute the target URL, decorate, send, relay.
    async fn proxy_request(
        &self,
        snapshot: &CompiledRuleSet,
        route: &IncomingRoute,
        method: &Method,
        original_headers: &HeaderMap,
        projection: &RequestProjection,
        trace: &mut TraceRecord,
    ) -> Result<Response<Full<Bytes>>, GatewayError> {
        let reference = route.outgoing_route_id.clone().unwrap_or_default();
        let outgoing = snapshot
            .outgoing_route(&reference)
            .ok_or(GatewayError::MisconfiguredRoute {
                reference: reference.clone(),
            })?;

        trace.outgoing_route_id = Some(outgoing.id.clone());
        trace.outgoing_route_name = Some(outgoing.name.clone());

        let mut processed = projection.body.clone();
        if let Some(mapping_id) = &outgoing.mapping_id {
            match snapshot.mapping(mapping_id) {
                Some(mapping) => {
                    processed = apply_mapping(&processed, mapping);
                    trace.mapping_id = Some(mapping.id.clone());
                }
                // A dangling mapping reference skips the mapping step; only
                // a dangling outgoing route is a configuration error.
                None => debug!("mapping {mapping_id:?} not found; forwarding unmapped body"),
            }
        }
        processed = apply_egress(&processed, &outgoing.egress_transforms);
        trace.body_after_transforms = Some(processed.clone());

        let mut target_url = substitute_url_params(&outgoing.target_url, &projection.query);
        let mut headers = original_headers.clone();
        apply_outgoing_auth(&outgoing.authentication, &mut target_url, &mut headers);

        let body_bytes = match &processed {
            Value::Object(map) if map.is_empty() => None,
            other => Some(Bytes::from(serde_json::to_vec(other).unwrap_or_default())),
        };

        let outbound = build_outbound_request(method, &target_url, &headers, body_bytes)?;
        let upstream = send_upstream(&self.client, outbound, self.upstream_timeout).await?;

        trace.response = TracedResponse {
            status: Some(upstream.status.as_u16()),
            headers: Some(header_map(&upstream.headers)),
            body: Some(parse_or_string(&upstream.body)),
        };
        Ok(relay_response(upstream))
    }

    /// Terminal failure: JSON error body, status from the taxonomy, error
    /// captured in the trace.
    fn fail(&self, trace: &mut TraceRecord, err: GatewayError) -> Response<Full<Bytes>> {
        let status = err.status();
        let message = err.client_message();
        trace.error = Some(err.to_string());
        trace.response = TracedResponse {
            status: Some(status.as_u16()),
            headers: None,
            body: Some(json!({ "error": message })),
        };
        error_response(status, message)
    }
}

fn header_map(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or("").to_string(),
            )
        })
        .collect()
}

/// Responses and mock bodies are traced as JSON when they parse, as raw
/// strings otherwise.
fn parse_or_string(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
