//! Route dispatch logic for the admin API.
//!
//! The authoring layer pushes complete rule-set snapshots here and reads
//! back the trace records the engine produced.

use crate::condition::parse_query_string;
use crate::rules::{RuleSet, RuleStore};
use crate::trace::MemorySink;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

const DEFAULT_TRACE_LIMIT: usize = 50;

/// Main request router.
pub async fn route_request(
    req: Request<Incoming>,
    store: Arc<RuleStore>,
    traces: Arc<MemorySink>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(|s| s.to_string());

    debug!("Admin API: {} {}", method, path);

    let response = match (&method, path.as_str()) {
        (&Method::GET, "/health") => handle_health(),
        (&Method::GET, "/rules") => handle_get_rules(&store),
        (&Method::PUT, "/rules") => handle_put_rules(req, &store).await,
        (&Method::GET, "/traces") => handle_get_traces(&traces, query.as_deref()),
        (&Method::DELETE, "/traces") => handle_delete_traces(&traces),
        _ => not_found(),
    };
    Ok(response)
}

fn handle_health() -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &json!({"status": "ok"}))
}

fn handle_get_rules(store: &RuleStore) -> Response<Full<Bytes>> {
    let snapshot = store.snapshot();
    json_response(StatusCode::OK, snapshot.rules.as_ref())
}

/// Replace the active rule set with the pushed snapshot, atomically.
async fn handle_put_rules(
    req: Request<Incoming>,
    store: &RuleStore,
) -> Response<Full<Bytes>> {
    let bytes = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                &format!("failed to read request body: {e}"),
            )
        }
    };

    let rules: RuleSet = match serde_json::from_slice(&bytes) {
        Ok(rules) => rules,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("invalid rule set: {e}"))
        }
    };

    let counts = json!({
        "mappings": rules.mappings.len(),
        "incomingRoutes": rules.incoming_routes.len(),
        "outgoingRoutes": rules.outgoing_routes.len(),
    });
    store.replace(rules);
    json_response(StatusCode::OK, &counts)
}

fn handle_get_traces(traces: &MemorySink, query: Option<&str>) -> Response<Full<Bytes>> {
    let limit = query
        .map(|q| parse_query_string(q))
        .and_then(|params| params.get("limit").and_then(|v| v.parse::<usize>().ok()))
        .unwrap_or(DEFAULT_TRACE_LIMIT);
    json_response(StatusCode::OK, &traces.recent(limit))
}

fn handle_delete_traces(traces: &MemorySink) -> Response<Full<Bytes>> {
    traces.clear();
    json_response(StatusCode::OK, &json!({"cleared": true}))
}

fn not_found() -> Response<Full<Bytes>> {
    error_response(StatusCode::NOT_FOUND, "no such admin endpoint")
}

fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(status, &json!({ "error": message }))
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let bytes = serde_json::to_vec(body).unwrap_or_else(|_| b"{}".to_vec());
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(bytes)))
        .expect("static response parts are valid")
}
