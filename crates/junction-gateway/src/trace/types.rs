//! Trace record types.
//!
//! One record is created per handled request, regardless of outcome, and
//! is immutable once emitted. Records carry route and mapping ids plus
//! names (not embedded copies of the rule objects), so they stay
//! meaningful after a rule-set swap.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// The request as the gateway saw it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracedRequest {
    pub url: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: Value,
}

/// The response the gateway returned to the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracedResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// The structured audit entry for one handled request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceRecord {
    pub id: String,
    /// RFC 3339 creation time.
    pub timestamp: String,
    pub request: TracedRequest,
    pub response: TracedResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incoming_route_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incoming_route_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outgoing_route_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outgoing_route_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping_id: Option<String>,
    /// Outbound body after mapping and egress transforms, for proxy mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_after_transforms: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TraceRecord {
    /// Start a record for a freshly captured request.
    pub fn begin(request: TracedRequest) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            request,
            response: TracedResponse::default(),
            incoming_route_id: None,
            incoming_route_name: None,
            outgoing_route_id: None,
            outgoing_route_name: None,
            mapping_id: None,
            body_after_transforms: None,
            error: None,
        }
    }
}
