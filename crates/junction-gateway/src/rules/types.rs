//! Rule-set data model.
//!
//! These types mirror the documents the authoring layer pushes to the
//! engine: incoming routes (what to claim and how to respond), outgoing
//! routes (where to forward and how to reshape), and field mappings.
//! The engine treats a pushed rule set as a read-only snapshot.

use serde::{Deserialize, Serialize};

/// Method constraint on an incoming route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RouteMethod {
    Get,
    Post,
    Put,
    Delete,
    /// Matches every request method.
    Any,
}

impl RouteMethod {
    /// Exact equality, with `ANY` as a wildcard.
    pub fn matches(&self, method: &hyper::Method) -> bool {
        match self {
            RouteMethod::Get => method == hyper::Method::GET,
            RouteMethod::Post => method == hyper::Method::POST,
            RouteMethod::Put => method == hyper::Method::PUT,
            RouteMethod::Delete => method == hyper::Method::DELETE,
            RouteMethod::Any => true,
        }
    }
}

/// How a matched incoming route answers: forward upstream or synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    #[default]
    Proxy,
    Mock,
}

/// Comparison operator of a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionOperator {
    Eq,
    Neq,
    Contains,
    Gt,
    Lt,
    Exists,
}

/// One predicate over an extracted request field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Field-path expression evaluated against `{body, headers, query}`.
    pub path: String,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: String,
}

/// Boolean combinator of a condition group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GroupKind {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

/// Recursive AND/OR tree of conditions. An empty tree is vacuously true.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionGroup {
    #[serde(rename = "type", default)]
    pub kind: GroupKind,
    /// Required on the wire: the presence of `conditions` is what
    /// distinguishes a nested group from a leaf condition.
    pub conditions: Vec<ConditionNode>,
}

impl Default for ConditionGroup {
    fn default() -> Self {
        Self {
            kind: GroupKind::And,
            conditions: Vec::new(),
        }
    }
}

/// A child of a condition group: either a leaf or a nested group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionNode {
    Group(ConditionGroup),
    Leaf(Condition),
}

/// Where an api-key credential travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyLocation {
    Header,
    Query,
}

/// Caller-credential policy of an incoming route.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum IncomingAuth {
    #[default]
    None,
    ApiKey {
        location: KeyLocation,
        param_name: String,
        allowed_keys: Vec<String>,
    },
    Bearer {
        allowed_tokens: Vec<String>,
    },
}

/// Credentials injected into a forwarded request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum OutgoingAuth {
    #[default]
    None,
    ApiKey {
        location: KeyLocation,
        param_name: String,
        api_key: String,
    },
    Bearer {
        token: String,
    },
    Basic {
        username: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },
}

/// One header of a mock response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockHeader {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

fn default_mock_status() -> u16 {
    200
}

/// A rule describing which inbound requests it claims and how to respond.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingRoute {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Path template; `:name` segments match one path component.
    pub path: String,
    pub method: RouteMethod,
    #[serde(default)]
    pub conditions: ConditionGroup,
    #[serde(default)]
    pub authentication: IncomingAuth,
    #[serde(default)]
    pub response_mode: ResponseMode,
    /// Target for `proxy` mode. Dangling references are a per-request
    /// configuration error, not a load-time one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outgoing_route_id: Option<String>,
    #[serde(default = "default_mock_status")]
    pub mock_status: u16,
    #[serde(default)]
    pub mock_headers: Vec<MockHeader>,
    #[serde(default)]
    pub mock_body: String,
}

/// Post-mapping edit applied to the outbound body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EgressTransform {
    pub path: String,
    pub action: TransformAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformAction {
    Set,
    Remove,
}

/// A target endpoint plus the reshaping applied when forwarding to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingRoute {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// May contain `:param` placeholders, substituted from the original
    /// request's query string.
    pub target_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping_id: Option<String>,
    #[serde(default)]
    pub egress_transforms: Vec<EgressTransform>,
    #[serde(default)]
    pub authentication: OutgoingAuth,
}

/// One source→target field correspondence. The type fields are advisory
/// metadata from the authoring layer; no runtime coercion is performed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatamapEntry {
    pub source_field: String,
    #[serde(default)]
    pub source_type: String,
    pub target_field: String,
    #[serde(default)]
    pub target_type: String,
}

/// A field-to-field correspondence table used to reshape a request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub datamap: Vec<DatamapEntry>,
}

/// The complete snapshot pushed by the authoring layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSet {
    #[serde(default)]
    pub mappings: Vec<Mapping>,
    #[serde(default)]
    pub incoming_routes: Vec<IncomingRoute>,
    #[serde(default)]
    pub outgoing_routes: Vec<OutgoingRoute>,
}
