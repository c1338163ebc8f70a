//! Condition evaluation over a request projection.
//!
//! Routes carry a recursive AND/OR tree of conditions; each leaf extracts
//! one field from the projection `{body, headers, query}` with a field-path
//! expression and compares it to a configured literal. Evaluation is pure.

use crate::fieldpath;
use crate::rules::{Condition, ConditionGroup, ConditionNode, ConditionOperator, GroupKind};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::debug;

/// The slice of a request that conditions and inbound auth see.
///
/// Header keys are lower-cased at construction; query keys and values are
/// URL-decoded.
#[derive(Debug, Clone)]
pub struct RequestProjection {
    pub body: Value,
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
}

impl RequestProjection {
    pub fn new(
        body: Value,
        headers: HashMap<String, String>,
        query: HashMap<String, String>,
    ) -> Self {
        Self {
            body,
            headers,
            query,
        }
    }

    /// Single JSON value for field-path lookups (`body.x`, `headers.x`,
    /// `query.x`).
    pub fn to_value(&self) -> Value {
        json!({
            "body": self.body,
            "headers": self.headers,
            "query": self.query,
        })
    }
}

/// Parse a raw query string into a decoded key/value map.
pub fn parse_query_string(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let decoded_key = urlencoding::decode(key).ok()?.into_owned();
            let decoded_value = urlencoding::decode(value).ok()?.into_owned();
            Some((decoded_key, decoded_value))
        })
        .collect()
}

/// Evaluate a condition tree against the projection value.
///
/// `AND` requires every child to hold, `OR` at least one; an empty tree is
/// vacuously true for both.
pub fn evaluate_group(projection: &Value, group: &ConditionGroup) -> bool {
    if group.conditions.is_empty() {
        return true;
    }
    match group.kind {
        GroupKind::And => group
            .conditions
            .iter()
            .all(|node| evaluate_node(projection, node)),
        GroupKind::Or => group
            .conditions
            .iter()
            .any(|node| evaluate_node(projection, node)),
    }
}

fn evaluate_node(projection: &Value, node: &ConditionNode) -> bool {
    match node {
        ConditionNode::Group(group) => evaluate_group(projection, group),
        ConditionNode::Leaf(condition) => evaluate_condition(projection, condition),
    }
}

/// Evaluate one leaf condition. A malformed path expression makes the
/// condition false rather than failing the request.
pub fn evaluate_condition(projection: &Value, condition: &Condition) -> bool {
    let extracted = match fieldpath::get(projection, &condition.path) {
        Ok(value) => value,
        Err(e) => {
            debug!("condition path rejected: {e}");
            return false;
        }
    };

    match condition.operator {
        ConditionOperator::Eq => scalar_to_string(extracted) == condition.value,
        ConditionOperator::Neq => scalar_to_string(extracted) != condition.value,
        ConditionOperator::Contains => scalar_to_string(extracted).contains(&condition.value),
        ConditionOperator::Gt => match (extract_number(extracted), condition.value.parse::<f64>())
        {
            (Some(left), Ok(right)) => left > right,
            _ => false,
        },
        ConditionOperator::Lt => match (extract_number(extracted), condition.value.parse::<f64>())
        {
            (Some(left), Ok(right)) => left < right,
            _ => false,
        },
        ConditionOperator::Exists => extracted.is_some_and(|v| !v.is_null()),
    }
}

/// String form of an extracted value. An absent or null field stringifies
/// as `"null"`, so `eq` against a non-empty literal never matches absence.
fn scalar_to_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Numeric form of an extracted value: a JSON number, or a string that
/// parses as one. Anything else fails numeric comparisons.
fn extract_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection() -> Value {
        RequestProjection::new(
            json!({"user": {"id": 7, "name": "ada"}, "amount": 25, "note": "hello world"}),
            HashMap::from([
                ("content-type".to_string(), "application/json".to_string()),
                ("x-tenant".to_string(), "acme".to_string()),
            ]),
            HashMap::from([("region".to_string(), "eu".to_string())]),
        )
        .to_value()
    }

    fn leaf(path: &str, operator: ConditionOperator, value: &str) -> ConditionNode {
        ConditionNode::Leaf(Condition {
            path: path.into(),
            operator,
            value: value.into(),
        })
    }

    fn group(kind: GroupKind, conditions: Vec<ConditionNode>) -> ConditionGroup {
        ConditionGroup { kind, conditions }
    }

    #[test]
    fn test_eq_and_neq() {
        let p = projection();
        assert!(evaluate_condition(
            &p,
            &Condition {
                path: "body.user.name".into(),
                operator: ConditionOperator::Eq,
                value: "ada".into()
            }
        ));
        assert!(evaluate_condition(
            &p,
            &Condition {
                path: "body.user.name".into(),
                operator: ConditionOperator::Neq,
                value: "bob".into()
            }
        ));
        // Numbers compare through their string form.
        assert!(evaluate_condition(
            &p,
            &Condition {
                path: "body.user.id".into(),
                operator: ConditionOperator::Eq,
                value: "7".into()
            }
        ));
    }

    #[test]
    fn test_eq_against_absent_field() {
        let p = projection();
        // Absence stringifies as "null": a non-empty literal never matches...
        assert!(!evaluate_condition(
            &p,
            &Condition {
                path: "body.user.email".into(),
                operator: ConditionOperator::Eq,
                value: "x".into()
            }
        ));
        // ...and neq against it holds.
        assert!(evaluate_condition(
            &p,
            &Condition {
                path: "body.user.email".into(),
                operator: ConditionOperator::Neq,
                value: "x".into()
            }
        ));
    }

    #[test]
    fn test_contains() {
        let p = projection();
        assert!(evaluate_condition(
            &p,
            &Condition {
                path: "body.note".into(),
                operator: ConditionOperator::Contains,
                value: "world".into()
            }
        ));
        assert!(!evaluate_condition(
            &p,
            &Condition {
                path: "body.note".into(),
                operator: ConditionOperator::Contains,
                value: "mars".into()
            }
        ));
    }

    #[test]
    fn test_numeric_comparisons() {
        let p = projection();
        assert!(evaluate_condition(
            &p,
            &Condition {
                path: "body.amount".into(),
                operator: ConditionOperator::Gt,
                value: "10".into()
            }
        ));
        assert!(evaluate_condition(
            &p,
            &Condition {
                path: "body.amount".into(),
                operator: ConditionOperator::Lt,
                value: "100".into()
            }
        ));
        // Non-numeric extracted value fails, it does not error.
        assert!(!evaluate_condition(
            &p,
            &Condition {
                path: "body.user.name".into(),
                operator: ConditionOperator::Gt,
                value: "1".into()
            }
        ));
        // Absent field fails numeric comparison.
        assert!(!evaluate_condition(
            &p,
            &Condition {
                path: "body.missing".into(),
                operator: ConditionOperator::Gt,
                value: "0".into()
            }
        ));
        // Numeric strings are compared numerically.
        assert!(evaluate_condition(
            &p,
            &Condition {
                path: "query.region".into(),
                operator: ConditionOperator::Eq,
                value: "eu".into()
            }
        ));
    }

    #[test]
    fn test_exists_matches_presence_not_value() {
        let p = projection();
        assert!(evaluate_condition(
            &p,
            &Condition {
                path: "headers.x-tenant".into(),
                operator: ConditionOperator::Exists,
                value: String::new()
            }
        ));
        assert!(!evaluate_condition(
            &p,
            &Condition {
                path: "headers.x-missing".into(),
                operator: ConditionOperator::Exists,
                value: String::new()
            }
        ));
    }

    #[test]
    fn test_exists_agrees_with_eq_reachability() {
        // `exists` is true iff some eq-against-a-literal could match the
        // extracted value at all.
        let p = projection();
        for path in ["body.user.name", "body.user.email", "query.region"] {
            let exists = evaluate_condition(
                &p,
                &Condition {
                    path: path.into(),
                    operator: ConditionOperator::Exists,
                    value: String::new(),
                },
            );
            let eq_reachable = evaluate_condition(
                &p,
                &Condition {
                    path: path.into(),
                    operator: ConditionOperator::Eq,
                    value: scalar_to_string(fieldpath::get(&p, path).unwrap()),
                },
            ) && fieldpath::get(&p, path).unwrap().is_some();
            assert_eq!(exists, eq_reachable, "diverged for {path}");
        }
    }

    #[test]
    fn test_empty_group_is_vacuously_true() {
        let p = projection();
        assert!(evaluate_group(&p, &group(GroupKind::And, Vec::new())));
        assert!(evaluate_group(&p, &group(GroupKind::Or, Vec::new())));
    }

    #[test]
    fn test_and_or_semantics() {
        let p = projection();
        let hit = leaf("body.user.name", ConditionOperator::Eq, "ada");
        let miss = leaf("body.user.name", ConditionOperator::Eq, "bob");

        assert!(evaluate_group(
            &p,
            &group(GroupKind::And, vec![hit.clone(), hit.clone()])
        ));
        assert!(!evaluate_group(
            &p,
            &group(GroupKind::And, vec![hit.clone(), miss.clone()])
        ));
        assert!(evaluate_group(
            &p,
            &group(GroupKind::Or, vec![miss.clone(), hit.clone()])
        ));
        assert!(!evaluate_group(
            &p,
            &group(GroupKind::Or, vec![miss.clone(), miss])
        ));
    }

    #[test]
    fn test_nested_groups() {
        let p = projection();
        let tree = group(
            GroupKind::And,
            vec![
                leaf("headers.x-tenant", ConditionOperator::Eq, "acme"),
                ConditionNode::Group(group(
                    GroupKind::Or,
                    vec![
                        leaf("body.amount", ConditionOperator::Gt, "1000"),
                        leaf("query.region", ConditionOperator::Eq, "eu"),
                    ],
                )),
            ],
        );
        assert!(evaluate_group(&p, &tree));
    }

    #[test]
    fn test_malformed_path_is_false() {
        let p = projection();
        assert!(!evaluate_condition(
            &p,
            &Condition {
                path: "body..bad".into(),
                operator: ConditionOperator::Exists,
                value: String::new()
            }
        ));
    }

    #[test]
    fn test_parse_query_string_decodes() {
        let query = parse_query_string("a=1&name=hello%20world&flag&empty=");
        assert_eq!(query.get("a").map(String::as_str), Some("1"));
        assert_eq!(query.get("name").map(String::as_str), Some("hello world"));
        assert_eq!(query.get("flag").map(String::as_str), Some(""));
        assert_eq!(query.get("empty").map(String::as_str), Some(""));
    }
}
