//! Ordered set/remove edits applied to the mapped body before forwarding.

use crate::fieldpath;
use crate::rules::{EgressTransform, TransformAction};
use serde_json::Value;
use tracing::debug;

/// Apply the route's egress transforms in list order.
///
/// Works on a copy so the pre-transform body stays available for tracing.
/// `set` writes the configured literal string (vivifying); `remove`
/// deletes the addressed key if its parent exists, otherwise it is a
/// no-op. A malformed path expression skips that single transform.
pub fn apply_egress(body: &Value, transforms: &[EgressTransform]) -> Value {
    let mut output = body.clone();
    for transform in transforms {
        let result = match transform.action {
            TransformAction::Set => fieldpath::set(
                &mut output,
                &transform.path,
                Value::String(transform.value.clone().unwrap_or_default()),
            ),
            TransformAction::Remove => fieldpath::remove(&mut output, &transform.path).map(|_| ()),
        };
        if let Err(e) = result {
            debug!("skipping egress transform: {e}");
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(path: &str, value: &str) -> EgressTransform {
        EgressTransform {
            path: path.into(),
            action: TransformAction::Set,
            value: Some(value.into()),
        }
    }

    fn remove(path: &str) -> EgressTransform {
        EgressTransform {
            path: path.into(),
            action: TransformAction::Remove,
            value: None,
        }
    }

    #[test]
    fn test_set_writes_literal_string() {
        let body = json!({"a": 1});
        let out = apply_egress(&body, &[set("meta.source", "junction")]);
        assert_eq!(out, json!({"a": 1, "meta": {"source": "junction"}}));
    }

    #[test]
    fn test_input_is_not_mutated() {
        let body = json!({"a": 1});
        let _ = apply_egress(&body, &[set("a", "changed"), remove("a")]);
        assert_eq!(body, json!({"a": 1}));
    }

    #[test]
    fn test_remove_deletes_key() {
        let body = json!({"a": 1, "secret": "x"});
        let out = apply_egress(&body, &[remove("secret")]);
        assert_eq!(out, json!({"a": 1}));
    }

    #[test]
    fn test_remove_missing_path_is_noop() {
        let body = json!({"a": 1});
        let out = apply_egress(&body, &[remove("missing.deep")]);
        assert_eq!(out, body);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let body = json!({"a": 1, "b": 2});
        let once = apply_egress(&body, &[remove("b")]);
        let twice = apply_egress(&body, &[remove("b"), remove("b")]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_transforms_apply_in_list_order() {
        let body = json!({});
        // A later remove can depend on an earlier set.
        let out = apply_egress(&body, &[set("tmp.flag", "1"), remove("tmp.flag")]);
        assert_eq!(out, json!({"tmp": {}}));

        // Reversed order leaves the set in place.
        let out = apply_egress(&body, &[remove("tmp.flag"), set("tmp.flag", "1")]);
        assert_eq!(out, json!({"tmp": {"flag": "1"}}));
    }

    #[test]
    fn test_set_without_value_writes_empty_string() {
        let body = json!({});
        let out = apply_egress(
            &body,
            &[EgressTransform {
                path: "flag".into(),
                action: TransformAction::Set,
                value: None,
            }],
        );
        assert_eq!(out, json!({"flag": ""}));
    }

    #[test]
    fn test_malformed_transform_skipped() {
        let body = json!({"a": 1});
        let out = apply_egress(&body, &[set("..bad", "x"), set("ok", "y")]);
        assert_eq!(out, json!({"a": 1, "ok": "y"}));
    }
}
