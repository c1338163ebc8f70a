//! Field mapping: copy values from the decoded request body into a fresh
//! target object per the mapping's datamap.

use crate::fieldpath;
use crate::rules::Mapping;
use serde_json::{Map, Value};
use tracing::debug;

/// Build the mapped body for an outbound request.
///
/// Entries are applied in datamap order: the value at `sourceField` is
/// copied to `targetField`, vivifying intermediate containers. Entries
/// whose source is absent are skipped; they neither error nor write a
/// null. Source fields not named by any entry are dropped. When targets
/// overlap, the last write wins. A malformed path expression skips that
/// single entry.
pub fn apply_mapping(source: &Value, mapping: &Mapping) -> Value {
    let mut target = Value::Object(Map::new());
    for entry in &mapping.datamap {
        let value = match fieldpath::get(source, &entry.source_field) {
            Ok(Some(value)) => value.clone(),
            Ok(None) => continue,
            Err(e) => {
                debug!("skipping datamap entry: {e}");
                continue;
            }
        };
        if let Err(e) = fieldpath::set(&mut target, &entry.target_field, value) {
            debug!("skipping datamap entry: {e}");
        }
    }
    target
}
