//! Field-path expressions over JSON values.
//!
//! Conditions, mappings, and egress transforms all address request fields
//! with the same small grammar: an optional `$` root, dot-separated keys,
//! and `[n]` numeric indices (`user.addresses[0].city`). Lookups return
//! zero-or-one value; writes auto-vivify intermediate containers.

use serde_json::{Map, Value};

/// One step of a parsed field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object key (`.name`).
    Key(String),
    /// Array index (`[0]`).
    Index(usize),
}

/// Parse failure for a field-path expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid field path {path:?}: {reason}")]
pub struct PathError {
    pub path: String,
    pub reason: String,
}

impl PathError {
    fn new(path: &str, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Parse a path expression into segments.
///
/// An empty path or a bare `$` addresses the root and parses to no segments.
pub fn parse(path: &str) -> Result<Vec<Segment>, PathError> {
    let mut rest = path.trim();
    if let Some(stripped) = rest.strip_prefix('$') {
        rest = stripped;
    }
    rest = rest.strip_prefix('.').unwrap_or(rest);

    let mut segments = Vec::new();
    if rest.is_empty() {
        return Ok(segments);
    }

    for part in rest.split('.') {
        if part.is_empty() {
            return Err(PathError::new(path, "empty segment"));
        }
        let (name, mut brackets) = match part.find('[') {
            Some(pos) => (&part[..pos], &part[pos..]),
            None => (part, ""),
        };
        if !name.is_empty() {
            segments.push(Segment::Key(name.to_string()));
        }
        while !brackets.is_empty() {
            if !brackets.starts_with('[') {
                return Err(PathError::new(path, "expected '[' in index expression"));
            }
            let close = brackets
                .find(']')
                .ok_or_else(|| PathError::new(path, "unclosed '['"))?;
            let index_str = &brackets[1..close];
            let index = index_str
                .parse::<usize>()
                .map_err(|_| PathError::new(path, format!("invalid index {index_str:?}")))?;
            segments.push(Segment::Index(index));
            brackets = &brackets[close + 1..];
        }
    }
    Ok(segments)
}

/// Look up the value addressed by `path`. Missing fields are `None`, not an
/// error; only a malformed expression fails.
pub fn get<'a>(root: &'a Value, path: &str) -> Result<Option<&'a Value>, PathError> {
    let segments = parse(path)?;
    let mut current = root;
    for segment in &segments {
        current = match segment {
            Segment::Key(key) => match current.get(key.as_str()) {
                Some(value) => value,
                None => return Ok(None),
            },
            Segment::Index(index) => match current.get(*index) {
                Some(value) => value,
                None => return Ok(None),
            },
        };
    }
    Ok(Some(current))
}

/// Write `new` at `path`, creating intermediate containers as needed.
///
/// Key segments vivify objects, index segments vivify arrays (padded with
/// nulls up to the index). An intermediate that is not the right container
/// kind is replaced wholesale; last write wins.
pub fn set(root: &mut Value, path: &str, new: Value) -> Result<(), PathError> {
    let segments = parse(path)?;
    let Some((last, parents)) = segments.split_last() else {
        *root = new;
        return Ok(());
    };

    let mut current = root;
    for segment in parents {
        current = descend_vivify(current, segment);
    }

    match last {
        Segment::Key(key) => {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            if let Value::Object(map) = current {
                map.insert(key.clone(), new);
            }
        }
        Segment::Index(index) => {
            if !current.is_array() {
                *current = Value::Array(Vec::new());
            }
            if let Value::Array(array) = current {
                if array.len() <= *index {
                    array.resize(*index + 1, Value::Null);
                }
                array[*index] = new;
            }
        }
    }
    Ok(())
}

/// Remove the value addressed by `path`, returning it if it was present.
///
/// Resolves the parent of the final segment; a missing path or a parent of
/// the wrong kind is a no-op. Removing twice equals removing once.
pub fn remove(root: &mut Value, path: &str) -> Result<Option<Value>, PathError> {
    let segments = parse(path)?;
    let Some((last, parents)) = segments.split_last() else {
        // The root itself has no parent to remove it from.
        return Ok(None);
    };

    let mut current = root;
    for segment in parents {
        current = match segment {
            Segment::Key(key) => match current {
                Value::Object(map) => match map.get_mut(key) {
                    Some(value) => value,
                    None => return Ok(None),
                },
                _ => return Ok(None),
            },
            Segment::Index(index) => match current {
                Value::Array(array) => match array.get_mut(*index) {
                    Some(value) => value,
                    None => return Ok(None),
                },
                _ => return Ok(None),
            },
        };
    }

    match last {
        Segment::Key(key) => match current {
            Value::Object(map) => Ok(map.remove(key)),
            _ => Ok(None),
        },
        Segment::Index(index) => match current {
            Value::Array(array) if *index < array.len() => Ok(Some(array.remove(*index))),
            _ => Ok(None),
        },
    }
}

fn descend_vivify<'a>(current: &'a mut Value, segment: &Segment) -> &'a mut Value {
    match segment {
        Segment::Key(key) => {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            match current {
                Value::Object(map) => map.entry(key.clone()).or_insert(Value::Null),
                _ => unreachable!("value was just replaced with an object"),
            }
        }
        Segment::Index(index) => {
            if !current.is_array() {
                *current = Value::Array(Vec::new());
            }
            match current {
                Value::Array(array) => {
                    if array.len() <= *index {
                        array.resize(*index + 1, Value::Null);
                    }
                    &mut array[*index]
                }
                _ => unreachable!("value was just replaced with an array"),
            }
        }
    }
}
