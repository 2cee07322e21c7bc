//! Dotted-path flattening
//!
//! Both the compiler and the validator address properties by dotted paths
//! (`address.street`, `tags.0`). Paths are always built with [`join`] so the
//! two sides agree on the vocabulary.

use indexmap::IndexMap;

use crate::value::Value;

/// Separator between path segments
pub const SEPARATOR: char = '.';

/// Append `key` to an optional prefix
pub fn join(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}{}{}", prefix, SEPARATOR, key),
        _ => key.to_string(),
    }
}

/// Whether `path` lies strictly below `ancestor`
pub fn is_descendant(path: &str, ancestor: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path[ancestor.len()..].starts_with(SEPARATOR)
}

/// Number of segments in a path
pub fn depth(path: &str) -> usize {
    path.split(SEPARATOR).count()
}

/// A single-level view of a nested value
#[derive(Debug, Default)]
pub struct Flattened<'a> {
    entries: IndexMap<String, &'a Value>,
}

impl<'a> Flattened<'a> {
    pub fn get(&self, path: &str) -> Option<&'a Value> {
        self.entries.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Flatten `value` into path → value entries, `max_depth` levels deep.
///
/// Every node is recorded, not only leaves: objects contribute their keys,
/// instances their fields and arrays their indices. The root itself has no
/// path and is not included.
///
/// A key containing the separator names the same path as its nested
/// spelling. When a value carries both, the nested node is kept whatever the
/// key order.
pub fn flatten(value: &Value, max_depth: usize) -> Flattened<'_> {
    let mut flattened = Flattened::default();
    walk(value, None, true, max_depth, &mut flattened.entries);
    flattened
}

fn walk<'a>(
    value: &'a Value,
    prefix: Option<&str>,
    nested: bool,
    remaining: usize,
    entries: &mut IndexMap<String, &'a Value>,
) {
    if remaining == 0 {
        return;
    }

    let mut visit = |key: &str, child: &'a Value| {
        let path = join(prefix, key);
        let nested = nested && !key.contains(SEPARATOR);
        walk(child, Some(&path), nested, remaining - 1, entries);
        // Nested paths are unique, so they may replace a literal dotted key.
        if nested {
            entries.insert(path, child);
        } else {
            entries.entry(path).or_insert(child);
        }
    };

    match value {
        Value::Object(fields) => {
            for (key, child) in fields.iter() {
                visit(key, child);
            }
        }
        Value::Instance(instance) => {
            for (key, child) in instance.fields().iter() {
                visit(key, child);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                visit(&index.to_string(), child);
            }
        }
        _ => {}
    }
}
