//! Dotted-path lookup into JSON request bodies.

use serde_json::Value;

/// Resolve `path` (e.g. `"payment.amount"` or `"items.0.price"`) against
/// `root`. Numeric segments index into arrays. Returns `None` when any
/// segment is missing or the path is empty.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }

    path.split('.').try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}
