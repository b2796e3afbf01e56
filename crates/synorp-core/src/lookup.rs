//! JSON helpers used for change detection

use serde_json::Value;

/// Look up a dotted path such as `backend.port` in a JSON object.
///
/// Returns `None` when the record itself is absent or when any segment of
/// the path is missing. Non-object intermediates also yield `None`.
pub fn lookup<'a>(record: Option<&'a Value>, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(record?, |value, segment| value.get(segment))
}

/// Whether two header lists differ.
///
/// An item counts as a difference if it is missing from either list. Order
/// is ignored and repeated items are not counted, so `[a, a, b]` and
/// `[b, a]` compare equal. Missing or non-array values are treated as empty
/// lists.
pub fn list_different(left: Option<&Value>, right: Option<&Value>) -> bool {
    let left = as_items(left);
    let right = as_items(right);

    left.iter()
        .chain(right.iter())
        .any(|item| !left.contains(item) || !right.contains(item))
}

fn as_items(value: Option<&Value>) -> &[Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
