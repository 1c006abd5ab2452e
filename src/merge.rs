//! Merge-patch application for canonical records.

use serde_json::{Map, Value};

/// Apply `patch` onto `base`, returning a new value.
///
/// - Keys missing from `patch` keep their `base` value.
/// - A `null` base is replaced by the patch value.
/// - Scalars and arrays are replaced wholesale; arrays are never merged
///   element-wise.
/// - Objects merge key by key, recursively. Patch keys unknown to `base` are
///   appended.
/// - A non-object patch value (including `null`) replaces an object base.
///
/// Neither input is modified, and the result owns all of its data.
pub fn merge(base: &Value, patch: &Value) -> Value {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            Value::Object(merge_maps(base_map, patch_map))
        }
        _ => patch.clone(),
    }
}

fn merge_maps(base: &Map<String, Value>, patch: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = Map::with_capacity(base.len() + patch.len());
    for (key, base_value) in base {
        let value = match patch.get(key) {
            Some(patch_value) => merge(base_value, patch_value),
            None => base_value.clone(),
        };
        merged.insert(key.clone(), value);
    }
    for (key, patch_value) in patch {
        if !base.contains_key(key) {
            merged.insert(key.clone(), patch_value.clone());
        }
    }
    merged
}
