//! JSON merge-patch (RFC 7396)

use serde_json::Value;

/// Apply `patch` onto `target` in place.
///
/// Objects merge key by key, `null` removes a key, anything else replaces
/// the target wholesale. Applying the same patch twice gives the same
/// document as applying it once.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };

    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }

    if let Value::Object(target_map) = target {
        for (key, value) in patch_map {
            if value.is_null() {
                target_map.remove(key);
            } else {
                merge_patch(
                    target_map.entry(key.clone()).or_insert(Value::Null),
                    value,
                );
            }
        }
    }
}
