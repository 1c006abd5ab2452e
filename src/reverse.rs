//! Reverse projection of partial view updates into canonical patches.
//!
//! Only fields present in the update produce patch entries. Each entry has
//! the canonical wrapper shape (`{value, metadata: {display}}` and friends) so
//! it can be merged straight onto a fetched record with [`crate::merge`].
//! Unknown and read-only fields are rejected; they never reach the patch.

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::descriptor::{find, FieldDescriptor, Kind};
use crate::error::PatchError;
use crate::merge::merge;
use crate::registry::Binding;
use crate::tuple::parse_tuple;
use crate::types::{
    json_type_name, Envelope, KeyedRendering, Wrapping, DINO_ID_FIELD, USERNAMES_FIELD,
    USERNAME_FIELD, USERNAME_PROVIDER_KEY,
};

/// Turn a partial view update into a canonical-shaped patch.
///
/// `dinoId` is derived and silently ignored. `username` writes the primary
/// username under `usernames.values.mozilliansorg`; its view-side display is
/// a fixed literal and is not written back. A non-null `username` sent
/// alongside `usernames: null` wins over the clear: the patch sets only the
/// primary username, and other providers on the stored record are kept.
///
/// # Errors
///
/// Returns `PatchError` if the update is not an object, names a field the
/// binding does not expose, writes a relation, or has the wrong shape for a
/// field's wrapping mode.
pub fn to_patch(update: &Value, binding: &Binding) -> Result<Value, PatchError> {
    let entries = update.as_object().ok_or_else(|| PatchError::NotAnObject {
        actual: json_type_name(update).to_string(),
    })?;

    for key in entries.keys() {
        if key != USERNAME_FIELD && key != DINO_ID_FIELD && find(binding.fields(), key).is_none() {
            return Err(PatchError::UnknownField { field: key.clone() });
        }
    }

    let wrapping = binding.wrapping();
    let mut patch = Map::new();
    for field in binding.fields() {
        let Some(value) = entries.get(field.view_name) else {
            continue;
        };
        debug!(field = field.view_name, "reverse mapping field");
        patch.insert(
            field.canonical_name().into_owned(),
            reverse_value(value, field, wrapping, field.view_name)?,
        );
    }

    if let Some(username) = entries.get(USERNAME_FIELD) {
        if let Some(usernames) = username_patch(username, wrapping)? {
            let combined = match patch.get(USERNAMES_FIELD) {
                Some(Value::Null) if usernames["values"][USERNAME_PROVIDER_KEY].is_null() => {
                    Value::Null
                }
                Some(existing) => merge(existing, &usernames),
                None => usernames,
            };
            patch.insert(USERNAMES_FIELD.to_string(), combined);
        }
    }

    Ok(Value::Object(patch))
}

fn reverse_value(
    value: &Value,
    field: &FieldDescriptor,
    wrapping: Wrapping,
    path: &str,
) -> Result<Value, PatchError> {
    if !field.is_writable() {
        return Err(PatchError::ReadOnlyField {
            field: path.to_string(),
        });
    }
    if value.is_null() {
        return Ok(Value::Null);
    }

    match field.kind {
        Kind::Scalar(_) => match wrapping.scalar {
            Envelope::Bare => {
                expect_scalar(value, path)?;
                Ok(json!({ "value": value }))
            }
            Envelope::Display => {
                let wrapper = expect_object(value, path)?;
                let mut out = Map::new();
                if let Some(inner) = wrapper.get("value") {
                    expect_scalar(inner, &format!("{path}.value"))?;
                    out.insert("value".to_string(), inner.clone());
                }
                insert_display(&mut out, wrapper, wrapping, path)?;
                Ok(Value::Object(out))
            }
        },
        Kind::List => match wrapping.list {
            Envelope::Bare => Ok(json!({ "values": expect_list(value, path)? })),
            Envelope::Display => {
                let wrapper = expect_object(value, path)?;
                let mut out = Map::new();
                if let Some(values) = wrapper.get("values") {
                    let values = if values.is_null() {
                        Value::Null
                    } else {
                        expect_list(values, &format!("{path}.values"))?
                    };
                    out.insert("values".to_string(), values);
                }
                insert_display(&mut out, wrapper, wrapping, path)?;
                Ok(Value::Object(out))
            }
        },
        Kind::KeyedList => match wrapping.keyed {
            Envelope::Bare => Ok(json!({
                "values": unrender_keyed(value, wrapping.keyed_rendering, path)?
            })),
            Envelope::Display => {
                let wrapper = expect_object(value, path)?;
                let mut out = Map::new();
                if let Some(values) = wrapper.get("values") {
                    let values = unrender_keyed(
                        values,
                        wrapping.keyed_rendering,
                        &format!("{path}.values"),
                    )?;
                    out.insert("values".to_string(), values);
                }
                insert_display(&mut out, wrapper, wrapping, path)?;
                Ok(Value::Object(out))
            }
        },
        Kind::Group(inner) => {
            let entries = expect_object(value, path)?;
            for key in entries.keys() {
                if find(inner, key).is_none() {
                    return Err(PatchError::UnknownField {
                        field: format!("{path}.{key}"),
                    });
                }
            }
            let mut out = Map::new();
            for inner_field in inner {
                if let Some(inner_value) = entries.get(inner_field.view_name) {
                    let inner_path = format!("{path}.{}", inner_field.view_name);
                    out.insert(
                        inner_field.canonical_name().into_owned(),
                        reverse_value(inner_value, inner_field, wrapping, &inner_path)?,
                    );
                }
            }
            Ok(Value::Object(out))
        }
        Kind::Relation(_) => Err(PatchError::ReadOnlyField {
            field: path.to_string(),
        }),
    }
}

fn username_patch(username: &Value, wrapping: Wrapping) -> Result<Option<Value>, PatchError> {
    let value = match wrapping.scalar {
        Envelope::Bare => username.clone(),
        Envelope::Display if username.is_null() => Value::Null,
        Envelope::Display => match expect_object(username, USERNAME_FIELD)?.get("value") {
            Some(value) => value.clone(),
            None => return Ok(None),
        },
    };
    expect_scalar(&value, USERNAME_FIELD)?;
    Ok(Some(json!({
        "values": { USERNAME_PROVIDER_KEY: value }
    })))
}

/// Copy `display` from a view wrapper into `metadata.display`, if supplied.
fn insert_display(
    out: &mut Map<String, Value>,
    wrapper: &Map<String, Value>,
    wrapping: Wrapping,
    path: &str,
) -> Result<(), PatchError> {
    let display = match wrapper.get("display") {
        None => return Ok(()),
        Some(Value::Null) => Value::Null,
        Some(Value::String(s)) => Value::String(wrapping.display.invert(s)),
        Some(other) => {
            return Err(invalid(
                &format!("{path}.display"),
                "string or null",
                other,
            ))
        }
    };
    out.insert("metadata".to_string(), json!({ "display": display }));
    Ok(())
}

/// Fold a rendered keyed list back into its canonical mapping.
fn unrender_keyed(value: &Value, rendering: KeyedRendering, path: &str) -> Result<Value, PatchError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match rendering {
        KeyedRendering::Map => Ok(Value::Object(expect_object(value, path)?.clone())),
        KeyedRendering::Pairs => {
            let items = value
                .as_array()
                .ok_or_else(|| invalid(path, "array of {key, value}", value))?;
            let mut map = Map::new();
            for item in items {
                let key = item
                    .get("key")
                    .and_then(Value::as_str)
                    .ok_or_else(|| invalid(path, "{key, value} with a string key", item))?;
                let entry = item.get("value").cloned().unwrap_or(Value::Null);
                map.insert(key.to_string(), entry);
            }
            Ok(Value::Object(map))
        }
        KeyedRendering::Tuples => {
            let items = value
                .as_array()
                .ok_or_else(|| invalid(path, "array of \"(key,value)\" strings", value))?;
            let mut map = Map::new();
            for item in items {
                let (key, entry) = item
                    .as_str()
                    .and_then(parse_tuple)
                    .ok_or_else(|| invalid(path, "\"(key,value)\" string", item))?;
                map.insert(key, entry);
            }
            Ok(Value::Object(map))
        }
    }
}

fn expect_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, PatchError> {
    value.as_object().ok_or_else(|| invalid(path, "object", value))
}

fn expect_list(value: &Value, path: &str) -> Result<Value, PatchError> {
    match value {
        Value::Array(_) => Ok(value.clone()),
        other => Err(invalid(path, "array", other)),
    }
}

fn expect_scalar(value: &Value, path: &str) -> Result<(), PatchError> {
    match value {
        Value::Array(_) | Value::Object(_) => Err(invalid(path, "scalar", value)),
        _ => Ok(()),
    }
}

fn invalid(path: &str, expected: &str, actual: &Value) -> PatchError {
    PatchError::InvalidShape {
        field: path.to_string(),
        expected: expected.to_string(),
        actual: json_type_name(actual).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{EDITABLE_FIELDS, PROFILE_FIELDS};
    use crate::types::DisplayTransform;

    fn display_binding() -> Binding {
        Binding::new(
            "displayProfile",
            EDITABLE_FIELDS,
            Wrapping::display().display_transform(DisplayTransform::Uppercase),
        )
    }

    #[test]
    fn absent_fields_produce_no_entries() {
        let update = json!({ "firstName": { "value": "Ana", "display": "PUBLIC" } });
        let patch = to_patch(&update, &display_binding()).unwrap();
        assert_eq!(
            patch,
            json!({ "first_name": { "value": "Ana", "metadata": { "display": "public" } } })
        );
    }

    #[test]
    fn partial_wrapper_carries_only_supplied_keys() {
        let update = json!({ "pronouns": { "display": "staff" } });
        let patch = to_patch(&update, &display_binding()).unwrap();
        assert_eq!(patch, json!({ "pronouns": { "metadata": { "display": "staff" } } }));

        let update = json!({ "pronouns": { "value": "they/them" } });
        let patch = to_patch(&update, &display_binding()).unwrap();
        assert_eq!(patch, json!({ "pronouns": { "value": "they/them" } }));
    }

    #[test]
    fn null_field_clears() {
        let update = json!({ "timezone": null });
        let patch = to_patch(&update, &display_binding()).unwrap();
        assert_eq!(patch, json!({ "timezone": null }));
    }

    #[test]
    fn keyed_list_and_list() {
        let update = json!({
            "phoneNumbers": { "values": { "work": "+1" }, "display": "STAFF" },
            "tags": { "values": ["rust"] }
        });
        let patch = to_patch(&update, &display_binding()).unwrap();
        assert_eq!(
            patch,
            json!({
                "phone_numbers": { "values": { "work": "+1" }, "metadata": { "display": "staff" } },
                "tags": { "values": ["rust"] }
            })
        );
    }

    #[test]
    fn group_keys_converted() {
        let update = json!({
            "staffInformation": { "costCenter": { "value": "42", "display": "STAFF" } }
        });
        let patch = to_patch(&update, &display_binding()).unwrap();
        assert_eq!(
            patch,
            json!({
                "staff_information": {
                    "cost_center": { "value": "42", "metadata": { "display": "staff" } }
                }
            })
        );
    }

    #[test]
    fn username_writes_fixed_provider_key() {
        let update = json!({
            "usernames": { "values": { "github": "ana-gh" }, "display": "PUBLIC" },
            "username": { "value": "ana", "display": "publlic" }
        });
        let patch = to_patch(&update, &display_binding()).unwrap();
        assert_eq!(
            patch,
            json!({
                "usernames": {
                    "values": { "github": "ana-gh", "mozilliansorg": "ana" },
                    "metadata": { "display": "public" }
                }
            })
        );
    }

    #[test]
    fn username_overrides_usernames_clear() {
        let update = json!({ "usernames": null, "username": { "value": "ana" } });
        let patch = to_patch(&update, &display_binding()).unwrap();
        assert_eq!(patch, json!({ "usernames": { "values": { "mozilliansorg": "ana" } } }));

        let update = json!({ "usernames": null, "username": { "value": null } });
        let patch = to_patch(&update, &display_binding()).unwrap();
        assert_eq!(patch, json!({ "usernames": null }));
    }

    #[test]
    fn dino_id_is_ignored() {
        let update = json!({ "dinoId": { "value": "x", "display": "public" } });
        let patch = to_patch(&update, &display_binding()).unwrap();
        assert_eq!(patch, json!({}));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = to_patch(&json!({ "nickname": "a" }), &display_binding()).unwrap_err();
        assert!(matches!(err, PatchError::UnknownField { field } if field == "nickname"));

        let update = json!({ "staffInformation": { "shoeSize": { "value": "9" } } });
        let err = to_patch(&update, &display_binding()).unwrap_err();
        assert!(
            matches!(err, PatchError::UnknownField { field } if field == "staffInformation.shoeSize")
        );
    }

    #[test]
    fn relations_are_read_only() {
        let binding = Binding::new("profile", PROFILE_FIELDS, Wrapping::bare());
        let err = to_patch(&json!({ "manager": null }), &binding).unwrap_err();
        assert!(matches!(err, PatchError::ReadOnlyField { .. }));
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        let err = to_patch(&json!({ "firstName": "Ana" }), &display_binding()).unwrap_err();
        assert!(matches!(err, PatchError::InvalidShape { ref expected, .. } if expected == "object"));

        let err = to_patch(&json!([]), &display_binding()).unwrap_err();
        assert!(matches!(err, PatchError::NotAnObject { .. }));
    }

    #[test]
    fn bare_bindings_take_raw_values() {
        let binding = Binding::new(
            "tupleProfile",
            EDITABLE_FIELDS,
            Wrapping::bare().keyed_rendering(KeyedRendering::Tuples),
        );
        let update = json!({
            "firstName": "Ana",
            "uris": ["(blog,https://ana.dev)", "(old,null)"],
            "username": "ana"
        });
        let patch = to_patch(&update, &binding).unwrap();
        assert_eq!(
            patch,
            json!({
                "first_name": { "value": "Ana" },
                "uris": { "values": { "blog": "https://ana.dev", "old": null } },
                "usernames": { "values": { "mozilliansorg": "ana" } }
            })
        );
    }

    #[test]
    fn pairs_fold_into_mapping() {
        let binding = Binding::new(
            "keyValueProfile",
            EDITABLE_FIELDS,
            Wrapping::display().keyed_rendering(KeyedRendering::Pairs),
        );
        let update = json!({
            "sshPublicKeys": { "values": [{ "key": "laptop", "value": "ssh-ed25519 AAA" }] }
        });
        let patch = to_patch(&update, &binding).unwrap();
        assert_eq!(
            patch,
            json!({ "ssh_public_keys": { "values": { "laptop": "ssh-ed25519 AAA" } } })
        );
    }
}
