//! Projection of canonical profile records into view records.
//!
//! Walks a binding's descriptor table in order and emits one view field per
//! descriptor, wrapped according to the binding's [`Wrapping`]. Missing or
//! `null` canonical fields never fail; they project to the empty form of
//! their kind.

use serde_json::{json, Map, Value};
use tracing::trace;

use crate::case::to_view;
use crate::descriptor::{FieldDescriptor, Kind, Relation};
use crate::registry::Binding;
use crate::tuple::format_tuple;
use crate::types::{
    Envelope, KeyedRendering, Wrapping, DINO_ID_DISPLAY, DINO_ID_FIELD, DINO_ID_POINTER,
    USERNAME_DISPLAY, USERNAME_FIELD, USERNAME_POINTER,
};

/// Project a canonical record into the view shape of `binding`.
///
/// `related` is the related-profiles record (`{manager, directs}`) for
/// bindings that expose relation fields; pass `None` when it is not
/// available and relation fields project as `null` / `[]`.
pub fn project(canonical: &Value, related: Option<&Value>, binding: &Binding) -> Value {
    let wrapping = binding.wrapping();
    let mut view = project_fields(canonical, related, binding.fields(), wrapping);

    let username = canonical.pointer(USERNAME_POINTER).cloned();
    view.insert(
        USERNAME_FIELD.to_string(),
        synthesized(username, USERNAME_DISPLAY, wrapping),
    );
    let dino_id = canonical.pointer(DINO_ID_POINTER).cloned();
    view.insert(
        DINO_ID_FIELD.to_string(),
        synthesized(dino_id, DINO_ID_DISPLAY, wrapping),
    );

    Value::Object(view)
}

/// Project a single related profile (`snake_case` keys) into view names.
///
/// Returns `Null` for anything that is not an object.
pub fn project_related(profile: &Value) -> Value {
    match profile {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (to_view(k), v.clone()))
                .collect(),
        ),
        _ => Value::Null,
    }
}

fn project_fields(
    source: &Value,
    related: Option<&Value>,
    fields: &[FieldDescriptor],
    wrapping: Wrapping,
) -> Map<String, Value> {
    let mut view = Map::new();
    for field in fields {
        trace!(field = field.view_name, kind = field.kind.name(), "mapping field");
        let value = match field.kind {
            Kind::Relation(relation) => project_relation(related, relation),
            _ => {
                let canonical = source
                    .get(field.canonical_name().as_ref())
                    .filter(|v| !v.is_null());
                match canonical {
                    Some(value) => project_value(value, field, wrapping),
                    None => empty_form(field, wrapping),
                }
            }
        };
        view.insert(field.view_name.to_string(), value);
    }
    view
}

fn project_value(value: &Value, field: &FieldDescriptor, wrapping: Wrapping) -> Value {
    match field.kind {
        Kind::Scalar(_) => {
            let inner = value.get("value").cloned().unwrap_or(Value::Null);
            wrap(inner, "value", display_of(value, wrapping), wrapping.scalar)
        }
        Kind::List => {
            let values = match value.get("values") {
                Some(Value::Array(items)) => Value::Array(items.clone()),
                _ => Value::Array(Vec::new()),
            };
            wrap(values, "values", display_of(value, wrapping), wrapping.list)
        }
        Kind::KeyedList => {
            let values = match value.get("values") {
                Some(Value::Object(map)) => render_keyed(map, wrapping.keyed_rendering),
                _ => Value::Null,
            };
            wrap(values, "values", display_of(value, wrapping), wrapping.keyed)
        }
        Kind::Group(inner) => Value::Object(project_fields(value, None, inner, wrapping)),
        Kind::Relation(_) => Value::Null,
    }
}

fn empty_form(field: &FieldDescriptor, wrapping: Wrapping) -> Value {
    match field.kind {
        Kind::Scalar(_) => wrap(Value::Null, "value", Value::Null, wrapping.scalar),
        Kind::List => wrap(Value::Array(Vec::new()), "values", Value::Null, wrapping.list),
        Kind::KeyedList => wrap(Value::Null, "values", Value::Null, wrapping.keyed),
        Kind::Group(inner) => Value::Object(
            inner
                .iter()
                .map(|f| (f.view_name.to_string(), empty_form(f, wrapping)))
                .collect(),
        ),
        Kind::Relation(Relation::Manager) => Value::Null,
        Kind::Relation(Relation::Directs) => Value::Array(Vec::new()),
    }
}

fn project_relation(related: Option<&Value>, relation: Relation) -> Value {
    let entry = related
        .and_then(|r| r.get(relation.key()))
        .filter(|v| !v.is_null());
    match (relation, entry) {
        (Relation::Manager, Some(manager)) => project_related(manager),
        (Relation::Directs, Some(Value::Array(directs))) => {
            Value::Array(directs.iter().map(project_related).collect())
        }
        (Relation::Manager, _) => Value::Null,
        (Relation::Directs, _) => Value::Array(Vec::new()),
    }
}

fn render_keyed(map: &Map<String, Value>, rendering: KeyedRendering) -> Value {
    match rendering {
        KeyedRendering::Map => Value::Object(map.clone()),
        KeyedRendering::Pairs => Value::Array(
            map.iter()
                .map(|(k, v)| json!({ "key": k, "value": v }))
                .collect(),
        ),
        KeyedRendering::Tuples => Value::Array(
            map.iter()
                .map(|(k, v)| Value::String(format_tuple(k, v)))
                .collect(),
        ),
    }
}

/// Transformed `metadata.display` of a canonical field, or `Null`.
fn display_of(value: &Value, wrapping: Wrapping) -> Value {
    value
        .get("metadata")
        .and_then(|m| m.get("display"))
        .and_then(Value::as_str)
        .map(|d| Value::String(wrapping.display.apply(d)))
        .unwrap_or(Value::Null)
}

fn wrap(inner: Value, key: &str, display: Value, envelope: Envelope) -> Value {
    match envelope {
        Envelope::Bare => inner,
        Envelope::Display => {
            let mut wrapped = Map::new();
            wrapped.insert(key.to_string(), inner);
            wrapped.insert("display".to_string(), display);
            Value::Object(wrapped)
        }
    }
}

/// Synthesized identity fields carry a fixed display literal, untransformed.
fn synthesized(value: Option<Value>, display: &str, wrapping: Wrapping) -> Value {
    let value = value.unwrap_or(Value::Null);
    wrap(
        value,
        "value",
        Value::String(display.to_string()),
        wrapping.scalar,
    )
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

    fn raw_binding() -> Binding {
        Binding::new("profile", PROFILE_FIELDS, Wrapping::bare())
    }

    #[test]
    fn scalar_wrapped_with_transformed_display() {
        let canonical = json!({
            "first_name": { "value": "Ana", "metadata": { "display": "staff" } }
        });
        let view = project(&canonical, None, &display_binding());
        assert_eq!(view["firstName"], json!({ "value": "Ana", "display": "STAFF" }));
    }

    #[test]
    fn scalar_bare_drops_metadata() {
        let canonical = json!({
            "active": { "value": true, "metadata": { "display": "staff" } }
        });
        let view = project(&canonical, None, &raw_binding());
        assert_eq!(view["active"], json!(true));
    }

    #[test]
    fn false_scalar_is_kept() {
        let canonical = json!({
            "active": { "value": false, "metadata": { "display": "staff" } }
        });
        let view = project(&canonical, None, &display_binding());
        assert_eq!(view["active"]["value"], json!(false));
    }

    #[test]
    fn empty_forms_per_kind() {
        let view = project(&json!({}), None, &display_binding());
        assert_eq!(view["lastName"], json!({ "value": null, "display": null }));
        assert_eq!(view["tags"], json!({ "values": [], "display": null }));
        assert_eq!(view["uris"], json!({ "values": null, "display": null }));
        assert_eq!(
            view["staffInformation"]["costCenter"],
            json!({ "value": null, "display": null })
        );

        let view = project(&json!({ "tags": null }), None, &raw_binding());
        assert_eq!(view["tags"], json!([]));
        assert_eq!(view["uris"], Value::Null);
        assert_eq!(view["lastName"], Value::Null);
    }

    #[test]
    fn keyed_list_renderings() {
        let canonical = json!({
            "uris": {
                "values": { "blog": "https://ana.dev", "age": 7 },
                "metadata": { "display": "public" }
            }
        });

        let pairs = Binding::new(
            "pairs",
            EDITABLE_FIELDS,
            Wrapping::display().keyed_rendering(KeyedRendering::Pairs),
        );
        let view = project(&canonical, None, &pairs);
        assert_eq!(
            view["uris"],
            json!({
                "values": [
                    { "key": "blog", "value": "https://ana.dev" },
                    { "key": "age", "value": 7 }
                ],
                "display": "public"
            })
        );

        let tuples = Binding::new(
            "tuples",
            EDITABLE_FIELDS,
            Wrapping::bare().keyed_rendering(KeyedRendering::Tuples),
        );
        let view = project(&canonical, None, &tuples);
        assert_eq!(view["uris"], json!(["(blog,https://ana.dev)", "(age,7)"]));
    }

    #[test]
    fn group_fields_are_converted_and_wrapped() {
        let canonical = json!({
            "staff_information": {
                "cost_center": { "value": "1234", "metadata": { "display": "staff" } },
                "staff": { "value": true, "metadata": { "display": "public" } }
            },
            "access_information": {
                "mozilliansorg": { "values": { "nda": null }, "metadata": { "display": "ndaed" } }
            }
        });
        let view = project(&canonical, None, &display_binding());
        assert_eq!(
            view["staffInformation"]["costCenter"],
            json!({ "value": "1234", "display": "STAFF" })
        );
        assert_eq!(
            view["staffInformation"]["team"],
            json!({ "value": null, "display": null })
        );
        assert_eq!(
            view["accessInformation"]["mozilliansorg"],
            json!({ "values": { "nda": null }, "display": "NDAED" })
        );
    }

    #[test]
    fn relations_are_camel_cased() {
        let related = json!({
            "manager": { "user_id": "m1", "first_name": "Mia" },
            "directs": [{ "user_id": "d1", "fun_title": "Wizard" }]
        });
        let view = project(&json!({}), Some(&related), &raw_binding());
        assert_eq!(view["manager"], json!({ "userId": "m1", "firstName": "Mia" }));
        assert_eq!(view["directs"], json!([{ "userId": "d1", "funTitle": "Wizard" }]));
    }

    #[test]
    fn missing_identity_paths_project_null() {
        let view = project(&json!({ "usernames": null }), None, &raw_binding());
        assert_eq!(view["username"], Value::Null);
        assert_eq!(view["dinoId"], Value::Null);

        let view = project(&json!({}), None, &display_binding());
        assert_eq!(view["username"], json!({ "value": null, "display": "publlic" }));
    }

    #[test]
    fn view_keys_follow_table_order() {
        let view = project(&json!({}), None, &raw_binding());
        let keys: Vec<&str> = view.as_object().unwrap().keys().map(String::as_str).collect();
        let mut expected: Vec<&str> = PROFILE_FIELDS.iter().map(|f| f.view_name).collect();
        expected.extend(["username", "dinoId"]);
        assert_eq!(keys, expected);
    }
}
