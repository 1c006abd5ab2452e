//! JSON Schema for update inputs, and validation against it.

use std::fmt;
use std::sync::{Arc, OnceLock};

use jsonschema::Validator;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::descriptor::{FieldDescriptor, Kind, Primitive};
use crate::error::FieldError;
use crate::registry::Binding;
use crate::types::{Envelope, KeyedRendering, Wrapping, DINO_ID_FIELD, USERNAME_FIELD};

/// Build the JSON Schema describing an update input for `binding`.
///
/// Every writable field plus `username` and `dinoId` is optional and
/// nullable. Unknown properties are rejected at every level.
pub fn input_schema(binding: &Binding) -> Value {
    let wrapping = binding.wrapping();
    let mut properties = object_properties(binding.fields(), wrapping);
    let identity = scalar_schema(Primitive::Text, wrapping);
    properties.insert(USERNAME_FIELD.to_string(), identity.clone());
    properties.insert(DINO_ID_FIELD.to_string(), identity);

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": format!("{}Input", binding.name()),
        "type": "object",
        "properties": properties,
        "additionalProperties": false
    })
}

/// Validate an update against the input schema of `binding`.
///
/// The binding's validator is compiled on first use and shared by every
/// clone of the binding.
///
/// # Errors
///
/// Returns every violation found, each with the JSON Pointer of the
/// offending value.
pub fn validate_update(binding: &Binding, update: &Value) -> Result<(), Vec<FieldError>> {
    match binding.input_validator().get(binding) {
        Ok(validator) => collect_errors(validator, update),
        Err(message) => Err(vec![schema_failure(message)]),
    }
}

/// Validate a document against an already-built schema.
pub fn validate_against_schema(schema: &Value, document: &Value) -> Result<(), Vec<FieldError>> {
    let validator =
        jsonschema::validator_for(schema).map_err(|e| vec![schema_failure(&e.to_string())])?;
    collect_errors(&validator, document)
}

/// Lazily compiled input validator of one binding.
#[derive(Clone, Default)]
pub(crate) struct InputValidator(Arc<OnceLock<Result<Validator, String>>>);

impl InputValidator {
    /// The compiled validator for `binding`, compiling it on first call.
    pub(crate) fn get(&self, binding: &Binding) -> Result<&Validator, &str> {
        self.0
            .get_or_init(|| {
                debug!(binding = binding.name(), "compiling input schema");
                jsonschema::validator_for(&input_schema(binding)).map_err(|e| e.to_string())
            })
            .as_ref()
            .map_err(String::as_str)
    }

    pub(crate) fn is_compiled(&self) -> bool {
        self.0.get().is_some()
    }

    #[cfg(test)]
    pub(crate) fn shares(&self, other: &InputValidator) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for InputValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputValidator")
            .field("compiled", &self.is_compiled())
            .finish()
    }
}

fn collect_errors(validator: &Validator, document: &Value) -> Result<(), Vec<FieldError>> {
    let errors: Vec<FieldError> = validator
        .iter_errors(document)
        .map(|e| FieldError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn schema_failure(message: &str) -> FieldError {
    FieldError {
        path: String::new(),
        message: format!("invalid input schema: {message}"),
    }
}

fn object_properties(fields: &[FieldDescriptor], wrapping: Wrapping) -> Map<String, Value> {
    fields
        .iter()
        .filter(|f| f.is_writable())
        .map(|f| (f.view_name.to_string(), field_schema(f, wrapping)))
        .collect()
}

fn field_schema(field: &FieldDescriptor, wrapping: Wrapping) -> Value {
    match field.kind {
        Kind::Scalar(primitive) => scalar_schema(primitive, wrapping),
        Kind::List => {
            let values = json!({
                "type": ["array", "null"],
                "items": { "type": ["string", "null"] }
            });
            wrapped_schema("values", values, wrapping.list)
        }
        Kind::KeyedList => {
            let values = keyed_schema(wrapping.keyed_rendering);
            wrapped_schema("values", values, wrapping.keyed)
        }
        Kind::Group(inner) => json!({
            "type": ["object", "null"],
            "properties": object_properties(inner, wrapping),
            "additionalProperties": false
        }),
        // Relations are filtered out as read-only before this point.
        Kind::Relation(_) => json!(false),
    }
}

fn scalar_schema(primitive: Primitive, wrapping: Wrapping) -> Value {
    let value = json!({ "type": [primitive.schema_type(), "null"] });
    wrapped_schema("value", value, wrapping.scalar)
}

fn keyed_schema(rendering: KeyedRendering) -> Value {
    match rendering {
        KeyedRendering::Map => json!({ "type": ["object", "null"] }),
        KeyedRendering::Pairs => json!({
            "type": ["array", "null"],
            "items": {
                "type": "object",
                "properties": { "key": { "type": "string" }, "value": {} },
                "required": ["key"],
                "additionalProperties": false
            }
        }),
        KeyedRendering::Tuples => json!({
            "type": ["array", "null"],
            "items": { "type": "string", "pattern": "^\\(.*,.*\\)$" }
        }),
    }
}

fn wrapped_schema(key: &str, inner: Value, envelope: Envelope) -> Value {
    match envelope {
        Envelope::Bare => inner,
        Envelope::Display => json!({
            "type": ["object", "null"],
            "properties": {
                key: inner,
                "display": { "type": ["string", "null"] }
            },
            "additionalProperties": false
        }),
    }
}
