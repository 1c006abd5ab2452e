//! View bindings and the registry that holds them.
//!
//! A [`Binding`] pairs a descriptor table with a [`Wrapping`] under the name
//! of the operation that serves it. The registry is filled once at start-up
//! and only read afterwards; share it behind an `Arc`.

use std::collections::HashMap;
use std::collections::HashSet;

use serde::Serialize;

use crate::case::{is_invertible, to_canonical};
use crate::descriptor::{walk, FieldDescriptor, Kind, EDITABLE_FIELDS, PROFILE_FIELDS};
use crate::error::RegistryError;
use crate::schema::InputValidator;
use crate::types::{DisplayTransform, KeyedRendering, Wrapping};

/// Raw profile query, with manager and direct reports.
pub const PROFILE: &str = "profile";
/// Display-wrapped profile query and the update mutation.
pub const DISPLAY_PROFILE: &str = "displayProfile";
/// Display-wrapped profile with keyed lists as `{key, value}` pairs.
pub const KEY_VALUE_PROFILE: &str = "keyValueProfile";
/// Raw profile with keyed lists as `"(key,value)"` strings.
pub const TUPLE_PROFILE: &str = "tupleProfile";

/// One client-facing view shape.
#[derive(Debug, Clone)]
pub struct Binding {
    name: String,
    fields: &'static [FieldDescriptor],
    wrapping: Wrapping,
    input: InputValidator,
}

impl Binding {
    pub fn new(name: impl Into<String>, fields: &'static [FieldDescriptor], wrapping: Wrapping) -> Self {
        Self {
            name: name.into(),
            fields,
            wrapping,
            input: InputValidator::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &'static [FieldDescriptor] {
        self.fields
    }

    pub fn wrapping(&self) -> Wrapping {
        self.wrapping
    }

    pub(crate) fn input_validator(&self) -> &InputValidator {
        &self.input
    }

    /// Whether projecting this binding needs the related-profiles record.
    pub fn has_relations(&self) -> bool {
        self.fields
            .iter()
            .any(|f| matches!(f.kind, Kind::Relation(_)))
    }

    /// Serializable overview for listings.
    pub fn summary(&self) -> BindingSummary {
        BindingSummary {
            name: self.name.clone(),
            wrapping: self.wrapping,
            fields: self.fields.iter().map(FieldSummary::from).collect(),
        }
    }
}

/// Listing form of a binding.
#[derive(Debug, Clone, Serialize)]
pub struct BindingSummary {
    pub name: String,
    pub wrapping: Wrapping,
    pub fields: Vec<FieldSummary>,
}

/// Listing form of a field descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct FieldSummary {
    pub name: String,
    pub canonical: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldSummary>,
}

impl From<&FieldDescriptor> for FieldSummary {
    fn from(field: &FieldDescriptor) -> Self {
        let fields = match field.kind {
            Kind::Group(inner) => inner.iter().map(FieldSummary::from).collect(),
            _ => Vec::new(),
        };
        Self {
            name: field.view_name.to_string(),
            canonical: field.canonical_name().into_owned(),
            kind: field.kind.name(),
            fields,
        }
    }
}

/// Immutable set of named bindings.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    bindings: HashMap<String, Binding>,
    order: Vec<String>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in bindings: `profile`, `displayProfile`, `keyValueProfile`
    /// and `tupleProfile`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` if a built-in table breaks a registry rule.
    pub fn standard() -> Result<Self, RegistryError> {
        Self::new()
            .register(Binding::new(PROFILE, PROFILE_FIELDS, Wrapping::bare()))?
            .register(Binding::new(
                DISPLAY_PROFILE,
                EDITABLE_FIELDS,
                Wrapping::display().display_transform(DisplayTransform::Uppercase),
            ))?
            .register(Binding::new(
                KEY_VALUE_PROFILE,
                EDITABLE_FIELDS,
                Wrapping::display().keyed_rendering(KeyedRendering::Pairs),
            ))?
            .register(Binding::new(
                TUPLE_PROFILE,
                EDITABLE_FIELDS,
                Wrapping::bare().keyed_rendering(KeyedRendering::Tuples),
            ))
    }

    /// Add a binding.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateBinding` if the name is taken,
    /// `RegistryError::DuplicateField` if a table declares a name twice at the
    /// same level, and `RegistryError::NonInvertibleName` if a derived field
    /// name does not survive the view -> canonical -> view round trip. The
    /// binding's input validator is compiled here; a schema that fails to
    /// compile is `RegistryError::InputSchema`.
    pub fn register(mut self, binding: Binding) -> Result<Self, RegistryError> {
        if self.bindings.contains_key(binding.name()) {
            return Err(RegistryError::DuplicateBinding {
                name: binding.name().to_string(),
            });
        }
        check_unique(binding.name(), binding.fields())?;

        let mut broken = None;
        walk(binding.fields(), &mut |field| {
            if broken.is_none() && field.canonical_override.is_none() && !is_invertible(field.view_name)
            {
                broken = Some(field.view_name);
            }
        });
        if let Some(field) = broken {
            return Err(RegistryError::NonInvertibleName {
                binding: binding.name().to_string(),
                field: field.to_string(),
                canonical: to_canonical(field),
            });
        }

        if let Err(message) = binding.input_validator().get(&binding) {
            return Err(RegistryError::InputSchema {
                binding: binding.name().to_string(),
                message: message.to_string(),
            });
        }

        self.order.push(binding.name().to_string());
        self.bindings.insert(binding.name().to_string(), binding);
        Ok(self)
    }

    /// Look up a binding by operation name.
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    /// Bindings in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.order.iter().filter_map(|name| self.bindings.get(name))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

fn check_unique(binding: &str, fields: &[FieldDescriptor]) -> Result<(), RegistryError> {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.view_name) {
            return Err(RegistryError::DuplicateField {
                binding: binding.to_string(),
                field: field.view_name.to_string(),
            });
        }
        if let Kind::Group(inner) = field.kind {
            check_unique(binding, inner)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    static BAD_FIELDS: &[FieldDescriptor] = &[FieldDescriptor::text("home_town")];
    static TWICE: &[FieldDescriptor] = &[FieldDescriptor::text("title"), FieldDescriptor::text("title")];

    #[test]
    fn standard_bindings_in_order() {
        let registry = SchemaRegistry::standard().unwrap();
        let names: Vec<&str> = registry.iter().map(Binding::name).collect();
        assert_eq!(
            names,
            vec![PROFILE, DISPLAY_PROFILE, KEY_VALUE_PROFILE, TUPLE_PROFILE]
        );
        assert!(registry.get(PROFILE).unwrap().has_relations());
        assert!(!registry.get(DISPLAY_PROFILE).unwrap().has_relations());
    }

    #[test]
    fn duplicate_binding_rejected() {
        let result = SchemaRegistry::new()
            .register(Binding::new("v", EDITABLE_FIELDS, Wrapping::bare()))
            .and_then(|r| r.register(Binding::new("v", EDITABLE_FIELDS, Wrapping::display())));
        assert!(matches!(result, Err(RegistryError::DuplicateBinding { .. })));
    }

    #[test]
    fn non_invertible_name_rejected() {
        let result = SchemaRegistry::new().register(Binding::new("v", BAD_FIELDS, Wrapping::bare()));
        match result {
            Err(RegistryError::NonInvertibleName { field, canonical, .. }) => {
                assert_eq!(field, "home_town");
                assert_eq!(canonical, "home_town");
            }
            other => panic!("expected NonInvertibleName, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_field_rejected() {
        let result = SchemaRegistry::new().register(Binding::new("v", TWICE, Wrapping::bare()));
        assert!(matches!(result, Err(RegistryError::DuplicateField { .. })));
    }

    #[test]
    fn summary_lists_group_members() {
        let registry = SchemaRegistry::standard().unwrap();
        let summary = registry.get(DISPLAY_PROFILE).unwrap().summary();
        let staff = summary
            .fields
            .iter()
            .find(|f| f.name == "staffInformation")
            .unwrap();
        assert_eq!(staff.canonical, "staff_information");
        assert_eq!(staff.fields.len(), 8);
    }
}
