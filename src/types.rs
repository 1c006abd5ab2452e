//! Core types shared by projection, reverse projection and the registry.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// View field synthesized from the identity-provider username.
pub const USERNAME_FIELD: &str = "username";

/// View field synthesized from the external identity id.
pub const DINO_ID_FIELD: &str = "dinoId";

/// Key under `usernames.values` that holds the primary username.
pub const USERNAME_PROVIDER_KEY: &str = "mozilliansorg";

/// Canonical keyed-list field holding usernames by provider.
pub const USERNAMES_FIELD: &str = "usernames";

/// JSON Pointer to the primary username inside a canonical record.
pub const USERNAME_POINTER: &str = "/usernames/values/mozilliansorg";

/// JSON Pointer to the external identity id inside a canonical record.
pub const DINO_ID_POINTER: &str = "/identities/dinopark_id/value";

/// Display text emitted with the synthesized `username` field.
///
/// Clients match on this exact string, spelling included.
pub const USERNAME_DISPLAY: &str = "publlic";

/// Display text emitted with the synthesized `dinoId` field.
pub const DINO_ID_DISPLAY: &str = "public";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Whether a view emits the raw value or a `{value, display}` envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Envelope {
    /// Raw value only, metadata dropped.
    Bare,
    /// `{value, display}` for scalars, `{values, display}` for collections.
    Display,
}

/// How a keyed list's mapping is rendered in a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyedRendering {
    /// The mapping unchanged: `{"github": "ana"}`.
    Map,
    /// Flattened pairs: `[{"key": "github", "value": "ana"}]`.
    Pairs,
    /// Formatted tuple strings: `["(github,ana)"]`.
    Tuples,
}

/// Transform applied to display text on its way into a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayTransform {
    /// Display text passes through untouched.
    #[default]
    Verbatim,
    /// Display text is upper-cased in views and lower-cased on the way back.
    Uppercase,
}

impl DisplayTransform {
    /// Apply the transform to canonical display text.
    pub fn apply(&self, display: &str) -> String {
        match self {
            DisplayTransform::Verbatim => display.to_string(),
            DisplayTransform::Uppercase => display.to_uppercase(),
        }
    }

    /// Map view display text back to its canonical form.
    ///
    /// Canonical display levels are lower-case, so the inverse of
    /// `Uppercase` is lower-casing.
    pub fn invert(&self, display: &str) -> String {
        match self {
            DisplayTransform::Verbatim => display.to_string(),
            DisplayTransform::Uppercase => display.to_lowercase(),
        }
    }
}

/// Wrapping mode of one view binding.
///
/// Each field kind gets its own envelope so that a view can, for example,
/// wrap scalars while leaving lists bare. Modes are fixed per binding and
/// never inferred from data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wrapping {
    pub scalar: Envelope,
    pub list: Envelope,
    pub keyed: Envelope,
    pub keyed_rendering: KeyedRendering,
    pub display: DisplayTransform,
}

impl Wrapping {
    /// Everything bare, keyed lists as mappings, display untouched.
    pub const fn bare() -> Self {
        Self {
            scalar: Envelope::Bare,
            list: Envelope::Bare,
            keyed: Envelope::Bare,
            keyed_rendering: KeyedRendering::Map,
            display: DisplayTransform::Verbatim,
        }
    }

    /// Everything wrapped with display, keyed lists as mappings.
    pub const fn display() -> Self {
        Self {
            scalar: Envelope::Display,
            list: Envelope::Display,
            keyed: Envelope::Display,
            keyed_rendering: KeyedRendering::Map,
            display: DisplayTransform::Verbatim,
        }
    }

    /// Set the keyed-list rendering.
    pub const fn keyed_rendering(mut self, rendering: KeyedRendering) -> Self {
        self.keyed_rendering = rendering;
        self
    }

    /// Set the display transform.
    pub const fn display_transform(mut self, transform: DisplayTransform) -> Self {
        self.display = transform;
        self
    }
}
