//! Profile Views
//!
//! Projection and merge-patch engine for metadata-wrapped profile records.
//!
//! The profile store keeps one canonical record per person: `snake_case`
//! fields, each wrapped with its value and a `metadata.display` visibility
//! level. Clients see that record through several view shapes (bindings)
//! that differ in naming, wrapping and field subset. This library maps
//! canonical records to views, maps partial view updates back to canonical
//! patches, and merges those patches onto fetched records.
//!
//! # Example
//!
//! ```
//! use profile_views::{merge, project, to_patch, SchemaRegistry, DISPLAY_PROFILE};
//! use serde_json::json;
//!
//! let registry = SchemaRegistry::standard().unwrap();
//! let binding = registry.get(DISPLAY_PROFILE).unwrap();
//!
//! let canonical = json!({
//!     "first_name": { "value": "Ana", "metadata": { "display": "public" } },
//!     "usernames": { "values": { "mozilliansorg": "ana" }, "metadata": { "display": "public" } },
//!     "identities": { "dinopark_id": { "value": "d1" } }
//! });
//!
//! let view = project(&canonical, None, binding);
//! assert_eq!(view["firstName"], json!({ "value": "Ana", "display": "PUBLIC" }));
//! assert_eq!(view["username"], json!({ "value": "ana", "display": "publlic" }));
//!
//! let update = json!({ "firstName": { "value": "Ana-Maria", "display": "public" } });
//! let patch = to_patch(&update, binding).unwrap();
//! let merged = merge(&canonical, &patch);
//! assert_eq!(merged["first_name"]["value"], "Ana-Maria");
//! assert_eq!(merged["usernames"], canonical["usernames"]);
//! ```
//!
//! # Field kinds
//!
//! | Kind | Canonical shape | Bare view | Display view |
//! |------|-----------------|-----------|--------------|
//! | Scalar | `{value, metadata}` | `value` | `{value, display}` |
//! | List | `{values: [..]}` | `[..]` | `{values, display}` |
//! | KeyedList | `{values: {k: v}, metadata}` | map, pairs or tuples | `{values, display}` |
//! | Group | `{sub_field: <scalar or keyed>}` | `{subField: ..}` | `{subField: ..}` |
//! | Relation | related-profiles record | `camelCase` object(s) | same |

mod backend;
mod case;
mod config;
mod descriptor;
mod error;
mod loader;
mod merge;
mod projector;
mod registry;
mod reverse;
mod schema;
mod service;
mod tuple;
mod types;

pub use backend::{join_url, ProfileBackend};
pub use case::{is_invertible, to_canonical, to_view};
pub use config::{Config, Overrides};
pub use descriptor::{
    find, walk, FieldDescriptor, Kind, Primitive, Relation, ACCESS_INFORMATION, EDITABLE_FIELDS,
    PROFILE_FIELDS, STAFF_INFORMATION,
};
pub use error::{
    BackendError, ConfigError, FieldError, LoadError, PatchError, RegistryError, ServiceError,
};
pub use loader::{is_url, load_json, load_json_str};
pub use merge::merge;
pub use projector::{project, project_related};
pub use registry::{
    Binding, BindingSummary, FieldSummary, SchemaRegistry, DISPLAY_PROFILE, KEY_VALUE_PROFILE,
    PROFILE, TUPLE_PROFILE,
};
pub use reverse::to_patch;
pub use schema::{input_schema, validate_against_schema, validate_update};
pub use service::ProfileService;
pub use types::{
    json_type_name, DisplayTransform, Envelope, KeyedRendering, Wrapping, DINO_ID_DISPLAY,
    DINO_ID_FIELD, USERNAME_DISPLAY, USERNAME_FIELD, USERNAME_PROVIDER_KEY,
};

#[cfg(feature = "remote")]
pub use backend::HttpBackend;
