//! Query and mutation operations over a backend and a schema registry.
//!
//! `query` and `update` return typed errors. `profile`, `display_profile` and
//! `update_profile` are the client-facing operations: they log any failure
//! and answer `None`, which callers cannot tell apart from "not found".

use std::sync::Arc;
use std::thread;

use serde_json::Value;
use tracing::{debug, error, info};

use crate::backend::ProfileBackend;
use crate::config::DEFAULT_IDENTIFIER;
use crate::error::ServiceError;
use crate::merge::merge;
use crate::projector::project;
use crate::registry::{Binding, SchemaRegistry, DISPLAY_PROFILE, PROFILE};
use crate::reverse::to_patch;
use crate::schema::validate_update;

/// Profile operations bound to one backend.
#[derive(Debug, Clone)]
pub struct ProfileService<B> {
    registry: Arc<SchemaRegistry>,
    backend: B,
    default_identifier: String,
}

impl<B: ProfileBackend> ProfileService<B> {
    pub fn new(registry: Arc<SchemaRegistry>, backend: B) -> Self {
        Self {
            registry,
            backend,
            default_identifier: DEFAULT_IDENTIFIER.to_string(),
        }
    }

    /// Identifier used when a request names none.
    pub fn with_default_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.default_identifier = identifier.into();
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Fetch and project the profile for `identifier` under `binding`.
    ///
    /// Bindings with relation fields fetch the related-profiles record
    /// concurrently with the canonical record.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::UnknownBinding` for an unregistered binding and
    /// `ServiceError::Backend` if either fetch fails.
    pub fn query(&self, binding: &str, identifier: Option<&str>) -> Result<Value, ServiceError> {
        let binding = self.binding(binding)?;
        let id = identifier.unwrap_or(self.default_identifier.as_str());
        info!(binding = binding.name(), id, "fetching profile");

        if !binding.has_relations() {
            let canonical = self.backend.fetch_profile(id)?;
            return Ok(project(&canonical, None, binding));
        }

        let (canonical, related) = thread::scope(|scope| {
            let related = scope.spawn(|| self.backend.fetch_related(id));
            let canonical = self.backend.fetch_profile(id);
            let related = related
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            (canonical, related)
        });
        Ok(project(&canonical?, Some(&related?), binding))
    }

    /// Apply a partial view update to the stored profile and return the
    /// re-projected result.
    ///
    /// The stored record is fetched fresh, the update is validated and
    /// reverse-projected, the patch is merged onto the fetched record, and
    /// the merged record is projected under the same binding. Nothing is
    /// written back to the backend here.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Invalid` if the update fails input validation,
    /// `ServiceError::Patch` if it cannot be reverse-projected, and
    /// `ServiceError::Backend` if the fetch fails.
    pub fn update(
        &self,
        binding: &str,
        username: Option<&str>,
        update: &Value,
    ) -> Result<Value, ServiceError> {
        let binding = self.binding(binding)?;
        let id = username.unwrap_or(self.default_identifier.as_str());

        validate_update(binding, update).map_err(|errors| ServiceError::Invalid { errors })?;

        info!(binding = binding.name(), id, "fetching profile for update");
        let canonical = self.backend.fetch_profile(id)?;
        let patch = to_patch(update, binding)?;
        debug!(%patch, "canonical patch");
        let merged = merge(&canonical, &patch);
        Ok(project(&merged, None, binding))
    }

    /// `profile(identifier)`: the raw view, or `None` on any failure.
    pub fn profile(&self, identifier: Option<&str>) -> Option<Value> {
        self.query(PROFILE, identifier).map_err(log_failure).ok()
    }

    /// `displayProfile(username)`: the display view, or `None` on any failure.
    pub fn display_profile(&self, username: Option<&str>) -> Option<Value> {
        self.query(DISPLAY_PROFILE, username)
            .map_err(log_failure)
            .ok()
    }

    /// `updateProfile(username, update)`: the updated display view, or `None`
    /// on any failure.
    pub fn update_profile(&self, username: Option<&str>, update: &Value) -> Option<Value> {
        self.update(DISPLAY_PROFILE, username, update)
            .map_err(log_failure)
            .ok()
    }

    fn binding(&self, name: &str) -> Result<&Binding, ServiceError> {
        self.registry
            .get(name)
            .ok_or_else(|| ServiceError::UnknownBinding {
                name: name.to_string(),
            })
    }
}

fn log_failure(err: ServiceError) {
    error!(error = %err, "profile request failed");
}
