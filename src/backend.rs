//! Backend collaborators: the profile store and the relation store.

use serde_json::Value;

use crate::error::BackendError;

#[cfg(feature = "remote")]
use std::time::Duration;

#[cfg(feature = "remote")]
use tracing::debug;

/// Source of canonical profiles and related-profile records.
///
/// Implementations must be `Sync`; the service issues the two fetches of a
/// relation query from separate threads.
pub trait ProfileBackend: Sync {
    /// Fetch the canonical record for `id`.
    fn fetch_profile(&self, id: &str) -> Result<Value, BackendError>;

    /// Fetch `{manager, directs}` for `id`.
    fn fetch_related(&self, id: &str) -> Result<Value, BackendError>;
}

impl<B: ProfileBackend + ?Sized> ProfileBackend for &B {
    fn fetch_profile(&self, id: &str) -> Result<Value, BackendError> {
        (**self).fetch_profile(id)
    }

    fn fetch_related(&self, id: &str) -> Result<Value, BackendError> {
        (**self).fetch_related(id)
    }
}

/// Join a base URL and a path without doubling or dropping the `/`.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Blocking HTTP client for the search and orgchart services.
///
/// Requires the `remote` feature (enabled by default).
#[cfg(feature = "remote")]
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::blocking::Client,
    search_service: String,
    orgchart_service: String,
}

#[cfg(feature = "remote")]
impl HttpBackend {
    /// Build a client with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Request` if the HTTP client cannot be built.
    pub fn new(
        search_service: impl Into<String>,
        orgchart_service: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let search_service = search_service.into();
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| BackendError::Request {
                url: search_service.clone(),
                source,
            })?;

        Ok(Self {
            client,
            search_service,
            orgchart_service: orgchart_service.into(),
        })
    }

    fn get_json(&self, url: String) -> Result<Value, BackendError> {
        debug!(%url, "backend request");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|source| BackendError::Request {
                url: url.clone(),
                source,
            })?;

        // Check for HTTP errors before parsing
        let response = response
            .error_for_status()
            .map_err(|source| BackendError::Request {
                url: url.clone(),
                source,
            })?;

        response
            .json()
            .map_err(|source| BackendError::Request { url, source })
    }
}

#[cfg(feature = "remote")]
impl ProfileBackend for HttpBackend {
    fn fetch_profile(&self, id: &str) -> Result<Value, BackendError> {
        let path = format!("search/get/private/{id}");
        self.get_json(join_url(&self.search_service, &path))
    }

    fn fetch_related(&self, id: &str) -> Result<Value, BackendError> {
        let path = format!("orgchart/related/{id}");
        self.get_json(join_url(&self.orgchart_service, &path))
    }
}
