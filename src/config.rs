//! Service configuration.
//!
//! Loaded from an optional JSON file (camelCase keys, unknown keys
//! rejected); command-line flags and environment variables override the
//! file. Every key has a default, so no file is needed for local use.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::loader::{is_url, read_file};

/// Default search service (profile store) base URL.
pub const DEFAULT_SEARCH_SERVICE: &str = "http://localhost:8889/";

/// Default orgchart service (relation store) base URL.
pub const DEFAULT_ORGCHART_SERVICE: &str = "http://localhost:8888/";

/// Identifier used when a query or mutation names none.
pub const DEFAULT_IDENTIFIER: &str = "fiji";

/// Default timeout for backend requests, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct Config {
    /// Base URL of the profile store.
    pub search_service: String,
    /// Base URL of the relation store.
    pub orgchart_service: String,
    /// Identifier used when a request names none.
    pub default_identifier: String,
    /// Backend request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_service: DEFAULT_SEARCH_SERVICE.to_string(),
            orgchart_service: DEFAULT_ORGCHART_SERVICE.to_string(),
            default_identifier: DEFAULT_IDENTIFIER.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub search_service: Option<String>,
    pub orgchart_service: Option<String>,
    pub default_identifier: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from `path` (or defaults when `None`), apply
    /// `overrides`, and validate the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed, contains
    /// unknown keys, or a value fails validation.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_json(&read_file(path)?)?,
            None => Self::default(),
        };
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON string without validating it.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|source| ConfigError::Parse { source })
    }

    fn apply(&mut self, overrides: Overrides) {
        if let Some(v) = overrides.search_service {
            self.search_service = v;
        }
        if let Some(v) = overrides.orgchart_service {
            self.orgchart_service = v;
        }
        if let Some(v) = overrides.default_identifier {
            self.default_identifier = v;
        }
        if let Some(v) = overrides.timeout_secs {
            self.timeout_secs = v;
        }
    }

    /// Check that service URLs are HTTP(S) and the timeout is positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, url) in [
            ("searchService", &self.search_service),
            ("orgchartService", &self.orgchart_service),
        ] {
            if !is_url(url) {
                return Err(ConfigError::Invalid {
                    key: key.to_string(),
                    message: format!("expected http:// or https:// URL, got \"{url}\""),
                });
            }
        }
        if self.default_identifier.is_empty() {
            return Err(ConfigError::Invalid {
                key: "defaultIdentifier".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "timeoutSecs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
