//! Error types for profile projection, patching and backend access.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reading JSON documents from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from the profile and relation backends.
#[derive(Debug, Error)]
pub enum BackendError {
    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("backend unavailable at {url}: {message}")]
    Unavailable { url: String, message: String },
}

/// Errors turning a view update into a canonical patch.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("update must be an object, got {actual}")]
    NotAnObject { actual: String },

    #[error("unknown field \"{field}\" in update")]
    UnknownField { field: String },

    #[error("field \"{field}\" is read-only")]
    ReadOnlyField { field: String },

    #[error("invalid value at {field}: expected {expected}, got {actual}")]
    InvalidShape {
        field: String,
        expected: String,
        actual: String,
    },
}

/// Errors building a schema registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("binding \"{name}\" is already registered")]
    DuplicateBinding { name: String },

    #[error("field \"{field}\" in binding \"{binding}\" does not convert back from \"{canonical}\"")]
    NonInvertibleName {
        binding: String,
        field: String,
        canonical: String,
    },

    #[error("binding \"{binding}\" declares \"{field}\" twice")]
    DuplicateField { binding: String, field: String },

    #[error("input schema of binding \"{binding}\" does not compile: {message}")]
    InputSchema { binding: String, message: String },
}

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("invalid config: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Errors from the query and mutation operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("unknown binding \"{name}\"")]
    UnknownBinding { name: String },

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error("update rejected with {} error(s)", errors.len())]
    Invalid { errors: Vec<FieldError> },
}

/// Single update validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FieldError {
    /// JSON Pointer (RFC 6901) to the offending value.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
        }
    }
}

impl ConfigError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConfigError::Load(e) => e.exit_code(),
            _ => 2,
        }
    }
}

impl ServiceError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ServiceError::Backend(_) => 3,
            ServiceError::Invalid { .. } => 1,
            ServiceError::UnknownBinding { .. } | ServiceError::Patch(_) => 2,
        }
    }
}
