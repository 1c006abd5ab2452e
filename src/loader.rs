//! Loading JSON documents (profiles, related records, updates, config) from disk.

use std::path::Path;

use serde_json::Value;

use crate::error::LoadError;

/// Load a JSON document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_json(path: &Path) -> Result<Value, LoadError> {
    let content = read_file(path)?;
    load_json_str(&content)
}

/// Load a JSON document from a string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't valid JSON.
pub fn load_json_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Read a file to a string, distinguishing a missing file from other IO errors.
pub(crate) fn read_file(path: &Path) -> Result<String, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file() {
        let err = load_json(Path::new("/nonexistent/profile.json")).unwrap_err();
        assert!(matches!(err, LoadError::FileNotFound { .. }));
    }

    #[test]
    fn invalid_json() {
        let err = load_json_str("{ \"first_name\": ").unwrap_err();
        assert!(matches!(err, LoadError::InvalidJson { .. }));
    }

    #[test]
    fn url_detection() {
        assert!(is_url("http://localhost:8889/"));
        assert!(is_url("https://search.example.com"));
        assert!(!is_url("localhost:8889"));
        assert!(!is_url("/srv/profiles"));
    }
}
