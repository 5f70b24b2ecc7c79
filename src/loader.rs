//! Specification and external document loading.
//!
//! Handles decoding specifications from strings, files, and HTTP URLs, and
//! loading the external documents that `$ref` values point into.

use std::path::Path;
use std::time::Duration;

use serde_json::Value;

use crate::error::{ConvertError, ResolveError, ValidationError};

/// Decode a specification from JSON or YAML text.
///
/// JSON is tried first; YAML is the fallback. The result is not validated.
///
/// # Errors
///
/// Returns `ValidationError::Parse` if the text is neither JSON nor YAML.
pub fn load_spec_str(content: &str) -> Result<Value, ValidationError> {
    match serde_json::from_str(content) {
        Ok(value) => Ok(value),
        Err(json_err) => serde_yaml_ng::from_str(content).map_err(|yaml_err| {
            log::debug!("specification is not JSON: {}", json_err);
            ValidationError::Parse {
                message: yaml_err.to_string(),
            }
        }),
    }
}

/// Load a specification from a file path.
///
/// # Errors
///
/// Returns `ValidationError::FileNotFound` if the file doesn't exist,
/// or `ValidationError::Parse` if the content is neither JSON nor YAML.
pub fn load_spec_file(path: &Path) -> Result<Value, ValidationError> {
    if !path.exists() {
        return Err(ValidationError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ValidationError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_spec_str(&content)
}

/// Load a specification from a file path or URL.
///
/// URL loading requires the `remote` feature.
///
/// # Errors
///
/// Returns `ConvertError::Resolve` if a URL can't be fetched, otherwise the
/// validation errors of [`load_spec_file`].
pub fn load_spec_auto(source: &str) -> Result<Value, ConvertError> {
    if is_url(source) {
        let content = fetch_text(source, None)?;
        Ok(load_spec_str(&content)?)
    } else {
        Ok(load_spec_file(Path::new(source))?)
    }
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Whether an external location is decoded as YAML rather than JSON.
pub fn is_yaml_location(location: &str) -> bool {
    location.ends_with(".yaml") || location.ends_with(".yml")
}

/// Load an external document referenced from a specification.
///
/// URLs are fetched over HTTP; anything else is a path relative to
/// `base_dir`. The content is YAML when the location ends in `.yaml` or
/// `.yml`, JSON otherwise.
///
/// # Errors
///
/// Any fetch, read, or parse failure is returned as a `ResolveError`.
pub fn load_document(
    location: &str,
    base_dir: &Path,
    timeout: Option<Duration>,
) -> Result<Value, ResolveError> {
    let content = if is_url(location) {
        fetch_text(location, timeout)?
    } else {
        let path = base_dir.join(location);
        if !path.exists() {
            return Err(ResolveError::FileNotFound { path });
        }
        std::fs::read_to_string(&path).map_err(|source| ResolveError::ReadError { path, source })?
    };

    parse_document(&content, location)
}

/// Decode document text, choosing the format from the location's extension.
pub fn parse_document(content: &str, location: &str) -> Result<Value, ResolveError> {
    if is_yaml_location(location) {
        serde_yaml_ng::from_str(content).map_err(|source| ResolveError::InvalidYaml {
            location: location.to_string(),
            source,
        })
    } else {
        serde_json::from_str(content).map_err(|source| ResolveError::InvalidJson {
            location: location.to_string(),
            source,
        })
    }
}

/// Fetch a URL body as text. Blocks until the request completes.
#[cfg(feature = "remote")]
pub fn fetch_text(url: &str, timeout: Option<Duration>) -> Result<String, ResolveError> {
    let network_error = |source| ResolveError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(network_error)?;

    let response = client.get(url).send().map_err(network_error)?;

    // Check for HTTP errors before reading the body
    let response = response.error_for_status().map_err(network_error)?;

    response.text().map_err(network_error)
}

#[cfg(not(feature = "remote"))]
pub fn fetch_text(url: &str, _timeout: Option<Duration>) -> Result<String, ResolveError> {
    Err(ResolveError::RemoteDisabled {
        url: url.to_string(),
    })
}
