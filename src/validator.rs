//! Top-level specification validation.
//!
//! Only the shape needed by the converter is checked: a mapping root with
//! `openapi`, `info` and `paths`, and a 3.0 or 3.1 version string. Full
//! meta-schema validation is out of scope.

use serde_json::Value;

use crate::error::ValidationError;
use crate::types::json_type_name;

/// Top-level fields every specification must declare.
pub const REQUIRED_FIELDS: &[&str] = &["openapi", "info", "paths"];

/// Version prefixes accepted in the `openapi` field.
pub const SUPPORTED_VERSIONS: &[&str] = &["3.0", "3.1"];

/// Validate the top-level structure of an OpenAPI document.
///
/// # Errors
///
/// Returns `ValidationError` for a non-mapping root, a missing required
/// field, a non-mapping `paths`, or an unsupported version.
pub fn validate_spec(spec: &Value) -> Result<(), ValidationError> {
    let Some(root) = spec.as_object() else {
        return Err(ValidationError::NotAMapping {
            actual: json_type_name(spec).to_string(),
        });
    };

    for field in REQUIRED_FIELDS {
        if !root.contains_key(*field) {
            return Err(ValidationError::MissingField {
                field: field.to_string(),
            });
        }
    }

    match &root["openapi"] {
        Value::String(version) if is_supported_version(version) => {}
        Value::String(version) => {
            return Err(ValidationError::UnsupportedVersion {
                version: version.clone(),
            })
        }
        other => {
            return Err(ValidationError::UnsupportedVersion {
                version: other.to_string(),
            })
        }
    }

    if !root["paths"].is_object() {
        return Err(ValidationError::InvalidField {
            field: "paths".to_string(),
            expected: "mapping".to_string(),
        });
    }

    Ok(())
}

fn is_supported_version(version: &str) -> bool {
    SUPPORTED_VERSIONS
        .iter()
        .any(|prefix| version.starts_with(prefix))
}
