//! Core types for OpenAPI conversion and dereferencing.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// HTTP methods that produce a function descriptor.
pub const SUPPORTED_METHODS: &[&str] = &["get", "post", "put", "delete", "patch"];

/// Descriptive schema keys copied verbatim during normalization.
pub const COPIED_SCHEMA_KEYS: &[&str] = &[
    "type",
    "format",
    "description",
    "title",
    "pattern",
    "enum",
    "minimum",
    "maximum",
    "minLength",
    "maxLength",
];

/// Schema keywords whose values are sub-schemas handled recursively.
pub const NESTED_SCHEMA_KEYS: &[&str] = &["properties", "items", "allOf", "anyOf", "oneOf"];

/// Composite schema keywords.
pub const COMPOSITE_KEYWORDS: &[&str] = &["allOf", "anyOf", "oneOf"];

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

/// One of the four argument groups of a function descriptor.
///
/// Always an object schema; a group with no properties is reported as
/// absent by [`ParameterSchema::into_option`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    pub properties: Map<String, Value>,
    #[serde(rename = "additionalProperties")]
    pub additional_properties: bool,
    pub required: Vec<String>,
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(rename = "isRequired")]
    pub is_required: bool,
}

impl ParameterSchema {
    /// Create an empty object schema.
    pub fn new(is_required: bool) -> Self {
        Self {
            properties: Map::new(),
            additional_properties: false,
            required: Vec::new(),
            schema_type: "object".to_string(),
            is_required,
        }
    }

    /// Add a property, listing it in `required` when `required` is set.
    pub fn insert(&mut self, name: &str, schema: Value, required: bool) {
        self.properties.insert(name.to_string(), schema);
        if required && !self.required.iter().any(|r| r == name) {
            self.required.push(name.to_string());
        }
    }

    /// Collapse to `None` when no properties were collected.
    pub fn into_option(self) -> Option<Self> {
        if self.properties.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// A callable function derived from one path and HTTP method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    /// Uppercase name such as `GET_WEATHER_CITY`. Not guaranteed unique.
    pub name: String,
    /// Server base URL joined with the raw path template.
    pub url: String,
    pub description: String,
    /// Uppercase HTTP verb.
    pub method: String,
    pub query_schema: Option<ParameterSchema>,
    pub path_schema: Option<ParameterSchema>,
    pub body_schema: Option<ParameterSchema>,
    pub auth_schema: Option<ParameterSchema>,
    pub strict: bool,
}

/// Options for the full-document dereferencer.
#[derive(Debug, Clone, Default)]
pub struct DereferenceOptions {
    /// Directory that relative external references resolve against.
    /// Falls back to the current working directory when unset.
    pub base_path: Option<PathBuf>,
    /// Timeout for fetching HTTP(S) references. No timeout when unset.
    pub http_timeout: Option<Duration>,
}

impl DereferenceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base directory for relative external references.
    pub fn base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// Set a timeout for remote reference fetches.
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    /// Base directory, defaulting to the current working directory.
    pub fn resolved_base_path(&self) -> PathBuf {
        self.base_path
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
