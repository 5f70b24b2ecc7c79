//! Operation extraction - one function descriptor per path and HTTP method.
//!
//! Each descriptor groups the operation's arguments into four object schemas:
//! query parameters, path parameters, the JSON request body, and header-based
//! credentials. Schemas are normalized with [`SchemaNormalizer`], so nested
//! references are inlined and cycles are cut.

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{ConvertError, ResolveError, ValidationError};
use crate::loader::{load_spec_file, load_spec_str};
use crate::normalizer::SchemaNormalizer;
use crate::pointer::resolve_local;
use crate::types::{FunctionDescriptor, ParameterSchema, SUPPORTED_METHODS};
use crate::validator::validate_spec;

static NULL: Value = Value::Null;

/// Converts a validated OpenAPI document into function descriptors.
#[derive(Debug, Clone)]
pub struct OpenApiConverter {
    spec: Value,
}

impl OpenApiConverter {
    /// Wrap an already-decoded specification.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the document fails top-level validation.
    pub fn new(spec: Value) -> Result<Self, ValidationError> {
        validate_spec(&spec)?;
        Ok(Self { spec })
    }

    /// Decode JSON or YAML text and validate it.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ValidationError> {
        Self::new(load_spec_str(content)?)
    }

    /// Read, decode and validate a specification file.
    pub fn from_path(path: &Path) -> Result<Self, ValidationError> {
        Self::new(load_spec_file(path)?)
    }

    /// The validated specification.
    pub fn spec(&self) -> &Value {
        &self.spec
    }

    /// Produce one descriptor per path and supported HTTP method, in
    /// document order.
    ///
    /// # Errors
    ///
    /// Returns `ConvertError::Resolve` when a parameter-level or
    /// request-body-level `$ref` can't be resolved. References nested inside
    /// schemas never fail the conversion.
    pub fn convert(&self) -> Result<Vec<FunctionDescriptor>, ConvertError> {
        let mut normalizer = SchemaNormalizer::new(&self.spec);
        let base_url = self.base_url();
        let mut functions = Vec::new();

        let Some(paths) = self.spec.get("paths").and_then(Value::as_object) else {
            return Ok(functions);
        };

        for (path, path_item) in paths {
            let Some(path_item) = path_item.as_object() else {
                log::warn!("skipping path '{}': path item is not a mapping", path);
                continue;
            };

            for (method, operation) in path_item {
                if !SUPPORTED_METHODS.contains(&method.as_str()) {
                    continue;
                }
                let Some(operation) = operation.as_object() else {
                    log::warn!("skipping {} '{}': operation is not a mapping", method, path);
                    continue;
                };

                let (query_schema, path_schema) =
                    self.convert_parameters(&mut normalizer, path_item, operation)?;
                let body_schema = self.convert_request_body(&mut normalizer, operation)?;
                let auth_schema = self.convert_security(operation);

                functions.push(FunctionDescriptor {
                    name: function_name(method, path),
                    url: format!("{}{}", base_url, path),
                    description: operation_description(operation),
                    method: method.to_uppercase(),
                    query_schema,
                    path_schema,
                    body_schema,
                    auth_schema,
                    strict: false,
                });
            }
        }

        log::debug!("converted {} operations", functions.len());
        Ok(functions)
    }

    /// Base URL from the first `servers` entry, without trailing slashes.
    pub fn base_url(&self) -> String {
        self.spec
            .get("servers")
            .and_then(|servers| servers.get(0))
            .and_then(|server| server.get("url"))
            .and_then(Value::as_str)
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_default()
    }

    /// Split path-item and operation parameters into query and path schemas.
    fn convert_parameters(
        &self,
        normalizer: &mut SchemaNormalizer<'_>,
        path_item: &Map<String, Value>,
        operation: &Map<String, Value>,
    ) -> Result<(Option<ParameterSchema>, Option<ParameterSchema>), ResolveError> {
        let mut query_schema = ParameterSchema::new(true);
        let mut path_schema = ParameterSchema::new(true);

        let parameters = [path_item.get("parameters"), operation.get("parameters")]
            .into_iter()
            .flatten()
            .filter_map(Value::as_array)
            .flatten();

        for parameter in parameters {
            let parameter = self.resolve_object_ref(parameter)?;

            let Some(name) = parameter.get("name").and_then(Value::as_str) else {
                log::warn!("skipping parameter without a name");
                continue;
            };
            let location = parameter.get("in").and_then(Value::as_str).unwrap_or("");
            let required = parameter
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(false);

            let mut schema = normalizer.normalize(parameter.get("schema").unwrap_or(&NULL));
            if let Value::Object(schema) = &mut schema {
                schema.insert("isRequired".to_string(), Value::Bool(required));
                schema.insert(
                    "description".to_string(),
                    parameter
                        .get("description")
                        .cloned()
                        .unwrap_or_else(|| Value::from("")),
                );
            }

            match location {
                "path" => path_schema.insert(name, schema, required),
                "query" => query_schema.insert(name, schema, required),
                other => {
                    log::warn!("dropping parameter '{}' in unsupported location '{}'", name, other)
                }
            }
        }

        Ok((query_schema.into_option(), path_schema.into_option()))
    }

    /// Build the body schema from `application/json` request content.
    fn convert_request_body(
        &self,
        normalizer: &mut SchemaNormalizer<'_>,
        operation: &Map<String, Value>,
    ) -> Result<Option<ParameterSchema>, ResolveError> {
        let Some(request_body) = operation.get("requestBody") else {
            return Ok(None);
        };
        let request_body = self.resolve_object_ref(request_body)?;

        let Some(media) = request_body
            .get("content")
            .and_then(|content| content.get("application/json"))
        else {
            return Ok(None);
        };

        let schema = match media.get("schema") {
            Some(schema) => self.resolve_object_ref(schema)?,
            None => &NULL,
        };
        let normalized = normalizer.normalize(schema);

        let mut body_schema = ParameterSchema::new(
            request_body
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        );
        if let Some(properties) = normalized.get("properties").and_then(Value::as_object) {
            body_schema.properties = properties.clone();
        }
        // Required names come from the source schema, not the normalized one
        if let Some(required) = schema.get("required").and_then(Value::as_array) {
            body_schema.required = required
                .iter()
                .filter_map(|name| name.as_str().map(String::from))
                .collect();
        }

        Ok(body_schema.into_option())
    }

    /// Collect header-based credentials from the operation's security
    /// requirements, falling back to the document's global requirements.
    fn convert_security(&self, operation: &Map<String, Value>) -> Option<ParameterSchema> {
        let mut auth_schema = ParameterSchema::new(false);

        let requirements = operation
            .get("security")
            .or_else(|| self.spec.get("security"))
            .and_then(Value::as_array)?;

        let schemes = self
            .spec
            .get("components")
            .and_then(|components| components.get("securitySchemes"))
            .and_then(Value::as_object);

        for requirement in requirements.iter().filter_map(Value::as_object) {
            for scheme_name in requirement.keys() {
                let Some(scheme) = schemes.and_then(|schemes| schemes.get(scheme_name)) else {
                    log::warn!("security scheme '{}' is not defined", scheme_name);
                    continue;
                };
                if scheme.get("in").and_then(Value::as_str) != Some("header") {
                    log::debug!("ignoring non-header security scheme '{}'", scheme_name);
                    continue;
                }

                let header = scheme
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or(scheme_name.as_str());
                let description = scheme
                    .get("description")
                    .and_then(Value::as_str)
                    .map(String::from)
                    .unwrap_or_else(|| format!("Authentication header for {}", scheme_name));

                let mut property = Map::new();
                property.insert("type".to_string(), Value::from("string"));
                property.insert("description".to_string(), Value::String(description));
                property.insert("isRequired".to_string(), Value::Bool(true));

                auth_schema.insert(header, Value::Object(property), true);
                auth_schema.is_required = true;
            }
        }

        auth_schema.into_option()
    }

    /// Follow a single `$ref` on a parameter, request body or body schema.
    ///
    /// Failures here are fatal to the conversion.
    fn resolve_object_ref<'v>(&'v self, value: &'v Value) -> Result<&'v Value, ResolveError> {
        match value.get("$ref") {
            Some(Value::String(reference)) => resolve_local(&self.spec, reference),
            Some(other) => Err(ResolveError::InvalidReference {
                actual: other.to_string(),
            }),
            None => Ok(value),
        }
    }
}

/// Derive a function name such as `GET_WEATHER_CITY` from a method and path.
///
/// Names are not checked for uniqueness.
pub fn function_name(method: &str, path: &str) -> String {
    let path = path
        .trim_matches('/')
        .replace(['{', '}'], "")
        .replace(['/', '-'], "_");
    format!("{}_{}", method.to_uppercase(), path.to_uppercase())
}

fn operation_description(operation: &Map<String, Value>) -> String {
    operation
        .get("description")
        .or_else(|| operation.get("summary"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
