//! OpenAPI Function Converter
//!
//! Turns OpenAPI 3.0/3.1 documents into two normalized forms:
//!
//! - a flat list of [`FunctionDescriptor`]s, one per path and HTTP method,
//!   for function-calling tool APIs;
//! - a fully dereferenced copy of the document, with every `$ref` under
//!   `paths` and `components` replaced by its target.
//!
//! # Example
//!
//! ```
//! use openapi_functions::OpenApiConverter;
//! use serde_json::json;
//!
//! let spec = json!({
//!     "openapi": "3.0.0",
//!     "info": { "title": "Weather", "version": "1.0.0" },
//!     "paths": {
//!         "/weather/{city}": {
//!             "get": {
//!                 "parameters": [{
//!                     "name": "city",
//!                     "in": "path",
//!                     "required": true,
//!                     "schema": { "type": "string" }
//!                 }]
//!             }
//!         }
//!     }
//! });
//!
//! let functions = OpenApiConverter::new(spec).unwrap().convert().unwrap();
//! assert_eq!(functions[0].name, "GET_WEATHER_CITY");
//! assert!(functions[0].path_schema.is_some());
//! assert!(functions[0].query_schema.is_none());
//! ```
//!
//! # Reference Handling
//!
//! | | Schema normalizer | Document dereferencer |
//! |---|---|---|
//! | Scope | one schema fragment | `paths` and `components` |
//! | References | local `#/...` only | local, file, URL |
//! | Unresolvable | placeholder schema | error |
//! | Cycle | typed stub schema | `{"$$circular_ref": ref}` |
//! | Sibling keys | fill gaps only | override target |

mod converter;
mod dereferencer;
mod error;
mod loader;
mod normalizer;
mod pointer;
mod types;
mod validator;

pub use converter::{function_name, OpenApiConverter};
pub use dereferencer::{PathDereferencer, CIRCULAR_REF_MARKER};
pub use error::{ConvertError, ResolveError, ValidationError};
pub use loader::{
    is_url, load_document, load_spec_auto, load_spec_file, load_spec_str, parse_document,
};
pub use normalizer::{normalize_schema, SchemaNormalizer};
pub use pointer::{resolve_local, resolve_pointer, split_reference, PointerResolver};
pub use types::{DereferenceOptions, FunctionDescriptor, ParameterSchema};
pub use validator::validate_spec;
