//! Error types for OpenAPI conversion and dereferencing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating the top-level specification.
///
/// All of these are fatal: no descriptor or dereference output is produced.
#[derive(Debug, Error)]
pub enum ValidationError {
    // IO errors (exit code 3)
    #[error("specification file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read specification file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Document errors (exit code 2)
    #[error("failed to parse specification: {message}")]
    Parse { message: String },

    #[error("specification must be a mapping, got {actual}")]
    NotAMapping { actual: String },

    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("invalid field {field}: expected {expected}")]
    InvalidField { field: String, expected: String },

    #[error("unsupported OpenAPI version: {version}")]
    UnsupportedVersion { version: String },
}

impl ValidationError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidationError::FileNotFound { .. } | ValidationError::ReadError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors while resolving a `$ref` or loading an external document.
#[derive(Debug, Error)]
pub enum ResolveError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("cannot fetch {url}: remote loading is disabled")]
    RemoteDisabled { url: String },

    // Parse errors (exit code 2)
    #[error("invalid JSON in {location}: {source}")]
    InvalidJson {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML in {location}: {source}")]
    InvalidYaml {
        location: String,
        #[source]
        source: serde_yaml_ng::Error,
    },

    // Reference errors (exit code 2)
    #[error("invalid JSON pointer: {pointer}")]
    InvalidPointer { pointer: String },

    #[error("could not resolve reference: {reference}")]
    PointerNotFound { reference: String },

    #[error("only local references are supported: {reference}")]
    NonLocalReference { reference: String },

    #[error("invalid $ref value: expected string, got {actual}")]
    InvalidReference { actual: String },
}

impl ResolveError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ResolveError::FileNotFound { .. }
            | ResolveError::ReadError { .. }
            | ResolveError::RemoteDisabled { .. } => 3,
            #[cfg(feature = "remote")]
            ResolveError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors surfaced by a conversion run.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Reserved for constructs intentionally out of scope. Unsupported
    /// parameter locations and security schemes are currently dropped instead.
    #[error("unsupported OpenAPI feature: {feature}")]
    UnsupportedFeature { feature: String },
}

impl ConvertError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConvertError::Validation(e) => e.exit_code(),
            ConvertError::Resolve(e) => e.exit_code(),
            ConvertError::UnsupportedFeature { .. } => 2,
        }
    }
}
