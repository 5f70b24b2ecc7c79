//! JSON pointer resolution across local and external documents.
//!
//! A reference has the form `location#pointer`. An empty location means the
//! root document; otherwise the location is a file path or URL whose parsed
//! contents are cached for the lifetime of the resolver.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;

use crate::error::ResolveError;
use crate::loader::load_document;
use crate::types::DereferenceOptions;

/// Split a reference on its first `#` into `(location, pointer)`.
///
/// A reference without `#` is all location with an empty pointer.
pub fn split_reference(reference: &str) -> (&str, &str) {
    reference.split_once('#').unwrap_or((reference, ""))
}

/// Unescape one JSON pointer segment (`~1` is `/`, `~0` is `~`).
pub fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Resolve a JSON pointer such as `/components/schemas/User` against a value.
///
/// # Errors
///
/// Returns `ResolveError::InvalidPointer` if the pointer doesn't start with
/// `/`, or `ResolveError::PointerNotFound` for a missing key, an
/// out-of-range index, or a segment that indexes into a scalar.
pub fn resolve_pointer<'v>(document: &'v Value, pointer: &str) -> Result<&'v Value, ResolveError> {
    walk_pointer(document, pointer, pointer)
}

/// Resolve a local `#/...` reference against the root document.
///
/// # Errors
///
/// Returns `ResolveError::NonLocalReference` for anything not starting with
/// `#/`, plus the errors of [`resolve_pointer`].
pub fn resolve_local<'v>(document: &'v Value, reference: &str) -> Result<&'v Value, ResolveError> {
    if !reference.starts_with("#/") {
        return Err(ResolveError::NonLocalReference {
            reference: reference.to_string(),
        });
    }
    walk_pointer(document, &reference[1..], reference)
}

fn walk_pointer<'v>(
    document: &'v Value,
    pointer: &str,
    reference: &str,
) -> Result<&'v Value, ResolveError> {
    let Some(path) = pointer.strip_prefix('/') else {
        return Err(ResolveError::InvalidPointer {
            pointer: pointer.to_string(),
        });
    };

    let mut current = document;
    for segment in path.split('/') {
        let key = unescape_segment(segment);
        let next = match current {
            Value::Object(map) => map.get(&key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| ResolveError::PointerNotFound {
            reference: reference.to_string(),
        })?;
    }
    Ok(current)
}

/// Resolves references to values, loading external documents on demand.
#[derive(Debug)]
pub struct PointerResolver {
    base_path: PathBuf,
    http_timeout: Option<Duration>,
    cache: HashMap<String, Value>,
}

impl Default for PointerResolver {
    fn default() -> Self {
        Self::with_options(&DereferenceOptions::default())
    }
}

impl PointerResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: &DereferenceOptions) -> Self {
        Self {
            base_path: options.resolved_base_path(),
            http_timeout: options.http_timeout,
            cache: HashMap::new(),
        }
    }

    /// Resolve `reference` to a copy of its target.
    ///
    /// Local references (empty location) resolve against `root`.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError` if an external document can't be loaded or the
    /// pointer doesn't resolve.
    pub fn resolve(&mut self, root: &Value, reference: &str) -> Result<Value, ResolveError> {
        let (location, pointer) = split_reference(reference);

        let document = if location.is_empty() {
            root
        } else {
            self.load_external(location)?
        };

        let target = if pointer.is_empty() {
            document
        } else {
            walk_pointer(document, pointer, reference)?
        };

        log::debug!("resolved reference {}", reference);
        Ok(target.clone())
    }

    /// Load an external document, returning the cached copy on later calls.
    ///
    /// The cache key is the raw location string; no path normalization is
    /// performed.
    pub fn load_external(&mut self, location: &str) -> Result<&Value, ResolveError> {
        if !self.cache.contains_key(location) {
            let document = load_document(location, &self.base_path, self.http_timeout)?;
            log::debug!("loaded external document {}", location);
            self.cache.insert(location.to_string(), document);
        }
        Ok(&self.cache[location])
    }

    /// Number of external documents loaded so far.
    pub fn cached_documents(&self) -> usize {
        self.cache.len()
    }
}
