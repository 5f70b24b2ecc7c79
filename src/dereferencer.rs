//! Full-document dereferencing - inlines every `$ref` under `paths` and `components`.
//!
//! Handles local references (`#/paths/~1pets`), external files
//! (`./common.yaml#/paths/health`) and URLs. Unlike the schema normalizer,
//! resolution failures here are fatal, and a reference cycle is cut with a
//! `{"$$circular_ref": "<ref>"}` marker instead of a typed stub.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::error::ResolveError;
use crate::pointer::PointerResolver;
use crate::types::{json_type_name, DereferenceOptions};

/// Key of the marker that replaces a reference found on its own expansion path.
pub const CIRCULAR_REF_MARKER: &str = "$$circular_ref";

/// Dereferences `paths` and `components` of a specification.
///
/// Works on a private copy of the input, so the caller's document is never
/// modified. External documents are cached per instance.
#[derive(Debug)]
pub struct PathDereferencer {
    spec: Value,
    resolver: PointerResolver,
    ref_stack: HashSet<String>,
}

impl PathDereferencer {
    /// Dereferencer resolving relative files against the working directory.
    pub fn new(spec: &Value) -> Self {
        Self::with_options(spec, &DereferenceOptions::default())
    }

    pub fn with_options(spec: &Value, options: &DereferenceOptions) -> Self {
        Self {
            spec: spec.clone(),
            resolver: PointerResolver::with_options(options),
            ref_stack: HashSet::new(),
        }
    }

    /// Return a copy of the specification with every reference under `paths`
    /// and `components` replaced by its target. Other top-level keys are
    /// returned untouched.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError` if any reference can't be resolved or an
    /// external document can't be loaded.
    pub fn dereference(&mut self) -> Result<Value, ResolveError> {
        self.ref_stack.clear();
        let mut result = self.spec.clone();

        // References resolve against the pristine `self.spec`; `result` is
        // rewritten in place.
        if let Some(root) = result.as_object_mut() {
            if let Some(Value::Object(paths)) = root.get_mut("paths") {
                for (path, path_item) in paths.iter_mut() {
                    let original = std::mem::take(path_item);
                    *path_item = self.dereference_value(&original, path)?;
                }
            }

            if let Some(components) = root.get_mut("components") {
                let original = std::mem::take(components);
                *components = self.dereference_value(&original, "/components")?;
            }
        }

        Ok(result)
    }

    /// True when no reference is currently being expanded.
    pub fn is_idle(&self) -> bool {
        self.ref_stack.is_empty()
    }

    fn dereference_value(&mut self, value: &Value, path: &str) -> Result<Value, ResolveError> {
        match value {
            Value::Object(map) => match map.get("$ref") {
                Some(reference) => self.dereference_ref(map, reference, path),
                None => {
                    let mut result = Map::new();
                    for (key, child) in map {
                        let child_path = format!("{}/{}", path, key);
                        result.insert(key.clone(), self.dereference_value(child, &child_path)?);
                    }
                    Ok(Value::Object(result))
                }
            },
            Value::Array(items) => {
                let mut result = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{}/{}", path, i);
                    result.push(self.dereference_value(item, &item_path)?);
                }
                Ok(Value::Array(result))
            }
            other => Ok(other.clone()),
        }
    }

    /// Replace a `$ref` mapping by its dereferenced target, with the
    /// mapping's other keys layered on top.
    fn dereference_ref(
        &mut self,
        map: &Map<String, Value>,
        reference: &Value,
        path: &str,
    ) -> Result<Value, ResolveError> {
        let Some(reference) = reference.as_str() else {
            return Err(ResolveError::InvalidReference {
                actual: json_type_name(reference).to_string(),
            });
        };

        if self.ref_stack.contains(reference) {
            log::debug!("circular reference to {} at '{}'", reference, path);
            let mut marker = Map::new();
            marker.insert(CIRCULAR_REF_MARKER.to_string(), Value::from(reference));
            return Ok(Value::Object(marker));
        }

        self.ref_stack.insert(reference.to_string());
        let expanded = self.expand_ref(map, reference, path);
        self.ref_stack.remove(reference);
        expanded
    }

    fn expand_ref(
        &mut self,
        map: &Map<String, Value>,
        reference: &str,
        path: &str,
    ) -> Result<Value, ResolveError> {
        let target = self.resolver.resolve(&self.spec, reference)?;
        let target = self.dereference_value(&target, path)?;

        let mut result = match target {
            Value::Object(result) => result,
            other => {
                if map.len() > 1 {
                    log::debug!(
                        "{} resolves to a non-mapping value, dropping sibling keys at '{}'",
                        reference,
                        path
                    );
                }
                return Ok(other);
            }
        };

        for (key, sibling) in map {
            if key == "$ref" {
                continue;
            }
            let sibling_path = format!("{}/{}", path, key);
            let sibling = self.dereference_value(sibling, &sibling_path)?;
            result.insert(key.clone(), sibling);
        }

        Ok(Value::Object(result))
    }
}
