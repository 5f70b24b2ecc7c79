//! Schema normalization - turns OpenAPI Schema Objects into reference-free schemas.
//!
//! Local `$ref` chains are inlined, OpenAPI 3.1 `anyOf`-with-null unions are
//! flattened into the 3.0 `nullable` flag, and nested schemas under
//! `properties`, `items`, `allOf`, `anyOf` and `oneOf` are normalized
//! recursively. Reference failures never escape: an unresolvable `$ref`
//! becomes a placeholder object schema, and a reference that is already being
//! expanded higher up the tree becomes a circular-reference stub.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::pointer::resolve_local;
use crate::types::{COMPOSITE_KEYWORDS, COPIED_SCHEMA_KEYS, NESTED_SCHEMA_KEYS};

/// Normalize a single schema against `spec` with a fresh resolution stack.
pub fn normalize_schema(schema: &Value, spec: &Value) -> Value {
    SchemaNormalizer::new(spec).normalize(schema)
}

/// Recursive schema walker with cycle detection.
///
/// The resolution stack holds the references currently being expanded on the
/// path from the top-level schema to the node being processed. Every push is
/// paired with a pop before the expanding call returns, so the stack is empty
/// between top-level calls.
#[derive(Debug)]
pub struct SchemaNormalizer<'a> {
    spec: &'a Value,
    ref_stack: HashSet<String>,
}

impl<'a> SchemaNormalizer<'a> {
    pub fn new(spec: &'a Value) -> Self {
        Self {
            spec,
            ref_stack: HashSet::new(),
        }
    }

    /// Normalize a schema. Empty or non-mapping input yields `{}`.
    pub fn normalize(&mut self, schema: &Value) -> Value {
        self.normalize_at(schema, "")
    }

    /// Normalize a schema, labelling its position as `path` in diagnostics.
    pub fn normalize_at(&mut self, schema: &Value, path: &str) -> Value {
        Value::Object(self.normalize_map(schema, path))
    }

    /// True when no reference is currently being expanded.
    pub fn is_idle(&self) -> bool {
        self.ref_stack.is_empty()
    }

    fn normalize_map(&mut self, schema: &Value, path: &str) -> Map<String, Value> {
        let Some(schema) = schema.as_object().filter(|map| !map.is_empty()) else {
            return Map::new();
        };

        if let Some(reference) = schema.get("$ref") {
            return self.normalize_ref(schema, reference, path);
        }

        let mut normalized = Map::new();

        for key in COPIED_SCHEMA_KEYS {
            if let Some(value) = schema.get(*key) {
                normalized.insert(key.to_string(), value.clone());
            }
        }

        let collapsed_any_of = self.normalize_nullable(schema, &mut normalized, path);

        let schema_type = schema.get("type").and_then(Value::as_str);

        if schema_type == Some("object") || schema.contains_key("properties") {
            normalized.insert("type".to_string(), Value::from("object"));
            if let Some(properties) = schema.get("properties") {
                let mut normalized_props = Map::new();
                if let Some(properties) = properties.as_object() {
                    for (name, prop) in properties {
                        let prop_path = format!("{}>{}", path, name);
                        normalized_props.insert(name.clone(), self.normalize_at(prop, &prop_path));
                    }
                }
                normalized.insert("properties".to_string(), Value::Object(normalized_props));
            }
            if let Some(required) = schema.get("required") {
                normalized.insert("required".to_string(), required.clone());
            }
        }

        if schema_type == Some("array") {
            if let Some(items) = schema.get("items") {
                normalized.insert("type".to_string(), Value::from("array"));
                let items_path = format!("{}>items", path);
                normalized.insert("items".to_string(), self.normalize_at(items, &items_path));
            }
        }

        for keyword in COMPOSITE_KEYWORDS {
            if *keyword == "anyOf" && collapsed_any_of {
                continue;
            }
            let Some(members) = schema.get(*keyword) else {
                continue;
            };
            let value = match members.as_array() {
                Some(members) => Value::Array(
                    members
                        .iter()
                        .enumerate()
                        .map(|(i, member)| {
                            let member_path = format!("{}>{}[{}]", path, keyword, i);
                            self.normalize_at(member, &member_path)
                        })
                        .collect(),
                ),
                None => members.clone(),
            };
            normalized.insert(keyword.to_string(), value);
        }

        // Vendor extensions and anything else not handled above
        for (key, value) in schema {
            if !normalized.contains_key(key) && !NESTED_SCHEMA_KEYS.contains(&key.as_str()) {
                normalized.insert(key.clone(), value.clone());
            }
        }

        normalized
    }

    /// Inline a `$ref`, keeping sibling keys the target doesn't define.
    fn normalize_ref(
        &mut self,
        schema: &Map<String, Value>,
        reference: &Value,
        path: &str,
    ) -> Map<String, Value> {
        let Some(reference) = reference.as_str() else {
            let reference = reference.to_string();
            log::warn!("non-string $ref {} at '{}'", reference, path);
            return reference_stub(
                Value::from("object"),
                format!("Failed to resolve reference: {}", reference),
                &reference,
            );
        };

        if self.ref_stack.contains(reference) {
            log::debug!("circular reference to {} at '{}'", reference, path);
            return reference_stub(
                self.base_type(reference),
                format!("Circular reference to {}", reference),
                reference,
            );
        }

        let target = match resolve_local(self.spec, reference) {
            Ok(target) => target,
            Err(e) => {
                log::warn!("{} (at '{}'), using placeholder schema", e, path);
                return reference_stub(
                    Value::from("object"),
                    format!("Failed to resolve reference: {}", reference),
                    reference,
                );
            }
        };

        let ref_path = format!("{}>{}", path, reference);
        self.ref_stack.insert(reference.to_string());
        let mut normalized = self.normalize_map(target, &ref_path);
        self.ref_stack.remove(reference);

        for (key, value) in schema {
            if key != "$ref" && !normalized.contains_key(key) {
                normalized.insert(key.clone(), value.clone());
            }
        }

        normalized
    }

    /// Apply `nullable`, either carried through or synthesized from an
    /// `anyOf` containing a `{"type": "null"}` branch.
    ///
    /// Returns true when the `anyOf` was fully absorbed (a single non-null
    /// branch) and must not be emitted again.
    fn normalize_nullable(
        &mut self,
        schema: &Map<String, Value>,
        normalized: &mut Map<String, Value>,
        path: &str,
    ) -> bool {
        if matches!(schema.get("nullable"), Some(Value::Bool(true))) {
            normalized.insert("nullable".to_string(), Value::Bool(true));
            return false;
        }

        let Some(branches) = schema.get("anyOf").and_then(Value::as_array) else {
            return false;
        };
        if !branches.iter().any(is_null_branch) {
            return false;
        }

        normalized.insert("nullable".to_string(), Value::Bool(true));

        let non_null = branches.iter().filter(|b| !is_null_branch(b)).count();
        if let Some(index) = branches.iter().position(|b| !is_null_branch(b)) {
            let branch_path = format!("{}>anyOf[{}]", path, index);
            let branch = self.normalize_map(&branches[index], &branch_path);
            for (key, value) in branch {
                normalized.entry(key).or_insert(value);
            }
        }

        non_null <= 1
    }

    /// Infer the type for a circular-reference stub without expanding the target.
    fn base_type(&self, reference: &str) -> Value {
        let Ok(Value::Object(target)) = resolve_local(self.spec, reference) else {
            return Value::from("object");
        };

        if let Some(schema_type) = target.get("type") {
            schema_type.clone()
        } else if target.contains_key("properties") {
            Value::from("object")
        } else if target.contains_key("enum") {
            Value::from("string")
        } else {
            Value::from("object")
        }
    }
}

fn is_null_branch(branch: &Value) -> bool {
    branch.get("type").and_then(Value::as_str) == Some("null")
}

fn reference_stub(schema_type: Value, description: String, reference: &str) -> Map<String, Value> {
    let mut stub = Map::new();
    stub.insert("type".to_string(), schema_type);
    stub.insert("description".to_string(), Value::String(description));
    stub.insert("title".to_string(), Value::from(reference));
    stub
}
