//! Schema Linting
//!
//! Checks a dereferenced document for problems that render silently but
//! mislead readers.
//!
//! ## Lints
//! 1. **Structure**: `required` keys that are never declared, empty `anyOf`
//! 2. **Self-consistency**: `default` and `examples` must validate against
//!    the node that declares them
//! 3. **Coverage**: object properties without a description (info only)
//!
//! Paths use the same dotted keys as the renderer (`root.jobs.#.option 1`).

use jsonschema::{Draft, JSONSchema};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

use crate::diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics};
use crate::error::Result;
use crate::render::DEFAULT_ROOT_KEY;
use crate::schema::loader::{DocumentKind, SchemaDocument};

/// Result of linting one document
#[derive(Debug, Default)]
pub struct LintResult {
    pub document: String,
    pub diagnostics: Diagnostics,
}

impl LintResult {
    pub fn is_clean(&self) -> bool {
        !self.diagnostics.has_errors()
    }
}

#[derive(Debug, Clone)]
pub struct SchemaLinter {
    /// Report properties without a description
    check_descriptions: bool,
    /// Validate `default` / `examples` against their node
    check_values: bool,
}

impl Default for SchemaLinter {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaLinter {
    pub fn new() -> Self {
        Self {
            check_descriptions: true,
            check_values: true,
        }
    }

    pub fn with_descriptions(mut self, enabled: bool) -> Self {
        self.check_descriptions = enabled;
        self
    }

    pub fn with_value_checks(mut self, enabled: bool) -> Self {
        self.check_values = enabled;
        self
    }

    /// Lint a dereferenced schema
    pub fn lint(&self, document: &str, schema: &Value) -> LintResult {
        let mut result = LintResult {
            document: document.to_string(),
            ..Default::default()
        };

        let compiles = match compile(schema) {
            Ok(_) => true,
            Err(message) => {
                result.diagnostics.push(DiagnosticItem::new(
                    DEFAULT_ROOT_KEY,
                    DiagnosticCode::InvalidSchema,
                    format!("Document is not a valid JSON Schema: {}", message),
                ));
                false
            }
        };

        self.lint_node(schema, DEFAULT_ROOT_KEY, compiles && self.check_values, &mut result.diagnostics);
        debug!(document, findings = result.diagnostics.len(), "linted document");
        result
    }

    fn lint_node(&self, value: &Value, path: &str, check_values: bool, out: &mut Diagnostics) {
        let Some(obj) = value.as_object() else {
            return;
        };

        if check_values {
            self.check_declared_values(value, obj, path, out);
        }

        if let Some(any_of) = obj.get("anyOf").and_then(|v| v.as_array()) {
            if any_of.is_empty() {
                out.push(DiagnosticItem::new(
                    path,
                    DiagnosticCode::EmptyUnion,
                    format!("'{}' declares an empty anyOf", path),
                ));
            }
            for (i, option) in any_of.iter().enumerate() {
                self.lint_node(option, &format!("{}.option {}", path, i + 1), check_values, out);
            }
        }

        let properties = obj.get("properties").and_then(|v| v.as_object());
        self.check_required(obj, properties, path, out);

        if let Some(properties) = properties {
            for (key, property) in properties {
                let child_path = format!("{}.{}", path, key);
                if self.check_descriptions && property.get("description").is_none() {
                    out.push(DiagnosticItem::new(
                        &child_path,
                        DiagnosticCode::MissingDescription,
                        format!("Property '{}' has no description", key),
                    ));
                }
                self.lint_node(property, &child_path, check_values, out);
            }
        }

        if let Some(items) = obj.get("items") {
            self.lint_node(items, &format!("{}.#", path), check_values, out);
        }
        if let Some(additional) = obj.get("additionalProperties").filter(|v| v.is_object()) {
            self.lint_node(additional, &format!("{}.*", path), check_values, out);
        }
    }

    fn check_required(
        &self,
        obj: &Map<String, Value>,
        properties: Option<&Map<String, Value>>,
        path: &str,
        out: &mut Diagnostics,
    ) {
        let Some(required) = obj.get("required").and_then(|v| v.as_array()) else {
            return;
        };
        let declared: HashSet<&str> = properties
            .map(|p| p.keys().map(String::as_str).collect())
            .unwrap_or_default();

        for key in required.iter().filter_map(|v| v.as_str()) {
            if !declared.contains(key) {
                out.push(DiagnosticItem::new(
                    path,
                    DiagnosticCode::RequiredNotDeclared,
                    format!("'{}' is required but not declared in properties", key),
                ));
            }
        }
    }

    fn check_declared_values(&self, schema: &Value, obj: &Map<String, Value>, path: &str, out: &mut Diagnostics) {
        let default = obj.get("default");
        let examples: Vec<&Value> = match obj.get("examples") {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(other) => vec![other],
            None => Vec::new(),
        };
        if default.is_none() && examples.is_empty() {
            return;
        }

        // Compile failures here were already reported for the whole document
        let Ok(compiled) = compile(schema) else {
            return;
        };

        if let Some(default) = default {
            if let Some(errors) = validation_errors(&compiled, default) {
                let mut item = DiagnosticItem::new(
                    path,
                    DiagnosticCode::InvalidDefault,
                    format!("Default {} does not match its own schema", default),
                );
                for error in errors {
                    item = item.with_context(error);
                }
                out.push(item);
            }
        }

        for example in examples {
            if let Some(errors) = validation_errors(&compiled, example) {
                let mut item = DiagnosticItem::new(
                    path,
                    DiagnosticCode::InvalidExample,
                    format!("Example {} does not match its own schema", example),
                );
                for error in errors {
                    item = item.with_context(error);
                }
                out.push(item);
            }
        }
    }
}

fn compile(schema: &Value) -> std::result::Result<JSONSchema, String> {
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema)
        .map_err(|e| e.to_string())
}

/// Validator messages, or `None` when the instance is valid
fn validation_errors(compiled: &JSONSchema, instance: &Value) -> Option<Vec<String>> {
    match compiled.validate(instance) {
        Ok(()) => None,
        Err(errors) => Some(
            errors
                .map(|e| {
                    let location = e.instance_path.to_string();
                    if location.is_empty() {
                        e.to_string()
                    } else {
                        format!("{}: {}", location, e)
                    }
                })
                .collect(),
        ),
    }
}

/// Lint every schema document; file trees are skipped
pub fn lint_documents(documents: &[SchemaDocument], linter: &SchemaLinter) -> Result<Vec<LintResult>> {
    let mut results = Vec::new();
    for document in documents.iter().filter(|d| d.kind == DocumentKind::Schema) {
        let resolved = document.resolve()?;
        results.push(linter.lint(&document.name, &resolved));
    }
    Ok(results)
}
