//! $ref Dereferencing
//!
//! Inlines every `$ref` of a schema document so the renderer only ever sees a
//! finite, ref-free tree. Supported targets:
//!
//! - `#/json/pointer` into the current document
//! - `other.json` and `other.json#/json/pointer`, relative to the current document
//!
//! Remote references are rejected. A reference that is re-entered while it is
//! still being expanded is a cycle and fails the whole pass.

use include_dir::Dir;
use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::error::{DocsError, Result};

/// Keywords whose values are instance data, never schemas
const LITERAL_KEYWORDS: &[&str] = &["default", "examples", "const", "enum"];

/// Keywords holding a name → schema map
const SCHEMA_MAP_KEYWORDS: &[&str] = &["properties", "patternProperties"];

/// Definition containers, dropped from the output once refs are inlined
const DEFINITION_KEYWORDS: &[&str] = &["$defs", "definitions"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DocId {
    /// In-memory document passed to [`Dereferencer::dereference`]
    Root,
    File(PathBuf),
}

impl DocId {
    fn display(&self) -> String {
        match self {
            DocId::Root => "<root>".to_string(),
            DocId::File(path) => path.display().to_string(),
        }
    }
}

/// Resolves `$ref`s, caching every external document it loads
#[derive(Debug, Default)]
pub struct Dereferencer {
    base_dir: Option<PathBuf>,
    /// File refs are read from here instead of the filesystem
    embedded: Option<&'static Dir<'static>>,
    documents: HashMap<DocId, Value>,
}

impl Dereferencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory that relative file refs of an in-memory root resolve against
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
            ..Default::default()
        }
    }

    /// Resolve file refs inside `dir`; `base_dir` is the root's location within it
    pub fn with_embedded(dir: &'static Dir<'static>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
            embedded: Some(dir),
            ..Default::default()
        }
    }

    /// Dereference an in-memory document
    pub fn dereference(&mut self, root: &Value) -> Result<Value> {
        self.documents.insert(DocId::Root, root.clone());
        let mut stack = Vec::new();
        self.resolve_schema(root, &DocId::Root, &mut stack)
    }

    /// Load and dereference a document from disk
    pub fn dereference_file(&mut self, path: &Path) -> Result<Value> {
        let doc = DocId::File(normalize_path(path));
        let root = self.load(&doc)?.clone();
        let mut stack = Vec::new();
        self.resolve_schema(&root, &doc, &mut stack)
    }

    fn resolve_schema(&mut self, value: &Value, doc: &DocId, stack: &mut Vec<String>) -> Result<Value> {
        match value {
            Value::Object(obj) => {
                if let Some(Value::String(reference)) = obj.get("$ref") {
                    return self.resolve_ref(reference, obj, doc, stack);
                }
                self.resolve_keywords(obj, doc, stack).map(Value::Object)
            }
            Value::Array(arr) => arr
                .iter()
                .map(|item| self.resolve_schema(item, doc, stack))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn resolve_keywords(
        &mut self,
        obj: &Map<String, Value>,
        doc: &DocId,
        stack: &mut Vec<String>,
    ) -> Result<Map<String, Value>> {
        let mut out = Map::with_capacity(obj.len());
        for (key, value) in obj {
            let key_str = key.as_str();
            if DEFINITION_KEYWORDS.contains(&key_str) || key_str == "$ref" {
                continue;
            }
            let resolved = if LITERAL_KEYWORDS.contains(&key_str) {
                value.clone()
            } else if SCHEMA_MAP_KEYWORDS.contains(&key_str) {
                match value {
                    Value::Object(schemas) => {
                        let mut resolved = Map::with_capacity(schemas.len());
                        for (name, schema) in schemas {
                            resolved.insert(name.clone(), self.resolve_schema(schema, doc, stack)?);
                        }
                        Value::Object(resolved)
                    }
                    other => other.clone(),
                }
            } else {
                self.resolve_schema(value, doc, stack)?
            };
            out.insert(key.clone(), resolved);
        }
        Ok(out)
    }

    fn resolve_ref(
        &mut self,
        reference: &str,
        obj: &Map<String, Value>,
        doc: &DocId,
        stack: &mut Vec<String>,
    ) -> Result<Value> {
        let (target_doc, pointer) = self.locate(reference, doc)?;
        let id = format!("{}#{}", target_doc.display(), pointer);

        if let Some(pos) = stack.iter().position(|entry| entry == &id) {
            let mut chain = stack[pos..].to_vec();
            chain.push(id);
            return Err(DocsError::CyclicRef { chain });
        }

        let target = self
            .load(&target_doc)?
            .pointer(&pointer)
            .cloned()
            .ok_or_else(|| DocsError::UnresolvedRef {
                document: doc.display(),
                reference: reference.to_string(),
            })?;

        debug!(reference, target = %id, "resolving $ref");
        stack.push(id);
        let resolved = self.resolve_schema(&target, &target_doc, stack);
        stack.pop();
        let resolved = resolved?;

        // Keywords written next to the $ref override the target's
        let siblings = self.resolve_keywords(obj, doc, stack)?;
        if siblings.is_empty() {
            return Ok(resolved);
        }
        match resolved {
            Value::Object(mut merged) => {
                merged.extend(siblings);
                Ok(Value::Object(merged))
            }
            _ => Ok(Value::Object(siblings)),
        }
    }

    /// Split a reference into the document it points at and a JSON pointer
    fn locate(&mut self, reference: &str, current: &DocId) -> Result<(DocId, String)> {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return Err(DocsError::UnsupportedRef(reference.to_string()));
        }

        let (file_part, fragment) = match reference.split_once('#') {
            Some((file, fragment)) => (file, fragment),
            None => (reference, ""),
        };

        if !fragment.is_empty() && !fragment.starts_with('/') {
            return Err(DocsError::InvalidPointer(reference.to_string()));
        }
        // Fragments are URI-encoded; JSON pointers are not
        let pointer = percent_decode_str(fragment)
            .decode_utf8()
            .map_err(|_| DocsError::InvalidPointer(reference.to_string()))?;

        let target_doc = if file_part.is_empty() {
            current.clone()
        } else {
            let base = match current {
                DocId::Root => self.base_dir.clone().unwrap_or_default(),
                DocId::File(path) => path.parent().map(Path::to_path_buf).unwrap_or_default(),
            };
            DocId::File(normalize_path(&base.join(file_part)))
        };

        Ok((target_doc, pointer.into_owned()))
    }

    fn load(&mut self, doc: &DocId) -> Result<&Value> {
        if !self.documents.contains_key(doc) {
            let DocId::File(path) = doc else {
                return Err(DocsError::UnresolvedRef {
                    document: doc.display(),
                    reference: String::new(),
                });
            };
            let content = match self.embedded {
                Some(dir) => dir
                    .get_file(path)
                    .and_then(|file| file.contents_utf8())
                    .map(String::from)
                    .ok_or_else(|| DocsError::UnresolvedRef {
                        document: doc.display(),
                        reference: path.display().to_string(),
                    })?,
                None => fs::read_to_string(path)?,
            };
            let json: Value = serde_json::from_str(&content).map_err(|source| DocsError::Parse {
                path: path.display().to_string(),
                source,
            })?;
            debug!(path = %path.display(), "loaded referenced document");
            self.documents.insert(doc.clone(), json);
        }
        self.documents.get(doc).ok_or_else(|| DocsError::UnresolvedRef {
            document: doc.display(),
            reference: String::new(),
        })
    }
}

/// Dereference an in-memory document that only uses local refs
pub fn dereference(root: &Value) -> Result<Value> {
    Dereferencer::new().dereference(root)
}

/// Load and dereference a document from disk
pub fn dereference_file(path: &Path) -> Result<Value> {
    Dereferencer::new().dereference_file(path)
}

/// Fold `.` and `..` components without touching the filesystem
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inlines_defs() {
        let doc = json!({
            "type": "object",
            "properties": {
                "item": { "$ref": "#/$defs/Item" }
            },
            "$defs": {
                "Item": { "type": "string", "title": "Item" }
            }
        });
        let resolved = dereference(&doc).unwrap();
        assert_eq!(
            resolved,
            json!({
                "type": "object",
                "properties": {
                    "item": { "type": "string", "title": "Item" }
                }
            })
        );
    }

    #[test]
    fn test_siblings_override_target() {
        let doc = json!({
            "properties": {
                "queue": { "$ref": "#/definitions/Queue", "description": "local override" }
            },
            "definitions": {
                "Queue": { "type": "array", "description": "shared", "items": { "type": "string" } }
            }
        });
        let resolved = dereference(&doc).unwrap();
        assert_eq!(resolved["properties"]["queue"]["description"], json!("local override"));
        assert_eq!(resolved["properties"]["queue"]["type"], json!("array"));
    }

    #[test]
    fn test_literal_keywords_untouched() {
        let doc = json!({
            "type": "object",
            "default": { "$ref": "not-a-schema" },
            "examples": [{ "$ref": "#/nowhere" }]
        });
        let resolved = dereference(&doc).unwrap();
        assert_eq!(resolved["default"], json!({ "$ref": "not-a-schema" }));
    }

    #[test]
    fn test_self_cycle_fails() {
        let doc = json!({
            "$defs": {
                "Node": {
                    "type": "object",
                    "properties": { "children": { "type": "array", "items": { "$ref": "#/$defs/Node" } } }
                }
            },
            "$ref": "#/$defs/Node"
        });
        match dereference(&doc) {
            Err(DocsError::CyclicRef { chain }) => {
                assert_eq!(chain.first(), chain.last());
                assert!(chain[0].ends_with("#/$defs/Node"));
            }
            other => panic!("Expected CyclicRef, got {:?}", other),
        }
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let doc = json!({
            "type": "object",
            "properties": {
                "a": { "$ref": "#/$defs/Id" },
                "b": { "$ref": "#/$defs/Id" }
            },
            "$defs": { "Id": { "type": "string" } }
        });
        let resolved = dereference(&doc).unwrap();
        assert_eq!(resolved["properties"]["a"], resolved["properties"]["b"]);
    }

    #[test]
    fn test_unresolved_and_remote() {
        let missing = json!({ "$ref": "#/$defs/Missing" });
        assert!(matches!(dereference(&missing), Err(DocsError::UnresolvedRef { .. })));

        let remote = json!({ "$ref": "https://example.com/schema.json" });
        assert!(matches!(dereference(&remote), Err(DocsError::UnsupportedRef(_))));

        let anchor = json!({ "$ref": "#Item" });
        assert!(matches!(dereference(&anchor), Err(DocsError::InvalidPointer(_))));
    }

    #[test]
    fn test_percent_encoded_fragment() {
        let doc = json!({
            "properties": { "x": { "$ref": "#/$defs/Sensor%20Id" } },
            "$defs": { "Sensor Id": { "type": "string" } }
        });
        let resolved = dereference(&doc).unwrap();
        assert_eq!(resolved["properties"]["x"], json!({ "type": "string" }));

        let invalid = json!({ "$ref": "#/$defs/%FF" });
        assert!(matches!(dereference(&invalid), Err(DocsError::InvalidPointer(_))));
    }

    #[test]
    fn test_file_refs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("location.json"),
            r##"{ "type": "object", "properties": { "lat": { "$ref": "#/$defs/Lat" } }, "$defs": { "Lat": { "type": "number", "maximum": 90 } } }"##,
        )
        .unwrap();
        fs::write(
            dir.path().join("locations.json"),
            r#"{ "type": "array", "items": { "$ref": "location.json" } }"#,
        )
        .unwrap();

        let resolved = dereference_file(&dir.path().join("locations.json")).unwrap();
        assert_eq!(resolved["items"]["properties"]["lat"]["maximum"], json!(90));
    }

    #[test]
    fn test_embedded_file_refs() {
        static REFS: Dir<'static> = include_dir::include_dir!("$CARGO_MANIFEST_DIR/tests/fixtures/refs");

        let resolved = Dereferencer::with_embedded(&REFS, "")
            .dereference(&json!({ "$ref": "station.json" }))
            .unwrap();
        assert_eq!(
            resolved["properties"]["ground_pressure"]["unit"],
            json!("hPa")
        );

        // Never falls back to the working directory
        let missing = Dereferencer::with_embedded(&REFS, "").dereference(&json!({ "$ref": "Cargo.toml" }));
        match missing {
            Err(DocsError::UnresolvedRef { reference, .. }) => assert_eq!(reference, "Cargo.toml"),
            other => panic!("Expected UnresolvedRef, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("a/./b/../c.json")), PathBuf::from("a/c.json"));
    }
}
