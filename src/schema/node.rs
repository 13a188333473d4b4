//! Schema Node Model
//!
//! Typed view over one JSON Schema fragment. Shape detection follows a fixed
//! precedence (first match wins):
//!
//! ```text
//! const → enum → string → number/integer/float → null → boolean
//!       → anyOf → object → array → unmatched
//! ```
//!
//! Anything that matches none of the shapes becomes [`SchemaNode::Unmatched`],
//! so the renderer handles malformed input through the same exhaustive match
//! as everything else.

use serde_json::{Map, Number, Value};
use std::collections::HashSet;

// =============================================================================
// Shared Metadata
// =============================================================================

/// Keywords every node may carry regardless of its shape
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Meta {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Declared default. `Some(Value::Null)` means `"default": null` was written.
    pub default: Option<Value>,
    pub examples: Option<Value>,
    pub deprecated: bool,
}

impl Meta {
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        Self {
            title: string_field(obj, "title"),
            description: string_field(obj, "description"),
            default: obj.get("default").cloned(),
            examples: obj.get("examples").cloned(),
            deprecated: obj.get("deprecated").and_then(|v| v.as_bool()).unwrap_or(false),
        }
    }
}

// =============================================================================
// Kind-specific Constraints
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringConstraints {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberConstraints {
    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
    pub exclusive_minimum: Option<Number>,
    pub exclusive_maximum: Option<Number>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayConstraints {
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
}

/// The literal numeric type name a node declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericType {
    Number,
    Integer,
    Float,
}

impl NumericType {
    pub fn from_json_type(type_str: &str) -> Option<Self> {
        match type_str {
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "float" => Some(Self::Float),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Float => "float",
        }
    }
}

/// What an object says about undeclared keys
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProperties {
    /// Keyword not present
    Unspecified,
    /// `additionalProperties: true | false`
    Flag(bool),
    /// `additionalProperties: { ...schema... }`
    Schema(Box<SchemaNode>),
}

/// A declared object property. `required` comes from the parent's list.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: String,
    pub required: bool,
    pub node: SchemaNode,
}

// =============================================================================
// Schema Node
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Constant {
        meta: Meta,
        value: Value,
    },
    Enum {
        meta: Meta,
        values: Vec<Value>,
    },
    String {
        meta: Meta,
        constraints: StringConstraints,
    },
    Number {
        meta: Meta,
        numeric_type: NumericType,
        constraints: NumberConstraints,
    },
    Null {
        meta: Meta,
    },
    Boolean {
        meta: Meta,
    },
    Union {
        meta: Meta,
        options: Vec<SchemaNode>,
    },
    Object {
        meta: Meta,
        /// Declaration order; `None` when `properties` is absent
        properties: Option<Vec<Property>>,
        additional: AdditionalProperties,
        /// Keys listed in `required`, including ones never declared
        required: Vec<String>,
    },
    Array {
        meta: Meta,
        items: Box<SchemaNode>,
        constraints: ArrayConstraints,
    },
    /// Matches no recognized shape; rendered as a diagnostic
    Unmatched {
        meta: Meta,
        raw: Value,
    },
}

/// Kind label shown next to a property title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Constant,
    Enum,
    String,
    Number(NumericType),
    Null,
    Boolean,
    Union,
    Object,
    Array,
    Unmatched,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Enum => "enum",
            Self::String => "string",
            Self::Number(t) => t.as_str(),
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Union => "union",
            Self::Object => "object",
            Self::Array => "array",
            Self::Unmatched => "unknown",
        }
    }
}

impl SchemaNode {
    /// Detect the shape of a (dereferenced) schema value
    pub fn from_value(value: &Value) -> SchemaNode {
        let Some(obj) = value.as_object() else {
            return SchemaNode::Unmatched {
                meta: Meta::default(),
                raw: value.clone(),
            };
        };
        let meta = Meta::from_object(obj);

        if let Some(value) = obj.get("const") {
            return SchemaNode::Constant {
                meta,
                value: value.clone(),
            };
        }

        if let Some(values) = obj.get("enum") {
            let values = match values {
                Value::Array(arr) => arr.clone(),
                other => vec![other.clone()],
            };
            return SchemaNode::Enum { meta, values };
        }

        let json_type = obj.get("type").and_then(|v| v.as_str());

        if json_type == Some("string") {
            return SchemaNode::String {
                meta,
                constraints: StringConstraints {
                    min_length: obj.get("minLength").and_then(|v| v.as_u64()),
                    max_length: obj.get("maxLength").and_then(|v| v.as_u64()),
                    pattern: string_field(obj, "pattern"),
                    format: string_field(obj, "format"),
                },
            };
        }

        if let Some(numeric_type) = json_type.and_then(NumericType::from_json_type) {
            return SchemaNode::Number {
                meta,
                numeric_type,
                constraints: NumberConstraints {
                    minimum: number_field(obj, "minimum"),
                    maximum: number_field(obj, "maximum"),
                    exclusive_minimum: number_field(obj, "exclusiveMinimum"),
                    exclusive_maximum: number_field(obj, "exclusiveMaximum"),
                    unit: string_field(obj, "unit"),
                },
            };
        }

        match json_type {
            Some("null") => return SchemaNode::Null { meta },
            Some("boolean") => return SchemaNode::Boolean { meta },
            _ => {}
        }

        if let Some(any_of) = obj.get("anyOf").and_then(|v| v.as_array()) {
            return SchemaNode::Union {
                meta,
                options: any_of.iter().map(SchemaNode::from_value).collect(),
            };
        }

        match json_type {
            Some("object") => object_node(obj, meta),
            Some("array") => {
                // Missing items parse as an empty schema, which is unmatched
                let items = obj
                    .get("items")
                    .map(SchemaNode::from_value)
                    .unwrap_or_else(|| SchemaNode::from_value(&Value::Object(Map::new())));
                SchemaNode::Array {
                    meta,
                    items: Box::new(items),
                    constraints: ArrayConstraints {
                        min_items: obj.get("minItems").and_then(|v| v.as_u64()),
                        max_items: obj.get("maxItems").and_then(|v| v.as_u64()),
                    },
                }
            }
            _ => SchemaNode::Unmatched {
                meta,
                raw: value.clone(),
            },
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            SchemaNode::Constant { .. } => NodeKind::Constant,
            SchemaNode::Enum { .. } => NodeKind::Enum,
            SchemaNode::String { .. } => NodeKind::String,
            SchemaNode::Number { numeric_type, .. } => NodeKind::Number(*numeric_type),
            SchemaNode::Null { .. } => NodeKind::Null,
            SchemaNode::Boolean { .. } => NodeKind::Boolean,
            SchemaNode::Union { .. } => NodeKind::Union,
            SchemaNode::Object { .. } => NodeKind::Object,
            SchemaNode::Array { .. } => NodeKind::Array,
            SchemaNode::Unmatched { .. } => NodeKind::Unmatched,
        }
    }

    pub fn meta(&self) -> &Meta {
        match self {
            SchemaNode::Constant { meta, .. }
            | SchemaNode::Enum { meta, .. }
            | SchemaNode::String { meta, .. }
            | SchemaNode::Number { meta, .. }
            | SchemaNode::Null { meta }
            | SchemaNode::Boolean { meta }
            | SchemaNode::Union { meta, .. }
            | SchemaNode::Object { meta, .. }
            | SchemaNode::Array { meta, .. }
            | SchemaNode::Unmatched { meta, .. } => meta,
        }
    }
}

fn object_node(obj: &Map<String, Value>, meta: Meta) -> SchemaNode {
    let required: Vec<String> = obj
        .get("required")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default();
    let required_set: HashSet<&str> = required.iter().map(String::as_str).collect();

    let properties = obj.get("properties").and_then(|v| v.as_object()).map(|props| {
        props
            .iter()
            .map(|(key, prop)| Property {
                key: key.clone(),
                required: required_set.contains(key.as_str()),
                node: SchemaNode::from_value(prop),
            })
            .collect()
    });

    let additional = match obj.get("additionalProperties") {
        None => AdditionalProperties::Unspecified,
        Some(Value::Bool(flag)) => AdditionalProperties::Flag(*flag),
        Some(schema) => AdditionalProperties::Schema(Box::new(SchemaNode::from_value(schema))),
    };

    SchemaNode::Object {
        meta,
        properties,
        additional,
        required,
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(|v| v.as_str()).map(String::from)
}

fn number_field(obj: &Map<String, Value>, key: &str) -> Option<Number> {
    match obj.get(key) {
        Some(Value::Number(n)) => Some(n.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_const_wins_over_type() {
        let node = SchemaNode::from_value(&json!({ "const": "1.0", "type": "string" }));
        match node {
            SchemaNode::Constant { value, .. } => assert_eq!(value, json!("1.0")),
            other => panic!("Expected Constant, got {:?}", other),
        }
    }

    #[test]
    fn test_enum_wins_over_string() {
        let node = SchemaNode::from_value(&json!({
            "type": "string",
            "enum": ["cli", "automated"]
        }));
        match node {
            SchemaNode::Enum { values, .. } => assert_eq!(values, vec![json!("cli"), json!("automated")]),
            other => panic!("Expected Enum, got {:?}", other),
        }
    }

    #[test]
    fn test_numeric_label_keeps_declared_name() {
        let float = SchemaNode::from_value(&json!({ "type": "float" }));
        assert_eq!(float.kind().label(), "float");

        let integer = SchemaNode::from_value(&json!({ "type": "integer", "minimum": 1 }));
        assert_eq!(integer.kind().label(), "integer");
        match integer {
            SchemaNode::Number { constraints, .. } => {
                assert_eq!(constraints.minimum, Some(Number::from(1)));
            }
            other => panic!("Expected Number, got {:?}", other),
        }
    }

    #[test]
    fn test_union_keeps_declaration_order() {
        let node = SchemaNode::from_value(&json!({
            "anyOf": [{ "type": "string", "minLength": 1 }, { "type": "null" }],
            "default": null
        }));
        match node {
            SchemaNode::Union { options, meta } => {
                assert_eq!(options.len(), 2);
                assert_eq!(options[0].kind(), NodeKind::String);
                assert_eq!(options[1].kind(), NodeKind::Null);
                assert_eq!(meta.default, Some(Value::Null));
            }
            other => panic!("Expected Union, got {:?}", other),
        }
    }

    #[test]
    fn test_object_required_flags() {
        let node = SchemaNode::from_value(&json!({
            "type": "object",
            "required": ["a"],
            "properties": {
                "a": { "type": "string" },
                "b": { "type": "integer", "default": 5 }
            }
        }));
        match node {
            SchemaNode::Object { properties: Some(props), .. } => {
                let keys: Vec<_> = props.iter().map(|p| p.key.as_str()).collect();
                assert_eq!(keys, vec!["a", "b"]);
                assert!(props[0].required);
                assert!(!props[1].required);
            }
            other => panic!("Expected Object with properties, got {:?}", other),
        }
    }

    #[test]
    fn test_additional_properties_schema() {
        let node = SchemaNode::from_value(&json!({
            "type": "object",
            "additionalProperties": { "type": "number" }
        }));
        match node {
            SchemaNode::Object { properties: None, additional: AdditionalProperties::Schema(inner), .. } => {
                assert_eq!(inner.kind(), NodeKind::Number(NumericType::Number));
            }
            other => panic!("Expected Object with schema additionalProperties, got {:?}", other),
        }
    }

    #[test]
    fn test_array_without_items_is_unmatched_inside() {
        let node = SchemaNode::from_value(&json!({ "type": "array", "items": {} }));
        match node {
            SchemaNode::Array { items, .. } => assert_eq!(items.kind(), NodeKind::Unmatched),
            other => panic!("Expected Array, got {:?}", other),
        }
    }

    #[test]
    fn test_unrecognized_shape() {
        let node = SchemaNode::from_value(&json!({ "foo": "bar" }));
        assert_eq!(node.kind(), NodeKind::Unmatched);

        let typed_list = SchemaNode::from_value(&json!({ "type": ["string", "null"] }));
        assert_eq!(typed_list.kind(), NodeKind::Unmatched);
    }
}
