//! Schema Renderer
//!
//! Walks a [`SchemaNode`] tree and produces a [`RenderNode`] tree: one panel
//! per property with its key, required marker, kind label, description and
//! the constraint attributes relevant to its kind.
//!
//! ## Recursion
//!
//! ```text
//! object  → each declared property     key = property name, required = in parent's list
//!         → additionalProperties schema key = "*",           required = false
//! array   → items (exactly once)        key = "#",           required = false
//! union   → each anyOf alternative      key = "option N",    required = false
//! ```
//!
//! Every recursion adds 1 to the depth. The renderer is pure: it never
//! touches the schema, and malformed nodes go to [`Diagnostics`] instead of
//! failing the page.

pub mod theme;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::diagnostics::Diagnostics;
use crate::schema::node::{AdditionalProperties, Meta, SchemaNode};

pub use theme::{Palette, Theme, Tier};

/// Default key of the top-level node
pub const DEFAULT_ROOT_KEY: &str = "root";

/// Default nesting limit
pub const DEFAULT_MAX_DEPTH: usize = 32;

// =============================================================================
// Render Tree
// =============================================================================

/// One displayed constraint, in the order the kind lists them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    /// Schema keyword, e.g. `minLength`
    pub name: &'static str,
    /// Reader-facing label, e.g. `min. length`
    pub label: &'static str,
    pub value: Value,
}

impl Attribute {
    pub fn new(name: &'static str, value: Value) -> Self {
        Self {
            name,
            label: attribute_label(name),
            value,
        }
    }
}

/// Reader-facing label of a schema keyword
pub fn attribute_label(name: &str) -> &'static str {
    match name {
        "examples" => "examples",
        "default" => "default",
        "pattern" => "regex pattern",
        "minLength" => "min. length",
        "maxLength" => "max. length",
        "minimum" => "min.",
        "maximum" => "max.",
        "exclusiveMinimum" => "exclusive min.",
        "exclusiveMaximum" => "exclusive max.",
        "minItems" => "min. items",
        "maxItems" => "max. items",
        "const" => "allowed value",
        "enum" => "allowed values",
        "format" => "format",
        "unit" => "unit",
        _ => "attribute",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Body {
    /// Nothing nested
    Leaf,
    /// Object with declared properties, in declaration order
    Properties {
        additional_allowed: bool,
        children: Vec<RenderNode>,
    },
    /// Object without declared properties
    NoSchemaEnforced { additional_allowed: bool },
    /// Array element schema; `None` when it rendered to nothing
    Items { item: Option<Box<RenderNode>> },
    /// Union alternatives that rendered
    Options { options: Vec<RenderNode> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderNode {
    pub key: String,
    /// Dotted key path from the root, e.g. `root.sensors.#`
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Kind label; numeric kinds keep their declared name
    pub kind: &'static str,
    pub required: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `Some(Value::Null)` is a displayed null default, `None` is no default at all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_default: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    pub depth: usize,
    pub body: Body,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<RenderNode>>,
}

impl RenderNode {
    /// Direct children in display order
    pub fn children(&self) -> Vec<&RenderNode> {
        let mut out: Vec<&RenderNode> = match &self.body {
            Body::Leaf | Body::NoSchemaEnforced { .. } => Vec::new(),
            Body::Properties { children, .. } => children.iter().collect(),
            Body::Items { item } => item.iter().map(|b| &**b).collect(),
            Body::Options { options } => options.iter().collect(),
        };
        if let Some(extra) = &self.additional_properties {
            out.push(extra);
        }
        out
    }

    /// Direct child by key
    pub fn child(&self, key: &str) -> Option<&RenderNode> {
        self.children().into_iter().find(|c| c.key == key)
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    /// Number of nodes in this subtree, including itself
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(|c| c.node_count()).sum::<usize>()
    }

    /// `additional properties allowed` for object bodies
    pub fn additional_allowed(&self) -> Option<bool> {
        match &self.body {
            Body::Properties { additional_allowed, .. } | Body::NoSchemaEnforced { additional_allowed } => {
                Some(*additional_allowed)
            }
            _ => None,
        }
    }
}

/// Declared default, else `null` for optional nodes, else nothing
pub fn effective_default(meta: &Meta, required: bool) -> Option<Value> {
    match &meta.default {
        Some(value) => Some(value.clone()),
        None if !required => Some(Value::Null),
        None => None,
    }
}

/// Render tree plus everything that went wrong on the way
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    pub tree: Option<RenderNode>,
    pub diagnostics: Diagnostics,
}

// =============================================================================
// Renderer
// =============================================================================

#[derive(Debug, Clone)]
pub struct Renderer {
    max_depth: usize,
    root_key: String,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            root_key: DEFAULT_ROOT_KEY.to_string(),
        }
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_root_key(mut self, root_key: impl Into<String>) -> Self {
        self.root_key = root_key.into();
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn root_key(&self) -> &str {
        &self.root_key
    }

    /// Render a dereferenced document from its root, required at depth 0
    pub fn render_document(&self, document: &Value) -> RenderOutput {
        let node = SchemaNode::from_value(document);
        let mut diagnostics = Diagnostics::new();
        let tree = self.render_root(&node, &mut diagnostics);
        debug!(
            nodes = tree.as_ref().map(|t| t.node_count()).unwrap_or(0),
            diagnostics = diagnostics.len(),
            "rendered document"
        );
        RenderOutput { tree, diagnostics }
    }

    pub fn render_root(&self, node: &SchemaNode, diagnostics: &mut Diagnostics) -> Option<RenderNode> {
        self.render_property(node, &self.root_key, 0, true, diagnostics)
    }

    /// Render `node` displayed under `key`. `None` only for unmatched nodes
    /// and subtrees past the depth limit, both of which are reported.
    pub fn render_property(
        &self,
        node: &SchemaNode,
        key: &str,
        depth: usize,
        required: bool,
        diagnostics: &mut Diagnostics,
    ) -> Option<RenderNode> {
        self.render_at(node, key, key.to_string(), depth, required, diagnostics)
    }

    fn render_at(
        &self,
        node: &SchemaNode,
        key: &str,
        path: String,
        depth: usize,
        required: bool,
        diagnostics: &mut Diagnostics,
    ) -> Option<RenderNode> {
        if depth > self.max_depth {
            warn!(path = %path, max_depth = self.max_depth, "depth limit exceeded");
            diagnostics.depth_limit_exceeded(&path, self.max_depth);
            return None;
        }

        let meta = node.meta();
        let default = effective_default(meta, required);
        let mut attributes = Vec::new();
        let mut additional_properties = None;

        let body = match node {
            SchemaNode::Constant { value, .. } => {
                push(&mut attributes, "const", Some(value.clone()));
                Body::Leaf
            }
            SchemaNode::Enum { values, .. } => {
                push(&mut attributes, "enum", Some(Value::Array(values.clone())));
                push_default(&mut attributes, &default);
                Body::Leaf
            }
            SchemaNode::String { constraints, .. } => {
                push(&mut attributes, "minLength", constraints.min_length.map(Value::from));
                push(&mut attributes, "maxLength", constraints.max_length.map(Value::from));
                push(&mut attributes, "pattern", constraints.pattern.clone().map(Value::from));
                push(&mut attributes, "format", constraints.format.clone().map(Value::from));
                push_default(&mut attributes, &default);
                push(&mut attributes, "examples", meta.examples.clone());
                Body::Leaf
            }
            SchemaNode::Number { constraints, .. } => {
                push(&mut attributes, "minimum", constraints.minimum.clone().map(Value::Number));
                push(&mut attributes, "maximum", constraints.maximum.clone().map(Value::Number));
                push(
                    &mut attributes,
                    "exclusiveMinimum",
                    constraints.exclusive_minimum.clone().map(Value::Number),
                );
                push(
                    &mut attributes,
                    "exclusiveMaximum",
                    constraints.exclusive_maximum.clone().map(Value::Number),
                );
                push(&mut attributes, "unit", constraints.unit.clone().map(Value::from));
                push_default(&mut attributes, &default);
                push(&mut attributes, "examples", meta.examples.clone());
                Body::Leaf
            }
            SchemaNode::Null { .. } => Body::Leaf,
            SchemaNode::Boolean { .. } => {
                push_default(&mut attributes, &default);
                push(&mut attributes, "examples", meta.examples.clone());
                Body::Leaf
            }
            SchemaNode::Union { options, .. } => {
                let options = options
                    .iter()
                    .enumerate()
                    .filter_map(|(i, option)| {
                        let option_key = format!("option {}", i + 1);
                        let option_path = format!("{}.{}", path, option_key);
                        self.render_at(option, &option_key, option_path, depth + 1, false, diagnostics)
                    })
                    .collect();
                Body::Options { options }
            }
            SchemaNode::Object {
                properties,
                additional,
                ..
            } => {
                let declared = properties.as_deref().filter(|props| !props.is_empty());
                let additional_allowed =
                    matches!(additional, AdditionalProperties::Flag(true)) || declared.is_none();

                if let AdditionalProperties::Schema(schema) = additional {
                    additional_properties = self
                        .render_at(schema, "*", format!("{}.*", path), depth + 1, false, diagnostics)
                        .map(Box::new);
                }

                match declared {
                    Some(props) => Body::Properties {
                        additional_allowed,
                        children: props
                            .iter()
                            .filter_map(|prop| {
                                let child_path = format!("{}.{}", path, prop.key);
                                self.render_at(&prop.node, &prop.key, child_path, depth + 1, prop.required, diagnostics)
                            })
                            .collect(),
                    },
                    None => Body::NoSchemaEnforced { additional_allowed },
                }
            }
            SchemaNode::Array {
                items, constraints, ..
            } => {
                push_default(&mut attributes, &default);
                push(&mut attributes, "examples", meta.examples.clone());
                push(&mut attributes, "minItems", constraints.min_items.map(Value::from));
                push(&mut attributes, "maxItems", constraints.max_items.map(Value::from));
                let item = self
                    .render_at(items, "#", format!("{}.#", path), depth + 1, false, diagnostics)
                    .map(Box::new);
                Body::Items { item }
            }
            SchemaNode::Unmatched { raw, .. } => {
                warn!(key, path = %path, "could not render property");
                diagnostics.unmatched_node(&path, raw);
                return None;
            }
        };

        Some(RenderNode {
            key: key.to_string(),
            path,
            title: meta.title.clone(),
            kind: node.kind().label(),
            required,
            deprecated: meta.deprecated,
            description: meta.description.clone(),
            effective_default: default,
            attributes,
            depth,
            body,
            additional_properties,
        })
    }
}

/// Add an attribute unless it is absent or an explicit `null`
fn push(attributes: &mut Vec<Attribute>, name: &'static str, value: Option<Value>) {
    match value {
        None | Some(Value::Null) => {}
        Some(value) => attributes.push(Attribute::new(name, value)),
    }
}

/// The effective default is shown even when it is `null`
fn push_default(attributes: &mut Vec<Attribute>, default: &Option<Value>) {
    if let Some(value) = default {
        attributes.push(Attribute::new("default", value.clone()));
    }
}
