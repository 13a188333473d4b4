//! Reference Graph
//!
//! Dependency graph between the root of a document and its `$defs` /
//! `definitions` entries. Uses petgraph SCCs to report every cyclic group up
//! front, before dereferencing trips over the first one.

use petgraph::algo::kosaraju_scc;
use percent_encoding::percent_decode_str;
use petgraph::graph::{DiGraph, NodeIndex};
use serde_json::Value;
use std::collections::HashMap;

const ROOT: &str = "#";
const LITERAL_KEYWORDS: &[&str] = &["default", "examples", "const", "enum"];
const DEFINITION_KEYWORDS: &[&str] = &["$defs", "definitions"];

/// Local `$ref` dependency graph of one document
#[derive(Debug)]
pub struct RefGraph {
    graph: DiGraph<String, ()>,
    indices: HashMap<String, NodeIndex>,
    dangling: Vec<String>,
}

impl RefGraph {
    pub fn from_document(doc: &Value) -> Self {
        let mut graph = DiGraph::new();
        let mut indices = HashMap::new();

        let mut owners: Vec<(String, &Value)> = vec![(ROOT.to_string(), doc)];
        for container in DEFINITION_KEYWORDS {
            if let Some(defs) = doc.get(*container).and_then(|v| v.as_object()) {
                for (name, schema) in defs {
                    owners.push((format!("#/{}/{}", container, escape_pointer(name)), schema));
                }
            }
        }

        for (pointer, _) in &owners {
            let idx = graph.add_node(pointer.clone());
            indices.insert(pointer.clone(), idx);
        }

        let mut dangling = Vec::new();
        for (pointer, schema) in &owners {
            let mut refs = Vec::new();
            collect_local_refs(schema, pointer == ROOT, &mut refs);

            let from = indices[pointer];
            for reference in refs {
                match owner_of(&reference, &indices) {
                    Some(to) => {
                        if graph.find_edge(from, to).is_none() {
                            graph.add_edge(from, to, ());
                        }
                    }
                    None => dangling.push(reference),
                }
            }
        }
        dangling.sort();
        dangling.dedup();

        Self {
            graph,
            indices,
            dangling,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Definitions referenced directly by `pointer`
    pub fn dependencies(&self, pointer: &str) -> Vec<String> {
        let Some(&idx) = self.indices.get(pointer) else {
            return Vec::new();
        };
        let mut deps: Vec<String> = self
            .graph
            .neighbors(idx)
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect();
        deps.sort();
        deps
    }

    /// Strongly connected groups, including definitions that reference themselves
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut groups: Vec<Vec<String>> = kosaraju_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || scc.first().map(|&n| self.graph.contains_edge(n, n)).unwrap_or(false)
            })
            .map(|scc| {
                let mut group: Vec<String> = scc
                    .into_iter()
                    .filter_map(|idx| self.graph.node_weight(idx).cloned())
                    .collect();
                group.sort();
                group
            })
            .collect();
        groups.sort();
        groups
    }

    pub fn is_acyclic(&self) -> bool {
        self.cycles().is_empty()
    }

    /// Local refs whose target is neither the root nor a definition
    pub fn dangling(&self) -> &[String] {
        &self.dangling
    }
}

fn collect_local_refs(value: &Value, skip_definitions: bool, refs: &mut Vec<String>) {
    match value {
        Value::Object(obj) => {
            if let Some(reference) = obj.get("$ref").and_then(|v| v.as_str()) {
                if reference.starts_with('#') {
                    refs.push(percent_decode_str(reference).decode_utf8_lossy().into_owned());
                }
            }
            for (key, child) in obj {
                let key = key.as_str();
                if LITERAL_KEYWORDS.contains(&key) || (skip_definitions && DEFINITION_KEYWORDS.contains(&key)) {
                    continue;
                }
                collect_local_refs(child, false, refs);
            }
        }
        Value::Array(arr) => {
            for item in arr {
                collect_local_refs(item, false, refs);
            }
        }
        _ => {}
    }
}

/// The graph node a pointer lands in (`#/$defs/A/properties/x` belongs to `#/$defs/A`)
fn owner_of(reference: &str, indices: &HashMap<String, NodeIndex>) -> Option<NodeIndex> {
    if let Some(&idx) = indices.get(reference) {
        return Some(idx);
    }
    indices
        .iter()
        .filter(|(pointer, _)| pointer.as_str() != ROOT)
        .find(|(pointer, _)| reference.starts_with(&format!("{}/", pointer)))
        .map(|(_, &idx)| idx)
        .or_else(|| {
            // Anything else under the root that is not a definition
            let is_definition = DEFINITION_KEYWORDS
                .iter()
                .any(|c| reference.starts_with(&format!("#/{}/", c)));
            if reference == ROOT || (reference.starts_with("#/") && !is_definition) {
                indices.get(ROOT).copied()
            } else {
                None
            }
        })
}

fn escape_pointer(name: &str) -> String {
    name.replace('~', "~0").replace('/', "~1")
}
