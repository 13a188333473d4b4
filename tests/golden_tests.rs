//! Golden Tests for Rendered Documentation
//!
//! Renders fixtures and the bundled pipeline schemas end to end and checks
//! the trees, diagnostics and emitted pages they produce.

use std::path::{Path, PathBuf};

use schema_docs::diagnostics::DiagnosticCode;
use schema_docs::emit::{self, OutputFormat};
use schema_docs::lint::{lint_documents, SchemaLinter};
use schema_docs::render::{Body, RenderOutput, Renderer, Theme};
use schema_docs::schema::{dereference, dereference_file, load_bundled, DocumentKind, RefGraph};
use schema_docs::{filetree, DocsError};
use serde_json::{json, Value};

fn fixtures_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(content: &str) -> Value {
    serde_json::from_str(content).unwrap()
}

fn render_fixture(content: &str) -> RenderOutput {
    let resolved = dereference(&fixture(content)).unwrap();
    Renderer::new().render_document(&resolved)
}

// =============================================================================
// Rendering Scenarios
// =============================================================================

#[test]
fn test_required_and_default_fixture() {
    let out = render_fixture(include_str!("fixtures/required_default.json"));
    assert!(out.diagnostics.is_empty());
    let root = out.tree.unwrap();
    assert_eq!(root.kind, "object");

    let a = root.child("a").unwrap();
    assert!(a.required);
    assert_eq!(a.effective_default, None);

    let b = root.child("b").unwrap();
    assert!(!b.required);
    assert_eq!(b.effective_default, Some(json!(5)));

    let html = emit::emit(Some(&root), OutputFormat::Html, &Theme::default()).unwrap();
    assert!(html.contains("default: <code>5</code>"));
    // root and a
    assert_eq!(html.matches("title=\"required\"").count(), 2);
}

#[test]
fn test_const_fixture() {
    let out = render_fixture(include_str!("fixtures/const_version.json"));
    let root = out.tree.unwrap();
    assert_eq!(root.kind, "constant");

    let markdown = emit::emit(Some(&root), OutputFormat::Markdown, &Theme::default()).unwrap();
    assert!(markdown.contains("(constant)"));
    assert!(markdown.contains("allowed value: `\"1.0\"`"));
}

#[test]
fn test_unrecognized_fixture() {
    let out = render_fixture(include_str!("fixtures/unrecognized.json"));
    assert!(out.tree.is_none());
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics.all()[0].code, DiagnosticCode::UnmatchedNode);
    assert_eq!(out.diagnostics.all()[0].path, "root");

    let html = emit::emit(out.tree.as_ref(), OutputFormat::Html, &Theme::default()).unwrap();
    assert!(html.is_empty());
}

// =============================================================================
// $ref Resolution
// =============================================================================

#[test]
fn test_defs_fixture_renders_through_refs() {
    let out = render_fixture(include_str!("fixtures/defs.json"));
    assert!(out.diagnostics.is_empty());
    let root = out.tree.unwrap();

    let setup = match &root.body {
        Body::Items { item: Some(item) } => item,
        other => panic!("Expected Items, got {:?}", other),
    };
    assert_eq!(setup.path, "root.#");

    let from = setup.child("from_datetime").unwrap();
    assert!(from.required);
    assert_eq!(from.kind, "string");
    assert_eq!(from.description.as_deref(), Some("Local time without offset"));
    assert!(from.attribute("pattern").is_some());

    let to = setup.child("to_datetime").unwrap();
    assert!(!to.required);

    let offset = setup.child("value").unwrap().child("utc_offset").unwrap();
    assert_eq!(offset.depth, 3);
    assert_eq!(offset.attribute("minimum"), Some(&json!(-12)));
}

#[test]
fn test_dereferenced_defs_leave_no_refs() {
    let resolved = dereference(&fixture(include_str!("fixtures/defs.json"))).unwrap();
    let text = serde_json::to_string(&resolved).unwrap();
    assert!(!text.contains("$ref"));
    assert!(!text.contains("$defs"));
    assert_eq!(resolved["items"]["properties"]["to_datetime"]["type"], json!("string"));
}

#[test]
fn test_file_refs_resolve_relative_to_document() {
    let resolved = dereference_file(&fixtures_path().join("refs/station.json")).unwrap();
    let out = Renderer::new().render_document(&resolved);
    let pressure = out.tree.unwrap();
    let pressure = pressure.child("ground_pressure").unwrap();
    assert_eq!(pressure.kind, "number");
    assert_eq!(pressure.attribute("unit"), Some(&json!("hPa")));
    assert_eq!(pressure.attribute("exclusiveMinimum"), Some(&json!(0)));
}

#[test]
fn test_cyclic_fixture_fails_loudly() {
    let doc = fixture(include_str!("fixtures/cyclic.json"));
    match dereference(&doc) {
        Err(DocsError::CyclicRef { chain }) => {
            assert!(chain.iter().all(|r| r.ends_with("#/definitions/Node")));
        }
        other => panic!("Expected CyclicRef, got {:?}", other),
    }

    let cycles = RefGraph::from_document(&doc).cycles();
    assert_eq!(cycles, vec![vec!["#/definitions/Node".to_string()]]);
}

// =============================================================================
// Bundled Pipeline Schemas
// =============================================================================

#[test]
fn test_all_bundled_schemas_render() {
    let documents = load_bundled();
    assert_eq!(documents.len(), 8);

    for document in documents.iter().filter(|d| d.kind == DocumentKind::Schema) {
        let resolved = document.resolve().unwrap();
        let out = Renderer::new().render_document(&resolved);
        let tree = out
            .tree
            .unwrap_or_else(|| panic!("{} rendered nothing", document.name));
        assert!(tree.node_count() > 1, "{} has no nested nodes", document.name);

        // sensors.json ships an empty schema for calibration factor items
        let expected = if document.name == "sensors" { 1 } else { 0 };
        assert_eq!(
            out.diagnostics.len(),
            expected,
            "{}: {}",
            document.name,
            out.diagnostics.format_all()
        );

        for format in [OutputFormat::Html, OutputFormat::Markdown, OutputFormat::Json] {
            let page = emit::emit(Some(&tree), format, &Theme::default()).unwrap();
            assert!(!page.is_empty());
        }
    }
}

#[test]
fn test_sensors_unmatched_path() {
    let sensors = load_bundled().into_iter().find(|d| d.name == "sensors").unwrap();
    let out = Renderer::new().render_document(&sensors.resolve().unwrap());
    let item = &out.diagnostics.all()[0];
    assert_eq!(item.code, DiagnosticCode::UnmatchedNode);
    assert_eq!(item.path, "root.#.calibration_factors.#");
}

#[test]
fn test_bundled_file_tree() {
    let document = load_bundled()
        .into_iter()
        .find(|d| d.kind == DocumentKind::FileTree)
        .unwrap();
    assert_eq!(document.name, "filetrees/data-directory");

    let tree = filetree::parse(&document.raw).unwrap();
    assert!(tree.entry_count() > 1);
    let markdown = filetree::render(&tree, OutputFormat::Markdown).unwrap();
    assert!(markdown.starts_with("- **"));
}

#[test]
fn test_bundled_lint_findings() {
    let documents = load_bundled();
    let linter = SchemaLinter::new().with_descriptions(false);
    let results = lint_documents(&documents, &linter).unwrap();
    // file trees are not linted
    assert_eq!(results.len(), 7);

    for result in &results {
        if result.document == "config" {
            let invalid: Vec<&str> = result
                .diagnostics
                .with_code(DiagnosticCode::InvalidExample)
                .map(|d| d.path.as_str())
                .collect();
            assert_eq!(invalid.len(), 4);
            assert!(invalid
                .iter()
                .all(|p| p.starts_with("root.retrieval.option 1.jobs.#.settings.pressure_calibration_")));
        } else {
            assert!(result.is_clean(), "{}: {}", result.document, result.diagnostics.format_all());
        }
    }
}
