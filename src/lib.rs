//! Schema Docs
//!
//! Renders JSON Schema documents into nested, human-readable reference
//! pages for the EM27/SUN retrieval pipeline's configuration and metadata
//! formats.
//!
//! ## Features
//!
//! - **Recursive Renderer**: one panel per property with required marker,
//!   kind label, description and constraints
//! - **$ref Resolution**: local pointers and relative files are inlined before
//!   rendering; cycles fail loudly
//! - **Graceful Degradation**: malformed nodes become diagnostics, not errors
//! - **Multiple Outputs**: HTML, Markdown and JSON render trees
//! - **Lint**: required keys, empty unions, defaults and examples that do not
//!   match their own schema
//!
//! ## Pipeline
//!
//! ```text
//! schema.json ──▶ Dereferencer ──▶ SchemaNode ──▶ Renderer ──▶ RenderNode ──▶ emit
//!                 (ref-free tree)   (typed)        (+Diagnostics)             (html/md/json)
//! ```

pub mod checksum;
pub mod config;
pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod filetree;
pub mod lint;
pub mod render;
pub mod schema;
pub mod site;

pub use checksum::Checksum;
pub use config::{DocsConfig, PageConfig, PageKind};
pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};
pub use emit::OutputFormat;
pub use error::{DocsError, Result};
pub use lint::{LintResult, SchemaLinter};
pub use render::{Body, RenderNode, RenderOutput, Renderer, Theme};
pub use schema::{Dereferencer, SchemaDocument, SchemaNode};
pub use site::{Manifest, SiteBuilder};
