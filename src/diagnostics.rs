//! Diagnostics
//!
//! Non-fatal findings collected while rendering and linting. A malformed
//! node never fails a page; it lands here and the walk carries on.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // === Rendering ===
    /// Node matches none of the recognized shapes
    UnmatchedNode,
    /// Nesting went past the configured max depth
    DepthLimitExceeded,

    // === Lint ===
    /// Key listed in `required` but missing from `properties`
    RequiredNotDeclared,
    /// `anyOf` with no alternatives
    EmptyUnion,
    /// An `examples` entry fails its own node schema
    InvalidExample,
    /// `default` fails its own node schema
    InvalidDefault,
    /// Document does not compile as a JSON Schema
    InvalidSchema,
    /// Object property without a description
    MissingDescription,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequiredNotDeclared => "E001",
            Self::EmptyUnion => "E002",
            Self::InvalidExample => "E003",
            Self::InvalidDefault => "E004",
            Self::InvalidSchema => "E005",
            Self::UnmatchedNode => "W001",
            Self::DepthLimitExceeded => "W002",
            Self::MissingDescription => "I001",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::RequiredNotDeclared
            | Self::EmptyUnion
            | Self::InvalidExample
            | Self::InvalidDefault
            | Self::InvalidSchema => Severity::Error,

            Self::UnmatchedNode | Self::DepthLimitExceeded => Severity::Warning,

            Self::MissingDescription => Severity::Info,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// Dotted key path of the offending node, e.g. `root.sensors.#`
    pub path: String,
    pub code: DiagnosticCode,
    pub message: String,
    /// Additional context (validator output, offending values)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(path: impl Into<String>, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({})",
            self.code,
            self.code.severity(),
            self.message,
            self.path
        )?;

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: DiagnosticItem) {
        self.items.push(item);
    }

    /// Record a node that matched no shape
    pub fn unmatched_node(&mut self, path: &str, raw: &serde_json::Value) {
        self.push(
            DiagnosticItem::new(
                path,
                DiagnosticCode::UnmatchedNode,
                format!("Unrecognized schema node at '{}', nothing rendered", path),
            )
            .with_context(format!("Node: {}", raw)),
        );
    }

    /// Record a subtree cut off by the depth guard
    pub fn depth_limit_exceeded(&mut self, path: &str, max_depth: usize) {
        self.push(DiagnosticItem::new(
            path,
            DiagnosticCode::DepthLimitExceeded,
            format!("Nesting deeper than {} levels at '{}', subtree omitted", max_depth, path),
        ));
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|i| i.severity() == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Warning)
    }

    /// Items carrying `code`
    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(move |i| i.code == code)
    }

    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Format all diagnostics for display
    pub fn format_all(&self) -> String {
        let mut output = String::new();

        for item in &self.items {
            output.push_str(&format!("{}\n", item));
        }

        if self.has_errors() {
            output.push_str(&format!(
                "\n{} error(s), {} warning(s)\n",
                self.error_count(),
                self.warning_count()
            ));
        } else if !self.is_empty() {
            output.push_str(&format!("\n{} warning(s)\n", self.warning_count()));
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_all())
    }
}

impl IntoIterator for Diagnostics {
    type Item = DiagnosticItem;
    type IntoIter = std::vec::IntoIter<DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticItem;
    type IntoIter = std::slice::Iter<'a, DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
