//! Error types for schema documentation generation

use thiserror::Error;

/// Result type for schema-docs operations
pub type Result<T> = std::result::Result<T, DocsError>;

/// Hard failures of loading, dereferencing and building.
///
/// Malformed schema nodes are not errors: the renderer reports them as
/// [`Diagnostics`](crate::diagnostics::Diagnostics) and keeps going.
#[derive(Error, Debug)]
pub enum DocsError {
    #[error("Unresolved $ref '{reference}' in {document}")]
    UnresolvedRef { document: String, reference: String },

    #[error("Unsupported $ref '{0}': remote references are not fetched")]
    UnsupportedRef(String),

    #[error("Cyclic $ref detected: {}", chain.join(" -> "))]
    CyclicRef { chain: Vec<String> },

    #[error("Invalid JSON pointer '{0}'")]
    InvalidPointer(String),

    #[error("Invalid file tree: {0}")]
    InvalidFileTree(String),

    #[error("Unknown page source: {0}")]
    UnknownPage(String),

    #[error("Duplicate page name: {0}")]
    DuplicatePage(String),

    #[error("Output is stale: {}", pages.join(", "))]
    StaleOutput { pages: Vec<String> },

    #[error("Failed to parse JSON in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}
