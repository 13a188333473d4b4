//! Schema Loading
//!
//! Loads schema documents from a directory tree or from the schemas bundled
//! into the binary at compile time.

use include_dir::{include_dir, Dir};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::deref::Dereferencer;
use crate::error::{DocsError, Result};

/// EM27/SUN retrieval pipeline schemas shipped with the crate
pub static BUNDLED: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/schemas");

/// What a document describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// A JSON Schema
    Schema,
    /// A file/directory layout (top-level `"type": "directory" | "file"`)
    FileTree,
}

impl DocumentKind {
    fn detect(json: &Value) -> Self {
        match json.get("type").and_then(|v| v.as_str()) {
            Some("directory") | Some("file") => DocumentKind::FileTree,
            _ => DocumentKind::Schema,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSource {
    Disk,
    Bundled,
}

/// One loaded document, not yet dereferenced
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    /// Relative path without the `.json` extension, e.g. `filetrees/data-directory`
    pub name: String,
    pub path: PathBuf,
    pub kind: DocumentKind,
    pub source: DocumentSource,
    pub raw: Value,
}

impl SchemaDocument {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let raw = parse(&content, path)?;
        let name = document_name(path.file_name().and_then(|s| s.to_str()).unwrap_or(""));
        Ok(Self {
            name,
            path: path.to_path_buf(),
            kind: DocumentKind::detect(&raw),
            source: DocumentSource::Disk,
            raw,
        })
    }

    /// Title declared at the document root, falling back to the name
    pub fn title(&self) -> &str {
        self.raw
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.name)
    }

    /// Inline every `$ref`; file refs resolve next to the document, on disk or
    /// inside the bundled directory
    pub fn resolve(&self) -> Result<Value> {
        match self.source {
            DocumentSource::Disk => {
                let base = self.path.parent().map(Path::to_path_buf).unwrap_or_default();
                Dereferencer::with_base_dir(base).dereference(&self.raw)
            }
            DocumentSource::Bundled => {
                let base = self.path.parent().map(Path::to_path_buf).unwrap_or_default();
                Dereferencer::with_embedded(&BUNDLED, base).dereference(&self.raw)
            }
        }
    }
}

/// Configuration for directory loading
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Skip documents matching these relative path prefixes
    pub skip_prefixes: Vec<String>,
    /// Only load documents matching these relative path prefixes
    pub include_prefixes: Vec<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            skip_prefixes: vec![
                "target/".to_string(),
                ".git/".to_string(),
                "node_modules/".to_string(),
            ],
            include_prefixes: Vec::new(),
        }
    }
}

impl LoadConfig {
    fn accepts(&self, relative: &str) -> bool {
        if !self.include_prefixes.is_empty() && !self.include_prefixes.iter().any(|p| relative.starts_with(p)) {
            return false;
        }
        !self.skip_prefixes.iter().any(|p| relative.starts_with(p))
    }
}

/// Load every `*.json` document below `dir`, sorted by name
pub fn load_from_directory(dir: &Path, config: &LoadConfig) -> Result<Vec<SchemaDocument>> {
    let mut documents = Vec::new();

    for entry in WalkDir::new(dir).into_iter() {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || path.extension().map(|e| e != "json").unwrap_or(true) {
            continue;
        }

        let relative = path.strip_prefix(dir).unwrap_or(path);
        let relative_str = relative.to_string_lossy().replace('\\', "/");
        if !config.accepts(&relative_str) {
            debug!(path = %relative_str, "skipping filtered document");
            continue;
        }

        let mut document = SchemaDocument::from_file(path)?;
        document.name = document_name(&relative_str);
        documents.push(document);
    }

    documents.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(count = documents.len(), dir = %dir.display(), "loaded documents");
    Ok(documents)
}

/// All bundled documents, sorted by name
pub fn load_bundled() -> Vec<SchemaDocument> {
    let mut files = Vec::with_capacity(16);
    collect_embedded_files(&BUNDLED, &mut files);

    let mut documents: Vec<SchemaDocument> = files
        .into_iter()
        .filter_map(|(path, content)| match parse(content, path) {
            Ok(raw) => Some(SchemaDocument {
                name: document_name(&path.to_string_lossy().replace('\\', "/")),
                path: path.to_path_buf(),
                kind: DocumentKind::detect(&raw),
                source: DocumentSource::Bundled,
                raw,
            }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unparsable bundled document");
                None
            }
        })
        .collect();

    documents.sort_by(|a, b| a.name.cmp(&b.name));
    documents
}

/// Look up one bundled document by name (`sensors`, `filetrees/data-directory`)
pub fn bundled(name: &str) -> Option<SchemaDocument> {
    load_bundled().into_iter().find(|doc| doc.name == name)
}

fn collect_embedded_files<'a>(dir: &'a Dir<'static>, files: &mut Vec<(&'a Path, &'a str)>) {
    for file in dir.files() {
        let path = file.path();
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            if let Some(content) = file.contents_utf8() {
                files.push((path, content));
            }
        }
    }

    for subdir in dir.dirs() {
        collect_embedded_files(subdir, files);
    }
}

/// `nested/a.schema.json` and `nested/a.json` are both named `nested/a`
fn document_name(relative: &str) -> String {
    let name = relative.strip_suffix(".json").unwrap_or(relative);
    name.strip_suffix(".schema").unwrap_or(name).to_string()
}

fn parse(content: &str, path: &Path) -> Result<Value> {
    serde_json::from_str(content).map_err(|source| DocsError::Parse {
        path: path.display().to_string(),
        source,
    })
}
