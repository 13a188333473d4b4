//! Site Build
//!
//! Renders every configured page into the output directory and records
//! what was written in `manifest.json`:
//!
//! ```text
//! docs/generated/
//! ├── config.html
//! ├── sensors.html
//! ├── data-directory.md
//! └── manifest.json
//! ```
//!
//! Check mode renders the same pages without writing and reports every page
//! whose file on disk differs, with a unified diff.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use similar::TextDiff;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::checksum::Checksum;
use crate::config::{DocsConfig, PageConfig, PageKind, BUNDLED_PREFIX};
use crate::diagnostics::Diagnostics;
use crate::emit::{self, OutputFormat};
use crate::error::{DocsError, Result};
use crate::filetree;
use crate::render::{Renderer, Theme};
use crate::schema::loader::{self, SchemaDocument};

pub const MANIFEST_FILE: &str = "manifest.json";

/// A page rendered in memory
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub name: String,
    /// File name inside the output directory
    pub file_name: String,
    pub kind: PageKind,
    pub format: OutputFormat,
    pub content: String,
    pub diagnostics: Diagnostics,
}

// =============================================================================
// Manifest
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub file: String,
    pub format: OutputFormat,
    pub checksum: Checksum,
    /// Render diagnostics the page was built with
    pub diagnostics: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub generator: String,
    pub generated_at: DateTime<Utc>,
    pub pages: Vec<ManifestEntry>,
    /// Checksum over all page checksums, in page order
    pub manifest_checksum: Checksum,
}

impl Manifest {
    pub fn new(pages: &[RenderedPage]) -> Self {
        let entries: Vec<ManifestEntry> = pages
            .iter()
            .map(|page| ManifestEntry {
                name: page.name.clone(),
                file: page.file_name.clone(),
                format: page.format,
                checksum: Checksum::of(&page.content),
                diagnostics: page.diagnostics.len(),
            })
            .collect();

        let combined = entries
            .iter()
            .map(|e| e.checksum.to_string())
            .collect::<Vec<_>>()
            .join(",");

        Self {
            generator: format!("schema-docs {}", env!("CARGO_PKG_VERSION")),
            generated_at: Utc::now(),
            pages: entries,
            manifest_checksum: Checksum::of(&combined),
        }
    }

    pub fn entry(&self, name: &str) -> Option<&ManifestEntry> {
        self.pages.iter().find(|e| e.name == name)
    }
}

// =============================================================================
// Reports
// =============================================================================

#[derive(Debug)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    pub pages: Vec<RenderedPage>,
    pub manifest: Option<Manifest>,
}

impl BuildReport {
    pub fn diagnostic_count(&self) -> usize {
        self.pages.iter().map(|p| p.diagnostics.len()).sum()
    }
}

/// A page whose file on disk differs from a fresh render
#[derive(Debug, Clone)]
pub struct StalePage {
    pub name: String,
    pub path: PathBuf,
    /// Unified diff from the file on disk to the fresh render
    pub diff: String,
}

#[derive(Debug, Default)]
pub struct CheckReport {
    pub checked: usize,
    pub stale: Vec<StalePage>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.stale.is_empty()
    }

    /// Fail with [`DocsError::StaleOutput`] naming every stale page
    pub fn into_result(self) -> Result<()> {
        if self.is_clean() {
            Ok(())
        } else {
            Err(DocsError::StaleOutput {
                pages: self.stale.into_iter().map(|p| p.name).collect(),
            })
        }
    }
}

// =============================================================================
// Site Builder
// =============================================================================

pub struct SiteBuilder<'a> {
    config: &'a DocsConfig,
    output_dir: PathBuf,
}

impl<'a> SiteBuilder<'a> {
    pub fn new(config: &'a DocsConfig) -> Self {
        Self {
            config,
            output_dir: config.output_dir(),
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render one page in memory
    pub fn render_page(&self, page: &PageConfig) -> Result<RenderedPage> {
        let document = load_source(&page.source)?;
        let format = self.config.page_format(page);
        let mut diagnostics = Diagnostics::new();

        let content = match page.kind {
            PageKind::Schema => {
                let resolved = document.resolve()?;
                let root_key = page.root_key.as_deref().unwrap_or(&self.config.render.root_key);
                let output = Renderer::new()
                    .with_max_depth(self.config.render.max_depth)
                    .with_root_key(root_key)
                    .render_document(&resolved);
                diagnostics = output.diagnostics;
                emit::emit(output.tree.as_ref(), format, &Theme::new(self.config.render.palette))?
            }
            PageKind::FileTree => {
                let tree = filetree::parse(&document.raw)?;
                filetree::render(&tree, format)?
            }
        };

        if !diagnostics.is_empty() {
            warn!(page = %page.name, count = diagnostics.len(), "page rendered with diagnostics");
        }

        Ok(RenderedPage {
            name: page.name.clone(),
            file_name: format!("{}.{}", page.name, format.extension()),
            kind: page.kind,
            format,
            content,
            diagnostics,
        })
    }

    /// Render every configured page in memory
    pub fn render_all(&self) -> Result<Vec<RenderedPage>> {
        let pages = self.config.effective_pages();
        let mut seen = HashSet::new();
        for page in &pages {
            if !seen.insert(page.name.as_str()) {
                return Err(DocsError::DuplicatePage(page.name.clone()));
            }
        }
        pages.iter().map(|page| self.render_page(page)).collect()
    }

    /// Render and write every page, plus the manifest
    pub fn build(&self) -> Result<BuildReport> {
        let pages = self.render_all()?;
        fs::create_dir_all(&self.output_dir)?;

        for page in &pages {
            let path = self.output_dir.join(&page.file_name);
            fs::write(&path, &page.content)?;
            debug!(path = %path.display(), bytes = page.content.len(), "wrote page");
        }

        let manifest = if self.config.output.manifest {
            let manifest = Manifest::new(&pages);
            let content = serde_json::to_string_pretty(&manifest)?;
            fs::write(self.output_dir.join(MANIFEST_FILE), content)?;
            Some(manifest)
        } else {
            None
        };

        info!(
            pages = pages.len(),
            dir = %self.output_dir.display(),
            "site built"
        );

        Ok(BuildReport {
            output_dir: self.output_dir.clone(),
            pages,
            manifest,
        })
    }

    /// Compare fresh renders against the files on disk without writing
    pub fn check(&self) -> Result<CheckReport> {
        let pages = self.render_all()?;
        let mut report = CheckReport {
            checked: pages.len(),
            ..Default::default()
        };

        for page in pages {
            let path = self.output_dir.join(&page.file_name);
            let on_disk = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
                Err(e) => return Err(e.into()),
            };

            if on_disk != page.content {
                let diff = TextDiff::from_lines(&on_disk, &page.content)
                    .unified_diff()
                    .context_radius(3)
                    .header(&format!("a/{}", page.file_name), &format!("b/{}", page.file_name))
                    .to_string();
                warn!(page = %page.name, "generated page is stale");
                report.stale.push(StalePage {
                    name: page.name,
                    path,
                    diff,
                });
            }
        }

        Ok(report)
    }
}

/// Load a page source: a file path or `bundled:<name>`
pub fn load_source(source: &str) -> Result<SchemaDocument> {
    match source.strip_prefix(BUNDLED_PREFIX) {
        Some(name) => loader::bundled(name).ok_or_else(|| DocsError::UnknownPage(source.to_string())),
        None => SchemaDocument::from_file(Path::new(source)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(name: &str, source: &str, kind: PageKind, format: Option<OutputFormat>) -> PageConfig {
        PageConfig {
            name: name.to_string(),
            source: source.to_string(),
            kind,
            format,
            root_key: None,
        }
    }

    fn config_with(pages: Vec<PageConfig>) -> DocsConfig {
        DocsConfig {
            pages,
            ..Default::default()
        }
    }

    #[test]
    fn test_build_then_check_is_clean() {
        let out = tempfile::tempdir().unwrap();
        let config = config_with(vec![
            page("sensors", "bundled:sensors", PageKind::Schema, None),
            page("tree", "bundled:filetrees/data-directory", PageKind::FileTree, Some(OutputFormat::Markdown)),
        ]);
        let builder = SiteBuilder::new(&config).with_output_dir(out.path());

        let report = builder.build().unwrap();
        assert_eq!(report.pages.len(), 2);
        assert!(out.path().join("sensors.html").exists());
        assert!(out.path().join("tree.md").exists());

        let manifest: Manifest =
            serde_json::from_str(&fs::read_to_string(out.path().join(MANIFEST_FILE)).unwrap()).unwrap();
        let entry = manifest.entry("sensors").unwrap();
        assert!(entry
            .checksum
            .verify(&fs::read_to_string(out.path().join("sensors.html")).unwrap()));
        // calibration_factors items are an empty schema
        assert_eq!(entry.diagnostics, 1);

        let check = builder.check().unwrap();
        assert_eq!(check.checked, 2);
        assert!(check.is_clean());
    }

    #[test]
    fn test_check_reports_stale_and_missing_pages() {
        let out = tempfile::tempdir().unwrap();
        let config = config_with(vec![
            page("locations", "bundled:locations", PageKind::Schema, Some(OutputFormat::Markdown)),
            page("campaigns", "bundled:campaigns", PageKind::Schema, Some(OutputFormat::Markdown)),
        ]);
        let builder = SiteBuilder::new(&config).with_output_dir(out.path());
        builder.build().unwrap();

        fs::write(out.path().join("locations.md"), "- **root** (outdated)\n").unwrap();
        fs::remove_file(out.path().join("campaigns.md")).unwrap();

        let check = builder.check().unwrap();
        assert_eq!(check.stale.len(), 2);
        let stale = &check.stale[0];
        assert_eq!(stale.name, "locations");
        assert!(stale.diff.contains("--- a/locations.md"));
        assert!(stale.diff.contains("-- **root** (outdated)"));

        match check.into_result() {
            Err(DocsError::StaleOutput { pages }) => assert_eq!(pages, vec!["locations", "campaigns"]),
            other => panic!("Expected StaleOutput, got {:?}", other),
        }
    }

    #[test]
    fn test_check_writes_nothing() {
        let out = tempfile::tempdir().unwrap();
        let config = config_with(vec![page("config", "bundled:config", PageKind::Schema, None)]);
        let check = SiteBuilder::new(&config).with_output_dir(out.path()).check().unwrap();
        assert!(!check.is_clean());
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unknown_and_duplicate_pages() {
        let config = config_with(vec![page("x", "bundled:nope", PageKind::Schema, None)]);
        match SiteBuilder::new(&config).render_all() {
            Err(DocsError::UnknownPage(source)) => assert_eq!(source, "bundled:nope"),
            other => panic!("Expected UnknownPage, got {:?}", other),
        }

        let config = config_with(vec![
            page("same", "bundled:sensors", PageKind::Schema, None),
            page("same", "bundled:locations", PageKind::Schema, None),
        ]);
        assert!(matches!(
            SiteBuilder::new(&config).render_all(),
            Err(DocsError::DuplicatePage(_))
        ));
    }

    #[test]
    fn test_page_from_disk_with_file_refs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("common.json"),
            r#"{ "$defs": { "Id": { "type": "string", "minLength": 1 } } }"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("queue.json"),
            r#"{ "type": "object", "properties": { "id": { "$ref": "common.json#/$defs/Id" } } }"#,
        )
        .unwrap();

        let config = config_with(vec![page(
            "queue",
            dir.path().join("queue.json").to_str().unwrap(),
            PageKind::Schema,
            Some(OutputFormat::Json),
        )]);
        let rendered = SiteBuilder::new(&config).render_all().unwrap();
        let tree: serde_json::Value = serde_json::from_str(&rendered[0].content).unwrap();
        let id = &tree["body"]["children"][0];
        assert_eq!(id["key"], serde_json::json!("id"));
        assert_eq!(id["attributes"][0]["value"], serde_json::json!(1));
    }
}
