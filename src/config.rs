//! Configuration management for schema-docs
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schema-docs.toml)
//! - Environment variables (SCHEMA_DOCS__*)
//!
//! ## Example config file (schema-docs.toml):
//! ```toml
//! [render]
//! root_key = "root"
//! max_depth = 32
//! palette = "slate"
//!
//! [output]
//! dir = "docs/generated"
//! format = "html"
//!
//! [[pages]]
//! name = "config"
//! source = "schemas/config.json"
//!
//! [[pages]]
//! name = "data-directory"
//! source = "bundled:filetrees/data-directory"
//! kind = "file-tree"
//! format = "markdown"
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::emit::OutputFormat;
use crate::error::Result;
use crate::render::{Palette, DEFAULT_MAX_DEPTH, DEFAULT_ROOT_KEY};
use crate::schema::loader::{load_bundled, DocumentKind};

/// Page sources with this prefix name a bundled document
pub const BUNDLED_PREFIX: &str = "bundled:";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocsConfig {
    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub lint: LintConfig,

    /// Pages built by `schema-docs build`; empty means every bundled document
    #[serde(default)]
    pub pages: Vec<PageConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Key shown for the top-level node
    #[serde(default = "default_root_key")]
    pub root_key: String,

    /// Deeper subtrees are cut off with a diagnostic
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default)]
    pub palette: Palette,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Format for pages that don't set their own
    #[serde(default)]
    pub format: OutputFormat,

    /// Write manifest.json next to the pages
    #[serde(default = "default_true")]
    pub manifest: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintConfig {
    #[serde(default = "default_true")]
    pub check_descriptions: bool,

    #[serde(default = "default_true")]
    pub check_values: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageKind {
    #[default]
    Schema,
    FileTree,
}

impl From<DocumentKind> for PageKind {
    fn from(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Schema => PageKind::Schema,
            DocumentKind::FileTree => PageKind::FileTree,
        }
    }
}

/// One generated page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    /// Output file stem
    pub name: String,

    /// Path to a JSON document, or `bundled:<name>`
    pub source: String,

    #[serde(default)]
    pub kind: PageKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,

    /// Overrides `render.root_key` for this page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_key: Option<String>,
}

impl PageConfig {
    /// Name of the bundled document this page reads, if any
    pub fn bundled_name(&self) -> Option<&str> {
        self.source.strip_prefix(BUNDLED_PREFIX)
    }
}

// Default value functions
fn default_root_key() -> String {
    DEFAULT_ROOT_KEY.to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("docs/generated")
}

fn default_true() -> bool {
    true
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            root_key: default_root_key(),
            max_depth: default_max_depth(),
            palette: Palette::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            format: OutputFormat::default(),
            manifest: true,
        }
    }
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            check_descriptions: true,
            check_values: true,
        }
    }
}

impl DocsConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = [
            "schema-docs.toml",
            ".schema-docs.toml",
            "config/schema-docs.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(dirs) = directories::ProjectDirs::from("dev", "em27", "schema-docs") {
            let xdg_config = dirs.config_dir().join("schema-docs.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // SCHEMA_DOCS__RENDER__MAX_DEPTH=8 and friends
        builder = builder.add_source(
            Environment::with_prefix("SCHEMA_DOCS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Output directory (resolves relative paths)
    pub fn output_dir(&self) -> PathBuf {
        if self.output.dir.is_absolute() {
            self.output.dir.clone()
        } else {
            std::env::current_dir().unwrap_or_default().join(&self.output.dir)
        }
    }

    /// Configured pages, or one page per bundled document
    pub fn effective_pages(&self) -> Vec<PageConfig> {
        if !self.pages.is_empty() {
            return self.pages.clone();
        }
        load_bundled()
            .into_iter()
            .map(|doc| PageConfig {
                name: doc.name.rsplit('/').next().unwrap_or(&doc.name).to_string(),
                source: format!("{}{}", BUNDLED_PREFIX, doc.name),
                kind: doc.kind.into(),
                format: None,
                root_key: None,
            })
            .collect()
    }

    /// Format a page is written in
    pub fn page_format(&self, page: &PageConfig) -> OutputFormat {
        page.format.unwrap_or(self.output.format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DocsConfig::default();
        assert_eq!(config.render.root_key, "root");
        assert_eq!(config.render.max_depth, 32);
        assert_eq!(config.output.format, OutputFormat::Html);
        assert!(config.pages.is_empty());
    }

    #[test]
    fn test_serialize_config() {
        let config = DocsConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[render]"));
        assert!(toml_str.contains("[output]"));
        assert!(toml_str.contains("palette = \"slate\""));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.toml");
        std::fs::write(
            &path,
            r#"
[render]
max_depth = 4
palette = "plain"

[output]
format = "markdown"

[[pages]]
name = "tree"
source = "bundled:filetrees/data-directory"
kind = "file-tree"
format = "html"
"#,
        )
        .unwrap();

        let config = DocsConfig::load_from(Some(&path)).unwrap();
        assert_eq!(config.render.max_depth, 4);
        assert_eq!(config.render.palette, Palette::Plain);
        assert_eq!(config.render.root_key, "root");
        assert_eq!(config.pages.len(), 1);

        let page = &config.pages[0];
        assert_eq!(page.kind, PageKind::FileTree);
        assert_eq!(page.bundled_name(), Some("filetrees/data-directory"));
        assert_eq!(config.page_format(page), OutputFormat::Html);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/schema-docs.toml");
        let mut config = DocsConfig::default();
        config.pages.push(PageConfig {
            name: "sensors".to_string(),
            source: "schemas/sensors.json".to_string(),
            kind: PageKind::Schema,
            format: Some(OutputFormat::Json),
            root_key: Some("sensors".to_string()),
        });
        config.save(&path).unwrap();

        let loaded = DocsConfig::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.pages, config.pages);
    }

    #[test]
    fn test_default_pages_cover_bundled_documents() {
        let pages = DocsConfig::default().effective_pages();
        let tree = pages.iter().find(|p| p.name == "data-directory").unwrap();
        assert_eq!(tree.kind, PageKind::FileTree);
        assert!(pages.iter().any(|p| p.source == "bundled:config"));
    }
}
