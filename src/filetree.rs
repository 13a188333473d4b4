//! File System Trees
//!
//! Documents the expected layout of a data directory: nested files and
//! directories, each with optional badges saying who provides it and
//! whether it has to exist.
//!
//! ```json
//! { "type": "directory", "title": "data", "items": [
//!     { "type": "file", "title": "<YYYYMMDD>.tsv", "providedByUser": true }
//! ] }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::emit::html::escape;
use crate::emit::OutputFormat;
use crate::error::{DocsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FsEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub provided_by_download: bool,
    #[serde(default)]
    pub provided_by_user: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<FsEntry>,
}

/// Marker shown next to an entry's title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    ProvidedByDownload,
    ProvidedByUser,
    Optional,
    Required,
}

impl Badge {
    pub fn label(&self) -> &'static str {
        match self {
            Badge::ProvidedByDownload => "provided by download script",
            Badge::ProvidedByUser => "provided by user",
            Badge::Optional => "optional",
            Badge::Required => "required",
        }
    }

    fn classes(&self) -> &'static str {
        match self {
            Badge::ProvidedByDownload => "bg-yellow-100 text-yellow-600 dark:bg-yellow-700 dark:text-yellow-200",
            Badge::ProvidedByUser => "bg-teal-100 text-teal-600 dark:bg-teal-700 dark:text-teal-200",
            Badge::Optional => "bg-sky-100 text-sky-600 dark:bg-sky-700 dark:text-sky-200",
            Badge::Required => "bg-rose-100 text-rose-600 dark:bg-rose-700 dark:text-rose-200",
        }
    }
}

impl FsEntry {
    /// Badges in display order
    pub fn badges(&self) -> Vec<Badge> {
        [
            (self.provided_by_download, Badge::ProvidedByDownload),
            (self.provided_by_user, Badge::ProvidedByUser),
            (self.optional, Badge::Optional),
            (self.required, Badge::Required),
        ]
        .into_iter()
        .filter_map(|(set, badge)| set.then_some(badge))
        .collect()
    }

    /// Entries in this subtree, including this one
    pub fn entry_count(&self) -> usize {
        1 + self.items.iter().map(FsEntry::entry_count).sum::<usize>()
    }

    fn validate(&self, path: &str) -> Result<()> {
        if self.kind == EntryKind::File && !self.items.is_empty() {
            return Err(DocsError::InvalidFileTree(format!(
                "file '{}' cannot contain items",
                path
            )));
        }
        for item in &self.items {
            item.validate(&format!("{}/{}", path, item.title))?;
        }
        Ok(())
    }
}

/// Parse a tree whose root is a directory
pub fn parse(value: &Value) -> Result<FsEntry> {
    let root = FsEntry::deserialize(value).map_err(|e| DocsError::InvalidFileTree(e.to_string()))?;
    if root.kind != EntryKind::Directory {
        return Err(DocsError::InvalidFileTree(format!(
            "root '{}' must be a directory",
            root.title
        )));
    }
    root.validate(&root.title)?;
    Ok(root)
}

pub fn render(root: &FsEntry, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Html => Ok(render_html(root)),
        OutputFormat::Markdown => Ok(render_markdown(root)),
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(root)?;
            out.push('\n');
            Ok(out)
        }
    }
}

// =============================================================================
// HTML
// =============================================================================

pub fn render_html(root: &FsEntry) -> String {
    let mut output = String::new();
    output.push_str(
        "<div class=\"bg-slate-50 dark:bg-slate-800 border p-4 rounded-lg text-slate-900 dark:text-slate-100 border-slate-300 dark:border-slate-700\">\n",
    );
    html_entry(root, &mut output);
    output.push_str("</div>\n");
    output
}

fn html_entry(entry: &FsEntry, output: &mut String) {
    output.push_str("<div class=\"flex flex-col gap-y-0 w-full\">\n");
    output.push_str("<div class=\"flex flex-row items-center gap-x-0 text-sm\">");
    let (icon, weight) = match entry.kind {
        EntryKind::File => ("file", "font-medium"),
        EntryKind::Directory => ("folder", "font-bold"),
    };
    output.push_str(&format!(
        "<span class=\"w-6 text-slate-600 dark:text-slate-400\" data-icon=\"{}\"></span><span class=\"{}\">{}</span>",
        icon,
        weight,
        escape(&entry.title)
    ));
    for badge in entry.badges() {
        output.push_str(&format!(
            "<span class=\"ml-2 text-xs font-medium italic py-[0.0625rem] px-1 rounded-md {}\">{}</span>",
            badge.classes(),
            badge.label()
        ));
    }
    output.push_str("</div>\n");

    if let Some(description) = &entry.description {
        let border = if entry.kind == EntryKind::Directory { " border-l" } else { "" };
        output.push_str(&format!(
            "<div class=\"text-xs leading-normal ml-2 pl-4 mt-0.5 text-slate-700 dark:text-slate-300 border-slate-300 dark:border-slate-600{}\">{}</div>\n",
            border,
            escape(description)
        ));
    }

    if !entry.items.is_empty() {
        output.push_str(
            "<div class=\"flex flex-col ml-2 pl-4 gap-y-2 pt-2 border-l border-slate-300 dark:border-slate-600\">\n",
        );
        for item in &entry.items {
            html_entry(item, output);
        }
        output.push_str("</div>\n");
    }
    output.push_str("</div>\n");
}

// =============================================================================
// Markdown
// =============================================================================

pub fn render_markdown(root: &FsEntry) -> String {
    let mut output = String::new();
    markdown_entry(root, 0, &mut output);
    output
}

fn markdown_entry(entry: &FsEntry, level: usize, output: &mut String) {
    let indent = "  ".repeat(level);
    let name = match entry.kind {
        EntryKind::Directory => format!("**{}/**", entry.title),
        EntryKind::File => format!("`{}`", entry.title),
    };
    output.push_str(&format!("{}- {}", indent, name));
    for badge in entry.badges() {
        output.push_str(&format!(" _({})_", badge.label()));
    }
    output.push('\n');

    if let Some(description) = &entry.description {
        output.push_str(&format!("{}  {}\n", indent, description));
    }
    for item in &entry.items {
        markdown_entry(item, level + 1, output);
    }
}
