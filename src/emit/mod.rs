//! Output Emitters
//!
//! Turn a render tree into page text. Emitters only read [`RenderNode`]
//! fields; they never look at schema JSON.

pub mod html;
pub mod markdown;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::Result;
use crate::render::{RenderNode, Theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Html,
    Markdown,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" => Ok(OutputFormat::Html),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown format '{}', expected html, markdown or json", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Html => write!(f, "html"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Emit a render tree. A missing tree (fully unmatched document) emits an
/// empty page, or `null` for JSON.
pub fn emit(tree: Option<&RenderNode>, format: OutputFormat, theme: &Theme) -> Result<String> {
    match format {
        OutputFormat::Html => Ok(tree.map(|t| html::render(t, theme)).unwrap_or_default()),
        OutputFormat::Markdown => Ok(tree.map(markdown::render).unwrap_or_default()),
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(&tree)?;
            out.push('\n');
            Ok(out)
        }
    }
}

/// Single-line JSON text of an attribute value
pub(crate) fn value_text(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Renderer;
    use serde_json::json;

    #[test]
    fn test_format_parsing() {
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("HTML".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
        assert!("pdf".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Markdown.extension(), "md");
    }

    #[test]
    fn test_json_output_is_render_tree() {
        let out = Renderer::new().render_document(&json!({ "type": "string", "maxLength": 3 }));
        let text = emit(out.tree.as_ref(), OutputFormat::Json, &Theme::default()).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["key"], json!("root"));
        assert_eq!(parsed["kind"], json!("string"));
        assert_eq!(parsed["body"]["type"], json!("leaf"));
        assert_eq!(parsed["attributes"][0]["label"], json!("max. length"));
    }

    #[test]
    fn test_missing_tree() {
        let theme = Theme::default();
        assert_eq!(emit(None, OutputFormat::Html, &theme).unwrap(), "");
        assert_eq!(emit(None, OutputFormat::Json, &theme).unwrap(), "null\n");
    }
}
