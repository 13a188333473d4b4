//! Markdown Emitter
//!
//! One bullet per node, nested by depth. Description and attribute lines sit
//! under the node's bullet, followed by its children.

use super::value_text;
use crate::render::{Body, RenderNode};

pub fn render(tree: &RenderNode) -> String {
    let mut output = String::new();
    node(tree, 0, &mut output);
    output
}

fn node(node: &RenderNode, level: usize, output: &mut String) {
    let indent = "  ".repeat(level);
    let inner = "  ".repeat(level + 1);

    output.push_str(&format!("{}- **{}**", indent, escape(&node.key)));
    if node.required {
        output.push_str(" \\*");
    }
    output.push_str(&format!(" ({})", node.kind));
    if node.deprecated {
        output.push_str(" _deprecated_");
    }
    output.push('\n');

    if let Some(title) = node.title.as_deref().filter(|t| *t != node.key) {
        output.push_str(&format!("{}_{}_\n", inner, escape(title)));
    }
    if let Some(description) = &node.description {
        for line in description.lines().filter(|l| !l.trim().is_empty()) {
            output.push_str(&format!("{}{}\n", inner, description_line(line)));
        }
    }

    for attribute in &node.attributes {
        output.push_str(&format!(
            "{}- {}: {}\n",
            inner,
            attribute.label,
            inline_code(&value_text(&attribute.value))
        ));
    }

    if let Some(allowed) = node.additional_allowed() {
        output.push_str(&format!("{}- additional properties allowed: `{}`\n", inner, allowed));
    }
    if matches!(node.body, Body::NoSchemaEnforced { .. }) {
        output.push_str(&format!("{}- no schema enforced\n", inner));
    }

    for child in node.children() {
        self::node(child, level + 1, output);
    }
}

/// A description line that cannot open a list, heading, quote or code block
fn description_line(line: &str) -> String {
    let line = line.trim_start();
    let digits = line.find(|c: char| !c.is_ascii_digit()).unwrap_or(line.len());
    if digits > 0 && matches!(line[digits..].chars().next(), Some('.' | ')')) {
        return format!("{}\\{}", &line[..digits], &line[digits..]);
    }
    match line.chars().next() {
        Some('-' | '+' | '*' | '#' | '>' | '=' | '|') => format!("\\{}", line),
        _ => line.to_string(),
    }
}

/// Backtick span long enough to hold any backticks inside `text`
fn inline_code(text: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in text.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    let fence = "`".repeat(longest + 1);
    if longest == 0 {
        format!("{}{}{}", fence, text, fence)
    } else {
        format!("{} {} {}", fence, text, fence)
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '_' | '`' | '[' | ']' | '#' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
