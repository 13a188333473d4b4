//! HTML Emitter
//!
//! Nested `<div>` panels. Text size comes from the node's own depth tier;
//! the container holding its children uses that tier's panel and divider
//! classes. Every node gets an `id` anchor slugged from its key path.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use super::value_text;
use crate::render::{Body, RenderNode, Theme};

const MUTED: &str = "text-slate-800 dark:text-slate-300";
const ACCENT: &str = "px-0.5 text-rose-700 dark:text-rose-300";

/// Render a tree as an embeddable HTML fragment
pub fn render(tree: &RenderNode, theme: &Theme) -> String {
    let mut emitter = HtmlEmitter {
        theme,
        anchors: Anchors::default(),
        output: String::new(),
    };
    emitter.node(tree);
    emitter.output
}

struct HtmlEmitter<'a> {
    theme: &'a Theme,
    anchors: Anchors,
    output: String,
}

impl HtmlEmitter<'_> {
    fn node(&mut self, node: &RenderNode) {
        let tier = self.theme.tier(node.depth);
        let anchor = self.anchors.assign(&node.path);

        self.output.push_str(&format!(
            "<div id=\"{}\" class=\"flex flex-col p-4 gap-y-2 {}\">\n",
            anchor, tier.text
        ));
        self.title(node);

        if let Some(title) = node.title.as_deref().filter(|t| *t != node.key) {
            self.output
                .push_str(&format!("<div class=\"italic {}\">{}</div>\n", MUTED, escape(title)));
        }
        if let Some(description) = &node.description {
            self.output.push_str(&format!(
                "<div class=\"{} leading-tight\">{}</div>\n",
                MUTED,
                escape(description)
            ));
        }

        if !node.attributes.is_empty() {
            self.output.push_str("<div class=\"flex flex-col gap-y-0\">\n");
            for attribute in &node.attributes {
                self.output.push_str(&format!(
                    "<div class=\"{}\">{}: <code>{}</code></div>\n",
                    MUTED,
                    attribute.label,
                    escape(&value_text(&attribute.value))
                ));
            }
            self.output.push_str("</div>\n");
        }

        if let Some(allowed) = node.additional_allowed() {
            self.output.push_str(&format!(
                "<div class=\"{}\">additional properties allowed: {}</div>\n",
                MUTED, allowed
            ));
        }

        let children = node.children();
        if !children.is_empty() {
            self.output.push_str(&format!(
                "<div class=\"flex flex-col rounded-lg mt-2 divide-y {} {}\">\n",
                tier.panel, tier.divider
            ));
            for child in children {
                self.node(child);
            }
            self.output.push_str("</div>\n");
        }

        if matches!(node.body, Body::NoSchemaEnforced { .. }) {
            self.output
                .push_str(&format!("<div class=\"{}\">no schema enforced</div>\n", MUTED));
        }

        self.output.push_str("</div>\n");
    }

    fn title(&mut self, node: &RenderNode) {
        self.output.push_str("<div class=\"font-semibold leading-tight\">");
        self.output.push_str(&format!(
            "<span class=\"font-bold text-slate-950 dark:text-slate-100\">{}</span>",
            escape(&node.key)
        ));
        if node.required {
            self.output
                .push_str(&format!("<span class=\"{}\" title=\"required\">*</span>", ACCENT));
        }
        self.output
            .push_str(&format!("<span class=\"{}\">({})</span>", ACCENT, node.kind));
        if node.deprecated {
            self.output.push_str(
                "<span class=\"ml-1 rounded px-1 text-xs bg-amber-100 text-amber-800 dark:bg-amber-900 dark:text-amber-200\">deprecated</span>",
            );
        }
        self.output.push_str("</div>\n");
    }
}

/// Unique heading ids for one page
#[derive(Debug, Default)]
pub struct Anchors {
    issued: HashSet<String>,
    next_suffix: HashMap<String, usize>,
}

impl Anchors {
    /// Slug for `path`, suffixed `-1`, `-2`, ... until no issued id matches
    pub fn assign(&mut self, path: &str) -> String {
        let base = slugify(path);
        let mut anchor = base.clone();
        if self.issued.contains(&anchor) {
            let suffix = self.next_suffix.entry(base.clone()).or_insert(1);
            loop {
                anchor = format!("{}-{}", base, suffix);
                *suffix += 1;
                if !self.issued.contains(&anchor) {
                    break;
                }
            }
        }
        self.issued.insert(anchor.clone());
        anchor
    }
}

fn slug_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static slug pattern"))
}

/// Lowercase, non-alphanumeric runs collapsed to `-`. Synthetic keys get
/// words so `a.#` and `a` stay apart.
pub fn slugify(path: &str) -> String {
    let worded = path
        .split('.')
        .map(|segment| match segment {
            "#" => "items",
            "*" => "additional",
            other => other,
        })
        .collect::<Vec<_>>()
        .join(".")
        .to_lowercase();
    let slug = slug_pattern().replace_all(&worded, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "node".to_string()
    } else {
        slug.to_string()
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
