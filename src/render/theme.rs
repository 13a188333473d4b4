//! Depth Tiers
//!
//! Presentation classes per nesting depth. The renderer only records depth;
//! emitters look the classes up here. Depths past the last tier reuse it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of distinct tiers; deeper nodes clamp to the last one
pub const TIER_COUNT: usize = 9;

const TEXT_SIZES: [u8; TIER_COUNT] = [17, 16, 15, 14, 13, 12, 11, 10, 9];

/// Classes applied at one depth
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tier {
    /// Text size class of the node itself
    pub text: String,
    /// Background and border of the container holding the node's children
    pub panel: String,
    /// Separator between those children
    pub divider: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Palette {
    /// balancedSlate shades, one step darker per level, with dark-mode variants
    #[default]
    Slate,
    /// Text sizes only, no color classes
    Plain,
}

impl FromStr for Palette {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "slate" => Ok(Palette::Slate),
            "plain" => Ok(Palette::Plain),
            other => Err(format!("unknown palette '{}', expected slate or plain", other)),
        }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Palette::Slate => write!(f, "slate"),
            Palette::Plain => write!(f, "plain"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    palette: Palette,
    tiers: Vec<Tier>,
}

impl Default for Theme {
    fn default() -> Self {
        Self::new(Palette::default())
    }
}

impl Theme {
    pub fn new(palette: Palette) -> Self {
        let tiers = (0..TIER_COUNT).map(|level| build_tier(palette, level)).collect();
        Self { palette, tiers }
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    /// Tier for `depth`, clamped to the deepest one
    pub fn tier(&self, depth: usize) -> &Tier {
        &self.tiers[depth.min(self.tiers.len() - 1)]
    }
}

fn build_tier(palette: Palette, level: usize) -> Tier {
    let text = format!("text-[{}px]", TEXT_SIZES[level]);
    match palette {
        Palette::Slate => {
            // Light shades go up by 50 per level, dark shades come down by 50
            let step = 50 * level;
            let bg_light = 50 + step;
            let bg_dark = 900 - step;
            let border_light = 150 + step;
            let border_dark = 800 - step;
            Tier {
                text,
                panel: format!(
                    "bg-balancedSlate-{} dark:bg-balancedSlate-{} border border-balancedSlate-{} dark:border-balancedSlate-{}",
                    bg_light, bg_dark, border_light, border_dark
                ),
                divider: format!(
                    "divide-balancedSlate-{} dark:divide-balancedSlate-{}",
                    border_light, border_dark
                ),
            }
        }
        Palette::Plain => Tier {
            text,
            panel: "border".to_string(),
            divider: String::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slate_tiers() {
        let theme = Theme::default();
        let top = theme.tier(0);
        assert_eq!(top.text, "text-[17px]");
        assert_eq!(
            top.panel,
            "bg-balancedSlate-50 dark:bg-balancedSlate-900 border border-balancedSlate-150 dark:border-balancedSlate-800"
        );
        assert_eq!(top.divider, "divide-balancedSlate-150 dark:divide-balancedSlate-800");

        let last = theme.tier(8);
        assert_eq!(last.text, "text-[9px]");
        assert_eq!(last.divider, "divide-balancedSlate-550 dark:divide-balancedSlate-400");
    }

    #[test]
    fn test_depth_clamps_to_last_tier() {
        let theme = Theme::default();
        assert_eq!(theme.tier(40), theme.tier(TIER_COUNT - 1));
    }

    #[test]
    fn test_plain_palette() {
        let theme = Theme::new("plain".parse().unwrap());
        assert_eq!(theme.palette(), Palette::Plain);
        assert_eq!(theme.tier(3).text, "text-[14px]");
        assert!(!theme.tier(3).panel.contains("balancedSlate"));
        assert!("neon".parse::<Palette>().is_err());
    }
}
