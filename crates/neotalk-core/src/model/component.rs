// ── Component metadata ──

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumIter, EnumString};

/// Palette category of a widget type. Declaration order is display order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ComponentCategory {
    Indicators,
    Charts,
    Controls,
    Lists,
    Layout,
    Business,
}

impl ComponentCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Indicators => "Indicators",
            Self::Charts => "Charts",
            Self::Controls => "Controls",
            Self::Lists => "Lists",
            Self::Layout => "Layout",
            Self::Business => "Business",
        }
    }
}

/// Grid size limits, in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeConstraints {
    pub min_w: u32,
    pub min_h: u32,
    pub default_w: u32,
    pub default_h: u32,
    pub max_w: u32,
    pub max_h: u32,
    #[serde(default)]
    pub preserve_aspect: bool,
}

impl Default for SizeConstraints {
    fn default() -> Self {
        Self::new(1, 1, 4, 3, 12, 12)
    }
}

impl SizeConstraints {
    pub const fn new(
        min_w: u32,
        min_h: u32,
        default_w: u32,
        default_h: u32,
        max_w: u32,
        max_h: u32,
    ) -> Self {
        Self {
            min_w,
            min_h,
            default_w,
            default_h,
            max_w,
            max_h,
            preserve_aspect: false,
        }
    }

    pub const fn square(mut self) -> Self {
        self.preserve_aspect = true;
        self
    }

    /// Clamp a requested size into `[min, max]` on both axes.
    pub fn clamp(&self, w: u32, h: u32) -> (u32, u32) {
        let w = w.max(self.min_w).min(self.max_w.max(self.min_w));
        let h = h.max(self.min_h).min(self.max_h.max(self.min_h));
        (w, h)
    }

    pub fn contains(&self, w: u32, h: u32) -> bool {
        self.clamp(w, h) == (w, h)
    }
}

/// Everything the renderer and the editor need to know about a widget type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMeta {
    #[serde(rename = "type")]
    pub component_type: String,
    pub name: String,
    pub description: String,
    pub category: ComponentCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub size_constraints: SizeConstraints,
    pub has_data_source: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_data_sources: Option<u32>,
    pub has_display_config: bool,
    pub has_actions: bool,
    #[serde(default)]
    pub accepted_props: Vec<String>,
    #[serde(default)]
    pub default_props: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<String>,
}

impl ComponentMeta {
    /// Whether `key` is a configuration key this widget understands.
    pub fn accepts_prop(&self, key: &str) -> bool {
        self.accepted_props.iter().any(|p| p == key)
    }

    /// Whether the widget offers the named presentation mode.
    pub fn variant(&self, name: &str) -> bool {
        self.variants.iter().any(|v| v == name)
    }

    pub fn default_prop(&self, key: &str) -> Option<&Value> {
        self.default_props.get(key)
    }

    /// Case-insensitive substring match over name, description, and type key.
    /// `needle` must already be lowercased.
    pub(crate) fn matches_search(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.component_type.to_lowercase().contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!(
            ComponentCategory::from_str("Charts").ok(),
            Some(ComponentCategory::Charts)
        );
        assert!(ComponentCategory::from_str("gadgets").is_err());
    }

    #[test]
    fn category_order_is_declaration_order() {
        let order: Vec<_> = ComponentCategory::iter().collect();
        assert_eq!(order.first(), Some(&ComponentCategory::Indicators));
        assert_eq!(order.last(), Some(&ComponentCategory::Business));
    }

    #[test]
    fn clamp_bounds_both_axes() {
        let sc = SizeConstraints::new(2, 2, 4, 3, 6, 4);
        assert_eq!(sc.clamp(1, 10), (2, 4));
        assert_eq!(sc.clamp(5, 3), (5, 3));
        assert!(sc.contains(6, 4));
        assert!(!sc.contains(7, 4));
    }

    #[test]
    fn clamp_tolerates_inverted_limits() {
        let sc = SizeConstraints::new(4, 4, 4, 4, 2, 2);
        assert_eq!(sc.clamp(1, 1), (4, 4));
    }
}
