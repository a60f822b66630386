// ── Built-in widget table ──
//
// Built once on first access and never mutated afterwards.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde_json::{Map, Value, json};

use crate::model::{ComponentCategory, ComponentMeta, SizeConstraints};

pub(super) struct BuiltinTable {
    pub(super) entries: Vec<ComponentMeta>,
    index: HashMap<String, usize>,
}

impl BuiltinTable {
    pub(super) fn get(&self, component_type: &str) -> Option<&ComponentMeta> {
        self.index
            .get(component_type)
            .and_then(|&i| self.entries.get(i))
    }
}

pub(super) static BUILTINS: LazyLock<BuiltinTable> = LazyLock::new(|| {
    let entries = builtin_components();
    let index = entries
        .iter()
        .enumerate()
        .map(|(i, meta)| (meta.component_type.clone(), i))
        .collect();
    BuiltinTable { entries, index }
});

/// Shorthand for one table row.
struct Row {
    ty: &'static str,
    name: &'static str,
    description: &'static str,
    category: ComponentCategory,
    icon: &'static str,
    size: SizeConstraints,
    data: Option<u32>,
    display: bool,
    actions: bool,
    props: &'static [&'static str],
    defaults: Value,
    variants: &'static [&'static str],
}

impl Row {
    fn build(self) -> ComponentMeta {
        let default_props = match self.defaults {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        ComponentMeta {
            component_type: self.ty.into(),
            name: self.name.into(),
            description: self.description.into(),
            category: self.category,
            icon: Some(self.icon.into()),
            size_constraints: self.size,
            has_data_source: self.data.is_some(),
            max_data_sources: self.data.filter(|&n| n > 0),
            has_display_config: self.display,
            has_actions: self.actions,
            accepted_props: self.props.iter().map(|p| (*p).to_string()).collect(),
            default_props,
            variants: self.variants.iter().map(|v| (*v).to_string()).collect(),
        }
    }
}

// `data: Some(0)` means "binds data, no upper limit".
#[allow(clippy::too_many_lines)]
fn builtin_components() -> Vec<ComponentMeta> {
    use ComponentCategory::{Business, Charts, Controls, Indicators, Layout, Lists};

    let rows = vec![
        // ── Indicators ──
        Row {
            ty: "value-card",
            name: "Value Card",
            description: "Single value with label, unit and trend",
            category: Indicators,
            icon: "gauge",
            size: SizeConstraints::new(2, 1, 3, 2, 6, 4),
            data: Some(1),
            display: true,
            actions: false,
            props: &["title", "unit", "precision", "size", "variant", "icon", "color"],
            defaults: json!({ "size": "md", "variant": "default", "precision": 1 }),
            variants: &["default", "compact", "trend"],
        },
        Row {
            ty: "led-indicator",
            name: "LED Indicator",
            description: "On/off status light bound to a boolean reading",
            category: Indicators,
            icon: "circle-dot",
            size: SizeConstraints::new(1, 1, 2, 2, 4, 4).square(),
            data: Some(1),
            display: true,
            actions: false,
            props: &["title", "size", "onColor", "offColor", "blink"],
            defaults: json!({ "size": "md", "onColor": "green", "offColor": "gray" }),
            variants: &[],
        },
        Row {
            ty: "sparkline",
            name: "Sparkline",
            description: "Compact trend line without axes",
            category: Indicators,
            icon: "activity",
            size: SizeConstraints::new(2, 1, 3, 1, 8, 3),
            data: Some(1),
            display: true,
            actions: false,
            props: &["title", "color", "fill", "showValue"],
            defaults: json!({ "fill": true, "showValue": true }),
            variants: &[],
        },
        Row {
            ty: "progress-bar",
            name: "Progress Bar",
            description: "Horizontal bar showing a value within a range",
            category: Indicators,
            icon: "bar-chart-horizontal",
            size: SizeConstraints::new(2, 1, 4, 1, 12, 2),
            data: Some(1),
            display: true,
            actions: false,
            props: &["title", "min", "max", "unit", "color", "showLabel"],
            defaults: json!({ "min": 0, "max": 100, "showLabel": true }),
            variants: &["default", "striped"],
        },
        // ── Charts ──
        Row {
            ty: "line-chart",
            name: "Line Chart",
            description: "Time series plotted as lines",
            category: Charts,
            icon: "line-chart",
            size: SizeConstraints::new(3, 2, 6, 4, 12, 8),
            data: Some(0),
            display: true,
            actions: false,
            props: &["title", "showLegend", "showGrid", "smooth", "yMin", "yMax", "colors"],
            defaults: json!({ "showLegend": true, "showGrid": true, "smooth": true }),
            variants: &[],
        },
        Row {
            ty: "area-chart",
            name: "Area Chart",
            description: "Time series with filled area under the line",
            category: Charts,
            icon: "area-chart",
            size: SizeConstraints::new(3, 2, 6, 4, 12, 8),
            data: Some(0),
            display: true,
            actions: false,
            props: &["title", "showLegend", "showGrid", "stacked", "colors"],
            defaults: json!({ "showLegend": true, "stacked": false }),
            variants: &[],
        },
        Row {
            ty: "bar-chart",
            name: "Bar Chart",
            description: "Grouped or stacked bars over categories or time buckets",
            category: Charts,
            icon: "bar-chart",
            size: SizeConstraints::new(3, 2, 6, 4, 12, 8),
            data: Some(0),
            display: true,
            actions: false,
            props: &["title", "showLegend", "horizontal", "stacked", "colors"],
            defaults: json!({ "showLegend": true, "horizontal": false }),
            variants: &[],
        },
        Row {
            ty: "pie-chart",
            name: "Pie Chart",
            description: "Share of a whole across several sources",
            category: Charts,
            icon: "pie-chart",
            size: SizeConstraints::new(3, 3, 4, 4, 8, 8).square(),
            data: Some(0),
            display: true,
            actions: false,
            props: &["title", "showLegend", "donut", "colors"],
            defaults: json!({ "showLegend": true, "donut": false }),
            variants: &["pie", "donut"],
        },
        // ── Controls ──
        Row {
            ty: "toggle-switch",
            name: "Toggle Switch",
            description: "Sends an on/off command to a device",
            category: Controls,
            icon: "toggle-right",
            size: SizeConstraints::new(1, 1, 2, 1, 4, 2),
            data: Some(1),
            display: true,
            actions: true,
            props: &["title", "size", "confirm", "onLabel", "offLabel"],
            defaults: json!({ "size": "md", "confirm": false }),
            variants: &[],
        },
        Row {
            ty: "slider-control",
            name: "Slider",
            description: "Sets a numeric device parameter within a range",
            category: Controls,
            icon: "sliders-horizontal",
            size: SizeConstraints::new(2, 1, 4, 1, 12, 2),
            data: Some(1),
            display: true,
            actions: true,
            props: &["title", "min", "max", "step", "unit"],
            defaults: json!({ "min": 0, "max": 100, "step": 1 }),
            variants: &[],
        },
        Row {
            ty: "button-group",
            name: "Button Group",
            description: "Row of buttons each bound to a command",
            category: Controls,
            icon: "square-mouse-pointer",
            size: SizeConstraints::new(2, 1, 4, 1, 12, 3),
            data: None,
            display: true,
            actions: true,
            props: &["title", "buttons", "orientation"],
            defaults: json!({ "orientation": "horizontal" }),
            variants: &[],
        },
        // ── Lists ──
        Row {
            ty: "data-table",
            name: "Data Table",
            description: "Tabular view of recent readings",
            category: Lists,
            icon: "table",
            size: SizeConstraints::new(4, 3, 6, 4, 12, 12),
            data: Some(0),
            display: true,
            actions: false,
            props: &["title", "columns", "pageSize", "sortable"],
            defaults: json!({ "pageSize": 10, "sortable": true }),
            variants: &[],
        },
        Row {
            ty: "status-list",
            name: "Status List",
            description: "List of devices with their online state",
            category: Lists,
            icon: "list",
            size: SizeConstraints::new(3, 2, 4, 4, 8, 12),
            data: Some(0),
            display: true,
            actions: false,
            props: &["title", "showTimestamp", "compact"],
            defaults: json!({ "showTimestamp": true }),
            variants: &[],
        },
        Row {
            ty: "log-feed",
            name: "Log Feed",
            description: "Scrolling feed of events and messages",
            category: Lists,
            icon: "scroll-text",
            size: SizeConstraints::new(3, 2, 6, 4, 12, 12),
            data: Some(1),
            display: true,
            actions: false,
            props: &["title", "maxItems", "autoScroll", "levels"],
            defaults: json!({ "maxItems": 100, "autoScroll": true }),
            variants: &[],
        },
        // ── Layout ──
        Row {
            ty: "markdown-display",
            name: "Markdown",
            description: "Static rich text rendered from markdown",
            category: Layout,
            icon: "file-text",
            size: SizeConstraints::new(2, 1, 4, 3, 12, 12),
            data: None,
            display: true,
            actions: false,
            props: &["title", "content"],
            defaults: json!({ "content": "" }),
            variants: &[],
        },
        Row {
            ty: "image-display",
            name: "Image",
            description: "Shows an image from a URL or a device snapshot",
            category: Layout,
            icon: "image",
            size: SizeConstraints::new(2, 2, 4, 3, 12, 12),
            data: Some(1),
            display: true,
            actions: false,
            props: &["title", "src", "fit", "refreshInterval"],
            defaults: json!({ "fit": "contain" }),
            variants: &[],
        },
        Row {
            ty: "image-history",
            name: "Image History",
            description: "Scrub through images captured over time",
            category: Layout,
            icon: "images",
            size: SizeConstraints::new(3, 3, 6, 4, 12, 12),
            data: Some(1),
            display: true,
            actions: false,
            props: &["title", "fit", "limit"],
            defaults: json!({ "fit": "contain", "limit": 20 }),
            variants: &[],
        },
        Row {
            ty: "web-display",
            name: "Web Page",
            description: "Embeds an external page in a frame",
            category: Layout,
            icon: "globe",
            size: SizeConstraints::new(3, 2, 6, 4, 12, 12),
            data: None,
            display: true,
            actions: false,
            props: &["title", "url", "sandbox"],
            defaults: json!({ "sandbox": true }),
            variants: &[],
        },
        Row {
            ty: "video-display",
            name: "Video",
            description: "Live or recorded video stream",
            category: Layout,
            icon: "video",
            size: SizeConstraints::new(3, 2, 6, 4, 12, 12),
            data: Some(1),
            display: true,
            actions: false,
            props: &["title", "src", "autoplay", "muted"],
            defaults: json!({ "autoplay": true, "muted": true }),
            variants: &[],
        },
        Row {
            ty: "map-display",
            name: "Map",
            description: "Device locations on a map",
            category: Layout,
            icon: "map",
            size: SizeConstraints::new(4, 3, 6, 5, 12, 12),
            data: Some(0),
            display: true,
            actions: false,
            props: &["title", "center", "zoom", "tileLayer"],
            defaults: json!({ "zoom": 10 }),
            variants: &[],
        },
        Row {
            ty: "custom-layer",
            name: "Custom Layer",
            description: "Free-form canvas with positioned bindings over a background",
            category: Layout,
            icon: "layers",
            size: SizeConstraints::new(4, 3, 8, 6, 12, 12),
            data: Some(0),
            display: true,
            actions: true,
            props: &["title", "background", "items"],
            defaults: json!({ "items": [] }),
            variants: &[],
        },
        // ── Business ──
        Row {
            ty: "agent-monitor-widget",
            name: "Agent Monitor",
            description: "Status and recent runs of an automation agent",
            category: Business,
            icon: "bot",
            size: SizeConstraints::new(3, 3, 4, 4, 12, 12),
            data: None,
            display: true,
            actions: true,
            props: &["title", "agentId", "showHistory"],
            defaults: json!({ "showHistory": true }),
            variants: &[],
        },
        Row {
            ty: "alert-panel",
            name: "Alert Panel",
            description: "Active alerts with acknowledge actions",
            category: Business,
            icon: "bell",
            size: SizeConstraints::new(3, 2, 4, 4, 12, 12),
            data: None,
            display: true,
            actions: true,
            props: &["title", "severity", "maxItems"],
            defaults: json!({ "maxItems": 20 }),
            variants: &[],
        },
    ];

    rows.into_iter().map(Row::build).collect()
}
