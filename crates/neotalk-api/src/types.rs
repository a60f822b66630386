//! Wire types for the NeoTalk backend REST API.
//!
//! The backend speaks snake_case. Older endpoints (and dashboards exported
//! from the browser client) use camelCase, so the deserializers accept both
//! spellings here, once, at the edge. Everything the client does not model
//! is kept in a flattened `extra` map and written back untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Dashboards ───────────────────────────────────────────────────────

/// A persisted dashboard, from `GET /api/dashboards`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub layout: DashboardLayoutDto,
    #[serde(default)]
    pub components: Vec<ComponentInstanceDto>,
    /// Epoch milliseconds.
    #[serde(default, alias = "createdAt")]
    pub created_at: i64,
    /// Epoch milliseconds.
    #[serde(default, alias = "updatedAt")]
    pub updated_at: i64,
    #[serde(default, alias = "isDefault", skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    /// Catch-all for additional fields not modeled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Grid layout settings of a dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardLayoutDto {
    #[serde(default = "default_columns")]
    pub columns: u32,
    #[serde(default = "default_row_height", alias = "rowHeight")]
    pub row_height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakpoints: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for DashboardLayoutDto {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            row_height: default_row_height(),
            breakpoints: None,
            extra: Map::new(),
        }
    }
}

fn default_columns() -> u32 {
    12
}
fn default_row_height() -> u32 {
    60
}

/// One placed widget inside a dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInstanceDto {
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default)]
    pub position: ComponentPositionDto,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, alias = "dataSource", skip_serializing_if = "Option::is_none")]
    pub data_source: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Grid position of a placed widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentPositionDto {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(default, alias = "minW", skip_serializing_if = "Option::is_none")]
    pub min_w: Option<u32>,
    #[serde(default, alias = "minH", skip_serializing_if = "Option::is_none")]
    pub min_h: Option<u32>,
    #[serde(default, alias = "maxW", skip_serializing_if = "Option::is_none")]
    pub max_w: Option<u32>,
    #[serde(default, alias = "maxH", skip_serializing_if = "Option::is_none")]
    pub max_h: Option<u32>,
}

// ── Extension components ─────────────────────────────────────────────

/// A widget type contributed by an extension, from
/// `GET /api/extensions/{id}/components` and
/// `GET /api/extensions/dashboard-components`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardComponentDto {
    #[serde(rename = "type")]
    pub component_type: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Where the bundle implementing this widget is served from.
    #[serde(alias = "bundleUrl")]
    pub bundle_url: String,
    /// `"esm"` for native modules, `"iife"` for self-executing bundles.
    #[serde(default, alias = "bundleFormat", skip_serializing_if = "Option::is_none")]
    pub bundle_format: Option<String>,
    /// Named export carrying the widget; `default` when absent.
    #[serde(default, alias = "exportName", skip_serializing_if = "Option::is_none")]
    pub export_name: Option<String>,
    /// Global variable an IIFE bundle assigns itself to.
    #[serde(default, alias = "globalName", skip_serializing_if = "Option::is_none")]
    pub global_name: Option<String>,
    #[serde(default, alias = "sizeConstraints")]
    pub size_constraints: SizeConstraintsDto,
    #[serde(default, alias = "hasDataSource")]
    pub has_data_source: bool,
    #[serde(default, alias = "maxDataSources", skip_serializing_if = "Option::is_none")]
    pub max_data_sources: Option<u32>,
    #[serde(default, alias = "hasDisplayConfig")]
    pub has_display_config: bool,
    #[serde(default, alias = "hasActions")]
    pub has_actions: bool,
    /// Configuration keys the widget understands.
    #[serde(default, alias = "acceptedProps", alias = "config_keys")]
    pub accepted_props: Vec<String>,
    #[serde(default, alias = "defaultProps", alias = "default_config")]
    pub default_props: Map<String, Value>,
    #[serde(default)]
    pub variants: Vec<String>,
    /// Present on the aggregated catalog endpoint only.
    #[serde(default, alias = "extensionId", skip_serializing_if = "Option::is_none")]
    pub extension_id: Option<String>,
    #[serde(default, alias = "extensionName", skip_serializing_if = "Option::is_none")]
    pub extension_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_category() -> String {
    "business".into()
}

/// Grid size limits declared by an extension widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeConstraintsDto {
    #[serde(default, alias = "minW", skip_serializing_if = "Option::is_none")]
    pub min_w: Option<u32>,
    #[serde(default, alias = "minH", skip_serializing_if = "Option::is_none")]
    pub min_h: Option<u32>,
    #[serde(default, alias = "defaultW", skip_serializing_if = "Option::is_none")]
    pub default_w: Option<u32>,
    #[serde(default, alias = "defaultH", skip_serializing_if = "Option::is_none")]
    pub default_h: Option<u32>,
    #[serde(default, alias = "maxW", skip_serializing_if = "Option::is_none")]
    pub max_w: Option<u32>,
    #[serde(default, alias = "maxH", skip_serializing_if = "Option::is_none")]
    pub max_h: Option<u32>,
    #[serde(default, alias = "preserveAspect", skip_serializing_if = "Option::is_none")]
    pub preserve_aspect: Option<bool>,
}
