// ── Dashboard domain type ──

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::component::ComponentMeta;
use super::data_source::{DataSource, DataSourceBinding, normalize_data_source};

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A named grid of placed widgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub layout: DashboardLayout,
    #[serde(default)]
    pub components: Vec<DashboardComponent>,
    /// Epoch milliseconds.
    #[serde(default)]
    pub created_at: i64,
    /// Epoch milliseconds.
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardLayout {
    pub columns: u32,
    pub row_height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakpoints: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for DashboardLayout {
    fn default() -> Self {
        Self {
            columns: 12,
            row_height: 60,
            breakpoints: None,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentPosition {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_h: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_h: Option<u32>,
}

/// A widget instance placed on a dashboard.
///
/// `data_source` is kept as raw JSON so bindings the model cannot parse
/// (unknown `type`, editor scratch state) still round-trip. Use
/// [`DashboardComponent::data_sources`] for the typed view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardComponent {
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default)]
    pub position: ComponentPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
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

impl DashboardComponent {
    pub fn new(component_type: impl Into<String>, position: ComponentPosition) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            component_type: component_type.into(),
            position,
            title: None,
            data_source: None,
            display: None,
            config: None,
            actions: None,
            extra: Map::new(),
        }
    }

    /// Typed view of the binding, `None` when absent or unparseable.
    pub fn binding(&self) -> Option<DataSourceBinding> {
        let raw = self.data_source.as_ref()?;
        match serde_json::from_value(raw.clone()) {
            Ok(binding) => Some(binding),
            Err(e) => {
                debug!(component_id = %self.id, error = %e, "ignoring unparseable data source");
                None
            }
        }
    }

    /// The bound sources as a flat list.
    pub fn data_sources(&self) -> Vec<DataSource> {
        normalize_data_source(self.binding().as_ref())
    }

    pub fn set_binding(&mut self, binding: Option<&DataSourceBinding>) {
        self.data_source = binding.and_then(|b| serde_json::to_value(b).ok());
    }
}

/// A problem found by [`Dashboard::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutIssue {
    DuplicateId { id: String },
    UnknownType { id: String, component_type: String },
    SizeOutOfRange {
        id: String,
        component_type: String,
        size: (u32, u32),
        clamped: (u32, u32),
    },
    TooManySources {
        id: String,
        count: usize,
        max: u32,
    },
}

impl LayoutIssue {
    /// Duplicate ids break editing; everything else is advisory.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::DuplicateId { .. })
    }
}

impl Dashboard {
    pub fn new(name: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            layout: DashboardLayout::default(),
            components: Vec::new(),
            created_at: now,
            updated_at: now,
            is_default: None,
            extra: Map::new(),
        }
    }

    /// Advance `updated_at`, strictly, even when the clock has not moved.
    pub fn touch(&mut self) {
        self.updated_at = now_millis().max(self.updated_at + 1);
    }

    pub fn component(&self, id: &str) -> Option<&DashboardComponent> {
        self.components.iter().find(|c| c.id == id)
    }

    /// Remove every component whose type is in `types`, returning the removed
    /// instances in their original order.
    pub fn remove_components_of_types(&mut self, types: &[String]) -> Vec<DashboardComponent> {
        if types.is_empty() {
            return Vec::new();
        }
        let (removed, kept) = std::mem::take(&mut self.components)
            .into_iter()
            .partition(|c| types.contains(&c.component_type));
        self.components = kept;
        removed
    }

    /// Check id uniqueness and, through `lookup`, size and binding limits.
    pub fn validate<'a, F>(&self, lookup: F) -> Vec<LayoutIssue>
    where
        F: Fn(&str) -> Option<std::borrow::Cow<'a, ComponentMeta>>,
    {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for component in &self.components {
            if !seen.insert(component.id.as_str()) {
                issues.push(LayoutIssue::DuplicateId {
                    id: component.id.clone(),
                });
            }

            let Some(meta) = lookup(&component.component_type) else {
                issues.push(LayoutIssue::UnknownType {
                    id: component.id.clone(),
                    component_type: component.component_type.clone(),
                });
                continue;
            };

            let size = (component.position.w, component.position.h);
            let clamped = meta.size_constraints.clamp(size.0, size.1);
            if clamped != size {
                issues.push(LayoutIssue::SizeOutOfRange {
                    id: component.id.clone(),
                    component_type: component.component_type.clone(),
                    size,
                    clamped,
                });
            }

            if let Some(max) = meta.max_data_sources {
                let count = component.data_sources().len();
                if count > usize::try_from(max).unwrap_or(usize::MAX) {
                    issues.push(LayoutIssue::TooManySources {
                        id: component.id.clone(),
                        count,
                        max,
                    });
                }
            }
        }

        issues
    }
}
