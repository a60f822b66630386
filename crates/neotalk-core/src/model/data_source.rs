// ── Data source model ──
//
// A widget's value comes from one or more data sources. Each source is a
// loosely-typed record: the `type` discriminator picks which fields are
// meaningful, everything else rides along untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// Discriminator for the active binding style of a [`DataSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DataSourceType {
    Api,
    Websocket,
    Static,
    Computed,
    Device,
    Metric,
    Command,
    Telemetry,
}

/// Aggregation applied to a time series before display.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Aggregate {
    #[default]
    Latest,
    First,
    Avg,
    Min,
    Max,
    Sum,
    Count,
    Delta,
    Rate,
    Raw,
}

/// Maps raw boolean-ish readings to display values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub off: Option<Value>,
    #[serde(rename = "true", default, skip_serializing_if = "Option::is_none")]
    pub true_value: Option<Value>,
    #[serde(rename = "false", default, skip_serializing_if = "Option::is_none")]
    pub false_value: Option<Value>,
}

impl ValueMapping {
    fn truthy(&self) -> Option<&Value> {
        self.true_value.as_ref().or(self.on.as_ref())
    }

    fn falsy(&self) -> Option<&Value> {
        self.false_value.as_ref().or(self.off.as_ref())
    }
}

/// Where a widget reads its value from.
///
/// Only the fields relevant to `source_type` are meaningful. Fields belonging
/// to other binding styles are ignored, never rejected, so half-edited
/// bindings survive a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    #[serde(rename = "type")]
    pub source_type: DataSourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_mapping: Option<ValueMapping>,
    /// Relative window such as `"1h"` or `"24h"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window: Option<String>,
    /// Window length in hours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<Aggregate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_ext: Option<Aggregate>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The semantically active part of a [`DataSource`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Binding<'a> {
    Device {
        device_id: &'a str,
        property: Option<&'a str>,
    },
    Metric {
        metric_id: &'a str,
        device_id: Option<&'a str>,
    },
    Command {
        command: &'a str,
        device_id: Option<&'a str>,
    },
    Static(&'a Value),
    Endpoint(&'a str),
    Computed,
    /// The discriminator names a style whose required field is missing.
    Unbound,
}

impl DataSource {
    /// A bare source of the given type with every optional field unset.
    pub fn new(source_type: DataSourceType) -> Self {
        Self {
            source_type,
            endpoint: None,
            device_id: None,
            property: None,
            metric_id: None,
            command: None,
            command_params: None,
            static_value: None,
            value_mapping: None,
            time_window: None,
            time_range: None,
            limit: None,
            aggregate: None,
            aggregate_ext: None,
            extra: Map::new(),
        }
    }

    pub fn device(device_id: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            device_id: Some(device_id.into()),
            property: Some(property.into()),
            ..Self::new(DataSourceType::Device)
        }
    }

    pub fn metric(metric_id: impl Into<String>) -> Self {
        Self {
            metric_id: Some(metric_id.into()),
            ..Self::new(DataSourceType::Metric)
        }
    }

    pub fn fixed(value: Value) -> Self {
        Self {
            static_value: Some(value),
            ..Self::new(DataSourceType::Static)
        }
    }

    /// Classify the active binding by the `type` discriminator.
    pub fn binding(&self) -> Binding<'_> {
        match self.source_type {
            DataSourceType::Device | DataSourceType::Telemetry => match &self.device_id {
                Some(device_id) => Binding::Device {
                    device_id,
                    property: self.property.as_deref().or(self.metric_id.as_deref()),
                },
                None => Binding::Unbound,
            },
            DataSourceType::Metric => match &self.metric_id {
                Some(metric_id) => Binding::Metric {
                    metric_id,
                    device_id: self.device_id.as_deref(),
                },
                None => Binding::Unbound,
            },
            DataSourceType::Command => match &self.command {
                Some(command) => Binding::Command {
                    command,
                    device_id: self.device_id.as_deref(),
                },
                None => Binding::Unbound,
            },
            DataSourceType::Static => self
                .static_value
                .as_ref()
                .map_or(Binding::Unbound, Binding::Static),
            DataSourceType::Api | DataSourceType::Websocket => self
                .endpoint
                .as_deref()
                .map_or(Binding::Unbound, Binding::Endpoint),
            DataSourceType::Computed => Binding::Computed,
        }
    }

    /// `aggregateExt` wins over the legacy `aggregate` field.
    pub fn effective_aggregate(&self) -> Option<Aggregate> {
        self.aggregate_ext.or(self.aggregate)
    }

    /// Apply `valueMapping` to a raw reading. Unmapped values pass through.
    pub fn map_value(&self, raw: &Value) -> Value {
        let Some(mapping) = &self.value_mapping else {
            return raw.clone();
        };

        let state = match raw {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "on" | "true" => Some(true),
                "off" | "false" => Some(false),
                _ => None,
            },
            Value::Number(n) => match n.as_i64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            _ => None,
        };

        let mapped = match state {
            Some(true) => mapping.truthy(),
            Some(false) => mapping.falsy(),
            None => None,
        };
        mapped.cloned().unwrap_or_else(|| raw.clone())
    }
}

// ── Single-or-many binding ──────────────────────────────────────────

/// A widget binds either one source or an ordered list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataSourceBinding {
    Many(Vec<DataSource>),
    Single(Box<DataSource>),
}

impl DataSourceBinding {
    /// Borrow the bound sources as a slice without allocating.
    pub fn sources(&self) -> &[DataSource] {
        match self {
            Self::Many(list) => list,
            Self::Single(source) => std::slice::from_ref(source.as_ref()),
        }
    }
}

impl From<DataSource> for DataSourceBinding {
    fn from(source: DataSource) -> Self {
        Self::Single(Box::new(source))
    }
}

impl From<Vec<DataSource>> for DataSourceBinding {
    fn from(list: Vec<DataSource>) -> Self {
        Self::Many(list)
    }
}

/// Flatten an optional binding into a list: nothing becomes empty, a single
/// source becomes a one-element list, a list is kept as-is (order preserved,
/// duplicates kept).
pub fn normalize_data_source(source: Option<&DataSourceBinding>) -> Vec<DataSource> {
    source.map(|b| b.sources().to_vec()).unwrap_or_default()
}

/// True iff `value` is an array whose first element is an object with a
/// `type` key.
pub fn is_data_source_list(value: &Value) -> bool {
    value
        .as_array()
        .and_then(|items| items.first())
        .and_then(Value::as_object)
        .is_some_and(|first| first.contains_key("type"))
}

// ── Per-chart defaults ──────────────────────────────────────────────

/// Default query shape a chart applies when its source leaves it unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartDataDefaults {
    pub aggregate: Aggregate,
    pub time_window: &'static str,
    pub limit: u32,
}

const FALLBACK_CHART_DEFAULTS: ChartDataDefaults = ChartDataDefaults {
    aggregate: Aggregate::Latest,
    time_window: "1h",
    limit: 100,
};

const CHART_DEFAULTS: &[(&str, ChartDataDefaults)] = &[
    (
        "line-chart",
        ChartDataDefaults {
            aggregate: Aggregate::Raw,
            time_window: "1h",
            limit: 200,
        },
    ),
    (
        "area-chart",
        ChartDataDefaults {
            aggregate: Aggregate::Raw,
            time_window: "1h",
            limit: 200,
        },
    ),
    (
        "sparkline",
        ChartDataDefaults {
            aggregate: Aggregate::Raw,
            time_window: "1h",
            limit: 50,
        },
    ),
    (
        "bar-chart",
        ChartDataDefaults {
            aggregate: Aggregate::Sum,
            time_window: "24h",
            limit: 24,
        },
    ),
    (
        "pie-chart",
        ChartDataDefaults {
            aggregate: Aggregate::Latest,
            time_window: "24h",
            limit: 10,
        },
    ),
    (
        "value-card",
        ChartDataDefaults {
            aggregate: Aggregate::Latest,
            time_window: "1h",
            limit: 1,
        },
    ),
    (
        "progress-bar",
        ChartDataDefaults {
            aggregate: Aggregate::Latest,
            time_window: "1h",
            limit: 1,
        },
    ),
    (
        "led-indicator",
        ChartDataDefaults {
            aggregate: Aggregate::Latest,
            time_window: "1h",
            limit: 1,
        },
    ),
];

/// Look up the default aggregation and window for a chart type. Unknown
/// types get the fallback entry.
pub fn chart_defaults(chart_type: &str) -> ChartDataDefaults {
    CHART_DEFAULTS
        .iter()
        .find(|(key, _)| *key == chart_type)
        .map_or(FALLBACK_CHART_DEFAULTS, |(_, defaults)| *defaults)
}
