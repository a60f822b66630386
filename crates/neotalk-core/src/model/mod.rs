// ── Domain model ──
//
// Canonical dashboard types. Wire quirks (snake/camel spelling, wrapped
// responses) stop at `neotalk_api`; everything here is one shape.

pub mod component;
pub mod dashboard;
pub mod data_source;

// ── Re-exports ──────────────────────────────────────────────────────

pub use component::{ComponentCategory, ComponentMeta, SizeConstraints};
pub use dashboard::{
    ComponentPosition, Dashboard, DashboardComponent, DashboardLayout, LayoutIssue, now_millis,
};
pub use data_source::{
    Aggregate, Binding, ChartDataDefaults, DataSource, DataSourceBinding, DataSourceType,
    ValueMapping, chart_defaults, is_data_source_list, normalize_data_source,
};
