//! Dashboard widget registry and persistence layer between `neotalk-api`
//! and UI consumers.
//!
//! - **Data sources** ([`model::data_source`]): single-or-many bindings
//!   describing where a widget reads its value, normalized with
//!   [`normalize_data_source`].
//!
//! - **Built-in registry** ([`registry`]): immutable table of the widget
//!   types shipped with the app, with filtering and category grouping.
//!
//! - **[`DynamicComponentRegistry`]**: extension widgets registered at
//!   runtime and loaded on demand through a [`BundleResolver`], with per-type
//!   load coalescing and a module cache. [`ComponentCatalog`] puts both
//!   registries behind one lookup.
//!
//! - **Persistence** ([`storage`]): the [`DashboardStorage`] trait with
//!   local, API, and hybrid backends, built by [`create_dashboard_storage`].
//!
//! - **[`ExtensionLifecycleSync`]**: consumes backend lifecycle events and
//!   keeps the registry and the open [`DashboardSession`] consistent.

pub mod config;
pub mod convert;
pub mod dynamic;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod registry;
pub mod session;
pub mod storage;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ClientConfig, TlsVerification};
pub use dynamic::{
    Acquisition, BundleFormat, BundleResolver, ComponentDefinition, ComponentModule,
    DynamicComponentRegistry, ExtensionEntry, LoadError, Renderable,
};
pub use error::CoreError;
pub use lifecycle::{ExtensionLifecycleSync, SyncSummary, UnregisterOutcome};
pub use registry::{
    ComponentCatalog, ComponentFilter, ComponentGroup, ComponentOrigin, filter_components,
    get_component_meta, group_components_by_category,
};
pub use session::DashboardSession;
pub use storage::{
    DashboardStorage, StorageBackend, StorageError, StorageKind, StorageOptions, Sourced,
    create_dashboard_storage,
};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    ComponentCategory, ComponentMeta, ComponentPosition, Dashboard, DashboardComponent,
    DataSource, DataSourceBinding, DataSourceType, SizeConstraints, is_data_source_list,
    normalize_data_source,
};
