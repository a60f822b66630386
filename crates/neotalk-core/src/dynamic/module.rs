// ── Loaded component modules ──
//
// A bundle evaluates to host-side values the core cannot inspect directly.
// The host describes them as `ExportValue`s; the loader classifies what it
// got into a closed set of renderable shapes.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Opaque handle to a callable living in the host runtime.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HostRef(Arc<str>);

impl HostRef {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for HostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostRef({})", self.0)
    }
}

/// Shape of a value exported by a bundle, as reported by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportValue {
    Function(HostRef),
    Object(BTreeMap<String, ExportValue>),
    /// Primitives, `null`, arrays: never renderable.
    Other(serde_json::Value),
}

impl ExportValue {
    pub fn object<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, ExportValue)>,
        K: Into<String>,
    {
        Self::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn function(id: impl Into<Arc<str>>) -> Self {
        Self::Function(HostRef::new(id))
    }

    pub fn get(&self, key: &str) -> Option<&ExportValue> {
        match self {
            Self::Object(map) => map.get(key),
            _ => None,
        }
    }
}

/// Named exports of an evaluated module.
pub type ModuleExports = BTreeMap<String, ExportValue>;

/// Something the renderer can mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Renderable {
    /// A plain component function.
    Callable(HostRef),
    /// A wrapper object (memo, forwardRef, lazy) forwarding to `render`.
    Forwarded { render: HostRef, wrapper: String },
}

/// Keys under which wrapper objects expose their inner component.
const FORWARDING_KEYS: &[&str] = &["render", "type", "component"];

/// Classify an export. Anything that is neither callable nor a wrapper
/// around a callable is rejected.
pub fn classify(value: &ExportValue) -> Option<Renderable> {
    match value {
        ExportValue::Function(f) => Some(Renderable::Callable(f.clone())),
        ExportValue::Object(map) => FORWARDING_KEYS.iter().find_map(|key| match map.get(*key) {
            Some(ExportValue::Function(render)) => Some(Renderable::Forwarded {
                render: render.clone(),
                wrapper: (*key).to_string(),
            }),
            _ => None,
        }),
        ExportValue::Other(_) => None,
    }
}

/// Pick the export a bundle offers for a component: the named one when
/// given and present, else `default`.
pub fn select_export<'a>(
    exports: &'a ModuleExports,
    export_name: Option<&str>,
) -> Option<(&'a str, &'a ExportValue)> {
    export_name
        .and_then(|name| exports.get_key_value(name))
        .or_else(|| exports.get_key_value("default"))
        .map(|(k, v)| (k.as_str(), v))
}

/// A successfully loaded widget implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentModule {
    pub component_type: String,
    pub renderable: Renderable,
    pub source_url: String,
}

/// Why a widget bundle could not be turned into a [`ComponentModule`].
///
/// Cloneable: one failure is handed to every caller of a coalesced load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("Unknown dynamic component: {component_type}")]
    UnknownComponent { component_type: String },

    #[error("Failed to load script {url}: {reason}")]
    Injection { url: String, reason: String },

    #[error("Script {url} defined none of the globals [{}]", .tried.join(", "))]
    MissingGlobal { url: String, tried: Vec<String> },

    #[error("Export '{export}' not found in {url}")]
    MissingExport { url: String, export: String },

    #[error("Export '{export}' of {url} is not a renderable component")]
    NotRenderable { url: String, export: String },

    #[error("Module import of {url} failed: {reason}")]
    Import { url: String, reason: String },

    #[error("Load task for {component_type} aborted: {reason}")]
    Aborted {
        component_type: String,
        reason: String,
    },
}

impl LoadError {
    /// Pipeline stage that failed, for log fields.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::UnknownComponent { .. } => "resolve",
            Self::Injection { .. } => "inject",
            Self::MissingGlobal { .. } => "global",
            Self::MissingExport { .. } => "export",
            Self::NotRenderable { .. } => "classify",
            Self::Import { .. } => "import",
            Self::Aborted { .. } => "task",
        }
    }
}

/// Outcome of [`crate::DynamicComponentRegistry::load_component`].
#[derive(Debug, Clone)]
pub enum Acquisition {
    Loaded(Arc<ComponentModule>),
    Failed(LoadError),
}

impl Acquisition {
    /// The loaded module, or `None` for the renderer's fallback widget.
    pub fn module(&self) -> Option<&Arc<ComponentModule>> {
        match self {
            Self::Loaded(m) => Some(m),
            Self::Failed(_) => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    pub fn error(&self) -> Option<&LoadError> {
        match self {
            Self::Loaded(_) => None,
            Self::Failed(e) => Some(e),
        }
    }

    pub fn into_result(self) -> Result<Arc<ComponentModule>, LoadError> {
        match self {
            Self::Loaded(m) => Ok(m),
            Self::Failed(e) => Err(e),
        }
    }
}
