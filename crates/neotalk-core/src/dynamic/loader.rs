// ── Bundle acquisition ──
//
// Turning a bundle URL into a renderable is the host's job (it owns the
// module loader and the global scope). The registry only sees the
// `BundleResolver` seam; the resolvers here adapt the two ways a bundle can
// be delivered.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

use super::module::{LoadError, ModuleExports, Renderable, classify, select_export};
use crate::model::ComponentMeta;

/// How a widget bundle is packaged.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BundleFormat {
    /// Native ES module, loaded with a dynamic import.
    Esm,
    /// Self-executing script that assigns a global.
    #[default]
    Iife,
}

/// Where a widget's implementation is served from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleLocation {
    pub url: String,
    pub format: BundleFormat,
    pub export_name: Option<String>,
    pub global_name: Option<String>,
}

/// An extension-supplied widget: its metadata plus its bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDefinition {
    pub meta: ComponentMeta,
    pub bundle: BundleLocation,
}

impl ComponentDefinition {
    pub fn component_type(&self) -> &str {
        &self.meta.component_type
    }
}

/// Everything a resolver needs for one acquisition. Owned so it can move
/// into a spawned task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRequest {
    pub component_type: String,
    pub extension_id: String,
    pub bundle: BundleLocation,
}

impl BundleRequest {
    /// Name of the export to pull out, for error messages.
    pub(crate) fn export_label(&self) -> &str {
        self.bundle.export_name.as_deref().unwrap_or("default")
    }
}

/// Turns a bundle into something renderable.
#[async_trait]
pub trait BundleResolver: Send + Sync {
    async fn acquire(&self, request: &BundleRequest) -> Result<Renderable, LoadError>;
}

// ── Module import ───────────────────────────────────────────────────

/// Host hook for a standard dynamic module import.
#[async_trait]
pub trait ModuleImporter: Send + Sync {
    async fn import(&self, url: &str) -> Result<ModuleExports, String>;
}

/// Resolver for ES module bundles.
pub struct ModuleImportResolver<I> {
    importer: I,
}

impl<I: ModuleImporter> ModuleImportResolver<I> {
    pub fn new(importer: I) -> Self {
        Self { importer }
    }
}

#[async_trait]
impl<I: ModuleImporter> BundleResolver for ModuleImportResolver<I> {
    async fn acquire(&self, request: &BundleRequest) -> Result<Renderable, LoadError> {
        let url = &request.bundle.url;
        debug!(component_type = %request.component_type, url = %url, "importing module");

        let exports = self
            .importer
            .import(url)
            .await
            .map_err(|reason| LoadError::Import {
                url: url.clone(),
                reason,
            })?;

        let (name, value) = select_export(&exports, request.bundle.export_name.as_deref())
            .ok_or_else(|| LoadError::MissingExport {
                url: url.clone(),
                export: request.export_label().to_string(),
            })?;

        classify(value).ok_or_else(|| LoadError::NotRenderable {
            url: url.clone(),
            export: name.to_string(),
        })
    }
}

// ── Format routing ──────────────────────────────────────────────────

/// Dispatches to the module or script resolver by [`BundleFormat`].
pub struct FormatRouter {
    module: Arc<dyn BundleResolver>,
    script: Arc<dyn BundleResolver>,
}

impl FormatRouter {
    pub fn new(module: Arc<dyn BundleResolver>, script: Arc<dyn BundleResolver>) -> Self {
        Self { module, script }
    }
}

#[async_trait]
impl BundleResolver for FormatRouter {
    async fn acquire(&self, request: &BundleRequest) -> Result<Renderable, LoadError> {
        match request.bundle.format {
            BundleFormat::Esm => self.module.acquire(request).await,
            BundleFormat::Iife => self.script.acquire(request).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dynamic::module::{ExportValue, HostRef};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeImporter(ModuleExports);

    #[async_trait]
    impl ModuleImporter for FakeImporter {
        async fn import(&self, url: &str) -> Result<ModuleExports, String> {
            if url.ends_with("404.js") {
                return Err("404 Not Found".into());
            }
            Ok(self.0.clone())
        }
    }

    fn request(url: &str, format: BundleFormat, export: Option<&str>) -> BundleRequest {
        BundleRequest {
            component_type: "gauge".into(),
            extension_id: "weather".into(),
            bundle: BundleLocation {
                url: url.into(),
                format,
                export_name: export.map(Into::into),
                global_name: None,
            },
        }
    }

    fn exports(entries: Vec<(&str, ExportValue)>) -> ModuleExports {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[tokio::test]
    async fn module_import_picks_named_export() {
        let resolver = ModuleImportResolver::new(FakeImporter(exports(vec![
            ("Gauge", ExportValue::function("gauge-fn")),
            ("default", ExportValue::function("other")),
        ])));
        let r = resolver
            .acquire(&request("/b.js", BundleFormat::Esm, Some("Gauge")))
            .await
            .unwrap();
        assert_eq!(r, Renderable::Callable(HostRef::new("gauge-fn")));
    }

    #[tokio::test]
    async fn module_import_failure_is_reported() {
        let resolver = ModuleImportResolver::new(FakeImporter(ModuleExports::new()));
        let err = resolver
            .acquire(&request("/404.js", BundleFormat::Esm, None))
            .await
            .unwrap_err();
        assert_eq!(err.stage(), "import");
    }

    #[tokio::test]
    async fn missing_and_unrenderable_exports() {
        let resolver = ModuleImportResolver::new(FakeImporter(exports(vec![(
            "Gauge",
            ExportValue::Other(serde_json::json!({})),
        )])));
        let missing = resolver
            .acquire(&request("/b.js", BundleFormat::Esm, None))
            .await
            .unwrap_err();
        assert!(matches!(missing, LoadError::MissingExport { ref export, .. } if export == "default"));

        let bad = resolver
            .acquire(&request("/b.js", BundleFormat::Esm, Some("Gauge")))
            .await
            .unwrap_err();
        assert!(matches!(bad, LoadError::NotRenderable { .. }));
    }

    struct Counting(AtomicUsize, &'static str);

    #[async_trait]
    impl BundleResolver for Counting {
        async fn acquire(&self, _request: &BundleRequest) -> Result<Renderable, LoadError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Renderable::Callable(HostRef::new(self.1)))
        }
    }

    #[tokio::test]
    async fn router_dispatches_by_format() {
        let module = Arc::new(Counting(AtomicUsize::new(0), "esm"));
        let script = Arc::new(Counting(AtomicUsize::new(0), "iife"));
        let router = FormatRouter::new(module.clone(), script.clone());

        router
            .acquire(&request("/a.js", BundleFormat::Esm, None))
            .await
            .unwrap();
        router
            .acquire(&request("/b.js", BundleFormat::Iife, None))
            .await
            .unwrap();
        router
            .acquire(&request("/c.js", BundleFormat::Iife, None))
            .await
            .unwrap();

        assert_eq!(module.0.load(Ordering::SeqCst), 1);
        assert_eq!(script.0.load(Ordering::SeqCst), 2);
    }
}
