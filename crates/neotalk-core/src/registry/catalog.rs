// ── Unified component lookup ──
//
// The renderer asks one place for a widget type and does not care whether
// it ships with the app or comes from an extension. Built-ins win.

use std::borrow::Cow;
use std::sync::Arc;

use super::{ComponentFilter, ComponentGroup, builtin_components, get_component_meta, group_by_category};
use crate::dynamic::{Acquisition, DynamicComponentRegistry};
use crate::model::ComponentMeta;

/// Where a widget type is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ComponentOrigin {
    Builtin,
    Extension,
}

#[derive(Clone)]
pub struct ComponentCatalog {
    dynamic: Arc<DynamicComponentRegistry>,
}

impl ComponentCatalog {
    pub fn new(dynamic: Arc<DynamicComponentRegistry>) -> Self {
        Self { dynamic }
    }

    pub fn dynamic(&self) -> &Arc<DynamicComponentRegistry> {
        &self.dynamic
    }

    pub fn meta(&self, component_type: &str) -> Option<Cow<'static, ComponentMeta>> {
        get_component_meta(component_type)
            .map(Cow::Borrowed)
            .or_else(|| self.dynamic.get_meta(component_type).map(Cow::Owned))
    }

    pub fn origin(&self, component_type: &str) -> Option<ComponentOrigin> {
        if get_component_meta(component_type).is_some() {
            Some(ComponentOrigin::Builtin)
        } else if self.dynamic.is_dynamic(component_type) {
            Some(ComponentOrigin::Extension)
        } else {
            None
        }
    }

    /// Built-ins then extension widgets, filtered. An extension type that
    /// shadows a built-in key is hidden.
    pub fn filter(&self, filter: &ComponentFilter) -> Vec<Cow<'static, ComponentMeta>> {
        let matches = filter.matcher();
        let builtins = builtin_components()
            .iter()
            .filter(|meta| matches(meta))
            .map(Cow::Borrowed);
        let extensions = self
            .dynamic
            .components()
            .into_iter()
            .filter(|meta| get_component_meta(&meta.component_type).is_none() && matches(meta))
            .map(Cow::Owned);
        builtins.chain(extensions).collect()
    }

    pub fn groups(&self, filter: &ComponentFilter) -> Vec<ComponentGroup<Cow<'static, ComponentMeta>>> {
        group_by_category(self.filter(filter), |meta| meta.category)
    }

    /// Load the implementation of an extension widget. Built-in types need
    /// no loading and report `None`.
    pub async fn load(&self, component_type: &str) -> Option<Acquisition> {
        if get_component_meta(component_type).is_some() {
            return None;
        }
        Some(self.dynamic.load_component(component_type).await)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dynamic::{
        BundleFormat, BundleLocation, BundleRequest, BundleResolver, ComponentDefinition,
        HostRef, LoadError, Renderable,
    };
    use crate::model::ComponentCategory;
    use async_trait::async_trait;

    struct Instant;

    #[async_trait]
    impl BundleResolver for Instant {
        async fn acquire(&self, request: &BundleRequest) -> Result<Renderable, LoadError> {
            Ok(Renderable::Callable(HostRef::new(request.component_type.as_str())))
        }
    }

    fn catalog_with(types: &[&str]) -> ComponentCatalog {
        let registry = Arc::new(DynamicComponentRegistry::new(Arc::new(Instant)));
        for ty in types {
            let mut meta = get_component_meta("value-card").unwrap().clone();
            meta.component_type = (*ty).to_string();
            meta.name = format!("Ext {ty}");
            meta.category = ComponentCategory::Business;
            registry.register(
                "ext",
                "Ext",
                ComponentDefinition {
                    meta,
                    bundle: BundleLocation {
                        url: format!("/ext/{ty}.js"),
                        format: BundleFormat::Esm,
                        export_name: None,
                        global_name: None,
                    },
                },
            );
        }
        ComponentCatalog::new(registry)
    }

    #[test]
    fn builtins_shadow_extensions() {
        let catalog = catalog_with(&["value-card", "wind-rose"]);
        let meta = catalog.meta("value-card").unwrap();
        assert!(matches!(meta, Cow::Borrowed(_)));
        assert_eq!(catalog.origin("wind-rose"), Some(ComponentOrigin::Extension));
        assert_eq!(catalog.origin("nope"), None);

        let all = catalog.filter(&ComponentFilter::all());
        let value_cards = all.iter().filter(|m| m.component_type == "value-card").count();
        assert_eq!(value_cards, 1);
        assert!(all.iter().any(|m| m.component_type == "wind-rose"));
    }

    #[test]
    fn groups_include_extension_widgets() {
        let catalog = catalog_with(&["wind-rose"]);
        let groups = catalog.groups(&ComponentFilter::all().search("ext wind"));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].category, ComponentCategory::Business);
    }

    #[tokio::test]
    async fn builtins_are_not_loaded() {
        let catalog = catalog_with(&["wind-rose"]);
        assert!(catalog.load("line-chart").await.is_none());
        let acquired = catalog.load("wind-rose").await.unwrap();
        assert!(acquired.is_loaded());
    }
}
