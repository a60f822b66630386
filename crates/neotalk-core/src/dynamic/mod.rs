// ── Dynamic component registry ──
//
// Extension-supplied widgets, registered at runtime and loaded on demand.
// Descriptors, the module cache, and in-flight loads share one lock so an
// unregistration removes a type from all three at once.

pub mod loader;
pub mod module;
pub mod script;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::model::ComponentMeta;

pub use loader::{
    BundleFormat, BundleLocation, BundleRequest, BundleResolver, ComponentDefinition,
    FormatRouter, ModuleImportResolver, ModuleImporter,
};
pub use module::{
    Acquisition, ComponentModule, ExportValue, HostRef, LoadError, ModuleExports, Renderable,
    classify,
};
pub use script::{GENERIC_GLOBAL, GlobalPoll, GlobalScriptResolver, ScriptHost, ScriptId};

type SharedLoad = Shared<BoxFuture<'static, Acquisition>>;

/// An extension and the widget types it contributed, in registration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionEntry {
    pub extension_id: String,
    pub extension_name: String,
    pub component_types: Vec<String>,
}

#[derive(Debug, Clone)]
struct RegisteredComponent {
    extension_id: String,
    definition: ComponentDefinition,
}

struct InFlight {
    id: u64,
    load: SharedLoad,
}

#[derive(Default)]
struct RegistryState {
    components: HashMap<String, RegisteredComponent>,
    extensions: IndexMap<String, ExtensionEntry>,
    loaded: HashMap<String, Arc<ComponentModule>>,
    loading: HashMap<String, InFlight>,
    next_load_id: u64,
}

impl RegistryState {
    fn drop_type(&mut self, component_type: &str) {
        self.components.remove(component_type);
        self.loaded.remove(component_type);
        self.loading.remove(component_type);
    }
}

/// Registry of extension widgets. Share it behind an `Arc`.
pub struct DynamicComponentRegistry {
    state: Arc<Mutex<RegistryState>>,
    resolver: Arc<dyn BundleResolver>,
}

impl DynamicComponentRegistry {
    pub fn new(resolver: Arc<dyn BundleResolver>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RegistryState::default())),
            resolver,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        lock_state(&self.state)
    }

    // ── Registration ─────────────────────────────────────────────────

    /// Insert or overwrite a widget type owned by `extension_id`.
    ///
    /// A changed definition drops the cached module so the next load picks
    /// up the new bundle. A type moving between extensions leaves its old
    /// owner's index.
    pub fn register(
        &self,
        extension_id: &str,
        extension_name: &str,
        definition: ComponentDefinition,
    ) {
        let component_type = definition.component_type().to_string();
        let mut state = self.lock();

        if let Some(previous) = state.components.get(&component_type) {
            let previous_owner = previous.extension_id.clone();
            let changed = previous.definition != definition;

            if changed {
                state.loaded.remove(&component_type);
                state.loading.remove(&component_type);
            }
            if previous_owner != extension_id {
                if let Some(entry) = state.extensions.get_mut(&previous_owner) {
                    entry.component_types.retain(|t| t != &component_type);
                }
            }
        }

        let entry = state
            .extensions
            .entry(extension_id.to_string())
            .or_insert_with(|| ExtensionEntry {
                extension_id: extension_id.to_string(),
                extension_name: extension_name.to_string(),
                component_types: Vec::new(),
            });
        entry.extension_name = extension_name.to_string();
        if !entry.component_types.contains(&component_type) {
            entry.component_types.push(component_type.clone());
        }

        state.components.insert(
            component_type.clone(),
            RegisteredComponent {
                extension_id: extension_id.to_string(),
                definition,
            },
        );
        debug!(component_type = %component_type, extension_id, "registered dynamic component");
    }

    /// Remove an extension and every type it owns, including cached and
    /// in-flight modules. Returns the removed types; unknown ids are a no-op.
    pub fn unregister_extension(&self, extension_id: &str) -> Vec<String> {
        let mut state = self.lock();
        let Some(entry) = state.extensions.shift_remove(extension_id) else {
            debug!(extension_id, "unregister for unknown extension ignored");
            return Vec::new();
        };

        for component_type in &entry.component_types {
            state.drop_type(component_type);
        }
        info!(
            extension_id,
            removed = entry.component_types.len(),
            "unregistered extension"
        );
        entry.component_types
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Load a registered widget, reusing the cache and coalescing concurrent
    /// requests into one acquisition.
    ///
    /// The acquisition runs as its own task and completes even if every
    /// caller stops waiting.
    pub async fn load_component(&self, component_type: &str) -> Acquisition {
        let load = {
            let mut state = self.lock();

            if let Some(module) = state.loaded.get(component_type) {
                return Acquisition::Loaded(Arc::clone(module));
            }
            if let Some(in_flight) = state.loading.get(component_type) {
                in_flight.load.clone()
            } else {
                let Some(registered) = state.components.get(component_type) else {
                    warn!(component_type, stage = "resolve", "load requested for unknown component");
                    return Acquisition::Failed(LoadError::UnknownComponent {
                        component_type: component_type.to_string(),
                    });
                };

                let request = BundleRequest {
                    component_type: component_type.to_string(),
                    extension_id: registered.extension_id.clone(),
                    bundle: registered.definition.bundle.clone(),
                };
                let id = state.next_load_id;
                state.next_load_id += 1;

                let load = self.spawn_load(request, id);
                state.loading.insert(
                    component_type.to_string(),
                    InFlight {
                        id,
                        load: load.clone(),
                    },
                );
                load
            }
        };

        load.await
    }

    fn spawn_load(&self, request: BundleRequest, id: u64) -> SharedLoad {
        let state = Arc::clone(&self.state);
        let resolver = Arc::clone(&self.resolver);
        let component_type = request.component_type.clone();

        let task = tokio::spawn(async move {
            let result = resolver.acquire(&request).await;
            finish_load(&state, &request, id, result)
        });

        async move {
            task.await.unwrap_or_else(|e| {
                Acquisition::Failed(LoadError::Aborted {
                    component_type,
                    reason: e.to_string(),
                })
            })
        }
        .boxed()
        .shared()
    }

    pub fn clear_module_cache(&self, component_type: &str) {
        self.lock().loaded.remove(component_type);
    }

    pub fn clear_all_module_cache(&self) {
        self.lock().loaded.clear();
    }

    // ── Lookups ──────────────────────────────────────────────────────

    pub fn get_meta(&self, component_type: &str) -> Option<ComponentMeta> {
        self.lock()
            .components
            .get(component_type)
            .map(|c| c.definition.meta.clone())
    }

    pub fn definition(&self, component_type: &str) -> Option<ComponentDefinition> {
        self.lock()
            .components
            .get(component_type)
            .map(|c| c.definition.clone())
    }

    pub fn is_dynamic(&self, component_type: &str) -> bool {
        self.lock().components.contains_key(component_type)
    }

    pub fn is_loaded(&self, component_type: &str) -> bool {
        self.lock().loaded.contains_key(component_type)
    }

    pub fn extension_of(&self, component_type: &str) -> Option<String> {
        self.lock()
            .components
            .get(component_type)
            .map(|c| c.extension_id.clone())
    }

    /// Types owned by an extension, in registration order.
    pub fn component_types_of(&self, extension_id: &str) -> Vec<String> {
        self.lock()
            .extensions
            .get(extension_id)
            .map(|e| e.component_types.clone())
            .unwrap_or_default()
    }

    /// All registered metadata, grouped by extension in registration order.
    pub fn components(&self) -> Vec<ComponentMeta> {
        let state = self.lock();
        state
            .extensions
            .values()
            .flat_map(|e| &e.component_types)
            .filter_map(|t| state.components.get(t))
            .map(|c| c.definition.meta.clone())
            .collect()
    }

    pub fn extensions(&self) -> Vec<ExtensionEntry> {
        self.lock().extensions.values().cloned().collect()
    }
}

fn lock_state(state: &Mutex<RegistryState>) -> MutexGuard<'_, RegistryState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Record a finished acquisition. Success is cached only while the type is
/// still registered and this load is still the current one.
fn finish_load(
    state: &Mutex<RegistryState>,
    request: &BundleRequest,
    id: u64,
    result: Result<Renderable, LoadError>,
) -> Acquisition {
    let component_type = request.component_type.as_str();
    let mut state = lock_state(state);

    let current = state
        .loading
        .get(component_type)
        .is_some_and(|f| f.id == id);
    if current {
        state.loading.remove(component_type);
    }

    match result {
        Ok(renderable) => {
            let module = Arc::new(ComponentModule {
                component_type: component_type.to_string(),
                renderable,
                source_url: request.bundle.url.clone(),
            });
            if current && state.components.contains_key(component_type) {
                state
                    .loaded
                    .insert(component_type.to_string(), Arc::clone(&module));
                debug!(component_type, "component module cached");
            } else {
                debug!(component_type, "component unregistered during load, not caching");
            }
            Acquisition::Loaded(module)
        }
        Err(e) => {
            warn!(component_type, stage = e.stage(), error = %e, "failed to load component");
            Acquisition::Failed(e)
        }
    }
}
