// ── Extension lifecycle sync ──
//
// Keeps the dynamic registry and the open dashboard consistent with
// extension install/remove notifications pushed over the event WebSocket.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use neotalk_api::NeoTalkClient;
use neotalk_api::websocket::{BackendEvent, LifecycleState};

use crate::dynamic::{ComponentDefinition, DynamicComponentRegistry};
use crate::error::CoreError;
use crate::session::{DashboardSession, PruneOutcome};

/// Extension id used for catalog entries that do not name their owner.
const UNATTRIBUTED_EXTENSION: &str = "unknown";

/// What an unregistration removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnregisterOutcome {
    pub component_types: Vec<String>,
    pub pruned: Option<PruneOutcome>,
}

/// Counts from a full catalog sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub extensions: usize,
    pub components: usize,
    pub pruned_extensions: usize,
}

/// Clears the single-flight flag however registration ends.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ExtensionLifecycleSync {
    registry: Arc<DynamicComponentRegistry>,
    client: Arc<NeoTalkClient>,
    session: Option<Arc<DashboardSession>>,
    registering: AtomicBool,
}

impl ExtensionLifecycleSync {
    pub fn new(
        registry: Arc<DynamicComponentRegistry>,
        client: Arc<NeoTalkClient>,
        session: Option<Arc<DashboardSession>>,
    ) -> Self {
        Self {
            registry,
            client,
            session,
            registering: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> &Arc<DynamicComponentRegistry> {
        &self.registry
    }

    /// React to one backend event. Anything but an extension lifecycle
    /// notification is ignored.
    pub async fn handle_event(&self, event: &BackendEvent) {
        let Some(lifecycle) = event.extension_lifecycle() else {
            return;
        };
        let extension_id = lifecycle.extension_id.as_str();
        debug!(extension_id, state = ?lifecycle.state, "extension lifecycle event");

        match lifecycle.state {
            LifecycleState::Registered | LifecycleState::Loaded => {
                if let Err(e) = self.register_extension(extension_id).await {
                    warn!(extension_id, error = %e, "failed to register extension components");
                }
            }
            LifecycleState::Unregistered => {
                self.unregister_extension(extension_id).await;
            }
        }
    }

    /// Fetch and register an extension's widgets.
    ///
    /// Returns `Ok(None)` when another registration is already running; the
    /// overlapping event is dropped.
    pub async fn register_extension(&self, extension_id: &str) -> Result<Option<usize>, CoreError> {
        if self.registering.swap(true, Ordering::AcqRel) {
            debug!(extension_id, "registration already in flight, skipping");
            return Ok(None);
        }
        let _guard = FlightGuard(&self.registering);

        let components = self.client.extension_components(extension_id).await?;
        let count = components.len();
        for dto in components {
            let extension_name = dto
                .extension_name
                .clone()
                .unwrap_or_else(|| extension_id.to_string());
            let definition = ComponentDefinition::from(dto);
            self.registry
                .register(extension_id, &extension_name, definition);
        }

        info!(extension_id, components = count, "extension components registered");
        Ok(Some(count))
    }

    /// Remove an extension: look up its types, prune them from the open
    /// dashboard (persisting the result), then drop them from the registry.
    pub async fn unregister_extension(&self, extension_id: &str) -> UnregisterOutcome {
        let component_types = self.registry.component_types_of(extension_id);

        let pruned = match &self.session {
            Some(session) if !component_types.is_empty() => {
                session.remove_component_types(&component_types).await
            }
            _ => None,
        };

        self.registry.unregister_extension(extension_id);
        UnregisterOutcome {
            component_types,
            pruned,
        }
    }

    /// Re-fetch the full catalog, register everything, drop extensions the
    /// backend no longer lists, and clear every cached module.
    pub async fn sync_components(&self) -> Result<SyncSummary, CoreError> {
        let catalog = self.client.dashboard_components().await?;

        let known: HashMap<String, String> = self
            .registry
            .extensions()
            .into_iter()
            .map(|e| (e.extension_id, e.extension_name))
            .collect();

        let mut by_extension: IndexMap<String, (String, Vec<ComponentDefinition>)> =
            IndexMap::new();
        for dto in catalog {
            // Unattributed entries stay with whoever registered the type.
            let extension_id = dto
                .extension_id
                .clone()
                .or_else(|| self.registry.extension_of(&dto.component_type))
                .unwrap_or_else(|| UNATTRIBUTED_EXTENSION.to_string());
            let extension_name = dto
                .extension_name
                .clone()
                .or_else(|| known.get(&extension_id).cloned())
                .unwrap_or_else(|| extension_id.clone());
            by_extension
                .entry(extension_id)
                .or_insert_with(|| (extension_name, Vec::new()))
                .1
                .push(ComponentDefinition::from(dto));
        }

        let mut summary = SyncSummary {
            extensions: by_extension.len(),
            ..SyncSummary::default()
        };
        for (extension_id, (extension_name, definitions)) in &by_extension {
            for definition in definitions {
                self.registry
                    .register(extension_id, extension_name, definition.clone());
                summary.components += 1;
            }
        }

        let listed: HashSet<&str> = by_extension.keys().map(String::as_str).collect();
        let stale: Vec<String> = self
            .registry
            .extensions()
            .into_iter()
            .map(|e| e.extension_id)
            .filter(|id| !listed.contains(id.as_str()))
            .collect();
        for extension_id in &stale {
            self.unregister_extension(extension_id).await;
        }
        summary.pruned_extensions = stale.len();

        self.registry.clear_all_module_cache();
        info!(
            extensions = summary.extensions,
            components = summary.components,
            pruned = summary.pruned_extensions,
            "extension component catalog synced"
        );
        Ok(summary)
    }

    /// Consume events until `cancel` fires or the stream closes. A lagged
    /// receiver triggers a full catalog sync to recover missed events.
    pub async fn run(
        &self,
        mut events: broadcast::Receiver<Arc<BackendEvent>>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                received = events.recv() => match received {
                    Ok(event) => self.handle_event(&event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event receiver lagged, resyncing extension catalog");
                        if let Err(e) = self.sync_components().await {
                            warn!(error = %e, "catalog resync failed");
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        debug!("extension lifecycle sync stopped");
    }

    /// Run [`run`](Self::run) on its own task.
    pub fn spawn(
        self: Arc<Self>,
        events: broadcast::Receiver<Arc<BackendEvent>>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(events, cancel).await })
    }
}
