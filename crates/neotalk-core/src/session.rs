// ── Open dashboard session ──
//
// Holds the dashboard the user currently has open and the storage it
// persists to. Watchers see every replacement through a `watch` channel.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::model::Dashboard;
use crate::storage::{DashboardStorage, StorageError};

/// Result of pruning extension widgets from the open dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct PruneOutcome {
    pub dashboard: Dashboard,
    pub removed: usize,
    /// Whether the storage sync succeeded.
    pub persisted: bool,
}

pub struct DashboardSession {
    storage: Arc<dyn DashboardStorage>,
    current: watch::Sender<Option<Arc<Dashboard>>>,
}

impl DashboardSession {
    pub fn new(storage: Arc<dyn DashboardStorage>) -> Self {
        let (current, _) = watch::channel(None);
        Self { storage, current }
    }

    pub fn storage(&self) -> &Arc<dyn DashboardStorage> {
        &self.storage
    }

    pub fn open(&self, dashboard: Dashboard) {
        debug!(dashboard_id = %dashboard.id, "dashboard opened");
        self.current.send_replace(Some(Arc::new(dashboard)));
    }

    /// Load the collection and open the dashboard with `id`.
    pub async fn open_by_id(&self, id: &str) -> Result<Option<Arc<Dashboard>>, StorageError> {
        let loaded = self.storage.load().await?;
        let found = loaded.data.into_iter().find(|d| d.id == id);
        if let Some(dashboard) = found {
            self.open(dashboard);
        }
        Ok(self.current())
    }

    pub fn close(&self) {
        self.current.send_replace(None);
    }

    pub fn current(&self) -> Option<Arc<Dashboard>> {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Dashboard>>> {
        self.current.subscribe()
    }

    /// Apply `edit` to the open dashboard, advance `updated_at`, publish the
    /// result, and persist it. `Ok(None)` when nothing is open.
    pub async fn update<F>(&self, edit: F) -> Result<Option<Dashboard>, StorageError>
    where
        F: FnOnce(&mut Dashboard),
    {
        let Some(current) = self.current() else {
            return Ok(None);
        };
        let mut next = Dashboard::clone(&current);
        edit(&mut next);
        next.touch();
        self.current.send_replace(Some(Arc::new(next.clone())));
        self.storage.sync(&next).await?;
        Ok(Some(next))
    }

    /// Drop every component of the given types from the open dashboard.
    ///
    /// Returns `None` when nothing is open or nothing matched. A failed sync
    /// is logged and reported in the outcome; the in-memory removal stands.
    pub async fn remove_component_types(&self, types: &[String]) -> Option<PruneOutcome> {
        let current = self.current()?;
        let mut next = Dashboard::clone(&current);
        let removed = next.remove_components_of_types(types).len();
        if removed == 0 {
            return None;
        }

        next.touch();
        self.current.send_replace(Some(Arc::new(next.clone())));
        info!(dashboard_id = %next.id, removed, "removed components of unregistered types");

        let persisted = match self.storage.sync(&next).await {
            Ok(_) => true,
            Err(e) => {
                warn!(dashboard_id = %next.id, error = %e, "failed to persist pruned dashboard");
                false
            }
        };

        Some(PruneOutcome {
            dashboard: next,
            removed,
            persisted,
        })
    }
}
