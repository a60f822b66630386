// ── Local dashboard storage ──

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{
    DashboardStorage, KeyValueStore, Sourced, StorageError, StorageKind, StorageResult,
};
use crate::model::Dashboard;

/// Key holding the serialized dashboard collection.
pub const DASHBOARDS_KEY: &str = "neotalk_dashboards";
/// Key holding the id of the dashboard last opened.
pub const CURRENT_DASHBOARD_KEY: &str = "neotalk_current_dashboard_id";

const PROBE_KEY: &str = "neotalk_storage_probe";

/// Whole collection serialized under one key.
///
/// `sync` and `delete` are load-modify-save with no locking across calls;
/// concurrent writers can lose updates.
pub struct LocalDashboardStorage {
    store: Arc<dyn KeyValueStore>,
}

impl LocalDashboardStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn read_all(&self) -> Result<Vec<Dashboard>, StorageError> {
        match self.store.get(DASHBOARDS_KEY)? {
            None => Ok(Vec::new()),
            Some(raw) if raw.trim().is_empty() => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw).map_err(StorageError::Corrupt),
        }
    }

    fn write_all(&self, dashboards: &[Dashboard]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(dashboards).map_err(StorageError::local)?;
        self.store.set(DASHBOARDS_KEY, &raw)
    }

    pub fn current_dashboard_id(&self) -> Result<Option<String>, StorageError> {
        Ok(self
            .store
            .get(CURRENT_DASHBOARD_KEY)?
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty()))
    }

    pub fn set_current_dashboard_id(&self, id: Option<&str>) -> Result<(), StorageError> {
        match id {
            Some(id) => self.store.set(CURRENT_DASHBOARD_KEY, id),
            None => self.store.remove(CURRENT_DASHBOARD_KEY),
        }
    }
}

#[async_trait]
impl DashboardStorage for LocalDashboardStorage {
    async fn load(&self) -> StorageResult<Vec<Dashboard>> {
        self.read_all().map(Sourced::local)
    }

    async fn save(&self, dashboards: &[Dashboard]) -> StorageResult<()> {
        self.write_all(dashboards).map(Sourced::local)
    }

    async fn sync(&self, dashboard: &Dashboard) -> StorageResult<Dashboard> {
        let mut all = self.read_all()?;
        match all.iter_mut().find(|d| d.id == dashboard.id) {
            Some(existing) => existing.clone_from(dashboard),
            None => all.push(dashboard.clone()),
        }
        self.write_all(&all)?;
        debug!(dashboard_id = %dashboard.id, "dashboard stored locally");
        Ok(Sourced::local(dashboard.clone()))
    }

    async fn delete(&self, id: &str) -> StorageResult<()> {
        let mut all = self.read_all()?;
        all.retain(|d| d.id != id);
        self.write_all(&all)?;
        if self.current_dashboard_id()?.as_deref() == Some(id) {
            self.set_current_dashboard_id(None)?;
        }
        Ok(Sourced::local(()))
    }

    async fn is_available(&self) -> bool {
        self.store
            .set(PROBE_KEY, "1")
            .and_then(|()| self.store.remove(PROBE_KEY))
            .is_ok()
    }

    async fn clear(&self) -> StorageResult<()> {
        self.store.remove(DASHBOARDS_KEY)?;
        self.store.remove(CURRENT_DASHBOARD_KEY)?;
        Ok(Sourced::local(()))
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Local
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore, StorageBackend};

    fn storage() -> LocalDashboardStorage {
        LocalDashboardStorage::new(Arc::new(MemoryStore::default()))
    }

    #[tokio::test]
    async fn empty_store_loads_nothing() {
        let loaded = storage().load().await.unwrap();
        assert!(loaded.data.is_empty());
        assert_eq!(loaded.backend, StorageBackend::Local);
    }

    #[tokio::test]
    async fn sync_inserts_then_updates_in_place() {
        let s = storage();
        let a = Dashboard::new("A");
        let mut b = Dashboard::new("B");
        s.sync(&a).await.unwrap();
        s.sync(&b).await.unwrap();

        b.name = "B renamed".into();
        s.sync(&b).await.unwrap();

        let names: Vec<_> = s.load().await.unwrap().data.into_iter().map(|d| d.name).collect();
        assert_eq!(names, ["A", "B renamed"]);
    }

    #[tokio::test]
    async fn delete_clears_current_pointer() {
        let s = storage();
        let a = Dashboard::new("A");
        s.sync(&a).await.unwrap();
        s.set_current_dashboard_id(Some(&a.id)).unwrap();

        s.delete(&a.id).await.unwrap();
        assert!(s.load().await.unwrap().data.is_empty());
        assert_eq!(s.current_dashboard_id().unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_collection_is_reported() {
        let store = Arc::new(MemoryStore::default());
        store.set(DASHBOARDS_KEY, "{not json").unwrap();
        let err = LocalDashboardStorage::new(store).load().await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
        assert_eq!(err.backend(), StorageBackend::Local);
    }

    #[tokio::test]
    async fn file_backed_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let a = Dashboard::new("Persisted");
        LocalDashboardStorage::new(Arc::new(FileStore::new(dir.path())))
            .sync(&a)
            .await
            .unwrap();

        let reopened = LocalDashboardStorage::new(Arc::new(FileStore::new(dir.path())));
        assert!(reopened.is_available().await);
        assert_eq!(reopened.load().await.unwrap().data, vec![a]);

        reopened.clear().await.unwrap();
        assert!(reopened.load().await.unwrap().data.is_empty());
    }
}
