// ── Hybrid dashboard storage ──
//
// Reads prefer the API and fall back to the local copy. Writes land locally
// first, then are mirrored to the API by a background task whose failure is
// only logged. A successful API load is merged into the local copy: the
// newer `updated_at` wins and dashboards only the local side knows survive,
// so a write whose mirror failed or is still pending is never lost.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{DashboardStorage, Sourced, StorageError, StorageKind, StorageResult};
use crate::model::Dashboard;

pub struct HybridDashboardStorage {
    local: Arc<dyn DashboardStorage>,
    api: Arc<dyn DashboardStorage>,
    mirrors: Mutex<Vec<JoinHandle<()>>>,
}

impl HybridDashboardStorage {
    pub fn new(local: Arc<dyn DashboardStorage>, api: Arc<dyn DashboardStorage>) -> Self {
        Self {
            local,
            api,
            mirrors: Mutex::new(Vec::new()),
        }
    }

    /// Fire a background API write. Errors are logged, never returned.
    fn mirror<F, Fut, T>(&self, op: &'static str, f: F)
    where
        F: FnOnce(Arc<dyn DashboardStorage>) -> Fut + Send + 'static,
        Fut: Future<Output = StorageResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let api = Arc::clone(&self.api);
        let handle = tokio::spawn(async move {
            match f(api).await {
                Ok(_) => debug!(op, "mirrored to API"),
                Err(e) => warn!(op, error = %e, "background API sync failed"),
            }
        });

        let mut mirrors = self.mirrors.lock().unwrap_or_else(PoisonError::into_inner);
        mirrors.retain(|h| !h.is_finished());
        mirrors.push(handle);
    }

    /// Wait for every background API write issued so far.
    pub async fn flush(&self) {
        let pending: Vec<_> = self
            .mirrors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for handle in pending {
            if let Err(e) = handle.await {
                warn!(error = %e, "background API sync task panicked");
            }
        }
    }
}

/// Remote order first, then dashboards only the local side has. On an id
/// present on both sides the newer `updated_at` wins; ties go to remote.
fn merge_remote(remote: Vec<Dashboard>, local: Vec<Dashboard>) -> Vec<Dashboard> {
    let mut local: Vec<Option<Dashboard>> = local.into_iter().map(Some).collect();
    let mut merged: Vec<Dashboard> = remote
        .into_iter()
        .map(|r| {
            let newer_local = local
                .iter_mut()
                .find(|slot| matches!(slot, Some(l) if l.id == r.id))
                .and_then(Option::take)
                .filter(|l| l.updated_at > r.updated_at);
            newer_local.unwrap_or(r)
        })
        .collect();
    let local_only: Vec<Dashboard> = local.into_iter().flatten().collect();
    if !local_only.is_empty() {
        debug!(kept = local_only.len(), "keeping dashboards not yet known to the API");
    }
    merged.extend(local_only);
    merged
}

#[async_trait]
impl DashboardStorage for HybridDashboardStorage {
    async fn load(&self) -> StorageResult<Vec<Dashboard>> {
        match self.api.load().await {
            Ok(remote) => {
                let cached = match self.local.load().await {
                    Ok(cached) => cached.data,
                    Err(e) => {
                        warn!(error = %e, "failed to read local dashboard cache");
                        Vec::new()
                    }
                };
                let merged = merge_remote(remote.data, cached);
                if let Err(e) = self.local.save(&merged).await {
                    warn!(error = %e, "failed to refresh local dashboard cache");
                }
                Ok(Sourced::api(merged))
            }
            Err(e) => {
                warn!(error = %e, "API load failed, falling back to local dashboards");
                self.local.load().await
            }
        }
    }

    /// Bulk replace locally; each dashboard is mirrored through `sync`
    /// since the API has no bulk write.
    async fn save(&self, dashboards: &[Dashboard]) -> StorageResult<()> {
        let stored = self.local.save(dashboards).await?;
        let dashboards = dashboards.to_vec();
        self.mirror("save", move |api| async move {
            for dashboard in &dashboards {
                api.sync(dashboard).await?;
            }
            Ok::<_, StorageError>(Sourced::api(()))
        });
        Ok(stored)
    }

    async fn sync(&self, dashboard: &Dashboard) -> StorageResult<Dashboard> {
        let stored = self.local.sync(dashboard).await?;
        let dashboard = dashboard.clone();
        self.mirror("sync", move |api| async move { api.sync(&dashboard).await });
        Ok(stored)
    }

    async fn delete(&self, id: &str) -> StorageResult<()> {
        let stored = self.local.delete(id).await?;
        let id = id.to_string();
        self.mirror("delete", move |api| async move { api.delete(&id).await });
        Ok(stored)
    }

    /// Local storage is authoritative for availability.
    async fn is_available(&self) -> bool {
        self.local.is_available().await
    }

    async fn clear(&self) -> StorageResult<()> {
        self.local.clear().await
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Hybrid
    }

    async fn flush(&self) {
        HybridDashboardStorage::flush(self).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::{LocalDashboardStorage, MemoryStore, StorageBackend};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// API stand-in that always fails and counts calls.
    #[derive(Default)]
    struct DownApi {
        calls: AtomicUsize,
    }

    fn unavailable<T>() -> StorageResult<T> {
        Err(StorageError::Api(neotalk_api::Error::Api {
            message: "unavailable".into(),
            code: None,
            status: 503,
        }))
    }

    impl DownApi {
        fn fail<T>(&self) -> StorageResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            unavailable()
        }
    }

    #[async_trait]
    impl DashboardStorage for DownApi {
        async fn load(&self) -> StorageResult<Vec<Dashboard>> {
            self.fail()
        }
        async fn save(&self, _dashboards: &[Dashboard]) -> StorageResult<()> {
            self.fail()
        }
        async fn sync(&self, _dashboard: &Dashboard) -> StorageResult<Dashboard> {
            self.fail()
        }
        async fn delete(&self, _id: &str) -> StorageResult<()> {
            self.fail()
        }
        async fn is_available(&self) -> bool {
            false
        }
        async fn clear(&self) -> StorageResult<()> {
            self.fail()
        }
        fn kind(&self) -> StorageKind {
            StorageKind::Api
        }
    }

    /// API stand-in that serves a fixed list but rejects every write.
    struct ReadOnlyApi {
        remote: Vec<Dashboard>,
    }

    #[async_trait]
    impl DashboardStorage for ReadOnlyApi {
        async fn load(&self) -> StorageResult<Vec<Dashboard>> {
            Ok(Sourced::api(self.remote.clone()))
        }
        async fn save(&self, _dashboards: &[Dashboard]) -> StorageResult<()> {
            unavailable()
        }
        async fn sync(&self, _dashboard: &Dashboard) -> StorageResult<Dashboard> {
            unavailable()
        }
        async fn delete(&self, _id: &str) -> StorageResult<()> {
            unavailable()
        }
        async fn is_available(&self) -> bool {
            true
        }
        async fn clear(&self) -> StorageResult<()> {
            unavailable()
        }
        fn kind(&self) -> StorageKind {
            StorageKind::Api
        }
    }

    fn hybrid(api: Arc<DownApi>) -> (HybridDashboardStorage, Arc<LocalDashboardStorage>) {
        let local = Arc::new(LocalDashboardStorage::new(Arc::new(MemoryStore::default())));
        (HybridDashboardStorage::new(local.clone(), api), local)
    }

    #[tokio::test]
    async fn load_falls_back_to_local_when_api_fails() {
        let api = Arc::new(DownApi::default());
        let (storage, local) = hybrid(api.clone());
        let d = Dashboard::new("Offline");
        local.sync(&d).await.unwrap();

        let loaded = storage.load().await.unwrap();
        assert_eq!(loaded.backend, StorageBackend::Local);
        assert_eq!(loaded.data, vec![d]);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn writes_succeed_locally_while_api_is_down() {
        let api = Arc::new(DownApi::default());
        let (storage, local) = hybrid(api.clone());
        let d = Dashboard::new("Draft");

        let stored = storage.sync(&d).await.unwrap();
        assert_eq!(stored, Sourced::local(d.clone()));
        storage.flush().await;
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert_eq!(local.load().await.unwrap().data, vec![d.clone()]);

        storage.delete(&d.id).await.unwrap();
        storage.flush().await;
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
        assert!(local.load().await.unwrap().data.is_empty());
    }

    #[tokio::test]
    async fn availability_and_clear_are_local() {
        let (storage, local) = hybrid(Arc::new(DownApi::default()));
        local.sync(&Dashboard::new("x")).await.unwrap();
        assert!(storage.is_available().await);
        storage.clear().await.unwrap();
        assert!(local.load().await.unwrap().data.is_empty());
        assert_eq!(storage.kind(), StorageKind::Hybrid);
    }

    #[tokio::test]
    async fn load_keeps_local_write_whose_mirror_failed() {
        let local = Arc::new(LocalDashboardStorage::new(Arc::new(MemoryStore::default())));
        let storage = HybridDashboardStorage::new(
            local.clone(),
            Arc::new(ReadOnlyApi { remote: Vec::new() }),
        );
        let d = Dashboard::new("Unsynced");
        storage.sync(&d).await.unwrap();
        storage.flush().await;

        let loaded = storage.load().await.unwrap();
        assert_eq!(loaded.backend, StorageBackend::Api);
        assert_eq!(loaded.data, vec![d.clone()]);
        assert_eq!(local.load().await.unwrap().data, vec![d]);
    }

    #[tokio::test]
    async fn load_keeps_the_newer_copy_of_each_dashboard() {
        let mut edited_here = Dashboard::new("Floor");
        edited_here.updated_at = 200;
        let mut edited_there = Dashboard::new("Roof");
        edited_there.updated_at = 200;

        let mut stale_remote = edited_here.clone();
        stale_remote.name = "Floor (old)".into();
        stale_remote.updated_at = 100;
        let mut fresh_remote = edited_there.clone();
        fresh_remote.name = "Roof v2".into();
        fresh_remote.updated_at = 300;

        let local = Arc::new(LocalDashboardStorage::new(Arc::new(MemoryStore::default())));
        local.save(&[edited_here.clone(), edited_there]).await.unwrap();
        let storage = HybridDashboardStorage::new(
            local.clone(),
            Arc::new(ReadOnlyApi {
                remote: vec![stale_remote, fresh_remote.clone()],
            }),
        );

        let loaded = storage.load().await.unwrap().data;
        assert_eq!(loaded, vec![edited_here, fresh_remote]);
        assert_eq!(local.load().await.unwrap().data, loaded);
    }
}
