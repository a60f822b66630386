// ── API dashboard storage ──

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use neotalk_api::{DashboardDto, NeoTalkClient};

use super::{DashboardStorage, Sourced, StorageKind, StorageResult};
use crate::model::Dashboard;

/// Proxies every operation to the backend REST API.
///
/// `save` and `clear` do nothing: the API has no bulk replace, and remote
/// data is never bulk-deleted from a client.
pub struct ApiDashboardStorage {
    client: Arc<NeoTalkClient>,
}

impl ApiDashboardStorage {
    pub fn new(client: Arc<NeoTalkClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<NeoTalkClient> {
        &self.client
    }
}

#[async_trait]
impl DashboardStorage for ApiDashboardStorage {
    async fn load(&self) -> StorageResult<Vec<Dashboard>> {
        let dtos = self.client.list_dashboards().await?;
        Ok(Sourced::api(dtos.into_iter().map(Dashboard::from).collect()))
    }

    async fn save(&self, dashboards: &[Dashboard]) -> StorageResult<()> {
        debug!(count = dashboards.len(), "bulk save is a no-op for API storage");
        Ok(Sourced::api(()))
    }

    /// Update when the backend already knows the id, create otherwise. A
    /// failed lookup counts as unknown.
    async fn sync(&self, dashboard: &Dashboard) -> StorageResult<Dashboard> {
        let dto = DashboardDto::from(dashboard);
        let exists = match self.client.find_dashboard(&dashboard.id).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                debug!(dashboard_id = %dashboard.id, error = %e, "dashboard lookup failed, creating");
                false
            }
        };
        let stored = if exists {
            self.client.update_dashboard(&dashboard.id, &dto).await?
        } else {
            self.client.create_dashboard(&dto).await?
        };
        Ok(Sourced::api(Dashboard::from(stored)))
    }

    async fn delete(&self, id: &str) -> StorageResult<()> {
        self.client.delete_dashboard(id).await?;
        Ok(Sourced::api(()))
    }

    async fn is_available(&self) -> bool {
        match self.client.health().await {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "dashboard API unavailable");
                false
            }
        }
    }

    async fn clear(&self) -> StorageResult<()> {
        debug!("clear is a no-op for API storage");
        Ok(Sourced::api(()))
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Api
    }
}
