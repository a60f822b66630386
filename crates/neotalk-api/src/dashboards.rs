// Dashboard CRUD endpoints
//
// `GET/POST /api/dashboards`, `GET/PUT/DELETE /api/dashboards/{id}`.
// List and single-entity payloads may arrive wrapped; see `client::extract_*`.

use serde_json::Value;
use tracing::debug;

use crate::client::{LIST_WRAPPER_KEYS, NeoTalkClient, decode_list, extract_object};
use crate::error::Error;
use crate::types::DashboardDto;

impl NeoTalkClient {
    /// List every dashboard visible to the caller.
    ///
    /// `GET /api/dashboards`
    pub async fn list_dashboards(&self) -> Result<Vec<DashboardDto>, Error> {
        let raw = self.get_value("api/dashboards").await?;
        decode_list("GET /api/dashboards", raw, LIST_WRAPPER_KEYS)
    }

    /// Fetch one dashboard.
    ///
    /// `GET /api/dashboards/{id}`
    pub async fn get_dashboard(&self, id: &str) -> Result<DashboardDto, Error> {
        let raw = self.get_value(&format!("api/dashboards/{id}")).await?;
        decode_dashboard(raw)
    }

    /// Lookup that maps a 404 to `Ok(None)`; other failures are returned.
    pub async fn find_dashboard(&self, id: &str) -> Result<Option<DashboardDto>, Error> {
        match self.get_dashboard(id).await {
            Ok(dto) => Ok(Some(dto)),
            Err(e) if e.is_not_found() => {
                debug!(dashboard_id = id, "dashboard not present remotely");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Create a dashboard. The backend echoes the stored entity.
    ///
    /// `POST /api/dashboards`
    pub async fn create_dashboard(&self, dashboard: &DashboardDto) -> Result<DashboardDto, Error> {
        debug!(dashboard_id = %dashboard.id, "creating dashboard");
        let raw: Value = self.post("api/dashboards", dashboard).await?;
        echo_or_input(raw, dashboard)
    }

    /// Replace a dashboard.
    ///
    /// `PUT /api/dashboards/{id}`
    pub async fn update_dashboard(
        &self,
        id: &str,
        dashboard: &DashboardDto,
    ) -> Result<DashboardDto, Error> {
        debug!(dashboard_id = id, "updating dashboard");
        let raw: Value = self.put(&format!("api/dashboards/{id}"), dashboard).await?;
        echo_or_input(raw, dashboard)
    }

    /// Delete a dashboard.
    ///
    /// `DELETE /api/dashboards/{id}`
    pub async fn delete_dashboard(&self, id: &str) -> Result<(), Error> {
        debug!(dashboard_id = id, "deleting dashboard");
        self.delete(&format!("api/dashboards/{id}")).await
    }
}

fn decode_dashboard(raw: Value) -> Result<DashboardDto, Error> {
    let inner = extract_object(raw);
    serde_json::from_value(inner.clone()).map_err(|e| Error::Deserialization {
        message: format!("dashboard: {e}"),
        body: inner.to_string(),
    })
}

/// Some backend versions answer writes with `{"success": true}` only; fall
/// back to the entity that was sent.
fn echo_or_input(raw: Value, sent: &DashboardDto) -> Result<DashboardDto, Error> {
    let inner = extract_object(raw);
    if inner.get("id").is_some() {
        decode_dashboard(inner)
    } else {
        Ok(sent.clone())
    }
}
