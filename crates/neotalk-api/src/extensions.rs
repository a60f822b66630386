// Extension component catalog endpoints

use tracing::debug;

use crate::client::{NeoTalkClient, decode_list};
use crate::error::Error;
use crate::types::DashboardComponentDto;

const COMPONENT_WRAPPER_KEYS: &[&str] = &["components", "data", "results", "items"];

impl NeoTalkClient {
    /// Widget types contributed by one extension.
    ///
    /// `GET /api/extensions/{id}/components`
    pub async fn extension_components(
        &self,
        extension_id: &str,
    ) -> Result<Vec<DashboardComponentDto>, Error> {
        debug!(extension_id, "fetching extension components");
        let endpoint = format!("api/extensions/{extension_id}/components");
        let raw = self.get_value(&endpoint).await?;
        decode_list(&endpoint, raw, COMPONENT_WRAPPER_KEYS)
    }

    /// Widget types of every installed extension, each tagged with its
    /// `extension_id`.
    ///
    /// `GET /api/extensions/dashboard-components`
    pub async fn dashboard_components(&self) -> Result<Vec<DashboardComponentDto>, Error> {
        debug!("fetching extension component catalog");
        let raw = self.get_value("api/extensions/dashboard-components").await?;
        decode_list(
            "GET /api/extensions/dashboard-components",
            raw,
            COMPONENT_WRAPPER_KEYS,
        )
    }
}
