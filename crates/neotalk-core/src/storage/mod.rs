// ── Dashboard persistence ──
//
// Three interchangeable backends behind one async trait: a local key-value
// store, the backend REST API, and a hybrid that prefers the API for reads
// and writes locally first.

mod api;
mod hybrid;
mod kv;
mod local;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::warn;

use neotalk_api::NeoTalkClient;

use crate::error::CoreError;
use crate::model::Dashboard;

pub use api::ApiDashboardStorage;
pub use hybrid::HybridDashboardStorage;
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use local::{CURRENT_DASHBOARD_KEY, DASHBOARDS_KEY, LocalDashboardStorage};

/// Which concrete store served a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StorageBackend {
    Local,
    Api,
}

/// Backend selection.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StorageKind {
    Local,
    Api,
    #[default]
    Hybrid,
}

/// A storage result tagged with the backend that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub data: T,
    pub backend: StorageBackend,
}

impl<T> Sourced<T> {
    pub fn local(data: T) -> Self {
        Self {
            data,
            backend: StorageBackend::Local,
        }
    }

    pub fn api(data: T) -> Self {
        Self {
            data,
            backend: StorageBackend::Api,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        Sourced {
            data: f(self.data),
            backend: self.backend,
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Local storage failed: {message}")]
    Local { message: String },

    #[error("Local dashboards are not valid JSON: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("Dashboard API request failed: {0}")]
    Api(#[from] neotalk_api::Error),
}

impl StorageError {
    pub fn backend(&self) -> StorageBackend {
        match self {
            Self::Local { .. } | Self::Corrupt(_) => StorageBackend::Local,
            Self::Api(_) => StorageBackend::Api,
        }
    }

    pub(crate) fn local(message: impl std::fmt::Display) -> Self {
        Self::Local {
            message: message.to_string(),
        }
    }
}

pub type StorageResult<T> = Result<Sourced<T>, StorageError>;

/// Persistence contract shared by every backend.
#[async_trait]
pub trait DashboardStorage: Send + Sync {
    /// All dashboards.
    async fn load(&self) -> StorageResult<Vec<Dashboard>>;
    /// Replace the whole collection.
    async fn save(&self, dashboards: &[Dashboard]) -> StorageResult<()>;
    /// Create or update one dashboard, returning what was stored.
    async fn sync(&self, dashboard: &Dashboard) -> StorageResult<Dashboard>;
    async fn delete(&self, id: &str) -> StorageResult<()>;
    async fn is_available(&self) -> bool;
    async fn clear(&self) -> StorageResult<()>;
    fn kind(&self) -> StorageKind;

    /// Wait for background writes to settle. Backends that write
    /// synchronously have nothing to wait for.
    async fn flush(&self) {}
}

/// Knobs for [`create_dashboard_storage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageOptions {
    pub mode: StorageKind,
    /// Keep a local copy in hybrid mode. Without it hybrid is API-only.
    pub cache: bool,
    /// Directory for the file-backed local store.
    pub data_dir: Option<PathBuf>,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            mode: StorageKind::Hybrid,
            cache: true,
            data_dir: None,
        }
    }
}

impl StorageOptions {
    /// The local key-value store these options point at: files under
    /// `data_dir`, or memory when none is set.
    pub fn open_store(&self) -> Arc<dyn KeyValueStore> {
        match &self.data_dir {
            Some(dir) => Arc::new(FileStore::new(dir.clone())),
            None => Arc::new(MemoryStore::default()),
        }
    }
}

/// Build the backend `options` ask for.
///
/// `client` is required for `api`. Hybrid without a client degrades to
/// local with a warning; hybrid without `cache` is API-only.
pub fn create_dashboard_storage(
    options: &StorageOptions,
    store: Arc<dyn KeyValueStore>,
    client: Option<Arc<NeoTalkClient>>,
) -> Result<Arc<dyn DashboardStorage>, CoreError> {
    let local = || -> Arc<dyn DashboardStorage> {
        Arc::new(LocalDashboardStorage::new(Arc::clone(&store)))
    };

    match (options.mode, client) {
        (StorageKind::Local, _) => Ok(local()),
        (StorageKind::Api, Some(client)) => Ok(Arc::new(ApiDashboardStorage::new(client))),
        (StorageKind::Api, None) => Err(CoreError::Config {
            message: "API storage requires a server URL".into(),
        }),
        (StorageKind::Hybrid, None) => {
            warn!("no server configured, hybrid storage falling back to local only");
            Ok(local())
        }
        (StorageKind::Hybrid, Some(client)) if !options.cache => {
            Ok(Arc::new(ApiDashboardStorage::new(client)))
        }
        (StorageKind::Hybrid, Some(client)) => Ok(Arc::new(HybridDashboardStorage::new(
            local(),
            Arc::new(ApiDashboardStorage::new(client)),
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use neotalk_api::TransportConfig;
    use std::str::FromStr;

    fn client() -> Arc<NeoTalkClient> {
        Arc::new(NeoTalkClient::new("http://127.0.0.1:9", &TransportConfig::default()).unwrap())
    }

    fn build(mode: StorageKind, cache: bool, client: Option<Arc<NeoTalkClient>>) -> StorageKind {
        let options = StorageOptions {
            mode,
            cache,
            data_dir: None,
        };
        create_dashboard_storage(&options, options.open_store(), client)
            .unwrap()
            .kind()
    }

    #[test]
    fn default_is_hybrid_with_cache() {
        let options = StorageOptions::default();
        assert_eq!(options.mode, StorageKind::Hybrid);
        assert!(options.cache);
    }

    #[test]
    fn factory_selects_backend() {
        assert_eq!(build(StorageKind::Local, true, Some(client())), StorageKind::Local);
        assert_eq!(build(StorageKind::Api, true, Some(client())), StorageKind::Api);
        assert_eq!(build(StorageKind::Hybrid, true, Some(client())), StorageKind::Hybrid);
        assert_eq!(build(StorageKind::Hybrid, false, Some(client())), StorageKind::Api);
        assert_eq!(build(StorageKind::Hybrid, true, None), StorageKind::Local);
    }

    #[test]
    fn api_without_client_is_config_error() {
        let options = StorageOptions {
            mode: StorageKind::Api,
            ..StorageOptions::default()
        };
        let err = create_dashboard_storage(&options, options.open_store(), None)
            .err()
            .unwrap();
        assert!(matches!(err, CoreError::Config { .. }));
    }

    #[test]
    fn kind_parses_from_config_strings() {
        assert_eq!(StorageKind::from_str("HYBRID").unwrap(), StorageKind::Hybrid);
        assert_eq!(StorageKind::Api.to_string(), "api");
    }
}
