//! Resolved invocation context: config file + profile + global flag
//! overrides, and the core objects commands build from them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;

use neotalk_api::NeoTalkClient;
use neotalk_config::{self as config, Config, ConfigError, Profile};
use neotalk_core::dynamic::BundleRequest;
use neotalk_core::storage::{KeyValueStore, LocalDashboardStorage};
use neotalk_core::{
    BundleResolver, ClientConfig, DashboardStorage, DynamicComponentRegistry, LoadError,
    Renderable, StorageOptions, TlsVerification, create_dashboard_storage,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Bundle acquisition needs a rendering host; the terminal has none.
struct HeadlessResolver;

#[async_trait]
impl BundleResolver for HeadlessResolver {
    async fn acquire(&self, request: &BundleRequest) -> Result<Renderable, LoadError> {
        Err(LoadError::Import {
            url: request.bundle.url.clone(),
            reason: "bundle loading requires a rendering host".into(),
        })
    }
}

pub struct Context {
    pub config: Config,
    pub profile_name: Option<String>,
    pub client_config: Option<ClientConfig>,
    pub storage: StorageOptions,
    pub color: bool,
}

impl Context {
    /// Merge the config file, the active profile, and flag overrides.
    /// Flags win over the profile, the profile over `[defaults]`.
    pub fn resolve(global: &GlobalOpts) -> Result<Self, CliError> {
        let cfg = config::load_config()?;
        let selected = cfg
            .profile(global.profile.as_deref())
            .map_err(|e| profile_error(e, &cfg))?;
        let profile = selected.map(|(_, p)| p);

        let client_config = resolve_client_config(profile, &cfg, global)?;

        let mut storage = config::storage_options(profile, &cfg.defaults);
        if profile.is_none() && client_config.is_some() {
            storage.mode = cfg.defaults.storage;
        }
        if let Some(mode) = global.storage {
            storage.mode = mode;
        }

        Ok(Self {
            profile_name: selected.map(|(name, _)| name.to_string()),
            client_config,
            storage,
            color: output::should_color(global.color),
            config: cfg,
        })
    }

    /// REST client, when a server is configured.
    pub fn optional_client(&self) -> Result<Option<Arc<NeoTalkClient>>, CliError> {
        self.client_config
            .as_ref()
            .map(|c| c.build_client().map(Arc::new))
            .transpose()
            .map_err(CliError::from)
    }

    /// REST client; commands that need the backend fail without a server.
    pub fn client(&self) -> Result<Arc<NeoTalkClient>, CliError> {
        self.optional_client()?.ok_or_else(|| CliError::NoServer {
            path: config::config_path().display().to_string(),
        })
    }

    /// The storage backend selected by profile and `--storage`.
    pub fn dashboard_storage(&self) -> Result<Arc<dyn DashboardStorage>, CliError> {
        Ok(create_dashboard_storage(
            &self.storage,
            self.local_store(),
            self.optional_client()?,
        )?)
    }

    /// Local dashboard storage, regardless of mode. Holds the
    /// current-dashboard pointer.
    pub fn local_storage(&self) -> LocalDashboardStorage {
        LocalDashboardStorage::new(self.local_store())
    }

    fn local_store(&self) -> Arc<dyn KeyValueStore> {
        self.storage.open_store()
    }

    /// Extension registry for this process. Metadata only; widget bundles
    /// cannot be loaded from a terminal.
    pub fn registry(&self) -> Arc<DynamicComponentRegistry> {
        Arc::new(DynamicComponentRegistry::new(Arc::new(HeadlessResolver)))
    }
}

fn profile_error(err: ConfigError, cfg: &Config) -> CliError {
    match err {
        ConfigError::UnknownProfile { name } => {
            let available: Vec<_> = cfg.profiles.keys().cloned().collect();
            CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            }
        }
        other => other.into(),
    }
}

/// Translate a profile + global flags into a `ClientConfig`.
///
/// `None` when neither the flags nor the profile name a server.
fn resolve_client_config(
    profile: Option<&Profile>,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<Option<ClientConfig>, CliError> {
    // 1. Server URL (flag > env > profile)
    let mut client = match (global.server.as_deref(), profile) {
        (Some(server), Some(profile)) => {
            let overridden = Profile {
                server: server.to_string(),
                ..profile.clone()
            };
            config::profile_to_client_config(&overridden, &cfg.defaults)?
        }
        (None, Some(profile)) if !profile.server.is_empty() => {
            config::profile_to_client_config(profile, &cfg.defaults)?
        }
        (Some(server), None) => {
            let mut client = ClientConfig::new(config::parse_server_url(server)?);
            client.timeout = Duration::from_secs(cfg.defaults.timeout);
            client
        }
        _ => return Ok(None),
    };

    // 2. Token (flag > profile chain)
    if let Some(ref token) = global.token {
        client.token = Some(SecretString::from(token.clone()));
    }

    // 3. TLS
    if global.insecure {
        client.tls = TlsVerification::DangerAcceptInvalid;
    }

    // 4. Timeout
    if let Some(secs) = global.timeout {
        client.timeout = Duration::from_secs(secs);
    }

    Ok(Some(client))
}
