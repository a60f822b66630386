//! Shared configuration for NeoTalk tools.
//!
//! TOML profiles merged with `NEOTALK_` environment variables, token
//! resolution (env var + plaintext), and translation to
//! `neotalk_core::ClientConfig` and `StorageOptions`. The CLI layers its
//! global flags on top of what this crate resolves.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use neotalk_core::{ClientConfig, StorageKind, StorageOptions, TlsVerification};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Resolve the profile to use: an explicit name, else `default_profile`.
    ///
    /// `Ok(None)` when no name is given and the default profile does not
    /// exist; a named profile that is missing is an error.
    pub fn profile(&self, name: Option<&str>) -> Result<Option<(&str, &Profile)>, ConfigError> {
        if let Some(name) = name {
            return self
                .profiles
                .get_key_value(name)
                .map(|(k, p)| Some((k.as_str(), p)))
                .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() });
        }
        Ok(self
            .default_profile
            .as_deref()
            .and_then(|name| self.profiles.get_key_value(name))
            .map(|(k, p)| (k.as_str(), p)))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Storage backend when the profile does not pick one.
    #[serde(default)]
    pub storage: StorageKind,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            storage: StorageKind::default(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named backend profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g., "http://127.0.0.1:9375").
    pub server: String,

    /// Bearer token (plaintext; prefer `token_env`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable holding the bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Path to a custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Accept invalid certificates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override the default timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Dashboard storage backend: "local", "api", or "hybrid".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<StorageKind>,

    /// Keep a local copy of dashboards in hybrid mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<bool>,

    /// Directory for locally stored dashboards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Subscribe to the backend event stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<bool>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "neotalk", "neotalk")
}

fn home_fallback(parts: &[&str]) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.extend(parts);
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(&[".config", "neotalk", "config.toml"]),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Where local dashboards live when a profile sets no `data_dir`.
pub fn default_data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(&[".local", "share", "neotalk"]),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

// ── Config loading ──────────────────────────────────────────────────

fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NEOTALK_").split("__"))
}

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file path + environment. A missing file yields
/// the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment_for(path).extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profile translation ─────────────────────────────────────────────

/// Resolve the bearer token: `token_env` first, then the plaintext value.
/// `None` when the profile configures neither.
pub fn resolve_token(profile: &Profile) -> Option<SecretString> {
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }
    profile.token.clone().map(SecretString::from)
}

/// Parse a server URL, rejecting non-HTTP schemes.
pub fn parse_server_url(raw: &str) -> Result<url::Url, ConfigError> {
    let invalid = |reason: String| ConfigError::Validation {
        field: "server".into(),
        reason,
    };
    let url: url::Url = raw
        .parse()
        .map_err(|_| invalid(format!("invalid URL: {raw}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("expected http or https, got '{other}'"))),
    }
}

/// Build a `ClientConfig` from a profile, with no CLI flag overrides.
pub fn profile_to_client_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let url = parse_server_url(&profile.server)?;

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut config = ClientConfig::new(url);
    config.token = resolve_token(profile);
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.events_enabled = profile.events.unwrap_or(true);
    Ok(config)
}

/// Storage options for a profile. Without a profile, dashboards stay
/// local under [`default_data_dir`].
pub fn storage_options(profile: Option<&Profile>, defaults: &Defaults) -> StorageOptions {
    let Some(profile) = profile else {
        return StorageOptions {
            mode: StorageKind::Local,
            cache: true,
            data_dir: Some(default_data_dir()),
        };
    };
    StorageOptions {
        mode: profile.mode.unwrap_or(defaults.storage),
        cache: profile.cache.unwrap_or(true),
        data_dir: Some(profile.data_dir.clone().unwrap_or_else(default_data_dir)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    fn profile(server: &str) -> Profile {
        Profile {
            server: server.into(),
            ..Profile::default()
        }
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.default_profile.as_deref(), Some("default"));
        assert_eq!(config.defaults.timeout, 30);
        assert_eq!(config.defaults.storage, StorageKind::Hybrid);
    }

    #[test]
    fn parses_profiles_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "edge"

[defaults]
timeout = 10
storage = "local"

[profiles.edge]
server = "http://10.0.0.5:9375"
token_env = "EDGE_TOKEN"
mode = "api"
cache = false
"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        let (name, edge) = config.profile(None).unwrap().unwrap();
        assert_eq!(name, "edge");
        assert_eq!(edge.mode, Some(StorageKind::Api));
        assert_eq!(edge.cache, Some(false));
        assert_eq!(config.defaults.timeout, 10);
        assert_eq!(config.defaults.storage, StorageKind::Local);
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.profiles.insert(
            "default".into(),
            Profile {
                mode: Some(StorageKind::Hybrid),
                data_dir: Some(dir.path().join("data")),
                ..profile("http://localhost:9375")
            },
        );

        save_config_to(&config, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), config);
    }

    #[test]
    fn named_profile_must_exist() {
        let config = Config::default();
        assert!(config.profile(None).unwrap().is_none());
        assert!(matches!(
            config.profile(Some("lab")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn client_config_from_profile() {
        let p = Profile {
            token: Some("plain".into()),
            timeout: Some(5),
            insecure: Some(true),
            ..profile("https://gw.local:9375")
        };
        let client = profile_to_client_config(&p, &Defaults::default()).unwrap();
        assert_eq!(client.url.as_str(), "https://gw.local:9375/");
        assert_eq!(client.timeout, Duration::from_secs(5));
        assert_eq!(client.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(client.token.unwrap().expose_secret(), "plain");
        assert!(client.events_enabled);
    }

    #[test]
    fn unset_token_env_falls_back_to_plaintext() {
        let p = Profile {
            token: Some("plain".into()),
            token_env: Some("NEOTALK_TEST_TOKEN_THAT_IS_NEVER_SET".into()),
            ..profile("http://localhost")
        };
        assert_eq!(resolve_token(&p).unwrap().expose_secret(), "plain");
        assert!(resolve_token(&profile("http://localhost")).is_none());
    }

    #[test]
    fn rejects_non_http_servers() {
        assert!(matches!(
            parse_server_url("ftp://example.com"),
            Err(ConfigError::Validation { .. })
        ));
        assert!(parse_server_url("not a url").is_err());
    }

    #[test]
    fn storage_options_follow_profile_then_defaults() {
        let defaults = Defaults::default();
        let dir = PathBuf::from("/var/lib/neotalk");
        let p = Profile {
            cache: Some(false),
            data_dir: Some(dir.clone()),
            ..profile("http://localhost")
        };
        let options = storage_options(Some(&p), &defaults);
        assert_eq!(options.mode, StorageKind::Hybrid);
        assert!(!options.cache);
        assert_eq!(options.data_dir, Some(dir));

        assert_eq!(storage_options(None, &defaults).mode, StorageKind::Local);
    }
}
