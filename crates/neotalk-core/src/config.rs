// ── Runtime connection configuration ──
//
// These types describe how to reach a NeoTalk backend. They carry the
// token and connection tuning, but never touch disk: the CLI builds a
// `ClientConfig` from its profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use neotalk_api::websocket::ReconnectConfig;
use neotalk_api::{NeoTalkClient, TlsMode, TransportConfig};

use crate::error::CoreError;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs on edge gateways).
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

/// Configuration for talking to one backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL (e.g., `http://localhost:9375`).
    pub url: Url,
    /// Bearer token, when the backend requires one.
    pub token: Option<SecretString>,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Subscribe to the event WebSocket.
    pub events_enabled: bool,
    pub reconnect: ReconnectConfig,
}

impl ClientConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            token: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            events_enabled: true,
            reconnect: ReconnectConfig::default(),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: (&self.tls).into(),
            timeout: self.timeout,
            token: self.token.clone(),
        }
    }

    /// Build the REST client for this configuration.
    pub fn build_client(&self) -> Result<NeoTalkClient, CoreError> {
        Ok(NeoTalkClient::new(self.url.as_str(), &self.transport())?)
    }
}
