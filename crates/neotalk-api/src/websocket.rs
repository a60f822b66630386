//! Backend event stream with auto-reconnect.
//!
//! Connects to the NeoTalk event WebSocket (`/api/events/ws`) and streams
//! parsed events through a [`tokio::sync::broadcast`] channel. Handles
//! reconnection with exponential backoff + jitter automatically.
//!
//! # Example
//!
//! ```rust,ignore
//! use neotalk_api::websocket::{EventStreamHandle, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let ws_url = client.events_ws_url()?;
//!
//! let handle = EventStreamHandle::connect(ws_url, ReconnectConfig::default(), cancel.clone(), None);
//! let mut rx = handle.subscribe();
//!
//! while let Ok(event) = rx.recv().await {
//!     if let Some(lifecycle) = event.extension_lifecycle() {
//!         println!("{} -> {:?}", lifecycle.extension_id, lifecycle.state);
//!     }
//! }
//!
//! handle.shutdown();
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

// ── Broadcast channel capacity ───────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Event type carrying extension install/remove notifications.
pub const EXTENSION_LIFECYCLE: &str = "ExtensionLifecycle";

// ── BackendEvent ─────────────────────────────────────────────────────

/// A parsed event from the backend event feed.
///
/// Uses `#[serde(flatten)]` to capture all fields beyond the core set,
/// so nothing the backend sends is silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendEvent {
    /// Event type, e.g. `"ExtensionLifecycle"`, `"DeviceMetric"`.
    #[serde(rename = "type", alias = "event_type")]
    pub event_type: String,

    /// Coarse category: `"extension"`, `"device"`, `"rule"`, `"agent"`, ...
    #[serde(default)]
    pub category: Option<String>,

    /// Epoch timestamp as sent by the backend.
    #[serde(default)]
    pub timestamp: Option<i64>,

    /// Event payload.
    #[serde(default, alias = "payload")]
    pub data: Value,

    /// All remaining fields the backend sends.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Lifecycle states an extension reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Registered,
    Loaded,
    Unregistered,
}

/// Payload of an [`EXTENSION_LIFECYCLE`] event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionLifecycleEvent {
    #[serde(alias = "extensionId")]
    pub extension_id: String,
    pub state: LifecycleState,
}

impl BackendEvent {
    /// Decode the payload as an extension lifecycle notification.
    ///
    /// Returns `None` for other event types, and for lifecycle events in
    /// states this client does not act on.
    pub fn extension_lifecycle(&self) -> Option<ExtensionLifecycleEvent> {
        if self.event_type != EXTENSION_LIFECYCLE {
            return None;
        }
        match serde_json::from_value(self.data.clone()) {
            Ok(evt) => Some(evt),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring extension lifecycle payload");
                None
            }
        }
    }
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for WebSocket reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── EventStreamHandle ────────────────────────────────────────────────

/// Handle to a running event stream.
///
/// Call [`shutdown`](Self::shutdown) to tear down the background task.
pub struct EventStreamHandle {
    event_rx: broadcast::Receiver<Arc<BackendEvent>>,
    cancel: CancellationToken,
}

impl EventStreamHandle {
    /// Spawn the connect/reconnect loop and return immediately.
    ///
    /// The first connection attempt happens asynchronously -- subscribe to
    /// the event receiver to start consuming events. Must be called from
    /// within a Tokio runtime.
    pub fn connect(
        ws_url: Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
        token: Option<SecretString>,
    ) -> Self {
        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            ws_loop(ws_url, event_tx, reconnect, task_cancel, token).await;
        });

        Self { event_rx, cancel }
    }

    /// Get a new broadcast receiver for the event stream.
    ///
    /// Multiple consumers can subscribe concurrently. If a consumer falls
    /// behind, it receives [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<BackendEvent>> {
        self.event_rx.resubscribe()
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on error, backoff → reconnect.
async fn ws_loop(
    ws_url: Url,
    event_tx: broadcast::Sender<Arc<BackendEvent>>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
    token: Option<SecretString>,
) {
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&ws_url, &event_tx, &cancel, token.as_ref()) => {
                match result {
                    // Clean disconnect: reset the counter and reconnect immediately.
                    Ok(()) => {
                        if cancel.is_cancelled() {
                            break;
                        }
                        tracing::info!("event stream disconnected cleanly, reconnecting");
                        attempt = 0;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "event stream error");

                        if let Some(max) = reconnect.max_retries {
                            if attempt >= max {
                                tracing::error!(
                                    max_retries = max,
                                    "event stream reconnection limit reached, giving up"
                                );
                                break;
                            }
                        }

                        let delay = calculate_backoff(attempt, &reconnect);
                        tracing::info!(
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            attempt,
                            "waiting before reconnect"
                        );

                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(delay) => {}
                        }

                        attempt += 1;
                    }
                }
            }
        }
    }

    tracing::debug!("event stream loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish a single WebSocket connection, read messages until it drops.
async fn connect_and_read(
    url: &Url,
    event_tx: &broadcast::Sender<Arc<BackendEvent>>,
    cancel: &CancellationToken,
    token: Option<&SecretString>,
) -> Result<(), Error> {
    tracing::info!(url = %url, "connecting to event stream");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

    let mut request = ClientRequestBuilder::new(uri);
    if let Some(token) = token {
        request = request.with_header("Authorization", format!("Bearer {}", token.expose_secret()));
    }

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    tracing::info!("event stream connected");

    let (_write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        parse_and_broadcast(&text, event_tx);
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite answers pings itself
                        tracing::trace!("event stream ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "close frame received"
                            );
                        } else {
                            tracing::info!("close frame received (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(Error::WebSocketConnect(e.to_string()));
                    }
                    None => {
                        tracing::info!("event stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    }
}

// ── Message parsing ──────────────────────────────────────────────────

/// Parse a text frame and broadcast the event(s) inside.
///
/// A frame carries either one event object or an array of them.
fn parse_and_broadcast(text: &str, event_tx: &broadcast::Sender<Arc<BackendEvent>>) {
    let raw: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse event frame");
            return;
        }
    };

    let items = match raw {
        Value::Array(items) => items,
        other => vec![other],
    };

    for item in items {
        match serde_json::from_value::<BackendEvent>(item) {
            // No active subscribers is not an error.
            Ok(event) => {
                let _ = event_tx.send(Arc::new(event));
            }
            Err(e) => tracing::debug!(error = %e, "skipping untyped event"),
        }
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25% to spread out reconnection storms from multiple clients.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt.min(30)).unwrap_or(30);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic jitter seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_reconnect_config() {
        let config = ReconnectConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert!(config.max_retries.is_none());
    }

    #[test]
    fn backoff_increases_exponentially() {
        let config = ReconnectConfig::default();

        let d0 = calculate_backoff(0, &config);
        let d1 = calculate_backoff(1, &config);
        let d2 = calculate_backoff(2, &config);

        assert!(d1 > d0, "d1 ({d1:?}) should be greater than d0 ({d0:?})");
        assert!(d2 > d1, "d2 ({d2:?}) should be greater than d1 ({d1:?})");
    }

    #[test]
    fn backoff_caps_at_max_delay() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_retries: None,
        };

        let d10 = calculate_backoff(10, &config);
        // jitter factor tops out at 1.25
        assert!(
            d10 <= Duration::from_secs(13),
            "delay at attempt 10 ({d10:?}) should be capped near max_delay"
        );
    }

    #[test]
    fn lifecycle_event_is_decoded() {
        let event: BackendEvent = serde_json::from_value(json!({
            "type": "ExtensionLifecycle",
            "category": "extension",
            "timestamp": 1_760_000_000,
            "data": { "extension_id": "weather", "state": "unregistered" }
        }))
        .unwrap();

        let lifecycle = event.extension_lifecycle().unwrap();
        assert_eq!(lifecycle.extension_id, "weather");
        assert_eq!(lifecycle.state, LifecycleState::Unregistered);
    }

    #[test]
    fn other_events_are_not_lifecycle() {
        let event: BackendEvent = serde_json::from_value(json!({
            "type": "DeviceMetric",
            "data": { "device_id": "sensor-1", "metric": "temp", "value": 21.5 },
            "source": "mqtt"
        }))
        .unwrap();
        assert!(event.extension_lifecycle().is_none());
        assert_eq!(event.extra["source"], "mqtt");
    }

    #[test]
    fn unknown_lifecycle_state_is_ignored() {
        let event: BackendEvent = serde_json::from_value(json!({
            "type": "ExtensionLifecycle",
            "data": { "extension_id": "weather", "state": "crashed" }
        }))
        .unwrap();
        assert!(event.extension_lifecycle().is_none());
    }

    #[test]
    fn parse_and_broadcast_single_and_batched() {
        let (tx, mut rx) = broadcast::channel(16);

        let single = json!({ "type": "ExtensionLifecycle", "data": { "extension_id": "a", "state": "loaded" } });
        parse_and_broadcast(&single.to_string(), &tx);
        assert_eq!(rx.try_recv().unwrap().event_type, "ExtensionLifecycle");

        let batch = json!([
            { "type": "RuleTriggered", "data": {} },
            { "type": "AgentThinking", "data": {} }
        ]);
        parse_and_broadcast(&batch.to_string(), &tx);
        assert_eq!(rx.try_recv().unwrap().event_type, "RuleTriggered");
        assert_eq!(rx.try_recv().unwrap().event_type, "AgentThinking");
    }

    #[test]
    fn parse_and_broadcast_malformed_json() {
        let (tx, mut rx) = broadcast::channel::<Arc<BackendEvent>>(16);

        parse_and_broadcast("not json at all", &tx);

        assert!(rx.try_recv().is_err());
    }
}
