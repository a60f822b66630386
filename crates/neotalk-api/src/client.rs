// HTTP client for the NeoTalk backend REST API.
//
// Wraps `reqwest::Client` with base-URL handling, error-body parsing, and
// the list-wrapper probing every collection endpoint needs. Endpoint groups
// (dashboards, extensions) live in sibling modules as inherent methods to
// keep this file focused on transport mechanics.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Field names the backend has used to wrap list payloads, probed in order.
pub const LIST_WRAPPER_KEYS: &[&str] = &["dashboards", "sessions", "data", "results", "items"];

/// Error body shape: `{"error": "...", "message": "...", "code": "..."}`.
#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    code: Option<String>,
}

/// Async client for the NeoTalk backend.
pub struct NeoTalkClient {
    http: reqwest::Client,
    base_url: Url,
}

impl NeoTalkClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client from a base URL and transport config.
    ///
    /// The base URL is the server root (e.g. `http://127.0.0.1:9375`);
    /// endpoint paths are joined below it.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Ensure the base path ends with `/` so relative joins append.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// WebSocket URL of the backend event feed (`/api/events/ws`).
    pub fn events_ws_url(&self) -> Result<Url, Error> {
        let mut url = self.url("api/events/ws")?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| Error::WebSocketConnect(format!("cannot derive ws URL from {url}")))?;
        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get_value(&self, path: &str) -> Result<Value, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        self.handle_empty(resp).await
    }

    /// Probe `GET /api/health`.
    pub async fn health(&self) -> Result<(), Error> {
        let url = self.url("api/health")?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            // 204 and friends: treat an empty body as JSON null.
            let body = if body.trim().is_empty() {
                "null".to_owned()
            } else {
                body
            };
            serde_json::from_str(&body).map_err(|e| {
                let preview = &body[..body.len().min(200)];
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::Authentication {
                message: if raw.is_empty() {
                    "token rejected".into()
                } else {
                    raw
                },
            };
        }

        if let Ok(err) = serde_json::from_str::<ErrorResponse>(&raw) {
            let message = err
                .message
                .or_else(|| match err.error {
                    Some(Value::String(s)) => Some(s),
                    Some(Value::Object(ref o)) => {
                        o.get("message").and_then(Value::as_str).map(String::from)
                    }
                    _ => None,
                })
                .unwrap_or_else(|| status.to_string());
            Error::Api {
                status: status.as_u16(),
                message,
                code: err.code,
            }
        } else {
            Error::Api {
                status: status.as_u16(),
                message: if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                },
                code: None,
            }
        }
    }
}

// ── Envelope probing ─────────────────────────────────────────────────

/// Pull a list out of a response that is either a bare array or an object
/// wrapping one under any of `keys`.
///
/// `{"success": true, "data": {"dashboards": [...]}}` is also accepted: a
/// `data` object is searched with the same keys.
pub fn extract_list(value: Value, keys: &[&str]) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut obj) => {
            for key in keys {
                if matches!(obj.get(*key), Some(Value::Array(_))) {
                    if let Some(Value::Array(items)) = obj.remove(*key) {
                        return Some(items);
                    }
                }
            }
            match obj.remove("data") {
                Some(inner @ Value::Object(_)) => extract_list(inner, keys),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Unwrap a single entity that may arrive as `{"data": {...}}`.
pub fn extract_object(value: Value) -> Value {
    match value {
        Value::Object(mut obj) if !obj.contains_key("id") && obj.contains_key("data") => {
            match obj.remove("data") {
                Some(inner @ Value::Object(_)) => inner,
                Some(other) => {
                    obj.insert("data".into(), other);
                    Value::Object(obj)
                }
                None => Value::Object(obj),
            }
        }
        other => other,
    }
}

/// Deserialize every element of a probed list.
pub(crate) fn decode_list<T: DeserializeOwned>(
    endpoint: &str,
    value: Value,
    keys: &[&str],
) -> Result<Vec<T>, Error> {
    let items = extract_list(value, keys).ok_or_else(|| Error::UnexpectedShape {
        endpoint: endpoint.to_owned(),
    })?;
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item.clone()).map_err(|e| Error::Deserialization {
                message: format!("{endpoint}: {e}"),
                body: item.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_array_passes_through() {
        let items = extract_list(json!([1, 2]), LIST_WRAPPER_KEYS).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn every_wrapper_key_is_probed() {
        for key in LIST_WRAPPER_KEYS {
            let mut wrapped = serde_json::Map::new();
            wrapped.insert((*key).to_owned(), json!([{"id": "a"}]));
            let items = extract_list(Value::Object(wrapped), LIST_WRAPPER_KEYS).unwrap();
            assert_eq!(items.len(), 1, "key {key} not probed");
        }
    }

    #[test]
    fn nested_data_object_is_searched() {
        let wrapped = json!({ "success": true, "data": { "dashboards": [{"id": "a"}, {"id": "b"}] } });
        let items = extract_list(wrapped, LIST_WRAPPER_KEYS).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn unknown_shape_yields_none() {
        assert!(extract_list(json!({"count": 3}), LIST_WRAPPER_KEYS).is_none());
        assert!(extract_list(json!("nope"), LIST_WRAPPER_KEYS).is_none());
    }

    #[test]
    fn single_object_unwrapped_from_data() {
        let v = extract_object(json!({ "success": true, "data": { "id": "d1" } }));
        assert_eq!(v["id"], "d1");

        let plain = extract_object(json!({ "id": "d1", "data": { "x": 1 } }));
        assert_eq!(plain["id"], "d1");
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let client =
            NeoTalkClient::from_reqwest("http://localhost:9375/neotalk", reqwest::Client::new())
                .unwrap();
        assert_eq!(
            client.url("api/dashboards").unwrap().as_str(),
            "http://localhost:9375/neotalk/api/dashboards"
        );
    }

    #[test]
    fn events_url_switches_scheme() {
        let client =
            NeoTalkClient::from_reqwest("https://edge.local", reqwest::Client::new()).unwrap();
        assert_eq!(
            client.events_ws_url().unwrap().as_str(),
            "wss://edge.local/api/events/ws"
        );
    }
}
