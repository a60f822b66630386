// ── Script-tag bundles ──
//
// Self-executing bundles announce themselves by assigning a global. The
// resolver appends the script, waits for its load event, then polls a short
// list of candidate global names. A failed acquisition always removes the
// script it appended.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::loader::{BundleRequest, BundleResolver};
use super::module::{ExportValue, LoadError, Renderable, classify};

/// Handle to a script element appended by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptId(pub u64);

/// Host hook for script injection and global lookup.
#[async_trait]
pub trait ScriptHost: Send + Sync {
    /// Append a script element for `url`. Does not wait for it to load.
    fn append(&self, url: &str) -> ScriptId;
    /// Resolve once the script's load event fires, or fail on its error event.
    async fn loaded(&self, script: ScriptId) -> Result<(), String>;
    fn read_global(&self, name: &str) -> Option<ExportValue>;
    fn remove(&self, script: ScriptId);
}

/// Generic global used by bundles that declare no name of their own.
pub const GENERIC_GLOBAL: &str = "NeoTalkExtensionComponent";

/// How long to wait for a global to appear after the load event.
#[derive(Debug, Clone, Copy)]
pub struct GlobalPoll {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for GlobalPoll {
    fn default() -> Self {
        Self {
            attempts: 20,
            interval: Duration::from_millis(50),
        }
    }
}

/// Resolver for self-executing bundles.
pub struct GlobalScriptResolver<H> {
    host: H,
    globals: HashMap<String, String>,
    poll: GlobalPoll,
}

impl<H: ScriptHost> GlobalScriptResolver<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            globals: HashMap::new(),
            poll: GlobalPoll::default(),
        }
    }

    /// Pin the global a component type's bundle assigns.
    pub fn with_global(
        mut self,
        component_type: impl Into<String>,
        global: impl Into<String>,
    ) -> Self {
        self.globals.insert(component_type.into(), global.into());
        self
    }

    pub fn with_poll(mut self, poll: GlobalPoll) -> Self {
        self.poll = poll;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Candidate globals in lookup order, without duplicates: the name the
    /// bundle declares, the pinned table entry, names derived from the
    /// extension id, then the generic name.
    pub fn candidate_globals(&self, request: &BundleRequest) -> Vec<String> {
        let pascal = pascal_case(&request.extension_id);
        let candidates = [
            request.bundle.global_name.clone(),
            self.globals.get(&request.component_type).cloned(),
            (!pascal.is_empty()).then(|| format!("{pascal}Component")),
            (!pascal.is_empty()).then(|| pascal.clone()),
            Some(format!("NeoTalkExtension_{}", request.extension_id.replace('-', "_"))),
            Some(GENERIC_GLOBAL.to_string()),
        ];

        let mut out: Vec<String> = Vec::with_capacity(candidates.len());
        for name in candidates.into_iter().flatten() {
            if !out.contains(&name) {
                out.push(name);
            }
        }
        out
    }

    async fn find_global(&self, candidates: &[String]) -> Option<(String, ExportValue)> {
        for attempt in 0..self.poll.attempts.max(1) {
            if attempt > 0 {
                tokio::time::sleep(self.poll.interval).await;
            }
            for name in candidates {
                if let Some(value) = self.host.read_global(name) {
                    return Some((name.clone(), value));
                }
            }
        }
        None
    }

    async fn resolve_loaded(&self, request: &BundleRequest) -> Result<Renderable, LoadError> {
        let url = &request.bundle.url;
        let candidates = self.candidate_globals(request);

        let Some((global, value)) = self.find_global(&candidates).await else {
            return Err(LoadError::MissingGlobal {
                url: url.clone(),
                tried: candidates,
            });
        };
        debug!(component_type = %request.component_type, global = %global, "bundle global found");

        let export = extract_export(&value, request.bundle.export_name.as_deref()).ok_or_else(
            || LoadError::MissingExport {
                url: url.clone(),
                export: request.export_label().to_string(),
            },
        )?;

        classify(export).ok_or_else(|| LoadError::NotRenderable {
            url: url.clone(),
            export: request.export_label().to_string(),
        })
    }
}

#[async_trait]
impl<H: ScriptHost> BundleResolver for GlobalScriptResolver<H> {
    async fn acquire(&self, request: &BundleRequest) -> Result<Renderable, LoadError> {
        let url = &request.bundle.url;
        let script = self.host.append(url);

        let result = match self.host.loaded(script).await {
            Ok(()) => self.resolve_loaded(request).await,
            Err(reason) => Err(LoadError::Injection {
                url: url.clone(),
                reason,
            }),
        };

        if let Err(ref e) = result {
            warn!(
                component_type = %request.component_type,
                stage = e.stage(),
                error = %e,
                "removing script after failed load"
            );
            self.host.remove(script);
        }
        result
    }
}

/// The global is either the component itself or a namespace holding it.
fn extract_export<'a>(global: &'a ExportValue, export_name: Option<&str>) -> Option<&'a ExportValue> {
    match global {
        ExportValue::Function(_) => Some(global),
        ExportValue::Object(_) => export_name
            .and_then(|name| global.get(name))
            .or_else(|| global.get("default"))
            .or_else(|| classify(global).map(|_| global)),
        ExportValue::Other(_) => None,
    }
}

/// `weather-station_v2` → `WeatherStationV2`.
fn pascal_case(id: &str) -> String {
    id.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect()
}
