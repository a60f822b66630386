//! Extension command handlers: catalog sync and lifecycle watch.

use std::sync::Arc;

use tabled::Tabled;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use neotalk_api::websocket::{BackendEvent, EventStreamHandle};
use neotalk_core::{DashboardSession, ExtensionEntry, ExtensionLifecycleSync};

use crate::cli::{ExtensionsArgs, ExtensionsCommand, GlobalOpts, OutputFormat};
use crate::context::Context;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ExtensionRow {
    #[tabled(rename = "Extension")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Widgets")]
    widgets: String,
}

impl From<&ExtensionEntry> for ExtensionRow {
    fn from(e: &ExtensionEntry) -> Self {
        Self {
            id: e.extension_id.clone(),
            name: e.extension_name.clone(),
            widgets: e.component_types.join(", "),
        }
    }
}

// ── Watch output ────────────────────────────────────────────────────

/// One line per lifecycle event: text for tables, JSON for scripts.
fn event_line(event: &BackendEvent, format: OutputFormat) -> Option<String> {
    let lifecycle = event.extension_lifecycle()?;
    Some(match format {
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            output::render_json_compact(&lifecycle)
        }
        OutputFormat::Table | OutputFormat::Plain => {
            let when = event
                .timestamp
                .map(|ts| output::format_millis(ts.saturating_mul(1000)))
                .unwrap_or_default();
            format!("{when}\t{}\t{:?}", lifecycle.extension_id, lifecycle.state)
                .trim_start()
                .to_string()
        }
    })
}

async fn print_events(
    mut events: broadcast::Receiver<Arc<BackendEvent>>,
    cancel: CancellationToken,
    format: OutputFormat,
    quiet: bool,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            received = events.recv() => match received {
                Ok(event) => {
                    if let Some(line) = event_line(&event, format) {
                        output::print_output(&line, quiet);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "event printer lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    ctx: &Context,
    args: ExtensionsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let client = ctx.client()?;
    let registry = ctx.registry();

    match args.command {
        ExtensionsCommand::Sync => {
            let sync = ExtensionLifecycleSync::new(Arc::clone(&registry), client, None);
            let summary = sync.sync_components().await?;
            let extensions = registry.extensions();
            let out = output::render_list(
                global.output,
                &extensions,
                |e| ExtensionRow::from(e),
                |e| e.extension_id.clone(),
            );
            output::print_output(&out, global.quiet);
            if !global.quiet {
                eprintln!(
                    "{} widget(s) from {} extension(s)",
                    summary.components, summary.extensions
                );
            }
            Ok(())
        }

        ExtensionsCommand::Watch { dashboard } => {
            let session = match dashboard {
                Some(id) => {
                    let session = Arc::new(DashboardSession::new(ctx.dashboard_storage()?));
                    if session.open_by_id(&id).await?.is_none() {
                        return Err(CliError::dashboard_not_found(id));
                    }
                    Some(session)
                }
                None => None,
            };

            let ws_url = client.events_ws_url().map_err(neotalk_core::CoreError::from)?;
            let (token, reconnect) = ctx
                .client_config
                .as_ref()
                .map(|c| (c.token.clone(), c.reconnect.clone()))
                .unwrap_or_default();

            let sync = Arc::new(ExtensionLifecycleSync::new(
                registry,
                client,
                session.clone(),
            ));
            let summary = sync.sync_components().await?;
            info!(
                extensions = summary.extensions,
                components = summary.components,
                "initial extension catalog loaded"
            );

            let cancel = CancellationToken::new();
            let stream = EventStreamHandle::connect(ws_url, reconnect, cancel.clone(), token);
            let lifecycle = Arc::clone(&sync).spawn(stream.subscribe(), cancel.clone());
            let printer = tokio::spawn(print_events(
                stream.subscribe(),
                cancel.clone(),
                global.output,
                global.quiet,
            ));

            if !global.quiet {
                eprintln!("Watching extension lifecycle events (Ctrl-C to stop)");
            }
            tokio::signal::ctrl_c().await?;

            stream.shutdown();
            let _ = lifecycle.await;
            let _ = printer.await;
            if let Some(session) = session {
                session.storage().flush().await;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: serde_json::Value) -> BackendEvent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn lifecycle_events_print_as_json_lines() {
        let e = event(json!({
            "type": "ExtensionLifecycle",
            "data": { "extension_id": "weather", "state": "unregistered" }
        }));
        let line = event_line(&e, OutputFormat::JsonCompact).unwrap();
        assert_eq!(line, r#"{"extension_id":"weather","state":"unregistered"}"#);
        let text = event_line(&e, OutputFormat::Plain).unwrap();
        assert_eq!(text, "weather\tUnregistered");
    }

    #[test]
    fn other_events_are_skipped() {
        let e = event(json!({ "type": "DeviceMetric", "data": {} }));
        assert!(event_line(&e, OutputFormat::Table).is_none());
    }
}
