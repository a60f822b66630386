//! Dashboard command handlers.

use std::fmt::Write as _;
use std::sync::Arc;

use tabled::Tabled;
use tracing::{info, warn};

use neotalk_core::model::LayoutIssue;
use neotalk_core::{
    ComponentCatalog, Dashboard, DashboardComponent, DashboardStorage, ExtensionLifecycleSync,
    StorageBackend, StorageKind,
};

use crate::cli::{DashboardsArgs, DashboardsCommand, GlobalOpts};
use crate::context::Context;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct DashboardRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Widgets")]
    widgets: usize,
    #[tabled(rename = "Default")]
    default: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&Dashboard> for DashboardRow {
    fn from(d: &Dashboard) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            widgets: d.components.len(),
            default: util::yes_no(d.is_default.unwrap_or(false)),
            updated: output::format_millis(d.updated_at),
        }
    }
}

#[derive(Tabled)]
struct WidgetRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Type")]
    component_type: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "Sources")]
    sources: usize,
}

impl From<&DashboardComponent> for WidgetRow {
    fn from(c: &DashboardComponent) -> Self {
        let p = c.position;
        Self {
            id: c.id.clone(),
            component_type: c.component_type.clone(),
            title: c.title.clone().unwrap_or_default(),
            position: format!("{},{} {}x{}", p.x, p.y, p.w, p.h),
            sources: c.data_sources().len(),
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Note on stderr when a hybrid read was served from the local copy.
fn note_fallback(storage: &dyn DashboardStorage, backend: StorageBackend, quiet: bool) {
    if storage.kind() == StorageKind::Hybrid && backend == StorageBackend::Local && !quiet {
        eprintln!("Backend unreachable, showing locally cached dashboards");
    }
}

async fn find(storage: &Arc<dyn DashboardStorage>, id: &str, quiet: bool) -> Result<Dashboard, CliError> {
    let loaded = storage.load().await?;
    note_fallback(storage.as_ref(), loaded.backend, quiet);
    loaded
        .data
        .into_iter()
        .find(|d| d.id == id)
        .ok_or_else(|| CliError::dashboard_not_found(id))
}

fn describe_issue(issue: &LayoutIssue) -> String {
    match issue {
        LayoutIssue::DuplicateId { id } => format!("duplicate widget id '{id}'"),
        LayoutIssue::UnknownType { id, component_type } => {
            format!("widget '{id}' has unknown type '{component_type}'")
        }
        LayoutIssue::SizeOutOfRange {
            id,
            component_type,
            size,
            clamped,
        } => format!(
            "widget '{id}' ({component_type}) is {}x{}, allowed size is {}x{}",
            size.0, size.1, clamped.0, clamped.1
        ),
        LayoutIssue::TooManySources { id, count, max } => {
            format!("widget '{id}' binds {count} data sources, at most {max} allowed")
        }
    }
}

/// Check a dashboard against widget metadata. Extension widgets are known
/// only when the backend catalog can be fetched.
async fn validate(ctx: &Context, dashboard: &Dashboard) -> Result<Vec<LayoutIssue>, CliError> {
    let registry = ctx.registry();
    if let Some(client) = ctx.optional_client()? {
        let sync = ExtensionLifecycleSync::new(Arc::clone(&registry), client, None);
        if let Err(e) = sync.sync_components().await {
            warn!(error = %e, "extension catalog unavailable, validating against built-ins only");
        }
    }
    let catalog = ComponentCatalog::new(registry);
    Ok(dashboard.validate(|t| catalog.meta(t)))
}

fn detail(d: &Dashboard, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}",
        output::heading(&d.name, color),
        output::muted(&format!("({})", d.id), color)
    );
    let _ = writeln!(
        out,
        "Grid:     {} columns, {}px rows",
        d.layout.columns, d.layout.row_height
    );
    let _ = writeln!(out, "Created:  {}", output::format_millis(d.created_at));
    let _ = writeln!(out, "Updated:  {}", output::format_millis(d.updated_at));
    if d.is_default == Some(true) {
        let _ = writeln!(out, "Default:  yes");
    }
    if d.components.is_empty() {
        let _ = writeln!(out, "\nNo widgets");
    } else {
        let rows: Vec<WidgetRow> = d.components.iter().map(WidgetRow::from).collect();
        let _ = writeln!(out, "\n{}", output::render_table(&rows));
    }
    out.trim_end().to_string()
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    ctx: &Context,
    args: DashboardsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let storage = ctx.dashboard_storage()?;
    let result = run(ctx, &storage, args, global).await;
    storage.flush().await;
    result
}

async fn run(
    ctx: &Context,
    storage: &Arc<dyn DashboardStorage>,
    args: DashboardsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DashboardsCommand::List => {
            let loaded = storage.load().await?;
            note_fallback(storage.as_ref(), loaded.backend, global.quiet);
            let out = output::render_list(
                global.output,
                &loaded.data,
                |d| DashboardRow::from(d),
                |d| d.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DashboardsCommand::Show { id, validate: check } => {
            let dashboard = find(storage, &id, global.quiet).await?;
            let out = output::render_single(
                global.output,
                &dashboard,
                |d| detail(d, ctx.color),
                |d| d.id.clone(),
            );
            output::print_output(&out, global.quiet);

            if !check {
                return Ok(());
            }
            let issues = validate(ctx, &dashboard).await?;
            for issue in &issues {
                eprintln!("{}", output::warning(&describe_issue(issue), ctx.color));
            }
            let errors = issues.iter().filter(|i| i.is_error()).count();
            if errors > 0 {
                return Err(CliError::Validation {
                    field: "layout".into(),
                    reason: format!("{errors} blocking issue(s) in dashboard '{id}'"),
                });
            }
            if issues.is_empty() && !global.quiet {
                eprintln!("Layout OK");
            }
            Ok(())
        }

        DashboardsCommand::Delete { id } => {
            if !util::confirm(
                &format!("Delete dashboard '{id}'? This cannot be undone."),
                "dashboards delete",
                global.yes,
            )? {
                return Ok(());
            }
            storage.delete(&id).await?;
            info!(dashboard_id = %id, "dashboard deleted");
            if !global.quiet {
                eprintln!("Dashboard deleted");
            }
            Ok(())
        }

        DashboardsCommand::Current { set, clear } => {
            let local = ctx.local_storage();
            if clear {
                local.set_current_dashboard_id(None)?;
                if !global.quiet {
                    eprintln!("Current dashboard cleared");
                }
                return Ok(());
            }
            if let Some(id) = set {
                let dashboard = find(storage, &id, global.quiet).await?;
                local.set_current_dashboard_id(Some(&dashboard.id))?;
                if !global.quiet {
                    eprintln!("Current dashboard set to '{}'", dashboard.name);
                }
                return Ok(());
            }

            match local.current_dashboard_id()? {
                Some(id) => output::print_output(&id, global.quiet),
                None => {
                    if !global.quiet {
                        eprintln!("No current dashboard");
                    }
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issues_read_as_sentences() {
        let text = describe_issue(&LayoutIssue::SizeOutOfRange {
            id: "c1".into(),
            component_type: "value-card".into(),
            size: (1, 9),
            clamped: (2, 6),
        });
        assert_eq!(text, "widget 'c1' (value-card) is 1x9, allowed size is 2x6");
    }

    #[test]
    fn widget_row_counts_sources() {
        let mut widget = DashboardComponent::new("line-chart", neotalk_core::ComponentPosition::default());
        widget.data_source = Some(serde_json::json!([
            { "type": "device", "deviceId": "a", "property": "t" },
            { "type": "device", "deviceId": "b", "property": "t" }
        ]));
        let row = WidgetRow::from(&widget);
        assert_eq!(row.sources, 2);
        assert_eq!(row.position, "0,0 0x0");
    }
}
