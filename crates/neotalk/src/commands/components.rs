//! Component catalog command handlers.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::sync::Arc;

use tabled::Tabled;

use neotalk_core::{
    ComponentCatalog, ComponentFilter, ComponentMeta, ComponentOrigin, CoreError,
    ExtensionLifecycleSync,
};

use crate::cli::{CatalogFilterArgs, ComponentsArgs, ComponentsCommand, GlobalOpts, OutputFormat};
use crate::context::Context;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Type")]
    component_type: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Data")]
    data: String,
    #[tabled(rename = "Origin")]
    origin: String,
}

impl ComponentRow {
    fn new(meta: &ComponentMeta, catalog: &ComponentCatalog) -> Self {
        let sc = meta.size_constraints;
        let data = match (meta.has_data_source, meta.max_data_sources) {
            (false, _) => "-".into(),
            (true, Some(max)) => format!("up to {max}"),
            (true, None) => "yes".into(),
        };
        Self {
            component_type: meta.component_type.clone(),
            name: meta.name.clone(),
            category: meta.category.label().into(),
            size: format!("{}x{}", sc.default_w, sc.default_h),
            data,
            origin: catalog
                .origin(&meta.component_type)
                .map(|o| o.to_string())
                .unwrap_or_default(),
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn build_filter(args: &CatalogFilterArgs) -> ComponentFilter {
    let mut filter = ComponentFilter::all();
    if let Some(category) = args.category {
        filter = filter.category(category);
    }
    if args.data_bound {
        filter = filter.with_data_source(true);
    }
    if let Some(ref query) = args.search {
        filter = filter.search(query.clone());
    }
    filter
}

/// Catalog over built-ins, plus the backend's extension widgets when asked.
async fn load_catalog(ctx: &Context, with_extensions: bool) -> Result<ComponentCatalog, CliError> {
    let registry = ctx.registry();
    if with_extensions {
        let sync = ExtensionLifecycleSync::new(Arc::clone(&registry), ctx.client()?, None);
        sync.sync_components().await?;
    }
    Ok(ComponentCatalog::new(registry))
}

fn detail(meta: &ComponentMeta, catalog: &ComponentCatalog, color: bool) -> String {
    let sc = meta.size_constraints;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}",
        output::heading(&meta.name, color),
        output::muted(&format!("({})", meta.component_type), color)
    );
    if !meta.description.is_empty() {
        let _ = writeln!(out, "{}", meta.description);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Category:     {}", meta.category.label());
    if let Some(origin) = catalog.origin(&meta.component_type) {
        let _ = writeln!(out, "Origin:       {origin}");
    }
    if origin_is_extension(catalog, meta) {
        let dynamic = catalog.dynamic();
        if let Some(ext) = dynamic.extension_of(&meta.component_type) {
            let _ = writeln!(out, "Extension:    {ext}");
        }
        if let Some(def) = dynamic.definition(&meta.component_type) {
            let _ = writeln!(out, "Bundle:       {} ({:?})", def.bundle.url, def.bundle.format);
        }
    }
    let _ = writeln!(
        out,
        "Size:         {}x{} (min {}x{}, max {}x{}{})",
        sc.default_w,
        sc.default_h,
        sc.min_w,
        sc.min_h,
        sc.max_w,
        sc.max_h,
        if sc.preserve_aspect { ", keeps aspect" } else { "" }
    );
    let _ = writeln!(out, "Data source:  {}", util::yes_no(meta.has_data_source));
    if let Some(max) = meta.max_data_sources {
        let _ = writeln!(out, "Max sources:  {max}");
    }
    let _ = writeln!(out, "Display cfg:  {}", util::yes_no(meta.has_display_config));
    let _ = writeln!(out, "Actions:      {}", util::yes_no(meta.has_actions));
    if !meta.variants.is_empty() {
        let _ = writeln!(out, "Variants:     {}", meta.variants.join(", "));
    }
    if !meta.accepted_props.is_empty() {
        let _ = writeln!(out, "Props:        {}", meta.accepted_props.join(", "));
    }
    if !meta.default_props.is_empty() {
        let _ = writeln!(out, "{}", output::heading("Defaults:", color));
        for (key, value) in &meta.default_props {
            let _ = writeln!(out, "  {key} = {value}");
        }
    }
    out.trim_end().to_string()
}

fn origin_is_extension(catalog: &ComponentCatalog, meta: &ComponentMeta) -> bool {
    catalog.origin(&meta.component_type) == Some(ComponentOrigin::Extension)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    ctx: &Context,
    args: ComponentsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ComponentsCommand::List(filter_args) => {
            let catalog = load_catalog(ctx, filter_args.extensions).await?;
            let found = catalog.filter(&build_filter(&filter_args));
            let out = output::render_list(
                global.output,
                &found,
                |m| ComponentRow::new(m, &catalog),
                |m| m.component_type.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ComponentsCommand::Groups(filter_args) => {
            let catalog = load_catalog(ctx, filter_args.extensions).await?;
            let groups = catalog.groups(&build_filter(&filter_args));
            let out = match global.output {
                OutputFormat::Table => groups
                    .iter()
                    .map(|g| {
                        let rows: Vec<_> = g
                            .components
                            .iter()
                            .map(|m| ComponentRow::new(m, &catalog))
                            .collect();
                        format!(
                            "{}\n{}",
                            output::heading(g.category.label(), ctx.color),
                            output::render_table(&rows)
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n\n"),
                OutputFormat::Plain => groups
                    .iter()
                    .flat_map(|g| {
                        g.components
                            .iter()
                            .map(move |m| format!("{}\t{}", g.category, m.component_type))
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
                OutputFormat::Json => output::render_json_pretty(&groups),
                OutputFormat::JsonCompact => output::render_json_compact(&groups),
                OutputFormat::Yaml => output::render_yaml(&groups),
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ComponentsCommand::Show {
            component_type,
            extensions,
        } => {
            let catalog = load_catalog(ctx, extensions).await?;
            let meta: Cow<'static, ComponentMeta> = catalog
                .meta(&component_type)
                .ok_or(CoreError::ComponentNotFound { component_type })?;
            let out = output::render_single(
                global.output,
                &meta,
                |m| detail(m, &catalog, ctx.color),
                |m| m.component_type.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neotalk_core::{ComponentCategory, get_component_meta};

    #[test]
    fn filter_flags_compose() {
        let args = CatalogFilterArgs {
            category: Some(ComponentCategory::Charts),
            search: Some("line".into()),
            data_bound: true,
            extensions: false,
        };
        let filter = build_filter(&args);
        assert_eq!(filter.category, Some(ComponentCategory::Charts));
        assert_eq!(filter.has_data_source, Some(true));
        assert_eq!(filter.search_query.as_deref(), Some("line"));
    }

    #[test]
    fn detail_lists_defaults() {
        let ctx_catalog = ComponentCatalog::new(std::sync::Arc::new(
            neotalk_core::DynamicComponentRegistry::new(std::sync::Arc::new(NoLoad)),
        ));
        let meta = get_component_meta("value-card").map(Cow::Borrowed);
        let text = meta.map(|m| detail(&m, &ctx_catalog, false)).unwrap_or_default();
        assert!(text.contains("Origin:       builtin"));
        assert!(text.contains("precision = 1"));
    }

    struct NoLoad;

    #[async_trait::async_trait]
    impl neotalk_core::BundleResolver for NoLoad {
        async fn acquire(
            &self,
            request: &neotalk_core::dynamic::BundleRequest,
        ) -> Result<neotalk_core::Renderable, neotalk_core::LoadError> {
            Err(neotalk_core::LoadError::UnknownComponent {
                component_type: request.component_type.clone(),
            })
        }
    }
}
