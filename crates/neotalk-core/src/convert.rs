// ── API-to-domain type conversions ──
//
// Bridges `neotalk_api` wire types and `neotalk_core::model` types. The
// dashboard mapping is lossless both ways: unknown fields travel in the
// `extra` maps and timestamps stay epoch milliseconds on both sides.

use std::str::FromStr;

use neotalk_api::{
    ComponentInstanceDto, ComponentPositionDto, DashboardComponentDto, DashboardDto,
    DashboardLayoutDto, SizeConstraintsDto,
};
use tracing::debug;

use crate::dynamic::{BundleFormat, BundleLocation, ComponentDefinition};
use crate::model::{
    ComponentCategory, ComponentMeta, ComponentPosition, Dashboard, DashboardComponent,
    DashboardLayout, SizeConstraints,
};

// ── Dashboards ───────────────────────────────────────────────────────

impl From<DashboardDto> for Dashboard {
    fn from(dto: DashboardDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            layout: dto.layout.into(),
            components: dto.components.into_iter().map(Into::into).collect(),
            created_at: dto.created_at,
            updated_at: dto.updated_at,
            is_default: dto.is_default,
            extra: dto.extra,
        }
    }
}

impl From<&Dashboard> for DashboardDto {
    fn from(d: &Dashboard) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            layout: (&d.layout).into(),
            components: d.components.iter().map(Into::into).collect(),
            created_at: d.created_at,
            updated_at: d.updated_at,
            is_default: d.is_default,
            extra: d.extra.clone(),
        }
    }
}

impl From<DashboardLayoutDto> for DashboardLayout {
    fn from(dto: DashboardLayoutDto) -> Self {
        Self {
            columns: dto.columns,
            row_height: dto.row_height,
            breakpoints: dto.breakpoints,
            extra: dto.extra,
        }
    }
}

impl From<&DashboardLayout> for DashboardLayoutDto {
    fn from(l: &DashboardLayout) -> Self {
        Self {
            columns: l.columns,
            row_height: l.row_height,
            breakpoints: l.breakpoints.clone(),
            extra: l.extra.clone(),
        }
    }
}

impl From<ComponentInstanceDto> for DashboardComponent {
    fn from(dto: ComponentInstanceDto) -> Self {
        Self {
            id: dto.id,
            component_type: dto.component_type,
            position: dto.position.into(),
            title: dto.title,
            data_source: dto.data_source,
            display: dto.display,
            config: dto.config,
            actions: dto.actions,
            extra: dto.extra,
        }
    }
}

impl From<&DashboardComponent> for ComponentInstanceDto {
    fn from(c: &DashboardComponent) -> Self {
        Self {
            id: c.id.clone(),
            component_type: c.component_type.clone(),
            position: c.position.into(),
            title: c.title.clone(),
            data_source: c.data_source.clone(),
            display: c.display.clone(),
            config: c.config.clone(),
            actions: c.actions.clone(),
            extra: c.extra.clone(),
        }
    }
}

impl From<ComponentPositionDto> for ComponentPosition {
    fn from(p: ComponentPositionDto) -> Self {
        Self {
            x: p.x,
            y: p.y,
            w: p.w,
            h: p.h,
            min_w: p.min_w,
            min_h: p.min_h,
            max_w: p.max_w,
            max_h: p.max_h,
        }
    }
}

impl From<ComponentPosition> for ComponentPositionDto {
    fn from(p: ComponentPosition) -> Self {
        Self {
            x: p.x,
            y: p.y,
            w: p.w,
            h: p.h,
            min_w: p.min_w,
            min_h: p.min_h,
            max_w: p.max_w,
            max_h: p.max_h,
        }
    }
}

// ── Extension components ─────────────────────────────────────────────

/// Missing limits fall back to the generic defaults.
impl From<SizeConstraintsDto> for SizeConstraints {
    fn from(dto: SizeConstraintsDto) -> Self {
        let base = Self::default();
        Self {
            min_w: dto.min_w.unwrap_or(base.min_w),
            min_h: dto.min_h.unwrap_or(base.min_h),
            default_w: dto.default_w.unwrap_or(base.default_w),
            default_h: dto.default_h.unwrap_or(base.default_h),
            max_w: dto.max_w.unwrap_or(base.max_w),
            max_h: dto.max_h.unwrap_or(base.max_h),
            preserve_aspect: dto.preserve_aspect.unwrap_or(false),
        }
    }
}

fn parse_category(raw: &str, component_type: &str) -> ComponentCategory {
    ComponentCategory::from_str(raw.trim()).unwrap_or_else(|_| {
        debug!(component_type, category = raw, "unknown category, filing under business");
        ComponentCategory::Business
    })
}

/// Explicit format wins; otherwise `.mjs` URLs are modules and everything
/// else is a script bundle.
fn bundle_format(raw: Option<&str>, url: &str) -> BundleFormat {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        Some("esm" | "module" | "es") => BundleFormat::Esm,
        Some("iife" | "script" | "umd") => BundleFormat::Iife,
        _ if url.ends_with(".mjs") => BundleFormat::Esm,
        _ => BundleFormat::Iife,
    }
}

impl From<DashboardComponentDto> for ComponentDefinition {
    fn from(dto: DashboardComponentDto) -> Self {
        let category = parse_category(&dto.category, &dto.component_type);
        let format = bundle_format(dto.bundle_format.as_deref(), &dto.bundle_url);

        Self {
            meta: ComponentMeta {
                category,
                icon: dto.icon,
                size_constraints: dto.size_constraints.into(),
                has_data_source: dto.has_data_source,
                max_data_sources: dto.max_data_sources,
                has_display_config: dto.has_display_config,
                has_actions: dto.has_actions,
                accepted_props: dto.accepted_props,
                default_props: dto.default_props,
                variants: dto.variants,
                name: dto.name,
                description: dto.description,
                component_type: dto.component_type,
            },
            bundle: BundleLocation {
                url: dto.bundle_url,
                format,
                export_name: dto.export_name,
                global_name: dto.global_name,
            },
        }
    }
}
