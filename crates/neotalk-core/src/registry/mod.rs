// ── Built-in component registry ──
//
// Static lookup from widget type key to metadata. Extension widgets live in
// `crate::dynamic`; `ComponentCatalog` unifies both.

mod builtin;
mod catalog;
mod filter;

use std::collections::BTreeMap;

use strum::IntoEnumIterator;

use crate::model::{ComponentCategory, ComponentMeta};

pub use catalog::{ComponentCatalog, ComponentOrigin};
pub use filter::{ComponentFilter, ComponentGroup};

/// Metadata for a built-in widget type. Unknown types yield `None`.
pub fn get_component_meta(component_type: &str) -> Option<&'static ComponentMeta> {
    builtin::BUILTINS.get(component_type)
}

/// Every built-in widget, in registry order.
pub fn builtin_components() -> &'static [ComponentMeta] {
    &builtin::BUILTINS.entries
}

pub fn is_builtin(component_type: &str) -> bool {
    get_component_meta(component_type).is_some()
}

/// Built-in widgets matching `filter`, in registry order.
pub fn filter_components(filter: &ComponentFilter) -> Vec<&'static ComponentMeta> {
    let matches = filter.matcher();
    builtin_components()
        .iter()
        .filter(|meta| matches(meta))
        .collect()
}

/// Matching built-ins bucketed by category in display order. Empty
/// categories are omitted.
pub fn group_components_by_category(
    filter: &ComponentFilter,
) -> Vec<ComponentGroup<&'static ComponentMeta>> {
    group_by_category(filter_components(filter), |m| m.category)
}

pub(crate) fn group_by_category<M>(
    items: Vec<M>,
    category_of: impl Fn(&M) -> ComponentCategory,
) -> Vec<ComponentGroup<M>> {
    let mut buckets: BTreeMap<ComponentCategory, Vec<M>> = BTreeMap::new();
    for item in items {
        buckets.entry(category_of(&item)).or_default().push(item);
    }
    ComponentCategory::iter()
        .filter_map(|category| {
            buckets.remove(&category).map(|components| ComponentGroup {
                category,
                components,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn value_card_default_props() {
        let meta = get_component_meta("value-card").unwrap();
        assert_eq!(meta.default_prop("size"), Some(&json!("md")));
        assert_eq!(meta.default_prop("variant"), Some(&json!("default")));
        assert!(meta.accepts_prop("unit"));
        assert!(!meta.accepts_prop("bogus"));
        assert!(meta.variant("compact"));
    }

    #[test]
    fn unknown_type_is_none() {
        assert!(get_component_meta("does-not-exist").is_none());
        assert!(!is_builtin(""));
    }

    #[test]
    fn type_keys_are_unique() {
        let keys: HashSet<_> = builtin_components()
            .iter()
            .map(|m| m.component_type.as_str())
            .collect();
        assert_eq!(keys.len(), builtin_components().len());
    }

    #[test]
    fn defaults_fit_size_constraints() {
        for meta in builtin_components() {
            let sc = meta.size_constraints;
            assert!(
                sc.contains(sc.default_w, sc.default_h),
                "{} default size out of range",
                meta.component_type
            );
        }
    }

    #[test]
    fn search_for_led_matches_type_name_and_description() {
        let hits = filter_components(&ComponentFilter::all().search("led"));
        let types: Vec<_> = hits.iter().map(|m| m.component_type.as_str()).collect();
        // "filled" and "acknowledge" match by description.
        assert_eq!(types, ["led-indicator", "area-chart", "alert-panel"]);
    }

    #[test]
    fn search_is_case_insensitive() {
        let hits = filter_components(&ComponentFilter::all().search("  PIE "));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].component_type, "pie-chart");
    }

    #[test]
    fn filter_by_category_and_capability() {
        let charts = filter_components(&ComponentFilter::all().category(ComponentCategory::Charts));
        assert!(charts.iter().all(|m| m.category == ComponentCategory::Charts));
        assert!(!charts.is_empty());

        let static_only = filter_components(&ComponentFilter::all().with_data_source(false));
        assert!(static_only.iter().all(|m| !m.has_data_source));
        assert!(static_only.iter().any(|m| m.component_type == "markdown-display"));
    }

    #[test]
    fn groups_follow_display_order_and_skip_empty() {
        let groups = group_components_by_category(&ComponentFilter::all().search("chart"));
        let cats: Vec<_> = groups.iter().map(|g| g.category).collect();
        assert_eq!(cats, [ComponentCategory::Charts]);

        let all = group_components_by_category(&ComponentFilter::all());
        let order: Vec<_> = all.iter().map(|g| g.category).collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
    }
}
