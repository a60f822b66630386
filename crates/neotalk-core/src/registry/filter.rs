// ── Filter predicates for component catalogs ──
//
// Used by the palette and the CLI to narrow the widget list without
// touching the registries themselves.

use crate::model::{ComponentCategory, ComponentMeta};

/// Conjunctive filter over component metadata. Unset criteria match all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentFilter {
    pub category: Option<ComponentCategory>,
    /// `Some(true)` keeps only widgets that bind data, `Some(false)` only
    /// those that do not.
    pub has_data_source: Option<bool>,
    /// Case-insensitive substring over name, description, and type key.
    pub search_query: Option<String>,
}

impl ComponentFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: ComponentCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_data_source(mut self, has: bool) -> Self {
        self.has_data_source = Some(has);
        self
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search_query = Some(query.into());
        self
    }

    /// Lowercased, trimmed search needle; `None` when blank.
    fn needle(&self) -> Option<String> {
        self.search_query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, meta: &ComponentMeta) -> bool {
        self.matcher()(meta)
    }

    /// Build the predicate once so the needle is lowercased a single time.
    pub(crate) fn matcher(&self) -> impl Fn(&ComponentMeta) -> bool + '_ {
        let needle = self.needle();
        move |meta| {
            self.category.is_none_or(|c| meta.category == c)
                && self
                    .has_data_source
                    .is_none_or(|has| meta.has_data_source == has)
                && needle.as_deref().is_none_or(|n| meta.matches_search(n))
        }
    }
}

/// Components of one category, in registry order.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ComponentGroup<M> {
    pub category: ComponentCategory,
    pub components: Vec<M>,
}
