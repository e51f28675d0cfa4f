//! Category index and the active category filter.

use crate::{Category, QuoteRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Sentinel value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "all";

/// The active category constraint.
///
/// Serializes as a plain string, with [`ALL_CATEGORIES`] standing for
/// [`CategoryFilter::All`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    /// Every record is eligible
    #[default]
    All,
    /// Only records in this exact category are eligible
    Exact(Category),
}

impl CategoryFilter {
    /// Parse a stored or selected value. Blank input means [`CategoryFilter::All`].
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Exact(value.to_string())
        }
    }

    /// The value as exposed to a selector.
    pub fn as_str(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_CATEGORIES,
            CategoryFilter::Exact(category) => category,
        }
    }

    /// Whether a record passes this filter.
    pub fn matches(&self, record: &QuoteRecord) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Exact(category) => record.in_category(category),
        }
    }
}

impl From<String> for CategoryFilter {
    fn from(value: String) -> Self {
        CategoryFilter::parse(&value)
    }
}

impl From<&str> for CategoryFilter {
    fn from(value: &str) -> Self {
        CategoryFilter::parse(value)
    }
}

impl From<CategoryFilter> for String {
    fn from(filter: CategoryFilter) -> Self {
        filter.as_str().to_string()
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sorted distinct categories plus the current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryIndex {
    categories: BTreeSet<Category>,
    selected: CategoryFilter,
}

impl CategoryIndex {
    /// Build an index over `records` with `selected` restored if still present.
    pub fn new<'a>(
        records: impl IntoIterator<Item = &'a QuoteRecord>,
        selected: CategoryFilter,
    ) -> Self {
        let mut index = Self {
            categories: BTreeSet::new(),
            selected,
        };
        index.refresh(records);
        index
    }

    /// Recompute categories from `records`.
    ///
    /// Ordering is byte-wise, so `"Zen"` sorts before `"art"`. A selection
    /// whose category disappeared falls back to [`CategoryFilter::All`].
    pub fn refresh<'a>(&mut self, records: impl IntoIterator<Item = &'a QuoteRecord>) {
        self.categories = records.into_iter().map(|r| r.category.clone()).collect();
        if !self.contains(&self.selected) {
            self.selected = CategoryFilter::All;
        }
    }

    /// Distinct categories in sorted order, without the `"all"` entry.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }

    /// Selector options: `"all"` first, then every category.
    pub fn options(&self) -> impl Iterator<Item = &str> {
        std::iter::once(ALL_CATEGORIES).chain(self.categories())
    }

    /// Number of distinct categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether there are no categories.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Whether `filter` can be selected.
    pub fn contains(&self, filter: &CategoryFilter) -> bool {
        match filter {
            CategoryFilter::All => true,
            CategoryFilter::Exact(category) => self.categories.contains(category),
        }
    }

    /// The current selection.
    pub fn selected(&self) -> &CategoryFilter {
        &self.selected
    }

    /// Select `filter`, falling back to [`CategoryFilter::All`] when unknown.
    ///
    /// Returns the selection actually applied.
    pub fn select(&mut self, filter: CategoryFilter) -> &CategoryFilter {
        self.selected = if self.contains(&filter) {
            filter
        } else {
            CategoryFilter::All
        };
        &self.selected
    }
}
