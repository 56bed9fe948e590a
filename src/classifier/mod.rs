//! Table classification.
//!
//! Reads every table in a document and sums the count column of rows
//! whose label matches a known test category.
//!
//! A row contributes when it has at least two cells: the first cell is the
//! label, the second the count. Labels are matched by case-insensitive
//! substring against each category's keywords, so "Unit Tests" and
//! "unit_count" both land in `unit`, and a label may match several
//! categories at once.

pub mod table;
pub mod text;
pub mod tokenizer;

use crate::models::{PageCounts, UNIT, WDIO};
use std::collections::BTreeMap;
use table::read_tables;
use text::parse_leading_float;
use tracing::debug;

/// Maps category names to the label substrings that select them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMatcher {
    categories: Vec<(String, Vec<String>)>,
}

impl Default for CategoryMatcher {
    fn default() -> Self {
        Self::new(default_categories())
    }
}

/// The built-in category table: each category matched by its own name.
pub fn default_categories() -> BTreeMap<String, Vec<String>> {
    [UNIT, WDIO]
        .into_iter()
        .map(|c| (c.to_string(), vec![c.to_string()]))
        .collect()
}

impl CategoryMatcher {
    /// Builds a matcher. Keywords are lowercased; empty keywords are dropped
    /// since they would match every label.
    pub fn new(categories: BTreeMap<String, Vec<String>>) -> Self {
        let categories = categories
            .into_iter()
            .map(|(name, keywords)| {
                let keywords = keywords
                    .into_iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                (name, keywords)
            })
            .collect();
        Self { categories }
    }

    /// Category names in name order.
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }

    /// Categories whose keywords occur in `label` (already lowercased).
    pub fn matching<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.categories
            .iter()
            .filter(move |(_, keywords)| keywords.iter().any(|k| label.contains(k.as_str())))
            .map(|(name, _)| name.as_str())
    }

    /// Zero counts for every category.
    pub fn empty_counts(&self) -> PageCounts {
        PageCounts::zeroed(self.category_names())
    }
}

/// Classifies document markup into per-category counts.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    matcher: CategoryMatcher,
}

impl Classifier {
    pub fn new(matcher: CategoryMatcher) -> Self {
        Self { matcher }
    }

    pub fn matcher(&self) -> &CategoryMatcher {
        &self.matcher
    }

    /// Sums the counts of matching rows across all tables in `content`.
    ///
    /// Never fails: markup without tables, or without matching rows, gives
    /// zero for every category.
    pub fn classify(&self, content: &str) -> PageCounts {
        let mut counts = self.matcher.empty_counts();
        let tables = read_tables(content);

        for table in &tables {
            for row in &table.rows {
                self.classify_row(row, &mut counts);
            }
        }

        debug!(
            "Classified {} tables: {} total",
            tables.len(),
            counts.total()
        );
        counts
    }

    fn classify_row(&self, row: &[String], counts: &mut PageCounts) {
        let [label, raw_value, ..] = row else {
            return;
        };

        // Non-numeric count cells are routine noise.
        let Some(value) = parse_leading_float(raw_value.trim()) else {
            return;
        };
        if !value.is_finite() || value < 0.0 {
            debug!("Skipping count '{}' for label '{}'", raw_value.trim(), label.trim());
            return;
        }

        let label = label.trim().to_lowercase();
        for category in self.matcher.matching(&label) {
            counts.add(category, value);
        }
    }
}
