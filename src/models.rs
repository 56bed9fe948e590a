//! Data models for the test metric counter.
//!
//! This module contains the core data structures passed between the
//! document source, the table classifier and the aggregator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category name for unit test counts.
pub const UNIT: &str = "unit";

/// Category name for WebdriverIO test counts.
pub const WDIO: &str = "wdio";

/// A fetched document with its markup payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    /// Document identifier in the remote store.
    pub id: String,
    /// Human readable title.
    pub title: String,
    /// Markup payload (storage format HTML).
    pub content: String,
}

/// An entry returned by a paginated collection listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
}

impl DocumentSummary {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// Per-category counts for one document, or for a whole run.
///
/// Categories that were configured but never matched are kept with a
/// value of zero so that every result carries the full category set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCounts {
    counts: BTreeMap<String, f64>,
}

impl PageCounts {
    /// Creates counts with every given category set to zero.
    pub fn zeroed<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            counts: categories.into_iter().map(|c| (c.into(), 0.0)).collect(),
        }
    }

    /// Adds `value` to the bucket for `category`, creating it if needed.
    pub fn add(&mut self, category: &str, value: f64) {
        *self.counts.entry(category.to_string()).or_insert(0.0) += value;
    }

    /// Returns the count for `category` (0 when absent).
    pub fn get(&self, category: &str) -> f64 {
        self.counts.get(category).copied().unwrap_or(0.0)
    }

    pub fn unit(&self) -> f64 {
        self.get(UNIT)
    }

    pub fn wdio(&self) -> f64 {
        self.get(WDIO)
    }

    /// Sum across all categories.
    pub fn total(&self) -> f64 {
        self.counts.values().sum()
    }

    /// Folds another set of counts into this one.
    pub fn merge(&mut self, other: &PageCounts) {
        for (category, value) in &other.counts {
            self.add(category, *value);
        }
    }

    /// Iterates categories in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Per-document detail record in an aggregate result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDetail {
    pub page_id: String,
    pub title: String,
    pub unit_count: f64,
    pub wdio_count: f64,
    /// Every configured category, including `unit` and `wdio`.
    pub counts: PageCounts,
}

impl PageDetail {
    pub fn new(page_id: impl Into<String>, title: impl Into<String>, counts: PageCounts) -> Self {
        Self {
            page_id: page_id.into(),
            title: title.into(),
            unit_count: counts.unit(),
            wdio_count: counts.wdio(),
            counts,
        }
    }

    /// Sum of all category counts for this document.
    pub fn total(&self) -> f64 {
        self.counts.total()
    }
}

/// Result of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    /// Number of documents considered (not only those with counts).
    pub total_pages: usize,
    pub total_unit_tests: f64,
    pub total_wdio_tests: f64,
    /// Totals for every configured category.
    pub totals: PageCounts,
    /// Detail records in processing order.
    pub page_details: Vec<PageDetail>,
}

impl AggregateResult {
    pub fn new(total_pages: usize, totals: PageCounts, page_details: Vec<PageDetail>) -> Self {
        Self {
            total_pages,
            total_unit_tests: totals.unit(),
            total_wdio_tests: totals.wdio(),
            totals,
            page_details,
        }
    }

    /// A result for a run that considered no documents.
    pub fn empty(totals: PageCounts) -> Self {
        Self::new(0, totals, Vec::new())
    }

    /// True when no document was considered.
    pub fn is_empty(&self) -> bool {
        self.total_pages == 0
    }
}

/// How the analyzed documents were selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// An explicit list of page ids.
    Pages,
    /// Every page in a space.
    Space,
}

/// Metadata about a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    /// Confluence site that was queried.
    pub base_url: String,
    pub mode: AnalysisMode,
    /// Space key, or the page ids joined with commas.
    pub target: String,
    pub analysis_date: DateTime<Utc>,
    pub duration_seconds: f64,
}

/// A run result together with its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    #[serde(flatten)]
    pub result: AggregateResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_counts_have_all_categories() {
        let counts = PageCounts::zeroed([UNIT, WDIO]);
        assert_eq!(counts.iter().count(), 2);
        assert_eq!(counts.unit(), 0.0);
        assert_eq!(counts.wdio(), 0.0);
        assert_eq!(counts.total(), 0.0);
    }

    #[test]
    fn test_merge_counts() {
        let mut totals = PageCounts::zeroed([UNIT, WDIO]);
        let mut page = PageCounts::default();
        page.add(UNIT, 4.0);
        page.add("e2e", 1.5);

        totals.merge(&page);
        totals.merge(&page);

        assert_eq!(totals.unit(), 8.0);
        assert_eq!(totals.wdio(), 0.0);
        assert_eq!(totals.get("e2e"), 3.0);
        assert_eq!(totals.total(), 11.0);
    }

    #[test]
    fn test_page_detail_copies_named_counts() {
        let mut counts = PageCounts::zeroed([UNIT, WDIO]);
        counts.add(WDIO, 3.5);
        let detail = PageDetail::new("42", "Release", counts);
        assert_eq!(detail.unit_count, 0.0);
        assert_eq!(detail.wdio_count, 3.5);
        assert_eq!(detail.total(), 3.5);
    }

    #[test]
    fn test_aggregate_result_json_shape() {
        let mut counts = PageCounts::zeroed([UNIT, WDIO]);
        counts.add(UNIT, 2.0);
        let result = AggregateResult::new(1, counts.clone(), vec![PageDetail::new("7", "A", counts)]);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["totalPages"], 1);
        assert_eq!(json["totalUnitTests"], 2.0);
        assert_eq!(json["totalWdioTests"], 0.0);
        assert_eq!(json["pageDetails"][0]["pageId"], "7");
        assert_eq!(json["pageDetails"][0]["unitCount"], 2.0);
        assert_eq!(json["totals"]["unit"], 2.0);
    }

    #[test]
    fn test_empty_result() {
        let result = AggregateResult::empty(PageCounts::zeroed([UNIT, WDIO]));
        assert!(result.is_empty());
        assert_eq!(result.total_unit_tests, 0.0);
        assert_eq!(result.total_wdio_tests, 0.0);
        assert!(result.page_details.is_empty());
    }
}
