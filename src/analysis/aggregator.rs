//! Multi-document aggregation.
//!
//! The [`Aggregator`] fetches documents one at a time from a
//! [`DocumentSource`], classifies each, and folds the counts into an
//! [`AggregateResult`]. Two traversal modes are offered:
//!
//! - explicit ids ([`Aggregator::analyze_by_ids`]): every processed id gets a
//!   detail record, even with zero counts;
//! - whole collection ([`Aggregator::analyze_space`]): only documents with a
//!   non-zero total get a detail record, but all are counted.
//!
//! Fetch failures for a single document never abort a run.

use crate::classifier::Classifier;
use crate::models::{AggregateResult, DocumentSummary, PageCounts, PageDetail, RawDocument};
use crate::source::{DocumentSource, SourceError};
use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default number of documents requested per listing call.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Errors surfaced by the strict collection traversal.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// Enumerating the collection failed.
    #[error("failed to list documents in '{collection}': {source}")]
    Listing {
        collection: String,
        #[source]
        source: SourceError,
    },
}

/// Orchestrates fetching and classifying documents.
pub struct Aggregator<S> {
    source: S,
    classifier: Classifier,
    page_size: usize,
    show_progress: bool,
}

impl<S: DocumentSource> Aggregator<S> {
    /// Create an aggregator over `source` using `classifier`.
    pub fn new(source: S, classifier: Classifier) -> Self {
        Self {
            source,
            classifier,
            page_size: DEFAULT_PAGE_SIZE,
            show_progress: false,
        }
    }

    /// Set the listing page size (values below 1 are raised to 1).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Show a progress bar while documents are processed.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    #[cfg(test)]
    fn source(&self) -> &S {
        &self.source
    }

    /// Analyze an explicit list of document ids, in order.
    ///
    /// Ids whose metadata cannot be fetched are logged and skipped; they
    /// are not counted in `total_pages`.
    pub async fn analyze_by_ids(&self, ids: &[String]) -> AggregateResult {
        let mut totals = self.classifier.matcher().empty_counts();
        if ids.is_empty() {
            return AggregateResult::empty(totals);
        }

        info!("Analyzing {} pages by id", ids.len());
        let progress = self.progress_bar(ids.len());
        let mut details = Vec::with_capacity(ids.len());

        for id in ids {
            progress.inc(1);

            let title = match self.source.get_document_metadata(id).await {
                Ok(metadata) => metadata.title,
                Err(e) => {
                    warn!("Failed to fetch metadata for page {}: {}", id, e);
                    continue;
                }
            };
            progress.set_message(title.clone());

            let document = self.fetch_document(id, title).await;
            let counts = self.classify_document(&document);
            totals.merge(&counts);
            details.push(PageDetail::new(document.id, document.title, counts));
        }

        progress.finish_and_clear();
        AggregateResult::new(details.len(), totals, details)
    }

    /// Analyze every document in a collection.
    ///
    /// A listing failure is logged and treated as an empty collection; use
    /// [`Aggregator::try_analyze_space`] to tell the two apart.
    pub async fn analyze_space(&self, collection: &str) -> AggregateResult {
        match self.try_analyze_space(collection).await {
            Ok(result) => result,
            Err(e) => {
                warn!("{}", e);
                AggregateResult::empty(self.classifier.matcher().empty_counts())
            }
        }
    }

    /// Analyze every document in a collection, failing if it cannot be listed.
    pub async fn try_analyze_space(&self, collection: &str) -> Result<AggregateResult, AnalyzeError> {
        let documents = self
            .list_all_documents(collection)
            .await
            .map_err(|source| AnalyzeError::Listing {
                collection: collection.to_string(),
                source,
            })?;

        let mut totals = self.classifier.matcher().empty_counts();
        if documents.is_empty() {
            info!("No pages found in space {}", collection);
            return Ok(AggregateResult::empty(totals));
        }

        info!("Analyzing {} pages in space {}", documents.len(), collection);
        let progress = self.progress_bar(documents.len());
        let mut details = Vec::new();

        for summary in &documents {
            progress.inc(1);
            progress.set_message(summary.title.clone());

            let document = self.fetch_document(&summary.id, summary.title.clone()).await;
            let counts = self.classify_document(&document);
            totals.merge(&counts);

            if counts.total() > 0.0 {
                details.push(PageDetail::new(document.id, document.title, counts));
            }
        }

        progress.finish_and_clear();
        Ok(AggregateResult::new(documents.len(), totals, details))
    }

    /// Enumerate all documents in a collection with offset/limit paging.
    ///
    /// Paging stops at the first page shorter than the page size.
    pub async fn list_all_documents(
        &self,
        collection: &str,
    ) -> Result<Vec<DocumentSummary>, SourceError> {
        let mut documents = Vec::new();
        let mut offset = 0;

        loop {
            let page = self
                .source
                .list_documents(collection, offset, self.page_size)
                .await?;
            let fetched = page.len();
            debug!("Listed {} pages at offset {}", fetched, offset);

            documents.extend(page);
            offset += fetched;

            if fetched < self.page_size {
                break;
            }
        }

        Ok(documents)
    }

    /// Fetch the body of one document; a fetch failure yields empty content.
    async fn fetch_document(&self, id: &str, title: String) -> RawDocument {
        let content = match self.source.get_document_content(id).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to fetch content for page {}: {}", id, e);
                String::new()
            }
        };

        RawDocument {
            id: id.to_string(),
            title,
            content,
        }
    }

    fn classify_document(&self, document: &RawDocument) -> PageCounts {
        let counts = self.classifier.classify(&document.content);
        debug!("Page {} ({}): {:?}", document.id, document.title, counts);
        counts
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}
