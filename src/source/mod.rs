//! Document sources.
//!
//! The aggregator reads documents through the [`DocumentSource`] trait so
//! that the transport can be swapped; [`ConfluenceClient`] is the HTTP
//! implementation.

pub mod confluence;

pub use confluence::ConfluenceClient;

use crate::models::DocumentSummary;
use thiserror::Error;

/// Errors that can occur when talking to a document store.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the server.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// The response could not be interpreted.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Metadata for a single document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub title: String,
}

/// Read access to a collection of documents.
#[allow(async_fn_in_trait)]
pub trait DocumentSource {
    /// Lists one page of documents in a collection, starting at `offset`.
    async fn list_documents(
        &self,
        collection: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<DocumentSummary>, SourceError>;

    /// Fetches the markup body of a document; empty when it has none.
    async fn get_document_content(&self, id: &str) -> Result<String, SourceError>;

    /// Fetches the metadata (title) of a document.
    async fn get_document_metadata(&self, id: &str) -> Result<DocumentMetadata, SourceError>;
}
