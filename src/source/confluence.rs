//! Confluence REST API client.
//!
//! Implements [`DocumentSource`] over the `/rest/api/content` endpoints
//! using HTTP basic auth (username + API token).

use super::{DocumentMetadata, DocumentSource, SourceError};
use crate::config::Credentials;
use crate::models::DocumentSummary;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Paginated listing response.
#[derive(Debug, Deserialize)]
struct ContentList {
    #[serde(default)]
    results: Vec<ContentEntry>,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    id: String,
    #[serde(default)]
    title: String,
}

/// Single content response, with the storage body when expanded.
#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: Option<ContentBody>,
}

#[derive(Debug, Deserialize)]
struct ContentBody {
    #[serde(default)]
    storage: Option<StorageBody>,
}

#[derive(Debug, Deserialize)]
struct StorageBody {
    #[serde(default)]
    value: String,
}

impl Content {
    fn into_storage_value(self) -> String {
        self.body
            .and_then(|b| b.storage)
            .map(|s| s.value)
            .unwrap_or_default()
    }
}

/// HTTP client for a Confluence site.
pub struct ConfluenceClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    api_token: String,
}

impl ConfluenceClient {
    /// Create a client for the site described by `credentials`.
    pub fn new(credentials: &Credentials, timeout_seconds: u64) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(concat!("testtally/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: credentials.base_url.trim_end_matches('/').to_string(),
            username: credentials.username.clone(),
            api_token: credentials.api_token.clone(),
        })
    }

    fn content_url(&self, id: &str) -> String {
        format!("{}/rest/api/content/{}", self.base_url, id)
    }

    fn list_url(&self) -> String {
        format!("{}/rest/api/content", self.base_url)
    }

    /// Send an authenticated GET and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        debug!("GET {} {:?}", url, query);

        let response = self
            .http
            .get(url)
            .query(query)
            .basic_auth(&self.username, Some(&self.api_token))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = if status.is_success() {
            response.text().await?
        } else {
            response.text().await.unwrap_or_default()
        };
        decode_response(status, &body)
    }
}

/// Maps a response status and body to a decoded value or a [`SourceError`].
fn decode_response<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, SourceError> {
    if !status.is_success() {
        return Err(SourceError::Api {
            status: status.as_u16(),
            message: body.to_string(),
        });
    }

    serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))
}

impl DocumentSource for ConfluenceClient {
    async fn list_documents(
        &self,
        collection: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<DocumentSummary>, SourceError> {
        let query = [
            ("spaceKey", collection.to_string()),
            ("type", "page".to_string()),
            ("start", offset.to_string()),
            ("limit", limit.to_string()),
        ];
        let list: ContentList = self.get_json(&self.list_url(), &query).await?;

        Ok(list
            .results
            .into_iter()
            .map(|entry| DocumentSummary::new(entry.id, entry.title))
            .collect())
    }

    async fn get_document_content(&self, id: &str) -> Result<String, SourceError> {
        let query = [("expand", "body.storage".to_string())];
        let content: Content = self.get_json(&self.content_url(id), &query).await?;
        Ok(content.into_storage_value())
    }

    async fn get_document_metadata(&self, id: &str) -> Result<DocumentMetadata, SourceError> {
        let content: Content = self.get_json(&self.content_url(id), &[]).await?;
        Ok(DocumentMetadata {
            title: content.title,
        })
    }
}
