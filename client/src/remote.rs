//! Remote quote source.
//!
//! The remote is a mock posts API. Its objects are reinterpreted as quotes:
//! only the first few entries of each response are used, and only their
//! `id`, `title`, and `body` fields are read.

use async_trait::async_trait;
use quotebook_engine::QuoteRecord;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::config::{Config, RemoteMapping};
use crate::error::{AppError, Result};

/// Category given to quotes read from titles.
pub const SERVER_CATEGORY: &str = "Server";

/// Text used when a remote object has no body.
pub const PLACEHOLDER_TEXT: &str = "Server generated quote.";

/// Fetch and publish collaborator for sync.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch the current remote batch, already shaped as quotes.
    async fn fetch_quotes(&self) -> Result<Vec<QuoteRecord>>;

    /// Send a newly added quote to the remote.
    async fn publish(&self, record: &QuoteRecord) -> Result<()>;
}

/// A remote object as far as we care about it.
#[derive(Debug, Deserialize)]
struct RemotePost {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: Option<String>,
}

/// Body sent when publishing a quote.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PublishRequest<'a> {
    title: &'a str,
    body: &'a str,
    user_id: u64,
}

/// [`RemoteSource`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    url: String,
    limit: usize,
    mapping: RemoteMapping,
}

impl HttpRemote {
    /// Create a remote for `url`. `timeout` bounds every request.
    pub fn new(
        url: impl Into<String>,
        limit: usize,
        mapping: RemoteMapping,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            limit,
            mapping,
        })
    }

    /// Create a remote from the client configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.remote_url.clone(),
            config.remote_limit,
            config.remote_mapping,
            config.fetch_timeout,
        )
    }
}

#[async_trait]
impl RemoteSource for HttpRemote {
    async fn fetch_quotes(&self) -> Result<Vec<QuoteRecord>> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status(status));
        }

        let items: Vec<Value> = response.json().await?;
        let quotes = map_posts(&items, self.limit, self.mapping);

        tracing::debug!(
            received = items.len(),
            mapped = quotes.len(),
            url = %self.url,
            "Fetched remote batch"
        );

        Ok(quotes)
    }

    async fn publish(&self, record: &QuoteRecord) -> Result<()> {
        let request = PublishRequest {
            title: &record.category,
            body: &record.text,
            user_id: 1,
        };

        let response = self.client.post(&self.url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status(status));
        }
        Ok(())
    }
}

/// Shape the first `limit` remote objects as quotes.
///
/// Objects that are not readable, or that map to blank text, are skipped.
pub fn map_posts(items: &[Value], limit: usize, mapping: RemoteMapping) -> Vec<QuoteRecord> {
    items
        .iter()
        .take(limit)
        .filter_map(|item| serde_json::from_value::<RemotePost>(item.clone()).ok())
        .filter_map(|post| map_post(post, mapping))
        .collect()
}

fn map_post(post: RemotePost, mapping: RemoteMapping) -> Option<QuoteRecord> {
    let record = match mapping {
        RemoteMapping::Title => {
            let title = post.title?;
            QuoteRecord::new(capitalize(title.trim()), SERVER_CATEGORY).ok()?
        }
        RemoteMapping::Body => {
            let text = post
                .body
                .as_deref()
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(capitalize)
                .unwrap_or_else(|| PLACEHOLDER_TEXT.to_string());
            let category = post
                .title
                .as_deref()
                .and_then(|t| t.split_whitespace().next())
                .map(capitalize)
                .unwrap_or_else(|| SERVER_CATEGORY.to_string());
            QuoteRecord::new(text, category).ok()?
        }
    };

    Some(match post.id {
        Some(id) => record.with_id(id),
        None => record,
    })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
