// src/services/feed.rs

//! Feed fetching service.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};

/// Source of raw feed documents.
///
/// The poll loop depends only on this trait so cycles can run against
/// canned documents in tests.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the current feed document as decoded text.
    async fn fetch(&self) -> Result<String>;
}

/// HTTP client for the active-calls endpoint.
///
/// One outbound request per `fetch`, bounded by the client timeout. Retry
/// policy belongs to the poll loop, not here.
pub struct HttpFeedClient {
    client: Client,
    url: String,
}

impl HttpFeedClient {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl FeedSource for HttpFeedClient {
    async fn fetch(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(AppError::fetch)?
            .error_for_status()
            .map_err(AppError::fetch)?;

        let bytes = response.bytes().await.map_err(AppError::fetch)?;
        Ok(decode_feed(&bytes))
    }
}

/// Decode raw feed bytes, tolerating a UTF-8 byte order mark and replacing
/// undecodable bytes instead of failing.
pub fn decode_feed(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text.into_owned(),
    }
}
