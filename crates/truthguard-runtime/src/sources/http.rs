//! Live feed fetcher over HTTP.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};

use super::{reddit, rss, FeedFetcher, FeedItem, FeedTarget, SourceError};
use crate::config::SourceSettings;

/// Fetches Reddit listings and RSS/Atom documents.
#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    client: Client,
    reddit_base_url: String,
    listing_limit: u32,
}

impl HttpFeedFetcher {
    /// Build a fetcher that presents the configured user agent and timeout.
    pub fn new(settings: &SourceSettings) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout)
            .build()
            .map_err(|e| SourceError::Http(e.to_string()))?;

        Ok(Self {
            client,
            reddit_base_url: settings.reddit_base_url.clone(),
            listing_limit: settings.listing_limit,
        })
    }

    async fn get(&self, url: &str, accept: &str) -> Result<String, SourceError> {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, accept)
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS | StatusCode::UNAUTHORIZED
        ) {
            return Err(SourceError::Blocked(status.as_u16()));
        }
        if !status.is_success() {
            return Err(SourceError::Http(format!("status {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, target: &FeedTarget) -> Result<Vec<FeedItem>, SourceError> {
        match target {
            FeedTarget::Subreddit { name } => {
                let url = reddit::listing_url(&self.reddit_base_url, name, self.listing_limit);
                let body = self.get(&url, "application/json").await?;
                reddit::parse_listing(&body, &self.reddit_base_url)
            }
            FeedTarget::Rss { url } => {
                let body = self
                    .get(url, "application/rss+xml, application/atom+xml, text/xml")
                    .await?;
                rss::parse_feed(&body)
            }
        }
    }
}
