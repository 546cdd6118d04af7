//! RSS 2.0 fetch adapter.
//!
//! Downloads a feed over HTTP with [`reqwest`] and parses it with the
//! [`rss`](::rss) crate.  Parsing is split out into
//! [`RssFetcher::parse_channel`] so it can be tested without the network.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::{FetchAdapter, RawEntry};
use crate::error::FetchError;
use crate::registry::Source;

const UNTITLED: &str = "(untitled)";

/// Fetches RSS feeds over HTTP.
#[derive(Debug, Clone)]
pub struct RssFetcher {
    client: reqwest::Client,
}

impl RssFetcher {
    /// Build a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Convert an already-fetched channel into [`RawEntry`]s.
    ///
    /// Items with neither `<guid>` nor `<link>` have no usable identity and
    /// are dropped.  Missing or unparsable dates fall back to `fetched_at`.
    pub fn parse_channel(channel: &::rss::Channel, fetched_at: DateTime<Utc>) -> Vec<RawEntry> {
        channel
            .items()
            .iter()
            .filter_map(|item| {
                let uri = item
                    .guid()
                    .map(|g| g.value().to_string())
                    .or_else(|| item.link().map(String::from))?;

                let published = item
                    .pub_date()
                    .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or(fetched_at);

                Some(RawEntry {
                    uri,
                    title: item.title().unwrap_or(UNTITLED).to_string(),
                    description: item.description().map(String::from),
                    link: item.link().map(String::from),
                    published,
                })
            })
            .collect()
    }
}

#[async_trait]
impl FetchAdapter for RssFetcher {
    async fn fetch(&self, source: &Source) -> Result<Vec<RawEntry>, FetchError> {
        let response = self.client.get(&source.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let channel = ::rss::Channel::read_from(body.as_ref())
            .map_err(|e| FetchError::Parse(e.to_string()))?;
        let entries = Self::parse_channel(&channel, Utc::now());
        debug!(source = %source.name, entries = entries.len(), "fetched feed");
        Ok(entries)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
