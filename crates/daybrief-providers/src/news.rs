//! Keyword headline search against the Hacker News Algolia API.
//!
//! News is non-critical: every failure is logged and comes back as an empty
//! list, so callers never distinguish "provider error" from "no results".

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use daybrief_core::{NetworkError, ReqwestErrorExt};
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::types::{Location, NewsItem};

pub const SOURCE_NAME: &str = "Hacker News";
pub const HITS_PER_PAGE: u32 = 6;

pub const GENERAL_QUERY: &str = "world news";
pub const EDUCATION_QUERY: &str = "education learning";
/// Used for tech news when the user has no interests.
pub const DEFAULT_TECH_QUERY: &str = "programming technology";

/// Only the first few interests are searched to bound request fan-out.
pub const MAX_TECH_TOPICS: usize = 3;
/// Merged tech headlines are truncated to this many items.
pub const MAX_TECH_ITEMS: usize = 8;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: Option<String>,
    url: Option<String>,
    created_at: Option<String>,
}

impl SearchHit {
    fn into_item(self) -> Option<NewsItem> {
        let title = self.title.filter(|t| !t.is_empty())?;
        let link = self.url.filter(|u| !u.is_empty())?;
        let published_at = self
            .created_at
            .and_then(|s| s.parse::<DateTime<Utc>>().ok());

        Some(NewsItem {
            title,
            link,
            source: SOURCE_NAME.to_string(),
            published_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewsProvider {
    client: Client,
    base_url: String,
}

impl NewsProvider {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Search stories for `query`. Returns an empty list on any failure.
    #[instrument(skip(self), level = "debug")]
    pub async fn search(&self, query: &str) -> Vec<NewsItem> {
        match self.try_search(query).await {
            Ok(items) => dedup_by_title(items),
            Err(e) => {
                tracing::warn!("News search for {:?} failed: {}", query, e);
                Vec::new()
            }
        }
    }

    async fn try_search(&self, query: &str) -> Result<Vec<NewsItem>, NetworkError> {
        let url = format!("{}/api/v1/search", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("query", query.to_string()),
                ("tags", "story".to_string()),
                ("hitsPerPage", HITS_PER_PAGE.to_string()),
            ])
            .send()
            .await
            .map_err(ReqwestErrorExt::into_network_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::from_status(status));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(ReqwestErrorExt::into_network_error)?;

        Ok(body
            .hits
            .into_iter()
            .filter_map(SearchHit::into_item)
            .collect())
    }

    pub async fn general(&self) -> Vec<NewsItem> {
        self.search(GENERAL_QUERY).await
    }

    pub async fn education(&self) -> Vec<NewsItem> {
        self.search(EDUCATION_QUERY).await
    }

    /// Headlines for the user's interests.
    ///
    /// With no interests the default query is used. Otherwise the first
    /// [`MAX_TECH_TOPICS`] interests are searched in parallel and the batches
    /// merged in interest order, see [`merge_topic_batches`].
    #[instrument(skip(self), level = "info")]
    pub async fn technology(&self, interests: &[String]) -> Vec<NewsItem> {
        if interests.is_empty() {
            return self.search(DEFAULT_TECH_QUERY).await;
        }

        let batches = join_all(
            interests
                .iter()
                .take(MAX_TECH_TOPICS)
                .map(|topic| self.search(topic)),
        )
        .await;

        merge_topic_batches(batches, MAX_TECH_ITEMS)
    }

    /// Headlines mentioning the city and country.
    pub async fn local(&self, location: &Location) -> Vec<NewsItem> {
        self.search(&location.news_query()).await
    }

    /// Weather and climate stories for a city.
    pub async fn weather_news(&self, city: &str) -> Vec<NewsItem> {
        self.search(&format!("{} weather climate", city)).await
    }
}

/// Drop items whose title was already seen, keeping the first occurrence.
pub fn dedup_by_title(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.title.clone()))
        .collect()
}

/// Concatenate per-topic batches in order, dedup by title, and cap the result.
pub fn merge_topic_batches(batches: Vec<Vec<NewsItem>>, cap: usize) -> Vec<NewsItem> {
    let mut merged = dedup_by_title(batches.into_iter().flatten().collect());
    merged.truncate(cap);
    merged
}
