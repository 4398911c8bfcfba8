use log::{debug, info, warn};
use reqwest::Client;
use rss::Channel;
use serde::Deserialize;

use crate::config::NewsSettings;
use crate::error::FetchError;

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Deserialize)]
struct Article {
    title: Option<String>,
}

// Placeholder title the search API uses for withdrawn articles.
const REMOVED_TITLE: &str = "[Removed]";

#[derive(Debug, Clone)]
pub enum NewsSource {
    /// Keyword search over a NewsAPI-compatible REST endpoint.
    Search {
        api_key: String,
        base_url: String,
        query: String,
        limit: usize,
    },
    /// A fixed list of RSS feeds, `per_feed` titles from each.
    Feeds { urls: Vec<String>, per_feed: usize },
}

impl NewsSource {
    /// The search endpoint is used whenever a key is available.
    pub fn select(settings: &NewsSettings, symbol: &str, api_key: Option<&str>) -> Self {
        match api_key {
            Some(key) => Self::Search {
                api_key: key.to_string(),
                base_url: settings.api_base_url.trim_end_matches('/').to_string(),
                query: settings.query_for(symbol),
                limit: settings.limit,
            },
            None => Self::Feeds {
                urls: settings.feeds_for(symbol),
                per_feed: settings.per_feed,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Search { .. } => "search",
            Self::Feeds { .. } => "rss",
        }
    }
}

pub struct NewsFetcher {
    client: Client,
    source: NewsSource,
}

impl NewsFetcher {
    pub fn new(client: Client, source: NewsSource) -> Self {
        Self { client, source }
    }

    /// Headlines from the configured source. A failing source contributes
    /// nothing rather than aborting the run.
    pub async fn fetch_headlines(&self) -> Vec<String> {
        info!("Fetching headlines from {} source", self.source.name());

        let headlines = match &self.source {
            NewsSource::Search {
                api_key,
                base_url,
                query,
                limit,
            } => match self.search(api_key, base_url, query, *limit).await {
                Ok(titles) => titles,
                Err(e) => {
                    warn!("News search failed: {}", e);
                    Vec::new()
                }
            },
            NewsSource::Feeds { urls, per_feed } => {
                let mut titles = Vec::new();
                for url in urls {
                    match self.read_feed(url, *per_feed).await {
                        Ok(feed_titles) => titles.extend(feed_titles),
                        Err(e) => warn!("Skipping feed {}: {}", url, e),
                    }
                }
                titles
            }
        };

        debug!("Collected {} headlines", headlines.len());
        headlines
    }

    async fn search(
        &self,
        api_key: &str,
        base_url: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<String>, FetchError> {
        let url = format!("{base_url}/v2/everything");
        let page_size = limit.to_string();

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", api_key)
            .header("Accept", "application/json")
            .query(&[
                ("q", query),
                ("language", "en"),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url,
                status: response.status(),
            });
        }

        let body: SearchResponse = response.json().await?;
        Ok(body
            .articles
            .into_iter()
            .filter_map(|a| a.title)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && t.as_str() != REMOVED_TITLE)
            .take(limit)
            .collect())
    }

    async fn read_feed(&self, url: &str, per_feed: usize) -> Result<Vec<String>, FetchError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let bytes = response.bytes().await?;
        let channel = Channel::read_from(&bytes[..])?;

        Ok(channel
            .items()
            .iter()
            .filter_map(|item| item.title())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .take(per_feed)
            .map(str::to_string)
            .collect())
    }
}
