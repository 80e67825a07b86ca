use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::config::SearchConfig;
use crate::data_models::SearchResult;
use crate::error::ServiceError;

/// Anything that can turn a topic into ranked search results.
pub trait SearchService: Send + Sync {
    fn search(
        &self,
        topic: &str,
    ) -> impl Future<Output = Result<Vec<SearchResult>, ServiceError>> + Send;
}

/// Serper news search (`POST /news`).
pub struct SerperClient {
    client: reqwest::Client,
    config: SearchConfig,
}

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    tbs: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct SerperResponse {
    #[serde(default)]
    pub news: Vec<SerperNewsItem>,
}

#[derive(Debug, Deserialize)]
pub struct SerperNewsItem {
    #[serde(default)]
    pub title: String,
    pub link: Option<String>,
    #[serde(default)]
    pub snippet: String,
}

impl SerperClient {
    pub fn new(config: SearchConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/news", self.config.base_url.trim_end_matches('/'))
    }
}

/// Maps Serper's news items to search results, keeping relevance order.
/// Items without a link can't be cited, so they're skipped.
pub fn results_from_response(response: SerperResponse, limit: usize) -> Vec<SearchResult> {
    response
        .news
        .into_iter()
        .filter_map(|item| {
            let url = item.link.filter(|l| !l.trim().is_empty())?;
            Some(SearchResult::new(item.title, url, item.snippet))
        })
        .take(limit)
        .collect()
}

impl SearchService for SerperClient {
    async fn search(&self, topic: &str) -> Result<Vec<SearchResult>, ServiceError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ServiceError::MissingCredentials("SERPER_API_KEY"))?;

        let body = SerperRequest {
            q: topic,
            num: self.config.max_results,
            tbs: self.config.recency.as_deref(),
        };

        let res = self
            .client
            .post(self.endpoint())
            .header("X-API-KEY", api_key)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let response: SerperResponse = res.json().await?;
        Ok(results_from_response(response, self.config.max_results))
    }
}

#[test]
fn test_results_from_response() {
    let response: SerperResponse = serde_json::from_value(serde_json::json!({
        "searchParameters": { "q": "Finance", "type": "news" },
        "news": [
            { "title": "A", "link": "https://a.example", "snippet": "alpha", "date": "1 hour ago" },
            { "title": "no link", "snippet": "skipped" },
            { "title": "B", "link": "https://b.example", "snippet": "beta" },
            { "title": "C", "link": "https://c.example" },
            { "title": "D", "link": "https://d.example", "snippet": "delta" }
        ]
    }))
    .unwrap();

    let results = results_from_response(response, 3);
    let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B", "C"]);
    assert_eq!(results[2].snippet, "");
}

#[test]
fn test_results_from_empty_response() {
    let response: SerperResponse = serde_json::from_str("{}").unwrap();
    assert!(results_from_response(response, 4).is_empty());
}
