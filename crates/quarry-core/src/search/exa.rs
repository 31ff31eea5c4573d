use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{SearchBackend, SearchDocument, SearchError, SearchRequest};

/// Client for the Exa search API (`POST /search` with page contents).
pub struct ExaClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl ExaClient {
    /// Creates a new Exa client.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl SearchBackend for ExaClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchDocument>, SearchError> {
        let url = format!("{}/search", self.base_url);
        let body = ExaSearchRequest::from(request);

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let payload: ExaSearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        Ok(payload.into_documents())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaSearchRequest {
    query: String,
    #[serde(rename = "type")]
    search_type: &'static str,
    num_results: u32,
    start_published_date: String,
    end_published_date: String,
    start_crawl_date: String,
    end_crawl_date: String,
    exclude_domains: Vec<String>,
    contents: ExaContents,
}

#[derive(Debug, Serialize)]
struct ExaContents {
    text: ExaTextOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaTextOptions {
    max_characters: u32,
}

impl From<&SearchRequest> for ExaSearchRequest {
    fn from(request: &SearchRequest) -> Self {
        let iso = |t: chrono::DateTime<chrono::Utc>| t.to_rfc3339_opts(SecondsFormat::Millis, true);
        Self {
            query: request.query.clone(),
            search_type: request.search_type.as_str(),
            num_results: request.max_results,
            start_published_date: iso(request.published.start),
            end_published_date: iso(request.published.end),
            start_crawl_date: iso(request.crawled.start),
            end_crawl_date: iso(request.crawled.end),
            exclude_domains: request.excluded_domains.clone(),
            contents: ExaContents {
                text: ExaTextOptions {
                    max_characters: request.max_content_chars,
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExaSearchResponse {
    #[serde(default)]
    results: Vec<ExaResult>,
}

#[derive(Debug, Deserialize)]
struct ExaResult {
    #[serde(default)]
    title: Option<String>,
    url: String,
    #[serde(default)]
    text: Option<String>,
}

impl ExaSearchResponse {
    fn into_documents(self) -> Vec<SearchDocument> {
        self.results
            .into_iter()
            .map(|r| SearchDocument {
                title: r.title,
                url: r.url,
                text: r.text,
            })
            .collect()
    }
}
