//! Page fetcher for TMDB-style REST endpoints.
//!
//! The API paginates with 1-based page numbers and a fixed response
//! envelope; this adapter maps that onto the cache's opaque-cursor
//! model. The token simply carries the decimal page number, and the
//! next token exists while `page < total_pages`.

use async_trait::async_trait;
use reel_query::{ErrorInfo, Page, PageFetcher, PageToken, QueryKey};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::policy::{EndpointClass, FetchPolicy};

/// Paginated response envelope shared by all list endpoints.
#[derive(Debug, Deserialize)]
struct PagedEnvelope<T> {
    page: u32,
    results: Vec<T>,
    #[serde(default)]
    total_pages: Option<u32>,
    #[serde(default)]
    total_results: Option<u64>,
}

/// HTTP page fetcher with per-endpoint-class timeout and retry.
pub struct TmdbFetcher {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    policy_override: Option<FetchPolicy>,
}

impl TmdbFetcher {
    /// Create a fetcher against the given API base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: None,
            policy_override: None,
        }
    }

    /// Set the `api_key` query parameter sent with every request.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Use a preconfigured HTTP client.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Override the per-endpoint-class policy defaults.
    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy_override = Some(policy);
        self
    }

    fn policy_for(&self, endpoint: &str) -> FetchPolicy {
        self.policy_override
            .clone()
            .unwrap_or_else(|| FetchPolicy::from_class(EndpointClass::classify(endpoint)))
    }

    fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), endpoint)
    }

    fn query_pairs(&self, key: &QueryKey, page: u32) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = key
            .params()
            .iter()
            .map(|(name, value)| (name.clone(), query_value(value)))
            .collect();
        pairs.push(("page".to_string(), page.to_string()));
        if let Some(api_key) = &self.api_key {
            pairs.push(("api_key".to_string(), api_key.clone()));
        }
        pairs
    }

    async fn send<T: DeserializeOwned>(
        &self,
        key: &QueryKey,
        page: u32,
    ) -> Result<PagedEnvelope<T>, ErrorInfo> {
        let endpoint = key.endpoint();
        let policy = self.policy_for(endpoint);
        let url = self.url_for(endpoint);
        let pairs = self.query_pairs(key, page);

        let mut attempt = 0u32;
        loop {
            let request = self
                .http
                .get(&url)
                .query(&pairs)
                .timeout(policy.timeout);

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if (500..600).contains(&status) && policy.should_retry(attempt) {
                        tracing::debug!(%endpoint, status, attempt, "retrying after server error");
                        tokio::time::sleep(policy.backoff.delay_for_attempt(attempt)).await;
                        attempt += 1;
                        continue;
                    }
                    if status >= 400 {
                        return Err(ErrorInfo::new(status, format!("HTTP {status} for {endpoint}")));
                    }
                    return response
                        .json::<PagedEnvelope<T>>()
                        .await
                        .map_err(|e| ErrorInfo::new(0, format!("malformed response: {e}")));
                }
                Err(e) => {
                    if policy.should_retry(attempt) {
                        tracing::debug!(%endpoint, attempt, error = %e, "retrying after transport error");
                        tokio::time::sleep(policy.backoff.delay_for_attempt(attempt)).await;
                        attempt += 1;
                        continue;
                    }
                    let code = if e.is_timeout() { 408 } else { 0 };
                    return Err(ErrorInfo::new(code, e.to_string()));
                }
            }
        }
    }
}

#[async_trait(?Send)]
impl<T: DeserializeOwned + 'static> PageFetcher<T> for TmdbFetcher {
    async fn fetch_page(
        &self,
        key: &QueryKey,
        token: Option<&PageToken>,
    ) -> Result<Page<T>, ErrorInfo> {
        let page_number = match token {
            Some(token) => token
                .as_str()
                .parse::<u32>()
                .map_err(|_| ErrorInfo::new(0, format!("malformed page token `{token}`")))?,
            None => 1,
        };

        let envelope = self.send::<T>(key, page_number).await?;
        Ok(page_from_envelope(envelope, token.cloned()))
    }
}

fn page_from_envelope<T>(envelope: PagedEnvelope<T>, self_token: Option<PageToken>) -> Page<T> {
    let has_more = envelope
        .total_pages
        .map(|total| envelope.page < total)
        .unwrap_or(false);

    let mut page = Page::new(envelope.results);
    page.self_token = self_token;
    page.next_token = has_more.then(|| PageToken::new((envelope.page + 1).to_string()));
    page.total_count = envelope.total_results;
    page
}

/// Render a key parameter as a query-string value.
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
