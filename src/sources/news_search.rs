use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{
    get_json, into_source_result, not_configured, str_at, AdapterKind, CompanyQuery,
    SourceAdapter,
};
use crate::config::ApiEndpoint;
use crate::errors::AppError;
use crate::models::{CompanyFields, SourceResult};

const MAX_HEADLINES: usize = 5;

/// Recent news lookup (NewsAPI `everything` endpoint).
pub struct NewsSearchAdapter {
    client: Client,
    endpoint: ApiEndpoint,
}

impl NewsSearchAdapter {
    pub fn new(client: Client, endpoint: ApiEndpoint) -> Self {
        Self { client, endpoint }
    }

    async fn lookup(&self, query: &CompanyQuery, api_key: &str) -> Result<CompanyFields, AppError> {
        let phrase = format!("\"{}\"", query.company_name);
        let page_size = (MAX_HEADLINES * 2).to_string();
        let url = reqwest::Url::parse_with_params(
            &format!("{}/v2/everything", self.endpoint.base_url),
            &[
                ("q", phrase.as_str()),
                ("sortBy", "publishedAt"),
                ("language", "en"),
                ("pageSize", page_size.as_str()),
            ],
        )
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        tracing::info!("Fetching recent news for: {}", query.company_name);

        let body = get_json(
            self.client.get(url).header("X-Api-Key", api_key),
            "news search",
        )
        .await?;

        Ok(CompanyFields {
            news_headlines: relevant_headlines(&body, &query.company_name),
            ..Default::default()
        })
    }
}

#[async_trait]
impl SourceAdapter for NewsSearchAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::NewsSearch
    }

    async fn fetch(&self, query: &CompanyQuery) -> SourceResult {
        let Some(api_key) = self.endpoint.api_key.as_deref() else {
            return not_configured(self.kind());
        };
        into_source_result(self.kind(), self.lookup(query, api_key).await)
    }
}

/// Headlines that actually mention the company, newest first.
pub(crate) fn relevant_headlines(body: &Value, company_name: &str) -> Vec<String> {
    let needle = company_name.to_lowercase();
    body.get("articles")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|article| str_at(article, "/title"))
        .filter(|title| title.to_lowercase().contains(&needle))
        .take(MAX_HEADLINES)
        .collect()
}
