use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use reqwest::Client;
use serde_json::Value;

use super::{
    get_json, int_at, into_source_result, not_configured, str_at, AdapterKind, CompanyQuery,
    SourceAdapter,
};
use crate::config::ApiEndpoint;
use crate::errors::AppError;
use crate::models::{CompanyFields, SourceResult};

/// General web / business-listing search (SerpAPI Google engine).
///
/// Reads the knowledge-graph panel, falling back to the first local listing.
pub struct BusinessSearchAdapter {
    client: Client,
    endpoint: ApiEndpoint,
}

impl BusinessSearchAdapter {
    pub fn new(client: Client, endpoint: ApiEndpoint) -> Self {
        Self { client, endpoint }
    }

    async fn lookup(&self, query: &CompanyQuery, api_key: &str) -> Result<CompanyFields, AppError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/search.json", self.endpoint.base_url),
            &[
                ("engine", "google"),
                ("q", query.company_name.as_str()),
                ("api_key", api_key),
            ],
        )
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        tracing::info!("Searching business listings for: {}", query.company_name);
        tracing::debug!(
            "Search URL: {}/search.json?engine=google&q={}&api_key=[REDACTED]",
            self.endpoint.base_url,
            query.company_name
        );

        let body = get_json(self.client.get(url), "business search").await?;
        Ok(parse_search_results(&body))
    }
}

#[async_trait]
impl SourceAdapter for BusinessSearchAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::BusinessSearch
    }

    async fn fetch(&self, query: &CompanyQuery) -> SourceResult {
        let Some(api_key) = self.endpoint.api_key.as_deref() else {
            return not_configured(self.kind());
        };
        into_source_result(self.kind(), self.lookup(query, api_key).await)
    }
}

pub(crate) fn parse_search_results(body: &Value) -> CompanyFields {
    if let Some(panel) = body.get("knowledge_graph") {
        return CompanyFields {
            description: str_at(panel, "/description"),
            employee_count: int_at(panel, "/number_of_employees")
                .or_else(|| int_at(panel, "/employees")),
            headquarters: str_at(panel, "/headquarters"),
            founded_year: str_at(panel, "/founded").as_deref().and_then(find_year),
            industry: str_at(panel, "/type").or_else(|| str_at(panel, "/industry")),
            website: str_at(panel, "/website"),
            ..Default::default()
        };
    }

    match body.pointer("/local_results/0") {
        Some(listing) => CompanyFields {
            description: str_at(listing, "/description"),
            headquarters: str_at(listing, "/address"),
            industry: str_at(listing, "/type"),
            website: str_at(listing, "/website"),
            ..Default::default()
        },
        None => CompanyFields::default(),
    }
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(1[89]\d{2}|20\d{2})\b").expect("year regex must compile"))
}

/// First four-digit year in free text such as `"March 2011, San Jose"`.
fn find_year(text: &str) -> Option<i32> {
    year_re()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
