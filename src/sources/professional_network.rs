use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{
    get_json, int_at, into_source_result, not_configured, str_at, strings_at, AdapterKind,
    CompanyQuery, SourceAdapter,
};
use crate::config::ApiEndpoint;
use crate::errors::AppError;
use crate::models::{CompanyFields, SourceResult};

/// Professional-network company profile lookup.
pub struct ProfessionalNetworkAdapter {
    client: Client,
    endpoint: ApiEndpoint,
}

impl ProfessionalNetworkAdapter {
    pub fn new(client: Client, endpoint: ApiEndpoint) -> Self {
        Self { client, endpoint }
    }

    async fn lookup(&self, query: &CompanyQuery, api_key: &str) -> Result<CompanyFields, AppError> {
        let mut params = vec![("company_name", query.company_name.as_str())];
        if let Some(domain) = query.domain.as_deref() {
            params.push(("company_domain", domain));
        }

        let url = reqwest::Url::parse_with_params(
            &format!("{}/linkedin/company", self.endpoint.base_url),
            &params,
        )
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        tracing::info!(
            "Fetching professional-network profile for: {}",
            query.company_name
        );

        let body = get_json(self.client.get(url).bearer_auth(api_key), "professional network").await?;
        Ok(parse_company_profile(&body))
    }
}

#[async_trait]
impl SourceAdapter for ProfessionalNetworkAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::ProfessionalNetwork
    }

    async fn fetch(&self, query: &CompanyQuery) -> SourceResult {
        let Some(api_key) = self.endpoint.api_key.as_deref() else {
            return not_configured(self.kind());
        };
        into_source_result(self.kind(), self.lookup(query, api_key).await)
    }
}

pub(crate) fn parse_company_profile(body: &Value) -> CompanyFields {
    // Exact headcount when present, otherwise the lower end of the size range
    let employee_count = int_at(body, "/company_size_on_linkedin")
        .or_else(|| int_at(body, "/company_size/0"))
        .or_else(|| int_at(body, "/employee_count"));

    let headquarters = body.get("hq").and_then(|hq| {
        let parts: Vec<String> = ["/city", "/state", "/country"]
            .iter()
            .filter_map(|p| str_at(hq, p))
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    });

    let mut fields = CompanyFields {
        description: str_at(body, "/description").or_else(|| str_at(body, "/tagline")),
        employee_count,
        headquarters,
        founded_year: int_at(body, "/founded_year").and_then(|y| i32::try_from(y).ok()),
        industry: str_at(body, "/industry"),
        website: str_at(body, "/website"),
        categories: strings_at(body, "/specialities", "name"),
        ..Default::default()
    };

    if let Some(profile_url) = str_at(body, "/linkedin_url").or_else(|| str_at(body, "/url")) {
        fields.social_links.insert("linkedin".to_string(), profile_url);
    }

    fields
}
