use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{
    get_json, humanize_label, into_source_result, not_configured, str_at, strings_at,
    AdapterKind, CompanyQuery, SourceAdapter,
};
use crate::config::ApiEndpoint;
use crate::errors::AppError;
use crate::models::{CompanyFields, SourceResult};

const FIELD_IDS: &str = "short_description,num_employees_enum,founded_on,location_identifiers,\
funding_total,last_funding_type,categories,investor_identifiers,website_url,linkedin,twitter";

/// Startup/funding registry organization lookup (Crunchbase v4 entity API).
pub struct FundingRegistryAdapter {
    client: Client,
    endpoint: ApiEndpoint,
}

impl FundingRegistryAdapter {
    pub fn new(client: Client, endpoint: ApiEndpoint) -> Self {
        Self { client, endpoint }
    }

    async fn lookup(&self, query: &CompanyQuery, api_key: &str) -> Result<CompanyFields, AppError> {
        let permalink = query.slug();
        if permalink.is_empty() {
            return Err(AppError::NotFound("empty company name".to_string()));
        }

        let url = reqwest::Url::parse_with_params(
            &format!("{}/entities/organizations/{}", self.endpoint.base_url, permalink),
            &[("user_key", api_key), ("field_ids", FIELD_IDS)],
        )
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        tracing::debug!(
            "Funding registry URL: {}/entities/organizations/{}?user_key=[REDACTED]",
            self.endpoint.base_url,
            permalink
        );

        let body = get_json(self.client.get(url), "funding registry").await?;
        Ok(parse_organization(&body))
    }
}

#[async_trait]
impl SourceAdapter for FundingRegistryAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::FundingRegistry
    }

    async fn fetch(&self, query: &CompanyQuery) -> SourceResult {
        let Some(api_key) = self.endpoint.api_key.as_deref() else {
            return not_configured(self.kind());
        };
        into_source_result(self.kind(), self.lookup(query, api_key).await)
    }
}

/// Maps an organization entity body onto company fields.
pub(crate) fn parse_organization(body: &Value) -> CompanyFields {
    let props = body.get("properties").unwrap_or(body);

    let mut fields = CompanyFields {
        description: str_at(props, "/short_description"),
        employee_count: str_at(props, "/num_employees_enum")
            .as_deref()
            .and_then(employee_enum_lower_bound),
        founded_year: str_at(props, "/founded_on/value")
            .or_else(|| str_at(props, "/founded_on"))
            .and_then(|date| date.get(..4).and_then(|y| y.parse().ok())),
        website: str_at(props, "/website_url"),
        total_funding_usd: props
            .pointer("/funding_total/value_usd")
            .and_then(Value::as_f64),
        funding_stage: str_at(props, "/last_funding_type").map(|t| humanize_label(&t)),
        categories: strings_at(props, "/categories", "value"),
        investors: strings_at(props, "/investor_identifiers", "value"),
        ..Default::default()
    };

    let locations = strings_at(props, "/location_identifiers", "value");
    if !locations.is_empty() {
        fields.headquarters = Some(locations.join(", "));
    }

    if let Some(industry) = fields.categories.first() {
        fields.industry = Some(industry.clone());
    }

    if let Some(linkedin) = str_at(props, "/linkedin/value") {
        fields.social_links.insert("linkedin".to_string(), linkedin);
    }
    if let Some(twitter) = str_at(props, "/twitter/value") {
        fields.social_links.insert("twitter".to_string(), twitter);
    }

    fields
}

/// `"c_00051_00100"` -> 51, `"c_10001_max"` -> 10001.
fn employee_enum_lower_bound(value: &str) -> Option<i64> {
    value
        .split('_')
        .nth(1)
        .and_then(|lower| lower.trim_start_matches('0').parse().ok())
}
