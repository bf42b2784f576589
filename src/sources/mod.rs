//! Source adapters and the shared plumbing they use.
//!
//! Every adapter resolves to a [`SourceResult`]; transport failures, bad
//! status codes and unparseable bodies are converted at this boundary and
//! never escape as errors.

mod business_search;
mod code_hosting;
mod funding_registry;
mod homepage;
mod news_search;
mod professional_network;
mod simulated;
mod tech_fingerprint;
mod website;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::{Config, SourceMode};
use crate::errors::AppError;
use crate::models::{CompanyFields, SourceId, SourceResult};

pub use business_search::BusinessSearchAdapter;
pub use code_hosting::CodeHostingAdapter;
pub use funding_registry::FundingRegistryAdapter;
pub use homepage::{HomepageFetcher, Page};
pub use news_search::NewsSearchAdapter;
pub use professional_network::ProfessionalNetworkAdapter;
pub use simulated::SimulatedAdapter;
pub use tech_fingerprint::{detect_technologies, TechFingerprintAdapter};
pub use website::{extract_site_details, WebsiteScraperAdapter};

/// User-Agent sent to every third-party source.
pub const USER_AGENT: &str = concat!("lead-enrichment-api/", env!("CARGO_PKG_VERSION"));

/// Concrete adapter implementation. Several adapters may back one logical
/// [`SourceId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    FundingRegistry,
    ProfessionalNetwork,
    CodeHosting,
    BusinessSearch,
    WebsiteScraper,
    TechFingerprint,
    NewsSearch,
}

impl AdapterKind {
    /// Registration order. Within one logical source, earlier adapters win
    /// scalar-field conflicts.
    pub const ALL: [AdapterKind; 7] = [
        AdapterKind::FundingRegistry,
        AdapterKind::ProfessionalNetwork,
        AdapterKind::CodeHosting,
        AdapterKind::BusinessSearch,
        AdapterKind::WebsiteScraper,
        AdapterKind::TechFingerprint,
        AdapterKind::NewsSearch,
    ];

    /// Logical source whose reliability weight this adapter contributes to.
    pub fn source_id(&self) -> SourceId {
        match self {
            AdapterKind::FundingRegistry => SourceId::FundingRegistry,
            AdapterKind::ProfessionalNetwork => SourceId::ProfessionalNetwork,
            AdapterKind::CodeHosting => SourceId::CodeHosting,
            AdapterKind::BusinessSearch
            | AdapterKind::WebsiteScraper
            | AdapterKind::TechFingerprint
            | AdapterKind::NewsSearch => SourceId::WebSearch,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterKind::FundingRegistry => "funding_registry",
            AdapterKind::ProfessionalNetwork => "professional_network",
            AdapterKind::CodeHosting => "code_hosting",
            AdapterKind::BusinessSearch => "business_search",
            AdapterKind::WebsiteScraper => "website_scraper",
            AdapterKind::TechFingerprint => "tech_fingerprint",
            AdapterKind::NewsSearch => "news_search",
        }
    }

    /// Adapters that can only work from the company's own website.
    pub fn needs_domain(&self) -> bool {
        matches!(
            self,
            AdapterKind::WebsiteScraper | AdapterKind::TechFingerprint
        )
    }
}

/// Company identifier handed to every adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompanyQuery {
    pub company_name: String,
    pub domain: Option<String>,
}

impl CompanyQuery {
    pub fn new(company_name: impl Into<String>, domain: Option<String>) -> Self {
        Self {
            company_name: company_name.into().trim().to_string(),
            domain: domain
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        }
    }

    /// URL-safe handle derived from the company name: `"Acme Cloud, Inc."` -> `"acme-cloud-inc"`.
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.company_name.len());
        for c in self.company_name.to_lowercase().chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c);
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        slug.trim_end_matches('-').to_string()
    }

    /// First label of the domain (`acme.io` -> `acme`), if a domain is known.
    pub fn domain_label(&self) -> Option<String> {
        let domain = self.domain.as_deref()?;
        let host = domain
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_start_matches("www.");
        host.split(['.', '/', ':'])
            .next()
            .filter(|label| !label.is_empty())
            .map(str::to_lowercase)
    }

    /// Cache key scoped to one adapter.
    pub fn cache_key(&self, kind: AdapterKind) -> String {
        format!(
            "{}:{}:{}",
            kind.as_str(),
            self.company_name.to_lowercase(),
            self.domain.as_deref().unwrap_or("").to_lowercase()
        )
    }
}

/// One external data source.
///
/// Implementations must be idempotent reads, must not fabricate values they
/// did not observe, and must always return a result rather than an error.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> AdapterKind;

    fn source_id(&self) -> SourceId {
        self.kind().source_id()
    }

    async fn fetch(&self, query: &CompanyQuery) -> SourceResult;
}

/// Builds the HTTP client shared by all live adapters.
pub fn build_http_client(timeout: Duration) -> Result<Client, AppError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::InternalError(format!("Failed to create HTTP client: {}", e)))
}

/// Builds the adapter registry for the configured mode. Live and simulated
/// adapters are never mixed in one registry.
pub fn build_adapters(config: &Config, client: &Client) -> Vec<Arc<dyn SourceAdapter>> {
    match config.source_mode {
        SourceMode::Simulated => AdapterKind::ALL
            .iter()
            .map(|kind| Arc::new(SimulatedAdapter::new(*kind)) as Arc<dyn SourceAdapter>)
            .collect(),
        SourceMode::Live => {
            let pages = Arc::new(HomepageFetcher::new(client.clone()));
            let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
                Arc::new(FundingRegistryAdapter::new(
                    client.clone(),
                    config.funding_registry.clone(),
                )),
                Arc::new(ProfessionalNetworkAdapter::new(
                    client.clone(),
                    config.professional_network.clone(),
                )),
                Arc::new(CodeHostingAdapter::new(
                    client.clone(),
                    config.code_hosting.clone(),
                )),
                Arc::new(BusinessSearchAdapter::new(client.clone(), config.search.clone())),
                Arc::new(WebsiteScraperAdapter::new(Arc::clone(&pages))),
                Arc::new(TechFingerprintAdapter::new(pages)),
                Arc::new(NewsSearchAdapter::new(client.clone(), config.news.clone())),
            ];
            adapters
        }
    }
}

// ============ Shared transport helpers ============

/// Sends `request` and decodes a JSON body.
///
/// 404 maps to `NotFound` (the source has no record); any other non-success
/// status, transport fault or parse failure maps to `ExternalApiError`.
pub(crate) async fn get_json(request: RequestBuilder, label: &str) -> Result<Value, AppError> {
    let response = request
        .send()
        .await
        .map_err(|e| AppError::ExternalApiError(format!("{} request failed: {}", label, e)))?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(AppError::NotFound(format!("{} has no record", label)));
    }
    if !status.is_success() {
        return Err(AppError::ExternalApiError(format!(
            "{} returned status {}",
            label, status
        )));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| AppError::ExternalApiError(format!("Failed to parse {} response: {}", label, e)))
}

/// Fetches an HTML page, returning its headers and body text. Status handling
/// matches [`get_json`].
pub(crate) async fn get_page(
    request: RequestBuilder,
    label: &str,
) -> Result<(HeaderMap, String), AppError> {
    let response = request
        .send()
        .await
        .map_err(|e| AppError::ExternalApiError(format!("{} request failed: {}", label, e)))?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(AppError::NotFound(format!("{} page not found", label)));
    }
    if !status.is_success() {
        return Err(AppError::ExternalApiError(format!(
            "{} returned status {}",
            label, status
        )));
    }

    let headers = response.headers().clone();
    let body = response
        .text()
        .await
        .map_err(|e| AppError::ExternalApiError(format!("Failed to read {} body: {}", label, e)))?;
    Ok((headers, body))
}

/// Homepage URL for the query's domain. A full URL is accepted as-is.
pub(crate) fn site_url(query: &CompanyQuery) -> Result<Url, AppError> {
    let domain = query
        .domain
        .as_deref()
        .ok_or_else(|| AppError::NotFound("no company domain".to_string()))?;

    let raw = if domain.starts_with("http://") || domain.starts_with("https://") {
        domain.to_string()
    } else {
        format!("https://{}", domain)
    };

    Url::parse(&raw).map_err(|e| AppError::BadRequest(format!("Invalid domain {}: {}", domain, e)))
}

/// Converts an adapter's internal outcome into its boundary result.
pub(crate) fn into_source_result(
    kind: AdapterKind,
    outcome: Result<CompanyFields, AppError>,
) -> SourceResult {
    let source_id = kind.source_id();
    match outcome {
        Ok(fields) if fields.is_empty() => {
            SourceResult::unavailable(source_id, format!("{}: no usable fields", kind.as_str()))
        }
        Ok(fields) => SourceResult::ok(source_id, fields),
        Err(AppError::NotFound(msg)) => {
            SourceResult::unavailable(source_id, format!("{}: {}", kind.as_str(), msg))
        }
        Err(e) => SourceResult::error(source_id, format!("{}: {}", kind.as_str(), e)),
    }
}

/// Result for an adapter whose credential is not configured.
pub(crate) fn not_configured(kind: AdapterKind) -> SourceResult {
    SourceResult::unavailable(
        kind.source_id(),
        format!("{}: not configured", kind.as_str()),
    )
}

// ============ JSON extraction helpers ============

/// Non-blank string at a JSON pointer.
pub(crate) fn str_at(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Integer at a JSON pointer; numeric strings like `"1,200 (2023)"` are read
/// up to the first non-digit.
pub(crate) fn int_at(value: &Value, pointer: &str) -> Option<i64> {
    match value.pointer(pointer)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => leading_integer(s),
        _ => None,
    }
}

pub(crate) fn leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let digits: String = rest
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .filter(|c| c.is_ascii_digit())
        .collect();
    let n: i64 = digits.parse().ok()?;
    Some(if negative { -n } else { n })
}

/// Strings from an array of strings or of objects carrying `field`.
pub(crate) fn strings_at(value: &Value, pointer: &str, field: &str) -> Vec<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Object(_) => item
                        .get(field)
                        .and_then(Value::as_str)
                        .map(|s| s.trim().to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// `"series_b"` -> `"Series B"`.
pub(crate) fn humanize_label(raw: &str) -> String {
    raw.split(['_', '-', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            if w.len() == 1 || w.eq_ignore_ascii_case("ipo") {
                w.to_uppercase()
            } else {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_slug_and_domain_label() {
        let query = CompanyQuery::new("  Acme Cloud, Inc. ", Some("www.acme-cloud.io".to_string()));
        assert_eq!(query.slug(), "acme-cloud-inc");
        assert_eq!(query.domain_label(), Some("acme-cloud".to_string()));

        let no_domain = CompanyQuery::new("Acme", Some("  ".to_string()));
        assert_eq!(no_domain.domain, None);
        assert_eq!(no_domain.domain_label(), None);
    }

    #[test]
    fn test_every_web_adapter_folds_into_web_search() {
        assert_eq!(AdapterKind::NewsSearch.source_id(), SourceId::WebSearch);
        assert_eq!(AdapterKind::TechFingerprint.source_id(), SourceId::WebSearch);
        assert_eq!(AdapterKind::WebsiteScraper.source_id(), SourceId::WebSearch);
        assert_eq!(AdapterKind::BusinessSearch.source_id(), SourceId::WebSearch);
        assert_eq!(AdapterKind::CodeHosting.source_id(), SourceId::CodeHosting);
    }

    #[test]
    fn test_into_source_result_classification() {
        let kind = AdapterKind::CodeHosting;

        let empty = into_source_result(kind, Ok(CompanyFields::default()));
        assert_eq!(empty.status, crate::models::SourceStatus::Unavailable);

        let missing = into_source_result(kind, Err(AppError::NotFound("gone".to_string())));
        assert_eq!(missing.status, crate::models::SourceStatus::Unavailable);

        let broken = into_source_result(kind, Err(AppError::ExternalApiError("500".to_string())));
        assert_eq!(broken.status, crate::models::SourceStatus::Error);
        assert!(broken.reason.unwrap().starts_with("code_hosting:"));
    }

    #[test]
    fn test_json_helpers() {
        let body = json!({
            "name": "  Acme ",
            "employees": "1,200 (2023)",
            "repos": 17,
            "tags": ["saas", {"value": "fintech"}, 3, ""],
        });

        assert_eq!(str_at(&body, "/name"), Some("Acme".to_string()));
        assert_eq!(str_at(&body, "/missing"), None);
        assert_eq!(int_at(&body, "/employees"), Some(1200));
        assert_eq!(int_at(&body, "/repos"), Some(17));
        assert_eq!(
            strings_at(&body, "/tags", "value"),
            vec!["saas".to_string(), "fintech".to_string()]
        );
    }

    #[test]
    fn test_leading_integer_keeps_sign() {
        assert_eq!(leading_integer("-40"), Some(-40));
        assert_eq!(leading_integer("about"), None);
    }

    #[test]
    fn test_humanize_label() {
        assert_eq!(humanize_label("series_b"), "Series B");
        assert_eq!(humanize_label("pre_seed"), "Pre Seed");
        assert_eq!(humanize_label("ipo"), "IPO");
    }
}
