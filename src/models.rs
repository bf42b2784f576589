use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use uuid::Uuid;

// ============ Lead ============

/// Outreach priority bucket derived from the lead score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Hot,
    Warm,
    #[default]
    Cold,
}

impl Priority {
    /// `hot` at 80 and above, `warm` from 60 to 79, `cold` below 60.
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => Priority::Hot,
            60..=79 => Priority::Warm,
            _ => Priority::Cold,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Hot => "hot",
            Priority::Warm => "warm",
            Priority::Cold => "cold",
        }
    }
}

/// A prospective customer record (company + contact).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub company_name: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Size bucket label such as `"51-200"` or `"1000+"`.
    #[serde(default)]
    pub company_size: Option<String>,
    #[serde(default)]
    pub employee_count: Option<u32>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub funding_stage: Option<String>,
    #[serde(default)]
    pub recent_activity: Option<String>,
    #[serde(default)]
    pub score: u8,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub is_enriched: bool,
    /// Last fused profile. Replaced wholesale on every enrichment.
    #[serde(default)]
    pub enrichment: Option<EnrichedProfile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    pub fn new(company_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            company_name: company_name.into(),
            contact_name: None,
            job_title: None,
            email: None,
            industry: None,
            location: None,
            company_size: None,
            employee_count: None,
            website: None,
            tech_stack: Vec::new(),
            funding_stage: None,
            recent_activity: None,
            score: 0,
            priority: Priority::Cold,
            is_enriched: false,
            enrichment: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Bare host of the lead's website (`https://www.acme.io/about` -> `acme.io`).
    pub fn domain(&self) -> Option<String> {
        self.website.as_deref().and_then(domain_from_website)
    }
}

/// Extracts the bare host from a website string, tolerating a missing scheme.
pub fn domain_from_website(website: &str) -> Option<String> {
    let trimmed = website.trim();
    if trimmed.is_empty() {
        return None;
    }

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = url::Url::parse(&with_scheme).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();

    if host.contains('.') {
        Some(host)
    } else {
        None
    }
}

/// Request body for `POST /api/leads`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NewLead {
    pub company_name: String,
    pub contact_name: Option<String>,
    pub job_title: Option<String>,
    pub email: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub company_size: Option<String>,
    pub employee_count: Option<u32>,
    pub website: Option<String>,
    pub tech_stack: Vec<String>,
    pub funding_stage: Option<String>,
    pub recent_activity: Option<String>,
}

impl NewLead {
    pub fn into_lead(self) -> Lead {
        let mut lead = Lead::new(self.company_name.trim());
        lead.contact_name = self.contact_name;
        lead.job_title = self.job_title;
        lead.email = self.email;
        lead.industry = self.industry;
        lead.location = self.location;
        lead.company_size = self.company_size;
        lead.employee_count = self.employee_count;
        lead.website = self.website;
        lead.tech_stack = self.tech_stack;
        lead.funding_stage = self.funding_stage;
        lead.recent_activity = self.recent_activity;
        lead
    }
}

// ============ Sources ============

/// Logical external data source. Declaration order is the fusion priority order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    FundingRegistry,
    ProfessionalNetwork,
    CodeHosting,
    WebSearch,
}

impl SourceId {
    /// All logical sources, highest fusion priority first.
    pub const PRIORITY_ORDER: [SourceId; 4] = [
        SourceId::FundingRegistry,
        SourceId::ProfessionalNetwork,
        SourceId::CodeHosting,
        SourceId::WebSearch,
    ];

    /// Fixed trust coefficient for the source.
    pub fn reliability_weight(&self) -> f64 {
        match self {
            SourceId::FundingRegistry => 0.95,
            SourceId::ProfessionalNetwork => 0.9,
            SourceId::CodeHosting => 0.8,
            SourceId::WebSearch => 0.7,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::FundingRegistry => "funding_registry",
            SourceId::ProfessionalNetwork => "professional_network",
            SourceId::CodeHosting => "code_hosting",
            SourceId::WebSearch => "web_search",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Ok,
    Unavailable,
    Error,
}

/// Partial company record as supplied by one source, and the merged field set
/// of an enriched profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headquarters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub founded_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tech_stack: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// Network key (`linkedin`, `twitter`, `github`, ...) to profile URL.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub social_links: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_funding_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding_stage: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub investors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_repos: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followers: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub news_headlines: Vec<String>,
}

impl CompanyFields {
    /// True when no enrichable field is set.
    pub fn is_empty(&self) -> bool {
        *self == CompanyFields::default()
    }

    /// Fills every field still absent in `self` from `other`; list fields are
    /// unioned case-insensitively and social links are added per missing key.
    pub fn merge_missing(&mut self, other: &CompanyFields) {
        fill(&mut self.description, &other.description);
        fill(&mut self.employee_count, &other.employee_count);
        fill(&mut self.headquarters, &other.headquarters);
        fill(&mut self.founded_year, &other.founded_year);
        fill(&mut self.industry, &other.industry);
        fill(&mut self.website, &other.website);
        fill(&mut self.total_funding_usd, &other.total_funding_usd);
        fill(&mut self.funding_stage, &other.funding_stage);
        fill(&mut self.public_repos, &other.public_repos);
        fill(&mut self.followers, &other.followers);

        union_case_insensitive(&mut self.tech_stack, &other.tech_stack);
        union_case_insensitive(&mut self.categories, &other.categories);
        union_case_insensitive(&mut self.investors, &other.investors);
        union_case_insensitive(&mut self.news_headlines, &other.news_headlines);

        for (network, link) in &other.social_links {
            self.social_links
                .entry(network.clone())
                .or_insert_with(|| link.clone());
        }
    }
}

fn fill<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
    if slot.is_none() {
        slot.clone_from(value);
    }
}

/// Appends entries of `extra` not already present in `target` (ignoring case).
/// The first spelling seen is kept.
pub fn union_case_insensitive(target: &mut Vec<String>, extra: &[String]) {
    let mut seen: HashSet<String> = target.iter().map(|v| v.trim().to_lowercase()).collect();
    for value in extra {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            target.push(trimmed.to_string());
        }
    }
}

/// Output of one adapter call, or of one logical source after folding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceResult {
    pub source_id: SourceId,
    pub status: SourceStatus,
    pub payload: CompanyFields,
    pub reliability_weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Produced by a simulation adapter rather than a live source.
    #[serde(default)]
    pub simulated: bool,
}

impl SourceResult {
    pub fn ok(source_id: SourceId, payload: CompanyFields) -> Self {
        Self {
            source_id,
            status: SourceStatus::Ok,
            payload,
            reliability_weight: source_id.reliability_weight(),
            reason: None,
            simulated: false,
        }
    }

    pub fn unavailable(source_id: SourceId, reason: impl Into<String>) -> Self {
        Self {
            source_id,
            status: SourceStatus::Unavailable,
            payload: CompanyFields::default(),
            reliability_weight: source_id.reliability_weight(),
            reason: Some(reason.into()),
            simulated: false,
        }
    }

    pub fn error(source_id: SourceId, reason: impl Into<String>) -> Self {
        Self {
            source_id,
            status: SourceStatus::Error,
            payload: CompanyFields::default(),
            reliability_weight: source_id.reliability_weight(),
            reason: Some(reason.into()),
            simulated: false,
        }
    }

    pub fn simulated(mut self) -> Self {
        self.simulated = true;
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == SourceStatus::Ok
    }
}

// ============ Enriched profile ============

/// Coarse confidence tier of an enriched profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    High,
    Medium,
    Low,
}

impl DataQuality {
    /// `high` needs 3+ sources and a score of 80+, `medium` 2+ sources and 60+.
    pub fn from_metrics(contributing_sources: usize, enrichment_score: f64) -> Self {
        if contributing_sources >= 3 && enrichment_score >= 80.0 {
            DataQuality::High
        } else if contributing_sources >= 2 && enrichment_score >= 60.0 {
            DataQuality::Medium
        } else {
            DataQuality::Low
        }
    }
}

/// Fused view of a company built from every source that answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedProfile {
    #[serde(flatten)]
    pub fields: CompanyFields,
    pub enrichment_score: f64,
    pub data_quality: DataQuality,
    pub contributing_sources: BTreeSet<SourceId>,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub simulated: bool,
}

impl EnrichedProfile {
    /// Profile for a company no source could describe.
    pub fn empty() -> Self {
        Self {
            fields: CompanyFields::default(),
            enrichment_score: 0.0,
            data_quality: DataQuality::Low,
            contributing_sources: BTreeSet::new(),
            last_updated: Utc::now(),
            simulated: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_thresholds() {
        assert_eq!(Priority::from_score(100), Priority::Hot);
        assert_eq!(Priority::from_score(80), Priority::Hot);
        assert_eq!(Priority::from_score(79), Priority::Warm);
        assert_eq!(Priority::from_score(60), Priority::Warm);
        assert_eq!(Priority::from_score(59), Priority::Cold);
        assert_eq!(Priority::from_score(0), Priority::Cold);
    }

    #[test]
    fn test_data_quality_boundaries() {
        assert_eq!(DataQuality::from_metrics(3, 80.0), DataQuality::High);
        assert_eq!(DataQuality::from_metrics(3, 79.0), DataQuality::Medium);
        assert_eq!(DataQuality::from_metrics(2, 95.0), DataQuality::Medium);
        assert_eq!(DataQuality::from_metrics(2, 59.0), DataQuality::Low);
        assert_eq!(DataQuality::from_metrics(1, 100.0), DataQuality::Low);
        assert_eq!(DataQuality::from_metrics(0, 0.0), DataQuality::Low);
    }

    #[test]
    fn test_domain_from_website() {
        assert_eq!(
            domain_from_website("https://www.Acme.io/about"),
            Some("acme.io".to_string())
        );
        assert_eq!(domain_from_website("acme.io"), Some("acme.io".to_string()));
        assert_eq!(domain_from_website("   "), None);
        assert_eq!(domain_from_website("localhost"), None);
    }

    #[test]
    fn test_union_is_case_insensitive_and_keeps_first_spelling() {
        let mut stack = vec!["React".to_string()];
        union_case_insensitive(
            &mut stack,
            &["react".to_string(), "AWS".to_string(), " ".to_string()],
        );
        assert_eq!(stack, vec!["React".to_string(), "AWS".to_string()]);
    }

    #[test]
    fn test_merge_missing_keeps_existing_values() {
        let mut primary = CompanyFields {
            headquarters: Some("Berlin".to_string()),
            ..Default::default()
        };
        primary
            .social_links
            .insert("linkedin".to_string(), "https://a".to_string());

        let mut secondary = CompanyFields {
            headquarters: Some("Paris".to_string()),
            founded_year: Some(2015),
            ..Default::default()
        };
        secondary
            .social_links
            .insert("linkedin".to_string(), "https://b".to_string());
        secondary
            .social_links
            .insert("github".to_string(), "https://c".to_string());

        primary.merge_missing(&secondary);

        assert_eq!(primary.headquarters.as_deref(), Some("Berlin"));
        assert_eq!(primary.founded_year, Some(2015));
        assert_eq!(primary.social_links["linkedin"], "https://a");
        assert_eq!(primary.social_links["github"], "https://c");
    }
}
