use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{AdapterKind, CompanyQuery, SourceAdapter};
use crate::models::{CompanyFields, SourceResult};

/// Out of 10: seeds whose first byte falls below this are "found".
const AVAILABILITY_TENTHS: u8 = 8;

const DESCRIPTIONS: [&str; 6] = [
    "Cloud platform for modern engineering teams",
    "Workflow automation for finance operations",
    "Data infrastructure for real-time analytics",
    "Security tooling for distributed applications",
    "Customer engagement software for growing brands",
    "Developer tools for shipping reliable APIs",
];
const INDUSTRIES: [&str; 6] = [
    "SaaS",
    "FinTech",
    "Data Analytics",
    "Cybersecurity",
    "E-commerce",
    "Enterprise Software",
];
const CITIES: [&str; 6] = [
    "San Francisco, CA",
    "New York, NY",
    "Austin, TX",
    "London, United Kingdom",
    "Berlin, Germany",
    "Toronto, Canada",
];
const STAGES: [&str; 5] = ["Seed", "Series A", "Series B", "Series C", "Public"];
const INVESTORS: [&str; 6] = [
    "Sequoia Capital",
    "Accel",
    "Index Ventures",
    "Andreessen Horowitz",
    "Benchmark",
    "Lightspeed",
];
const LANGUAGES: [&str; 6] = ["TypeScript", "Python", "Go", "Rust", "Java", "Ruby"];
const WEB_TECH: [&str; 6] = ["React", "Node.js", "AWS", "Docker", "Kubernetes", "Cloudflare"];
const HEADLINE_TEMPLATES: [&str; 4] = [
    "{} announces new product line",
    "{} expands into European market",
    "{} partners with leading cloud provider",
    "{} named to fastest-growing companies list",
];

/// Deterministic stand-in for one adapter kind. Identical queries always
/// produce identical results; every result is flagged as simulated.
pub struct SimulatedAdapter {
    kind: AdapterKind,
}

impl SimulatedAdapter {
    pub fn new(kind: AdapterKind) -> Self {
        Self { kind }
    }

    fn seed(&self, query: &CompanyQuery) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.kind.as_str().as_bytes());
        hasher.update(b"\0");
        hasher.update(query.company_name.to_lowercase().as_bytes());
        hasher.update(b"\0");
        hasher.update(query.domain.as_deref().unwrap_or("").to_lowercase().as_bytes());
        hasher.finalize().into()
    }

    fn fixture(&self, query: &CompanyQuery, seed: &[u8; 32]) -> CompanyFields {
        let pick = |i: usize, pool: &[&'static str]| pool[seed[i] as usize % pool.len()].to_string();
        let picks = |i: usize, pool: &[&'static str], n: usize| -> Vec<String> {
            (0..n).map(|k| pick(i + k, pool)).collect()
        };
        let employees = 10 + (u16::from_be_bytes([seed[2], seed[3]]) as i64 % 4990);
        let founded = 1995 + (seed[4] as i32 % 28);
        let slug = query.slug();

        match self.kind {
            AdapterKind::FundingRegistry => CompanyFields {
                description: Some(pick(5, &DESCRIPTIONS)),
                employee_count: Some(employees),
                headquarters: Some(pick(6, &CITIES)),
                founded_year: Some(founded),
                industry: Some(pick(7, &INDUSTRIES)),
                total_funding_usd: Some(f64::from(1 + seed[8] % 200) * 1_000_000.0),
                funding_stage: Some(pick(9, &STAGES)),
                investors: picks(10, &INVESTORS, 2),
                categories: picks(12, &INDUSTRIES, 2),
                ..Default::default()
            },
            AdapterKind::ProfessionalNetwork => {
                let mut fields = CompanyFields {
                    description: Some(pick(5, &DESCRIPTIONS)),
                    employee_count: Some(employees),
                    headquarters: Some(pick(6, &CITIES)),
                    founded_year: Some(founded),
                    industry: Some(pick(7, &INDUSTRIES)),
                    categories: picks(12, &INDUSTRIES, 2),
                    ..Default::default()
                };
                fields.social_links.insert(
                    "linkedin".to_string(),
                    format!("https://www.linkedin.com/company/{}", slug),
                );
                fields
            }
            AdapterKind::CodeHosting => {
                let mut fields = CompanyFields {
                    public_repos: Some(i64::from(seed[5] % 150)),
                    followers: Some(i64::from(u16::from_be_bytes([seed[6], seed[7]]) % 5000)),
                    tech_stack: picks(8, &LANGUAGES, 3),
                    ..Default::default()
                };
                fields.social_links.insert(
                    "github".to_string(),
                    format!("https://github.com/{}", slug.replace('-', "")),
                );
                fields
            }
            AdapterKind::BusinessSearch => CompanyFields {
                description: Some(pick(5, &DESCRIPTIONS)),
                headquarters: Some(pick(6, &CITIES)),
                industry: Some(pick(7, &INDUSTRIES)),
                website: query.domain.as_ref().map(|d| format!("https://{}", d)),
                ..Default::default()
            },
            AdapterKind::WebsiteScraper => {
                let mut fields = CompanyFields {
                    description: Some(pick(5, &DESCRIPTIONS)),
                    website: query.domain.as_ref().map(|d| format!("https://{}", d)),
                    ..Default::default()
                };
                fields
                    .social_links
                    .insert("twitter".to_string(), format!("https://twitter.com/{}", slug));
                fields
            }
            AdapterKind::TechFingerprint => CompanyFields {
                tech_stack: picks(5, &WEB_TECH, 3),
                ..Default::default()
            },
            AdapterKind::NewsSearch => CompanyFields {
                news_headlines: picks(5, &HEADLINE_TEMPLATES, 2)
                    .into_iter()
                    .map(|template| template.replace("{}", &query.company_name))
                    .collect(),
                ..Default::default()
            },
        }
    }
}

#[async_trait]
impl SourceAdapter for SimulatedAdapter {
    fn kind(&self) -> AdapterKind {
        self.kind
    }

    async fn fetch(&self, query: &CompanyQuery) -> SourceResult {
        let source_id = self.kind.source_id();

        if query.company_name.is_empty() {
            return SourceResult::unavailable(source_id, "simulated: empty company name").simulated();
        }
        if self.kind.needs_domain() && query.domain.is_none() {
            return SourceResult::unavailable(source_id, "simulated: no company domain").simulated();
        }

        let seed = self.seed(query);
        if seed[0] % 10 >= AVAILABILITY_TENTHS {
            tracing::debug!(
                "Simulated {} has no record for {}",
                self.kind.as_str(),
                query.company_name
            );
            return SourceResult::unavailable(source_id, "simulated: no record").simulated();
        }

        let mut fields = CompanyFields::default();
        // Picks from the same pool may repeat; dedupe the way live adapters do
        fields.merge_missing(&self.fixture(query, &seed));
        SourceResult::ok(source_id, fields).simulated()
    }
}
