use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::Lead;

pub const DEFAULT_PROSPECT_COUNT: usize = 10;
pub const MAX_PROSPECT_COUNT: usize = 50;

/// Body of `POST /api/prospect`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProspectRequest {
    pub industry: Option<String>,
    pub location: Option<String>,
    pub count: Option<usize>,
}

impl ProspectRequest {
    /// Requested lead count, defaulted and bounded.
    pub fn count(&self) -> Result<usize, AppError> {
        match self.count {
            None => Ok(DEFAULT_PROSPECT_COUNT),
            Some(0) => Err(AppError::BadRequest("count must be at least 1".to_string())),
            Some(n) if n > MAX_PROSPECT_COUNT => Err(AppError::BadRequest(format!(
                "count must be at most {}",
                MAX_PROSPECT_COUNT
            ))),
            Some(n) => Ok(n),
        }
    }
}

/// Source of new, unscored leads.
pub trait LeadGenerator: Send + Sync {
    fn generate(&self, request: &ProspectRequest) -> Result<Vec<Lead>, AppError>;
}

const NAME_PREFIXES: [&str; 10] = [
    "Nova", "Blue", "Quantum", "Bright", "Apex", "Stellar", "Cedar", "Vector", "Lumen", "Harbor",
];
const NAME_SUFFIXES: [&str; 8] = ["Labs", "Systems", "Cloud", "Analytics", "Works", "AI", "Data", "Logic"];
const INDUSTRIES: [&str; 8] = [
    "SaaS",
    "FinTech",
    "Cybersecurity",
    "Enterprise Software",
    "Healthcare",
    "E-commerce",
    "Data Analytics",
    "Manufacturing",
];
const LOCATIONS: [&str; 6] = [
    "San Francisco, CA",
    "New York, NY",
    "Austin, TX",
    "Seattle, WA",
    "Boston, MA",
    "Denver, CO",
];
const SIZE_BUCKETS: [(&str, u32, u32); 5] = [
    ("1-10", 1, 10),
    ("11-50", 11, 50),
    ("51-200", 51, 200),
    ("201-1000", 201, 1000),
    ("1000+", 1000, 5000),
];
const FIRST_NAMES: [&str; 8] = ["Alex", "Sam", "Jordan", "Taylor", "Morgan", "Riley", "Casey", "Jamie"];
const LAST_NAMES: [&str; 8] = ["Chen", "Patel", "Garcia", "Kim", "Okafor", "Novak", "Silva", "Brown"];
const JOB_TITLES: [&str; 8] = [
    "CEO",
    "CTO",
    "VP Engineering",
    "Head of Data",
    "Director of Operations",
    "Senior Engineer",
    "Solutions Architect",
    "Product Manager",
];
const TECHNOLOGIES: [&str; 10] = [
    "React", "Node.js", "Python", "AWS", "Docker", "Kubernetes", "PostgreSQL", "Go", "Java", "GCP",
];
const FUNDING_STAGES: [&str; 6] = ["Bootstrapped", "Seed", "Series A", "Series B", "Series C", "Public"];
const ACTIVITIES: [&str; 6] = [
    "Requested product demo",
    "Started free trial",
    "Downloaded whitepaper",
    "Visited pricing page",
    "Opened newsletter",
    "Attended webinar",
];

/// Placeholder prospects drawn from fixed vocabularies. Useful for demos and
/// load tests; none of the generated companies are real.
#[derive(Debug, Clone, Default)]
pub struct SyntheticLeadGenerator {
    seed: Option<u64>,
}

impl SyntheticLeadGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reproducible output for a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

fn choose<R: Rng>(rng: &mut R, pool: &[&str]) -> String {
    pool.choose(rng).copied().unwrap_or_default().to_string()
}

impl LeadGenerator for SyntheticLeadGenerator {
    fn generate(&self, request: &ProspectRequest) -> Result<Vec<Lead>, AppError> {
        let count = request.count()?;
        let mut rng = self.rng();

        let leads = (0..count)
            .map(|_| {
                let company = format!(
                    "{} {}",
                    choose(&mut rng, &NAME_PREFIXES),
                    choose(&mut rng, &NAME_SUFFIXES)
                );
                let slug: String = company
                    .to_lowercase()
                    .chars()
                    .filter(char::is_ascii_alphanumeric)
                    .collect();
                let first = choose(&mut rng, &FIRST_NAMES);
                let last = choose(&mut rng, &LAST_NAMES);
                let (bucket, low, high) = SIZE_BUCKETS[rng.gen_range(0..SIZE_BUCKETS.len())];

                let tech_count = rng.gen_range(1..=4);
                let mut tech: Vec<String> = TECHNOLOGIES
                    .choose_multiple(&mut rng, tech_count)
                    .map(|t| t.to_string())
                    .collect();
                tech.sort();

                let mut lead = Lead::new(company);
                lead.contact_name = Some(format!("{} {}", first, last));
                lead.email = Some(format!(
                    "{}.{}@{}.example",
                    first.to_lowercase(),
                    last.to_lowercase(),
                    slug
                ));
                lead.job_title = Some(choose(&mut rng, &JOB_TITLES));
                lead.industry = Some(
                    request
                        .industry
                        .clone()
                        .unwrap_or_else(|| choose(&mut rng, &INDUSTRIES)),
                );
                lead.location = Some(
                    request
                        .location
                        .clone()
                        .unwrap_or_else(|| choose(&mut rng, &LOCATIONS)),
                );
                lead.company_size = Some(bucket.to_string());
                lead.employee_count = Some(rng.gen_range(low..=high));
                lead.website = Some(format!("https://{}.example", slug));
                lead.tech_stack = tech;
                lead.funding_stage = Some(choose(&mut rng, &FUNDING_STAGES));
                lead.recent_activity = Some(choose(&mut rng, &ACTIVITIES));
                lead
            })
            .collect();

        Ok(leads)
    }
}
