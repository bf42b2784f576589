//! Lead quality scoring.
//!
//! Scoring is a pure function of a lead and its optional enriched profile: every
//! feature is mapped to a 0-100 sub-score, weighted by the active strategy's
//! table, and the weighted sum is rounded and clamped to an integer in 0..=100.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{union_case_insensitive, EnrichedProfile, Lead, Priority};

/// Scored feature of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    CompanySize,
    JobTitle,
    Industry,
    FundingStage,
    TechStack,
    Engagement,
}

/// Fixed feature -> weight table. Weights must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub entries: &'static [(Feature, f64)],
}

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

impl ScoreWeights {
    pub const WEIGHTED: ScoreWeights = ScoreWeights {
        entries: &[
            (Feature::CompanySize, 0.25),
            (Feature::JobTitle, 0.25),
            (Feature::Industry, 0.20),
            (Feature::FundingStage, 0.15),
            (Feature::TechStack, 0.10),
            (Feature::Engagement, 0.05),
        ],
    };

    pub const BASIC: ScoreWeights = ScoreWeights {
        entries: &[
            (Feature::CompanySize, 0.40),
            (Feature::JobTitle, 0.35),
            (Feature::Industry, 0.25),
        ],
    };

    /// Weight of `feature`, 0.0 when the table does not score it.
    pub fn weight(&self, feature: Feature) -> f64 {
        self.entries
            .iter()
            .find(|(f, _)| *f == feature)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    /// Rejects tables with out-of-range weights, duplicate features, or a sum
    /// other than 1.0.
    pub fn validate(&self) -> Result<(), AppError> {
        let mut seen = Vec::with_capacity(self.entries.len());
        for (feature, weight) in self.entries {
            if !(0.0..=1.0).contains(weight) {
                return Err(AppError::Configuration(format!(
                    "weight for {:?} out of range: {}",
                    feature, weight
                )));
            }
            if seen.contains(feature) {
                return Err(AppError::Configuration(format!(
                    "feature {:?} listed twice",
                    feature
                )));
            }
            seen.push(*feature);
        }

        let sum: f64 = self.entries.iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(AppError::Configuration(format!(
                "weights sum to {}, expected 1.0",
                sum
            )));
        }
        Ok(())
    }
}

/// Named scoring strategy, selected by configuration.
///
/// The two tables describe the same lead-quality concept with different
/// weights; they are kept distinct so a deployment always states which one it
/// scores with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringStrategy {
    /// Six-feature model including funding, technology fit and engagement.
    Weighted,
    /// Firmographic-only model: company size, job title and industry.
    Basic,
}

impl ScoringStrategy {
    pub fn weights(&self) -> &'static ScoreWeights {
        match self {
            ScoringStrategy::Weighted => &ScoreWeights::WEIGHTED,
            ScoringStrategy::Basic => &ScoreWeights::BASIC,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringStrategy::Weighted => "weighted",
            ScoringStrategy::Basic => "basic",
        }
    }
}

impl std::str::FromStr for ScoringStrategy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "weighted" => Ok(ScoringStrategy::Weighted),
            "basic" => Ok(ScoringStrategy::Basic),
            other => anyhow::bail!(
                "SCORING_STRATEGY must be 'weighted' or 'basic', got '{}'",
                other
            ),
        }
    }
}

// ============ Feature sub-scores ============

const DECISION_MAKER_KEYWORDS: [&str; 7] = ["ceo", "cto", "cfo", "vp", "director", "head", "chief"];
const TECHNICAL_ROLE_KEYWORDS: [&str; 4] = ["engineer", "developer", "architect", "lead"];

const HIGH_VALUE_INDUSTRIES: [&str; 4] = ["saas", "fintech", "enterprise software", "cybersecurity"];
const MEDIUM_VALUE_INDUSTRIES: [&str; 4] = [
    "healthcare",
    "e-commerce",
    "data analytics",
    "cloud services",
];

/// Technologies counted as a modern-stack match.
pub const MODERN_TECH_KEYWORDS: [&str; 6] = ["react", "node", "python", "aws", "docker", "kubernetes"];

pub fn company_size_score(employee_count: Option<u64>) -> f64 {
    match employee_count {
        Some(n) if n >= 1000 => 100.0,
        Some(n) if n >= 500 => 90.0,
        Some(n) if n >= 200 => 80.0,
        Some(n) if n >= 50 => 70.0,
        Some(n) if n >= 10 => 60.0,
        _ => 40.0,
    }
}

pub fn job_title_score(job_title: &str) -> f64 {
    let title = job_title.to_lowercase();
    if DECISION_MAKER_KEYWORDS.iter().any(|k| title.contains(k)) {
        100.0
    } else if TECHNICAL_ROLE_KEYWORDS.iter().any(|k| title.contains(k)) {
        70.0
    } else {
        40.0
    }
}

pub fn industry_score(industry: &str) -> f64 {
    let industry = industry.to_lowercase();
    if HIGH_VALUE_INDUSTRIES.iter().any(|k| industry.contains(k)) {
        100.0
    } else if MEDIUM_VALUE_INDUSTRIES.iter().any(|k| industry.contains(k)) {
        75.0
    } else {
        50.0
    }
}

/// First match wins, in this order: series C/D, B, A, public, seed.
pub fn funding_stage_score(funding_stage: &str) -> f64 {
    let normalized = funding_stage
        .to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if normalized.contains("series c") || normalized.contains("series d") {
        100.0
    } else if normalized.contains("series b") {
        90.0
    } else if normalized.contains("series a") {
        80.0
    } else if normalized.contains("public") || normalized.split(' ').any(|w| w == "ipo") {
        85.0
    } else if normalized.contains("seed") {
        70.0
    } else {
        40.0
    }
}

pub fn tech_stack_score(tech_stack: &[String]) -> f64 {
    let matches = tech_stack
        .iter()
        .filter(|tech| {
            let tech = tech.to_lowercase();
            MODERN_TECH_KEYWORDS.iter().any(|k| tech.contains(k))
        })
        .count();

    (matches as f64 / MODERN_TECH_KEYWORDS.len() as f64 * 100.0).min(100.0)
}

pub fn engagement_score(recent_activity: &str) -> f64 {
    let activity = recent_activity.to_lowercase();
    let bonus = if activity.contains("demo") || activity.contains("trial") {
        30.0
    } else if activity.contains("download") {
        20.0
    } else if activity.contains("visit") {
        10.0
    } else {
        0.0
    };

    f64::min(50.0 + bonus, 100.0)
}

/// Lower bound of a size bucket label: `"51-200"` -> 51, `"1,001+"` -> 1001.
pub fn size_bucket_lower_bound(bucket: &str) -> Option<u64> {
    let digits: String = bucket
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .filter(|c| c.is_ascii_digit())
        .collect();

    digits.parse().ok()
}

// ============ Scoring ============

/// Feature values a lead is scored on, after folding in enrichment data.
///
/// Native lead fields take precedence; the profile only fills gaps, except for
/// the technology stack which is the union of both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringInput {
    pub employee_count: Option<u64>,
    pub job_title: String,
    pub industry: String,
    pub funding_stage: String,
    pub tech_stack: Vec<String>,
    pub recent_activity: String,
}

impl ScoringInput {
    pub fn from_lead(lead: &Lead, profile: Option<&EnrichedProfile>) -> Self {
        let fields = profile.map(|p| &p.fields);

        let employee_count = lead
            .employee_count
            .map(u64::from)
            .or_else(|| {
                fields
                    .and_then(|f| f.employee_count)
                    .and_then(|n| u64::try_from(n).ok())
            })
            .or_else(|| {
                lead.company_size
                    .as_deref()
                    .and_then(size_bucket_lower_bound)
            });

        let industry = non_blank(lead.industry.as_deref())
            .or_else(|| fields.and_then(|f| non_blank(f.industry.as_deref())))
            .unwrap_or_default();

        let funding_stage = non_blank(lead.funding_stage.as_deref())
            .or_else(|| fields.and_then(|f| non_blank(f.funding_stage.as_deref())))
            .unwrap_or_default();

        let mut tech_stack = Vec::new();
        union_case_insensitive(&mut tech_stack, &lead.tech_stack);
        if let Some(f) = fields {
            union_case_insensitive(&mut tech_stack, &f.tech_stack);
        }

        Self {
            employee_count,
            job_title: lead.job_title.clone().unwrap_or_default(),
            industry,
            funding_stage,
            tech_stack,
            recent_activity: lead.recent_activity.clone().unwrap_or_default(),
        }
    }

    pub fn sub_score(&self, feature: Feature) -> f64 {
        match feature {
            Feature::CompanySize => company_size_score(self.employee_count),
            Feature::JobTitle => job_title_score(&self.job_title),
            Feature::Industry => industry_score(&self.industry),
            Feature::FundingStage => funding_stage_score(&self.funding_stage),
            Feature::TechStack => tech_stack_score(&self.tech_stack),
            Feature::Engagement => engagement_score(&self.recent_activity),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Contribution of one feature to the final score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureScore {
    pub feature: Feature,
    pub sub_score: f64,
    pub weight: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub strategy: ScoringStrategy,
    pub features: Vec<FeatureScore>,
    pub raw_total: f64,
    pub score: u8,
    pub priority: Priority,
}

#[derive(Debug, Clone, Copy)]
pub struct LeadScorer {
    strategy: ScoringStrategy,
}

impl LeadScorer {
    pub fn new(strategy: ScoringStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> ScoringStrategy {
        self.strategy
    }

    pub fn breakdown(&self, lead: &Lead, profile: Option<&EnrichedProfile>) -> ScoreBreakdown {
        let input = ScoringInput::from_lead(lead, profile);

        let features: Vec<FeatureScore> = self
            .strategy
            .weights()
            .entries
            .iter()
            .map(|(feature, weight)| {
                let sub_score = input.sub_score(*feature);
                FeatureScore {
                    feature: *feature,
                    sub_score,
                    weight: *weight,
                    contribution: sub_score * weight,
                }
            })
            .collect();

        let raw_total: f64 = features.iter().map(|f| f.contribution).sum();
        let score = raw_total.round().clamp(0.0, 100.0) as u8;

        ScoreBreakdown {
            strategy: self.strategy,
            features,
            raw_total,
            score,
            priority: Priority::from_score(score),
        }
    }

    pub fn score(&self, lead: &Lead, profile: Option<&EnrichedProfile>) -> u8 {
        self.breakdown(lead, profile).score
    }

    /// Overwrites the lead's score and priority from its own stored profile.
    pub fn apply(&self, lead: &mut Lead) {
        let score = self.score(lead, lead.enrichment.as_ref());
        lead.score = score;
        lead.priority = Priority::from_score(score);
    }
}
