use chrono::Utc;
use std::collections::BTreeSet;

use crate::coordinator::fold_by_source;
use crate::models::{CompanyFields, DataQuality, EnrichedProfile, SourceId, SourceResult};

/// Earliest founding year accepted from any source.
pub const MIN_FOUNDED_YEAR: i32 = 1800;

/// Merges per-source results into one enriched profile.
///
/// Scalar fields come from the highest-priority source that supplied a valid
/// value; list fields are unioned case-insensitively; social links merge per
/// network key. Results for the same logical source are folded first, so each
/// source counts once towards the enrichment score.
pub fn fuse(results: &[SourceResult]) -> EnrichedProfile {
    let sources = fold_by_source(results.to_vec());
    let attempted = sources.len();
    let simulated = sources.iter().any(|r| r.simulated);

    let ok: Vec<&SourceResult> = sources.iter().filter(|r| r.is_ok()).collect();
    if ok.is_empty() {
        return EnrichedProfile {
            simulated,
            ..EnrichedProfile::empty()
        };
    }

    let mut fields = CompanyFields::default();
    // fold_by_source yields sanitized payloads in priority order
    for result in &ok {
        fields.merge_missing(&result.payload);
    }

    let weight_sum: f64 = ok.iter().map(|r| r.reliability_weight).sum();
    let enrichment_score = enrichment_score(weight_sum, attempted);
    let contributing_sources: BTreeSet<SourceId> = ok.iter().map(|r| r.source_id).collect();
    let data_quality = DataQuality::from_metrics(contributing_sources.len(), enrichment_score);

    EnrichedProfile {
        fields,
        enrichment_score,
        data_quality,
        contributing_sources,
        last_updated: Utc::now(),
        simulated,
    }
}

/// `round(weight_sum / attempted * 100)`, 0 when nothing was attempted.
pub fn enrichment_score(weight_sum: f64, attempted: usize) -> f64 {
    if attempted == 0 {
        return 0.0;
    }
    (weight_sum / attempted as f64 * 100.0).round().clamp(0.0, 100.0)
}

/// Drops values that cannot be true so a lower-priority source may supply
/// the field instead.
pub fn sanitize(source_id: SourceId, payload: &CompanyFields, current_year: i32) -> CompanyFields {
    let mut clean = payload.clone();

    clean.description = trimmed(clean.description);
    clean.headquarters = trimmed(clean.headquarters);
    clean.industry = trimmed(clean.industry);
    clean.website = trimmed(clean.website);
    clean.funding_stage = trimmed(clean.funding_stage);

    if let Some(count) = clean.employee_count.filter(|n| *n < 0) {
        tracing::debug!("Discarding employee count {} from {}", count, source_id.as_str());
        clean.employee_count = None;
    }
    if let Some(year) = clean
        .founded_year
        .filter(|y| !(MIN_FOUNDED_YEAR..=current_year).contains(y))
    {
        tracing::debug!("Discarding founded year {} from {}", year, source_id.as_str());
        clean.founded_year = None;
    }
    if let Some(total) = clean
        .total_funding_usd
        .filter(|t| !t.is_finite() || *t < 0.0)
    {
        tracing::debug!("Discarding funding total {} from {}", total, source_id.as_str());
        clean.total_funding_usd = None;
    }
    clean.public_repos = clean.public_repos.filter(|n| *n >= 0);
    clean.followers = clean.followers.filter(|n| *n >= 0);

    for list in [
        &mut clean.tech_stack,
        &mut clean.categories,
        &mut clean.investors,
        &mut clean.news_headlines,
    ] {
        list.retain(|v| !v.trim().is_empty());
    }
    clean
        .social_links
        .retain(|network, link| !network.trim().is_empty() && !link.trim().is_empty());

    clean
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
