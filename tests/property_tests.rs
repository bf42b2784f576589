/// Property-based tests using proptest
/// Tests invariants that should hold for all inputs
use proptest::prelude::*;
use lead_enrichment_api::batch::plan_windows;
use lead_enrichment_api::fusion::{enrichment_score, fuse};
use lead_enrichment_api::models::{
    union_case_insensitive, CompanyFields, DataQuality, Lead, Priority, SourceId, SourceResult,
};
use lead_enrichment_api::scoring::{LeadScorer, ScoringStrategy};

fn arb_lead() -> impl Strategy<Value = Lead> {
    (
        "\\PC{0,40}",
        proptest::option::of(0u32..1_000_000),
        proptest::option::of("\\PC{0,30}"),
        proptest::option::of("\\PC{0,30}"),
        proptest::option::of("\\PC{0,30}"),
        proptest::collection::vec("[A-Za-z.]{1,12}", 0..10),
        proptest::option::of("\\PC{0,40}"),
        proptest::option::of("[0-9,+ -]{0,12}"),
    )
        .prop_map(
            |(name, employees, title, industry, funding, tech, activity, size)| {
                let mut lead = Lead::new(name);
                lead.employee_count = employees;
                lead.job_title = title;
                lead.industry = industry;
                lead.funding_stage = funding;
                lead.tech_stack = tech;
                lead.recent_activity = activity;
                lead.company_size = size;
                lead
            },
        )
}

fn arb_source_id() -> impl Strategy<Value = SourceId> {
    prop_oneof![
        Just(SourceId::FundingRegistry),
        Just(SourceId::ProfessionalNetwork),
        Just(SourceId::CodeHosting),
        Just(SourceId::WebSearch),
    ]
}

fn arb_result() -> impl Strategy<Value = SourceResult> {
    (
        arb_source_id(),
        0u8..3,
        proptest::option::of(-100i64..100_000),
        proptest::option::of(1500i32..2200),
        proptest::option::of("[a-zA-Z ]{0,12}"),
    )
        .prop_map(|(source_id, status, employees, founded, industry)| match status {
            0 => SourceResult::ok(
                source_id,
                CompanyFields {
                    employee_count: employees,
                    founded_year: founded,
                    industry,
                    ..Default::default()
                },
            ),
            1 => SourceResult::unavailable(source_id, "no record"),
            _ => SourceResult::error(source_id, "upstream failure"),
        })
}

// Property: scores stay in range and are deterministic
proptest! {
    #[test]
    fn score_is_always_in_range(lead in arb_lead()) {
        for strategy in [ScoringStrategy::Weighted, ScoringStrategy::Basic] {
            let breakdown = LeadScorer::new(strategy).breakdown(&lead, None);
            prop_assert!(breakdown.score <= 100);
            prop_assert_eq!(breakdown.priority, Priority::from_score(breakdown.score));
        }
    }

    #[test]
    fn scoring_is_deterministic(lead in arb_lead()) {
        let scorer = LeadScorer::new(ScoringStrategy::Weighted);
        prop_assert_eq!(scorer.score(&lead, None), scorer.score(&lead, None));
    }
}

// Property: fusion never produces an invalid profile
proptest! {
    #[test]
    fn fused_profile_is_consistent(results in proptest::collection::vec(arb_result(), 0..12)) {
        let profile = fuse(&results);

        prop_assert!((0.0..=100.0).contains(&profile.enrichment_score));
        prop_assert_eq!(
            profile.data_quality,
            DataQuality::from_metrics(profile.contributing_sources.len(), profile.enrichment_score)
        );
        prop_assert!(profile.contributing_sources.len() <= 4);
        if let Some(employees) = profile.fields.employee_count {
            prop_assert!(employees >= 0);
        }
        if let Some(year) = profile.fields.founded_year {
            prop_assert!(year >= 1800);
        }
        if profile.contributing_sources.is_empty() {
            prop_assert_eq!(profile.enrichment_score, 0.0);
        }
    }

    #[test]
    fn enrichment_score_is_bounded(weight_sum in 0.0f64..4.0, attempted in 0usize..8) {
        let score = enrichment_score(weight_sum.min(attempted as f64), attempted);
        prop_assert!((0.0..=100.0).contains(&score));
        prop_assert_eq!(score.fract(), 0.0);
    }
}

// Property: batch windows cover every lead exactly once
proptest! {
    #[test]
    fn windows_partition_the_batch(len in 0usize..200, size in 1usize..20) {
        let windows = plan_windows(len, size).unwrap();

        let covered: Vec<usize> = windows.iter().cloned().flatten().collect();
        prop_assert_eq!(covered, (0..len).collect::<Vec<_>>());
        prop_assert!(windows.iter().all(|w| !w.is_empty() && w.len() <= size));
        prop_assert_eq!(windows.len(), len.div_ceil(size));
    }

    #[test]
    fn union_never_duplicates_case_insensitively(
        base in proptest::collection::vec("[a-cA-C]{1,2}", 0..8),
        extra in proptest::collection::vec("[a-cA-C]{1,2}", 0..8)
    ) {
        let mut target = Vec::new();
        union_case_insensitive(&mut target, &base);
        union_case_insensitive(&mut target, &extra);

        let mut lowered: Vec<String> = target.iter().map(|s| s.to_lowercase()).collect();
        let total = lowered.len();
        lowered.sort();
        lowered.dedup();
        prop_assert_eq!(lowered.len(), total);
    }
}
