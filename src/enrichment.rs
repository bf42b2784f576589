//! Lead enrichment pipeline shared by the single-lead and batch endpoints.
//!
//! 1. Fan out to every source for the lead's company
//! 2. Fuse the results into an `EnrichedProfile`
//! 3. Attach the profile to the lead, replacing the previous one
//! 4. Rescore the lead against the active strategy
use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;

use crate::batch::BatchScheduler;
use crate::config::Config;
use crate::coordinator::EnrichmentCoordinator;
use crate::errors::AppError;
use crate::models::{EnrichedProfile, Lead};
use crate::scoring::LeadScorer;

pub struct LeadEnricher {
    coordinator: Arc<EnrichmentCoordinator>,
    scheduler: BatchScheduler,
    scorer: LeadScorer,
}

impl LeadEnricher {
    pub fn new(coordinator: Arc<EnrichmentCoordinator>, scheduler: BatchScheduler, scorer: LeadScorer) -> Self {
        Self {
            coordinator,
            scheduler,
            scorer,
        }
    }

    pub fn from_config(config: &Config, client: &Client) -> Self {
        let coordinator = Arc::new(EnrichmentCoordinator::from_config(config, client));
        let scheduler = BatchScheduler::new(
            Arc::clone(&coordinator),
            config.batch_size,
            config.batch_pacing(),
        );
        Self::new(coordinator, scheduler, LeadScorer::new(config.scoring_strategy))
    }

    pub fn scorer(&self) -> &LeadScorer {
        &self.scorer
    }

    /// Enriches and rescores one lead. Source failures only lower the
    /// profile's quality; this never fails.
    pub async fn enrich_lead(&self, mut lead: Lead) -> Lead {
        tracing::info!("Enriching lead {} ({})", lead.id, lead.company_name);

        let profile = self.coordinator.profile_lead(&lead).await;
        self.attach(&mut lead, profile);

        tracing::info!(
            "Lead {} enriched: quality {:?}, score {} ({})",
            lead.id,
            lead.enrichment.as_ref().map(|p| p.data_quality),
            lead.score,
            lead.priority.as_str()
        );
        lead
    }

    /// Enriches and rescores every lead through the batch scheduler, in
    /// input order.
    pub async fn enrich_leads(&self, leads: Vec<Lead>) -> Result<Vec<Lead>, AppError> {
        let mut profiles = self.scheduler.enrich_batch(&leads).await?;

        Ok(leads
            .into_iter()
            .map(|mut lead| {
                if let Some(profile) = profiles.remove(&lead.id) {
                    self.attach(&mut lead, profile);
                }
                lead
            })
            .collect())
    }

    /// Replaces the lead's profile and rescores it.
    pub fn attach(&self, lead: &mut Lead, profile: EnrichedProfile) {
        apply_profile(lead, profile);
        self.scorer.apply(lead);
    }
}

/// Stores `profile` on the lead, replacing any previous one.
///
/// Native fields stay exactly as supplied; the scorer reads the profile for
/// whatever the lead lacks. Nothing from an old profile survives a new one.
pub fn apply_profile(lead: &mut Lead, profile: EnrichedProfile) {
    lead.is_enriched = true;
    lead.enrichment = Some(profile);
    lead.updated_at = Utc::now();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompanyFields, DataQuality, Priority, SourceId, SourceResult};
    use crate::scoring::ScoringStrategy;
    use crate::sources::{AdapterKind, CompanyQuery, SourceAdapter};
    use async_trait::async_trait;
    use std::time::Duration;

    struct FixedAdapter {
        kind: AdapterKind,
        fields: CompanyFields,
    }

    #[async_trait]
    impl SourceAdapter for FixedAdapter {
        fn kind(&self) -> AdapterKind {
            self.kind
        }

        async fn fetch(&self, _query: &CompanyQuery) -> SourceResult {
            SourceResult::ok(self.kind.source_id(), self.fields.clone())
        }
    }

    fn enricher(adapters: Vec<Arc<dyn SourceAdapter>>) -> LeadEnricher {
        let coordinator = Arc::new(EnrichmentCoordinator::new(adapters, Duration::from_secs(1)));
        let scheduler = BatchScheduler::new(Arc::clone(&coordinator), 5, Duration::ZERO);
        LeadEnricher::new(coordinator, scheduler, LeadScorer::new(ScoringStrategy::Weighted))
    }

    fn registry_fields() -> CompanyFields {
        CompanyFields {
            employee_count: Some(1200),
            industry: Some("SaaS".to_string()),
            headquarters: Some("Boston, MA".to_string()),
            funding_stage: Some("Series B".to_string()),
            tech_stack: vec!["AWS".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_apply_profile_leaves_native_fields_alone() {
        let mut lead = Lead::new("Acme");
        lead.industry = Some("Healthcare".to_string());
        lead.tech_stack = vec!["react".to_string()];

        let profile = EnrichedProfile {
            fields: CompanyFields {
                tech_stack: vec!["React".to_string(), "AWS".to_string()],
                ..registry_fields()
            },
            ..EnrichedProfile::empty()
        };
        apply_profile(&mut lead, profile);

        assert_eq!(lead.industry.as_deref(), Some("Healthcare"));
        assert_eq!(lead.location, None);
        assert_eq!(lead.employee_count, None);
        assert_eq!(lead.tech_stack, vec!["react"]);
        assert!(lead.is_enriched);
        assert_eq!(
            lead.enrichment.as_ref().and_then(|p| p.fields.employee_count),
            Some(1200)
        );
    }

    #[tokio::test]
    async fn test_re_enrichment_scores_like_a_fresh_enrichment() {
        let strong: Vec<Arc<dyn SourceAdapter>> = vec![Arc::new(FixedAdapter {
            kind: AdapterKind::FundingRegistry,
            fields: CompanyFields {
                employee_count: Some(1200),
                industry: Some("SaaS".to_string()),
                funding_stage: Some("Series C".to_string()),
                ..Default::default()
            },
        })];
        let weak: Vec<Arc<dyn SourceAdapter>> = vec![Arc::new(FixedAdapter {
            kind: AdapterKind::FundingRegistry,
            fields: CompanyFields {
                employee_count: Some(5),
                industry: Some("Retail".to_string()),
                funding_stage: Some("Bootstrapped".to_string()),
                ..Default::default()
            },
        })];
        let (strong, weak) = (enricher(strong), enricher(weak));
        let lead = Lead::new("Acme");

        let first = strong.enrich_lead(lead.clone()).await;
        let re_enriched = weak.enrich_lead(first).await;
        let fresh = weak.enrich_lead(lead).await;

        assert_eq!(re_enriched.score, fresh.score);
        assert_eq!(re_enriched.score, 39);
        assert_eq!(re_enriched.employee_count, None);
        assert_eq!(re_enriched.industry, None);
        assert_eq!(re_enriched.funding_stage, None);
        let profile = re_enriched.enrichment.unwrap();
        assert_eq!(profile.fields.industry.as_deref(), Some("Retail"));
    }

    #[tokio::test]
    async fn test_enrich_lead_rescores_with_profile() {
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![Arc::new(FixedAdapter {
            kind: AdapterKind::FundingRegistry,
            fields: registry_fields(),
        })];
        let enricher = enricher(adapters);

        let mut lead = Lead::new("Acme");
        lead.job_title = Some("VP Engineering".to_string());
        lead.recent_activity = Some("Requested product demo".to_string());
        lead.tech_stack = vec!["React".to_string()];

        let enriched = enricher.enrich_lead(lead).await;

        // Same inputs as the reference example once the profile is folded in
        assert_eq!(enriched.score, 91);
        assert_eq!(enriched.priority, Priority::Hot);
        let profile = enriched.enrichment.unwrap();
        assert_eq!(profile.contributing_sources.len(), 1);
        assert_eq!(profile.enrichment_score, 95.0);
        assert_eq!(profile.data_quality, DataQuality::Low);
    }

    #[tokio::test]
    async fn test_total_source_failure_still_enriches() {
        let enricher = enricher(Vec::new());

        let lead = enricher.enrich_lead(Lead::new("Nobody Inc")).await;

        assert!(lead.is_enriched);
        let profile = lead.enrichment.unwrap();
        assert_eq!(profile.enrichment_score, 0.0);
        assert_eq!(profile.data_quality, DataQuality::Low);
        assert!(profile.contributing_sources.is_empty());
        assert_eq!(lead.score, 39);
    }

    #[tokio::test]
    async fn test_enrich_leads_keeps_input_order() {
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![Arc::new(FixedAdapter {
            kind: AdapterKind::ProfessionalNetwork,
            fields: registry_fields(),
        })];
        let enricher = enricher(adapters);
        let leads: Vec<Lead> = (0..7).map(|i| Lead::new(format!("Company {}", i))).collect();
        let ids: Vec<_> = leads.iter().map(|l| l.id).collect();

        let enriched = enricher.enrich_leads(leads).await.unwrap();

        assert_eq!(enriched.iter().map(|l| l.id).collect::<Vec<_>>(), ids);
        assert!(enriched.iter().all(|l| l.is_enriched));
        for lead in &enriched {
            let profile = lead.enrichment.as_ref().unwrap();
            assert!(profile.contributing_sources.contains(&SourceId::ProfessionalNetwork));
        }
    }
}
