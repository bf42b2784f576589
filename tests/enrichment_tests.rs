/// End-to-end tests for scoring and batch enrichment with in-process adapters
use async_trait::async_trait;
use lead_enrichment_api::batch::BatchScheduler;
use lead_enrichment_api::coordinator::EnrichmentCoordinator;
use lead_enrichment_api::enrichment::LeadEnricher;
use lead_enrichment_api::models::{CompanyFields, DataQuality, Lead, Priority, SourceResult};
use lead_enrichment_api::scoring::{LeadScorer, ScoringStrategy};
use lead_enrichment_api::sources::{AdapterKind, CompanyQuery, SimulatedAdapter, SourceAdapter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Tracks how many fetches overlap.
struct CountingAdapter {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
    delay: Duration,
}

impl CountingAdapter {
    fn new(delay: Duration) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            delay,
        }
    }
}

#[async_trait]
impl SourceAdapter for CountingAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::ProfessionalNetwork
    }

    async fn fetch(&self, query: &CompanyQuery) -> SourceResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        SourceResult::ok(
            self.source_id(),
            CompanyFields {
                description: Some(format!("{} profile", query.company_name)),
                employee_count: Some(120),
                ..Default::default()
            },
        )
    }
}

fn scheduler(
    adapter: &Arc<CountingAdapter>,
    window_size: usize,
    pacing: Duration,
) -> BatchScheduler {
    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![adapter.clone() as Arc<dyn SourceAdapter>];
    let coordinator = Arc::new(EnrichmentCoordinator::new(adapters, Duration::from_secs(2)));
    BatchScheduler::new(coordinator, window_size, pacing)
}

fn leads(n: usize) -> Vec<Lead> {
    (0..n).map(|i| Lead::new(format!("Company {}", i))).collect()
}

#[tokio::test]
async fn test_batch_never_exceeds_window_concurrency() {
    let adapter = Arc::new(CountingAdapter::new(Duration::from_millis(40)));
    let scheduler = scheduler(&adapter, 5, Duration::ZERO);
    let batch = leads(12);

    let profiles = scheduler.enrich_batch(&batch).await.unwrap();

    assert_eq!(profiles.len(), 12);
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 12);
    assert_eq!(adapter.max_in_flight.load(Ordering::SeqCst), 5);
    for lead in &batch {
        assert!(profiles.contains_key(&lead.id));
    }
}

#[tokio::test]
async fn test_batch_paces_between_windows_only() {
    let adapter = Arc::new(CountingAdapter::new(Duration::ZERO));
    let scheduler = scheduler(&adapter, 5, Duration::from_millis(100));

    let started = Instant::now();
    scheduler.enrich_batch(&leads(12)).await.unwrap();
    let elapsed = started.elapsed();

    // Three windows, two pauses
    assert!(elapsed >= Duration::from_millis(200), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(2), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_single_window_is_not_paced() {
    let adapter = Arc::new(CountingAdapter::new(Duration::ZERO));
    let scheduler = scheduler(&adapter, 5, Duration::from_secs(5));

    let started = Instant::now();
    scheduler.enrich_batch(&leads(5)).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_empty_batch_calls_nothing() {
    let adapter = Arc::new(CountingAdapter::new(Duration::ZERO));
    let scheduler = scheduler(&adapter, 5, Duration::ZERO);

    let profiles = scheduler.enrich_batch(&[]).await.unwrap();

    assert!(profiles.is_empty());
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_zero_window_fails_before_any_call() {
    let adapter = Arc::new(CountingAdapter::new(Duration::ZERO));
    let scheduler = scheduler(&adapter, 0, Duration::ZERO);

    assert!(scheduler.enrich_batch(&leads(3)).await.is_err());
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_reference_lead_is_hot() {
    let mut lead = Lead::new("Acme Cloud");
    lead.employee_count = Some(1200);
    lead.job_title = Some("VP Engineering".to_string());
    lead.industry = Some("SaaS".to_string());
    lead.funding_stage = Some("Series B".to_string());
    lead.tech_stack = vec!["React".to_string(), "AWS".to_string()];
    lead.recent_activity = Some("Requested product demo".to_string());

    let scorer = LeadScorer::new(ScoringStrategy::Weighted);
    let breakdown = scorer.breakdown(&lead, None);

    assert_eq!(breakdown.score, 91);
    assert_eq!(breakdown.priority, Priority::Hot);
    let contributions: f64 = breakdown.features.iter().map(|f| f.contribution).sum();
    assert!((contributions - breakdown.raw_total).abs() < 1e-9);
}

#[test]
fn test_priority_thresholds() {
    assert_eq!(Priority::from_score(100), Priority::Hot);
    assert_eq!(Priority::from_score(80), Priority::Hot);
    assert_eq!(Priority::from_score(79), Priority::Warm);
    assert_eq!(Priority::from_score(60), Priority::Warm);
    assert_eq!(Priority::from_score(59), Priority::Cold);
    assert_eq!(Priority::from_score(0), Priority::Cold);
}

#[tokio::test]
async fn test_simulated_pipeline_labels_every_profile() {
    let adapters: Vec<Arc<dyn SourceAdapter>> = AdapterKind::ALL
        .iter()
        .map(|kind| Arc::new(SimulatedAdapter::new(*kind)) as Arc<dyn SourceAdapter>)
        .collect();
    let coordinator = Arc::new(EnrichmentCoordinator::new(adapters, Duration::from_secs(1)));
    let scheduler = BatchScheduler::new(Arc::clone(&coordinator), 4, Duration::ZERO);
    let enricher = LeadEnricher::new(
        coordinator,
        scheduler,
        LeadScorer::new(ScoringStrategy::Weighted),
    );

    let mut batch = leads(9);
    for (i, lead) in batch.iter_mut().enumerate() {
        lead.website = Some(format!("https://company{}.example", i));
    }

    let enriched = enricher.enrich_leads(batch).await.unwrap();

    assert_eq!(enriched.len(), 9);
    for lead in &enriched {
        assert!(lead.is_enriched);
        let profile = lead.enrichment.as_ref().unwrap();
        assert!((0.0..=100.0).contains(&profile.enrichment_score));
        if !profile.contributing_sources.is_empty() {
            assert!(profile.simulated);
        }
        assert!(lead.score <= 100);
        assert_eq!(lead.priority, Priority::from_score(lead.score));
    }

    // Same inputs, same fixtures
    let first = enricher.enrich_lead(Lead::new("Company 0")).await;
    let again = enricher.enrich_lead(Lead::new("Company 0")).await;
    let (first, again) = (first.enrichment.unwrap(), again.enrichment.unwrap());
    assert_eq!(first.fields, again.fields);
    assert_eq!(first.enrichment_score, again.enrichment_score);
}

#[tokio::test]
async fn test_lead_without_sources_gets_low_quality_profile() {
    let coordinator = Arc::new(EnrichmentCoordinator::new(Vec::new(), Duration::from_secs(1)));
    let scheduler = BatchScheduler::new(Arc::clone(&coordinator), 5, Duration::ZERO);
    let enricher = LeadEnricher::new(
        coordinator,
        scheduler,
        LeadScorer::new(ScoringStrategy::Basic),
    );

    let enriched = enricher.enrich_leads(leads(2)).await.unwrap();

    for lead in enriched {
        let profile = lead.enrichment.unwrap();
        assert_eq!(profile.data_quality, DataQuality::Low);
        assert_eq!(profile.enrichment_score, 0.0);
        // 40*.4 + 40*.35 + 50*.25
        assert_eq!(lead.score, 43);
    }
}
