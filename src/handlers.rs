use crate::config::Config;
use crate::enrichment::LeadEnricher;
use crate::errors::{AppError, ResultExt};
use crate::lead_store::LeadStore;
use crate::models::{Lead, NewLead, Priority};
use crate::prospecting::{LeadGenerator, ProspectRequest};
use crate::scoring::ScoreBreakdown;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Lead records.
    pub store: Arc<dyn LeadStore>,
    /// Fan-out, fusion, batch scheduling and rescoring.
    pub enricher: Arc<LeadEnricher>,
    /// Source of new prospects for `POST /api/prospect`.
    pub generator: Arc<dyn LeadGenerator>,
}

/// Health check endpoint.
///
/// Reports the service version along with the active source mode and
/// scoring strategy.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "lead-enrichment-api",
            "version": env!("CARGO_PKG_VERSION"),
            "sourceMode": state.config.source_mode.as_str(),
            "scoringStrategy": state.config.scoring_strategy.as_str(),
        })),
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct ListLeadsParams {
    pub priority: Option<Priority>,
}

/// GET /api/leads
///
/// All leads, highest score first. `?priority=hot|warm|cold` narrows the list.
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListLeadsParams>,
) -> Json<Vec<Lead>> {
    let mut leads: Vec<Lead> = state
        .store
        .list()
        .await
        .into_iter()
        .filter(|lead| params.priority.map_or(true, |p| lead.priority == p))
        .collect();
    leads.sort_by(|a, b| b.score.cmp(&a.score));

    Json(leads)
}

/// GET /api/leads/:id
pub async fn get_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Lead>, AppError> {
    find_lead(&state, id).await.map(Json)
}

/// POST /api/leads
///
/// Creates a lead from the submitted fields and scores it straight away.
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewLead>,
) -> Result<(StatusCode, Json<Lead>), AppError> {
    if payload.company_name.trim().is_empty() {
        return Err(AppError::BadRequest("companyName is required".to_string()));
    }

    let mut lead = payload.into_lead();
    state.enricher.scorer().apply(&mut lead);
    tracing::info!(
        "Created lead {} ({}) with score {}",
        lead.id,
        lead.company_name,
        lead.score
    );

    state.store.upsert(lead.clone()).await;
    Ok((StatusCode::CREATED, Json(lead)))
}

/// GET /api/leads/:id/score
///
/// Per-feature breakdown of the lead's score under the active strategy.
pub async fn get_lead_score(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScoreBreakdown>, AppError> {
    let lead = find_lead(&state, id).await?;
    let breakdown = state
        .enricher
        .scorer()
        .breakdown(&lead, lead.enrichment.as_ref());

    Ok(Json(breakdown))
}

/// POST /api/leads/:id/enrich
///
/// Enriches one lead against every source, rescores it and returns it.
/// Individual source failures only show up in the profile's quality.
pub async fn enrich_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Lead>, AppError> {
    let lead = find_lead(&state, id).await?;

    let enriched = state.enricher.enrich_lead(lead).await;
    state.store.upsert(enriched.clone()).await;

    Ok(Json(enriched))
}

/// POST /api/leads/enrich-all
///
/// Runs the batch scheduler over every stored lead.
pub async fn enrich_all_leads(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let leads = state.store.list().await;
    tracing::info!("Batch enrichment requested for {} leads", leads.len());

    let enriched = state
        .enricher
        .enrich_leads(leads)
        .await
        .context("Batch enrichment failed")?;
    let enriched_count = store_profiles(state.store.as_ref(), &state.enricher, enriched).await;

    Ok(Json(json!({ "enrichedCount": enriched_count })))
}

/// Writes batch profiles onto the leads as they are stored now, so edits
/// made while the batch ran are kept. Returns how many leads were updated.
async fn store_profiles(store: &dyn LeadStore, enricher: &LeadEnricher, enriched: Vec<Lead>) -> usize {
    let mut updated = 0;
    for lead in enriched {
        let Some(profile) = lead.enrichment else {
            continue;
        };
        let attach = |current: &mut Lead| enricher.attach(current, profile.clone());
        if store.update(lead.id, &attach).await.is_some() {
            updated += 1;
        }
    }
    updated
}

/// POST /api/prospect
///
/// Generates new leads, scores and stores them. The body is optional.
pub async fn prospect(
    State(state): State<Arc<AppState>>,
    body: Option<Json<ProspectRequest>>,
) -> Result<(StatusCode, Json<Vec<Lead>>), AppError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();

    let mut leads = state.generator.generate(&request)?;
    for lead in &mut leads {
        state.enricher.scorer().apply(lead);
    }

    tracing::info!("Generated {} prospects", leads.len());
    state.store.upsert_many(leads.clone()).await;

    Ok((StatusCode::CREATED, Json(leads)))
}

async fn find_lead(state: &AppState, id: Uuid) -> Result<Lead, AppError> {
    state
        .store
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchScheduler;
    use crate::coordinator::EnrichmentCoordinator;
    use crate::lead_store::InMemoryLeadStore;
    use crate::scoring::{LeadScorer, ScoringStrategy};
    use std::time::Duration;

    fn enricher() -> LeadEnricher {
        let coordinator = Arc::new(EnrichmentCoordinator::new(Vec::new(), Duration::from_secs(1)));
        let scheduler = BatchScheduler::new(Arc::clone(&coordinator), 5, Duration::ZERO);
        LeadEnricher::new(coordinator, scheduler, LeadScorer::new(ScoringStrategy::Weighted))
    }

    #[tokio::test]
    async fn test_batch_write_back_keeps_concurrent_edits() {
        let store = InMemoryLeadStore::new();
        let enricher = enricher();
        let lead = Lead::new("Acme");
        store.upsert(lead.clone()).await;

        // Batch works from the copy read before the edit
        let enriched = enricher.enrich_leads(vec![lead.clone()]).await.unwrap();
        let mut edited = lead.clone();
        edited.job_title = Some("CEO".to_string());
        store.upsert(edited).await;

        let count = store_profiles(&store, &enricher, enriched).await;

        assert_eq!(count, 1);
        let stored = store.get(lead.id).await.unwrap();
        assert_eq!(stored.job_title.as_deref(), Some("CEO"));
        assert!(stored.is_enriched);
        assert!(stored.enrichment.is_some());
        // 40*.25 + 100*.25 + 50*.2 + 40*.15 + 0*.1 + 50*.05 = 53.5
        assert_eq!(stored.score, 54);
    }

    #[tokio::test]
    async fn test_batch_write_back_skips_unknown_leads() {
        let store = InMemoryLeadStore::new();
        let enricher = enricher();

        let enriched = enricher.enrich_leads(vec![Lead::new("Ghost")]).await.unwrap();

        assert_eq!(store_profiles(&store, &enricher, enriched).await, 0);
        assert!(store.list().await.is_empty());
    }
}
