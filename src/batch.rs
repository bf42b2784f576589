use futures::future::join_all;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::coordinator::EnrichmentCoordinator;
use crate::errors::AppError;
use crate::models::{EnrichedProfile, Lead};

/// Splits `len` items into consecutive windows of at most `window_size`.
pub fn plan_windows(len: usize, window_size: usize) -> Result<Vec<Range<usize>>, AppError> {
    if window_size == 0 {
        return Err(AppError::Configuration(
            "Batch window size must be at least 1".to_string(),
        ));
    }

    Ok((0..len)
        .step_by(window_size)
        .map(|start| start..(start + window_size).min(len))
        .collect())
}

/// Runs the fan-out over many leads, one window of concurrent fan-outs at a
/// time with a pacing delay between windows.
pub struct BatchScheduler {
    coordinator: Arc<EnrichmentCoordinator>,
    window_size: usize,
    pacing: Duration,
}

impl BatchScheduler {
    pub fn new(coordinator: Arc<EnrichmentCoordinator>, window_size: usize, pacing: Duration) -> Self {
        Self {
            coordinator,
            window_size,
            pacing,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Enriches every lead, keyed by lead id.
    ///
    /// Leads whose sources all fail still get an (empty, low-quality) profile.
    /// A repeated lead id keeps its first profile. The only error is an
    /// invalid window size, reported before any source is called.
    pub async fn enrich_batch(
        &self,
        leads: &[Lead],
    ) -> Result<HashMap<Uuid, EnrichedProfile>, AppError> {
        let windows = plan_windows(leads.len(), self.window_size)?;
        let window_count = windows.len();
        let mut profiles = HashMap::with_capacity(leads.len());

        tracing::info!(
            "Enriching {} leads in {} windows of up to {}",
            leads.len(),
            window_count,
            self.window_size
        );

        for (index, window) in windows.into_iter().enumerate() {
            if index > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }

            let batch = &leads[window];
            let fused = join_all(batch.iter().map(|lead| self.coordinator.profile_lead(lead))).await;

            for (lead, profile) in batch.iter().zip(fused) {
                profiles.entry(lead.id).or_insert(profile);
            }

            tracing::debug!("Batch window {}/{} settled", index + 1, window_count);
        }

        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twelve_leads_in_windows_of_five() {
        let windows = plan_windows(12, 5).unwrap();
        let sizes: Vec<usize> = windows.iter().map(|w| w.len()).collect();
        assert_eq!(sizes, vec![5, 5, 2]);
        assert_eq!(windows[2], 10..12);
    }

    #[test]
    fn test_edge_sizes() {
        assert!(plan_windows(0, 5).unwrap().is_empty());
        assert_eq!(plan_windows(5, 5).unwrap(), vec![0..5]);
        assert_eq!(plan_windows(3, 1).unwrap().len(), 3);
    }

    #[test]
    fn test_zero_window_is_configuration_error() {
        match plan_windows(3, 0) {
            Err(AppError::Configuration(_)) => {}
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_window_batch_fails_before_any_call() {
        let coordinator = Arc::new(EnrichmentCoordinator::new(Vec::new(), Duration::from_secs(1)));
        let scheduler = BatchScheduler::new(coordinator, 0, Duration::ZERO);

        let result = scheduler.enrich_batch(&[Lead::new("Acme")]).await;
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_duplicate_ids_keep_first_profile() {
        let coordinator = Arc::new(EnrichmentCoordinator::new(Vec::new(), Duration::from_secs(1)));
        let scheduler = BatchScheduler::new(coordinator, 2, Duration::ZERO);

        let lead = Lead::new("Acme");
        let profiles = scheduler
            .enrich_batch(&[lead.clone(), lead.clone(), Lead::new("Other")])
            .await
            .unwrap();

        assert_eq!(profiles.len(), 2);
        assert!(profiles.contains_key(&lead.id));
    }
}
