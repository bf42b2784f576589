//! Concurrent fan-out over every registered source adapter.
//!
//! Each adapter call is wrapped, innermost first, in a per-call timeout, the
//! adapter's own circuit breaker and (optionally) the shared response cache.
//! The per-adapter results are then folded into one result per logical source.

use chrono::{Datelike, Utc};
use failsafe::futures::CircuitBreaker;
use futures::future::join_all;
use moka::future::Cache;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::cache_validator::ValidatedCacheEntry;
use crate::circuit_breaker::{create_source_circuit_breaker, SourceCircuitBreaker};
use crate::config::Config;
use crate::fusion::{fuse, sanitize};
use crate::models::{CompanyFields, EnrichedProfile, Lead, SourceId, SourceResult, SourceStatus};
use crate::sources::{build_adapters, CompanyQuery, SourceAdapter};

const CACHE_CAPACITY: u64 = 100_000;

/// Outcomes that count against an adapter's breaker.
enum SourceFault {
    Failed(SourceResult),
    TimedOut,
}

struct GuardedAdapter {
    adapter: Arc<dyn SourceAdapter>,
    breaker: SourceCircuitBreaker,
}

pub struct EnrichmentCoordinator {
    adapters: Vec<GuardedAdapter>,
    call_timeout: Duration,
    /// Sealed (`ValidatedCacheEntry`) `ok` results keyed by adapter and company.
    cache: Option<Cache<String, String>>,
}

impl EnrichmentCoordinator {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>, call_timeout: Duration) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| GuardedAdapter {
                adapter,
                breaker: create_source_circuit_breaker(),
            })
            .collect();

        Self {
            adapters,
            call_timeout,
            cache: None,
        }
    }

    /// Enables the response cache. A zero TTL leaves caching disabled.
    pub fn with_cache(mut self, ttl: Duration) -> Self {
        self.cache = if ttl.is_zero() {
            None
        } else {
            Some(
                Cache::builder()
                    .time_to_live(ttl)
                    .max_capacity(CACHE_CAPACITY)
                    .build(),
            )
        };
        self
    }

    /// Registry, timeout and cache as configured. `client` is only used by
    /// live adapters.
    pub fn from_config(config: &Config, client: &Client) -> Self {
        let adapters = build_adapters(config, client);
        tracing::info!(
            "Enrichment coordinator: {} adapters ({:?} mode), {}s timeout, cache TTL {}s",
            adapters.len(),
            config.source_mode,
            config.source_timeout_secs,
            config.source_cache_ttl_secs
        );

        Self::new(adapters, config.source_timeout())
            .with_cache(Duration::from_secs(config.source_cache_ttl_secs))
    }

    pub fn adapter_count(&self) -> usize {
        self.adapters.len()
    }

    /// Queries every adapter concurrently and returns one result per logical
    /// source that has at least one adapter, in fusion priority order.
    ///
    /// Never fails: every adapter outcome, including timeouts and open
    /// breakers, is expressed as a [`SourceResult`].
    pub async fn enrich(&self, company_name: &str, domain: Option<&str>) -> Vec<SourceResult> {
        let query = CompanyQuery::new(company_name, domain.map(String::from));

        let results = join_all(
            self.adapters
                .iter()
                .map(|guarded| self.call_adapter(guarded, &query)),
        )
        .await;

        let folded = fold_by_source(results);
        tracing::debug!(
            "Fan-out for {} settled: {}/{} sources ok",
            query.company_name,
            folded.iter().filter(|r| r.is_ok()).count(),
            folded.len()
        );
        folded
    }

    /// Fans out for the lead's company and fuses the results.
    pub async fn profile_lead(&self, lead: &Lead) -> EnrichedProfile {
        let domain = lead.domain();
        fuse(&self.enrich(&lead.company_name, domain.as_deref()).await)
    }

    async fn call_adapter(&self, guarded: &GuardedAdapter, query: &CompanyQuery) -> SourceResult {
        let kind = guarded.adapter.kind();
        let cache_key = query.cache_key(kind);

        if let Some(cache) = &self.cache {
            if let Some(sealed) = cache.get(&cache_key).await {
                match ValidatedCacheEntry::open::<SourceResult>(&sealed) {
                    Some(cached) => {
                        tracing::debug!("Cache hit for {}", cache_key);
                        return cached;
                    }
                    None => {
                        tracing::warn!("Discarding corrupted cache entry for {}", cache_key);
                        cache.invalidate(&cache_key).await;
                    }
                }
            }
        }

        let call = async {
            match tokio::time::timeout(self.call_timeout, guarded.adapter.fetch(query)).await {
                Ok(result) if result.status == SourceStatus::Error => Err(SourceFault::Failed(result)),
                Ok(result) => Ok(result),
                Err(_) => Err(SourceFault::TimedOut),
            }
        };

        let result = match guarded.breaker.call(call).await {
            Ok(result) => result,
            Err(failsafe::Error::Inner(SourceFault::Failed(result))) => result,
            Err(failsafe::Error::Inner(SourceFault::TimedOut)) => {
                tracing::warn!(
                    "Source {} timed out after {:?} for {}",
                    kind.as_str(),
                    self.call_timeout,
                    query.company_name
                );
                return SourceResult::unavailable(
                    kind.source_id(),
                    format!("{}: timed out after {:?}", kind.as_str(), self.call_timeout),
                );
            }
            Err(failsafe::Error::Rejected) => {
                tracing::info!("Source {} skipped: circuit open", kind.as_str());
                return SourceResult::unavailable(
                    kind.source_id(),
                    format!("{}: circuit open", kind.as_str()),
                );
            }
        };

        match result.status {
            SourceStatus::Ok => {
                if let Some(cache) = &self.cache {
                    if let Some(sealed) = ValidatedCacheEntry::seal(&result) {
                        cache.insert(cache_key, sealed).await;
                    }
                }
            }
            SourceStatus::Unavailable => tracing::info!(
                "Source {} unavailable for {}: {}",
                kind.as_str(),
                query.company_name,
                result.reason.as_deref().unwrap_or("no reason given")
            ),
            SourceStatus::Error => tracing::warn!(
                "Source {} failed for {}: {}",
                kind.as_str(),
                query.company_name,
                result.reason.as_deref().unwrap_or("no reason given")
            ),
        }

        result
    }
}

/// Folds per-adapter results into one result per logical source.
///
/// A logical source is `ok` if any of its adapters was; ok payloads are
/// sanitized, then merged in input order with earlier adapters winning scalar
/// conflicts, so a value one adapter got wrong can still come from another. Otherwise it
/// is `error` if any adapter errored, else `unavailable`, with the reasons
/// joined.
pub fn fold_by_source(results: Vec<SourceResult>) -> Vec<SourceResult> {
    let current_year = Utc::now().year();
    SourceId::PRIORITY_ORDER
        .iter()
        .filter_map(|source_id| {
            let group: Vec<&SourceResult> =
                results.iter().filter(|r| r.source_id == *source_id).collect();
            if group.is_empty() {
                return None;
            }

            let simulated = group.iter().any(|r| r.simulated);
            let ok: Vec<&&SourceResult> = group.iter().filter(|r| r.is_ok()).collect();

            let mut folded = if ok.is_empty() {
                let reason = group
                    .iter()
                    .filter_map(|r| r.reason.as_deref())
                    .collect::<Vec<_>>()
                    .join("; ");
                if group.iter().any(|r| r.status == SourceStatus::Error) {
                    SourceResult::error(*source_id, reason)
                } else {
                    SourceResult::unavailable(*source_id, reason)
                }
            } else {
                let mut payload = CompanyFields::default();
                for result in ok {
                    payload.merge_missing(&sanitize(*source_id, &result.payload, current_year));
                }
                SourceResult::ok(*source_id, payload)
            };

            folded.simulated = simulated;
            Some(folded)
        })
        .collect()
}
