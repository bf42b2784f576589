use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

use crate::scoring::ScoringStrategy;

/// Whether source adapters call live third-party APIs or return labelled fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Live,
    Simulated,
}

impl SourceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceMode::Live => "live",
            SourceMode::Simulated => "simulated",
        }
    }
}

impl std::str::FromStr for SourceMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "live" => Ok(SourceMode::Live),
            "simulated" | "simulation" | "mock" => Ok(SourceMode::Simulated),
            other => anyhow::bail!("SOURCE_MODE must be 'live' or 'simulated', got '{}'", other),
        }
    }
}

/// Endpoint and credential of one third-party API.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ApiEndpoint {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub source_mode: SourceMode,
    pub scoring_strategy: ScoringStrategy,
    pub batch_size: usize,
    pub batch_pacing_ms: u64,
    pub source_timeout_secs: u64,
    /// 0 disables the adapter response cache.
    pub source_cache_ttl_secs: u64,
    pub professional_network: ApiEndpoint,
    pub funding_registry: ApiEndpoint,
    pub code_hosting: ApiEndpoint,
    pub search: ApiEndpoint,
    pub news: ApiEndpoint,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Server Port: {}", config.port);
        tracing::debug!("Source mode: {:?}", config.source_mode);
        tracing::debug!("Scoring strategy: {}", config.scoring_strategy.as_str());
        tracing::debug!(
            "Batch window: {} leads, {}ms pacing",
            config.batch_size,
            config.batch_pacing_ms
        );
        tracing::debug!("Code hosting API: {}", config.code_hosting.base_url);

        Ok(config)
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let scoring_strategy: ScoringStrategy = var("SCORING_STRATEGY")
            .unwrap_or_else(|| "weighted".to_string())
            .parse()?;
        scoring_strategy
            .weights()
            .validate()
            .context("Invalid scoring weights")?;

        let config = Self {
            port: var("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            source_mode: var("SOURCE_MODE")
                .unwrap_or_else(|| "simulated".to_string())
                .parse()?,
            scoring_strategy,
            batch_size: var("BATCH_SIZE")
                .unwrap_or_else(|| "5".to_string())
                .parse::<usize>()
                .map_err(|_| anyhow::anyhow!("BATCH_SIZE must be a positive integer"))
                .and_then(|size| {
                    if size == 0 {
                        anyhow::bail!("BATCH_SIZE must be at least 1");
                    }
                    Ok(size)
                })?,
            batch_pacing_ms: var("BATCH_PACING_MS")
                .unwrap_or_else(|| "1000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("BATCH_PACING_MS must be a number of milliseconds"))?,
            source_timeout_secs: var("SOURCE_TIMEOUT_SECS")
                .unwrap_or_else(|| "12".to_string())
                .parse::<u64>()
                .map_err(|_| anyhow::anyhow!("SOURCE_TIMEOUT_SECS must be a number of seconds"))
                .and_then(|secs| {
                    if !(1..=60).contains(&secs) {
                        anyhow::bail!("SOURCE_TIMEOUT_SECS must be between 1 and 60");
                    }
                    Ok(secs)
                })?,
            source_cache_ttl_secs: var("SOURCE_CACHE_TTL_SECS")
                .unwrap_or_else(|| "3600".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SOURCE_CACHE_TTL_SECS must be a number of seconds"))?,
            professional_network: endpoint(
                &var,
                "PROFESSIONAL_NETWORK_API_URL",
                "PROFESSIONAL_NETWORK_API_KEY",
                "https://nubela.co/proxycurl/api",
            )?,
            funding_registry: endpoint(
                &var,
                "FUNDING_REGISTRY_API_URL",
                "FUNDING_REGISTRY_API_KEY",
                "https://api.crunchbase.com/api/v4",
            )?,
            code_hosting: endpoint(
                &var,
                "CODE_HOSTING_API_URL",
                "CODE_HOSTING_TOKEN",
                "https://api.github.com",
            )?,
            search: endpoint(&var, "SEARCH_API_URL", "SEARCH_API_KEY", "https://serpapi.com")?,
            news: endpoint(&var, "NEWS_API_URL", "NEWS_API_KEY", "https://newsapi.org")?,
        };

        Ok(config)
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }

    pub fn batch_pacing(&self) -> Duration {
        Duration::from_millis(self.batch_pacing_ms)
    }
}

fn endpoint<F>(var: &F, url_key: &str, key_key: &str, default_url: &str) -> anyhow::Result<ApiEndpoint>
where
    F: Fn(&str) -> Option<String>,
{
    let base_url = var(url_key).unwrap_or_else(|| default_url.to_string());
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", url_key);
    }

    Ok(ApiEndpoint {
        base_url: base_url.trim_end_matches('/').to_string(),
        api_key: var(key_key),
    })
}
