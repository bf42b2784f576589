use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{
    get_json, int_at, into_source_result, str_at, AdapterKind, CompanyQuery, SourceAdapter,
};
use crate::config::ApiEndpoint;
use crate::errors::AppError;
use crate::models::{union_case_insensitive, CompanyFields, SourceResult};

/// Repositories sampled for language detection.
const REPO_SAMPLE_SIZE: &str = "30";

/// Code-hosting organization statistics (GitHub REST API).
///
/// Works without a token at the anonymous rate limit.
pub struct CodeHostingAdapter {
    client: Client,
    endpoint: ApiEndpoint,
}

impl CodeHostingAdapter {
    pub fn new(client: Client, endpoint: ApiEndpoint) -> Self {
        Self { client, endpoint }
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json");
        match self.endpoint.api_key.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Organization login guessed from the domain label, then the name slug.
    fn login(query: &CompanyQuery) -> Option<String> {
        query
            .domain_label()
            .or_else(|| Some(query.slug().replace('-', "")))
            .filter(|login| !login.is_empty())
    }

    async fn lookup(&self, query: &CompanyQuery) -> Result<CompanyFields, AppError> {
        let login = Self::login(query)
            .ok_or_else(|| AppError::NotFound("no organization handle".to_string()))?;

        tracing::info!("Fetching code-hosting organization: {}", login);
        let org = get_json(
            self.request(&format!("{}/orgs/{}", self.endpoint.base_url, login)),
            "code hosting",
        )
        .await?;

        let mut fields = parse_organization(&org);

        // Languages are a bonus; a failed repo listing keeps the org data
        let repos_url = format!(
            "{}/orgs/{}/repos?per_page={}&sort=pushed",
            self.endpoint.base_url, login, REPO_SAMPLE_SIZE
        );
        match get_json(self.request(&repos_url), "code hosting repos").await {
            Ok(repos) => union_case_insensitive(&mut fields.tech_stack, &repo_languages(&repos)),
            Err(e) => tracing::debug!("Skipping repository languages for {}: {}", login, e),
        }

        Ok(fields)
    }
}

#[async_trait]
impl SourceAdapter for CodeHostingAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::CodeHosting
    }

    async fn fetch(&self, query: &CompanyQuery) -> SourceResult {
        into_source_result(self.kind(), self.lookup(query).await)
    }
}

pub(crate) fn parse_organization(org: &Value) -> CompanyFields {
    let mut fields = CompanyFields {
        description: str_at(org, "/description"),
        headquarters: str_at(org, "/location"),
        website: str_at(org, "/blog"),
        public_repos: int_at(org, "/public_repos"),
        followers: int_at(org, "/followers"),
        ..Default::default()
    };

    if let Some(html_url) = str_at(org, "/html_url") {
        fields.social_links.insert("github".to_string(), html_url);
    }
    if let Some(handle) = str_at(org, "/twitter_username") {
        fields
            .social_links
            .insert("twitter".to_string(), format!("https://twitter.com/{}", handle));
    }

    fields
}

/// Distinct primary languages across the sampled repositories, most used first.
pub(crate) fn repo_languages(repos: &Value) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for language in repos
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|repo| str_at(repo, "/language"))
    {
        match counts.iter_mut().find(|(l, _)| *l == language) {
            Some((_, n)) => *n += 1,
            None => counts.push((language, 1)),
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().map(|(l, _)| l).collect()
}
