use moka::future::Cache;
use reqwest::header::HeaderMap;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::get_page;
use crate::errors::AppError;

const PAGE_TTL: Duration = Duration::from_secs(60);
const PAGE_CAPACITY: u64 = 1_000;

/// A fetched homepage: response headers and body.
#[derive(Debug)]
pub struct Page {
    pub headers: HeaderMap,
    pub body: String,
}

/// Homepage downloads shared by the website scraper and the technology
/// fingerprint adapter.
///
/// Concurrent requests for the same URL wait on a single GET; the page is then
/// kept briefly so both adapters read the same response. Failures are not
/// cached.
pub struct HomepageFetcher {
    client: Client,
    pages: Cache<String, Arc<Page>>,
}

impl HomepageFetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            pages: Cache::builder()
                .time_to_live(PAGE_TTL)
                .max_capacity(PAGE_CAPACITY)
                .build(),
        }
    }

    pub async fn fetch(&self, url: &Url) -> Result<Arc<Page>, AppError> {
        let download = async {
            let (headers, body) = get_page(self.client.get(url.clone()), "homepage").await?;
            Ok::<_, AppError>(Arc::new(Page { headers, body }))
        };

        self.pages
            .try_get_with(url.to_string(), download)
            .await
            .map_err(|e| e.as_ref().clone())
    }
}
