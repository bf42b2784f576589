use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use scraper::{Html, Selector};
use url::Url;

use super::{into_source_result, site_url, AdapterKind, CompanyQuery, HomepageFetcher, SourceAdapter};
use crate::errors::AppError;
use crate::models::{CompanyFields, SourceResult};

/// Social networks recognised in homepage links, matched on the link host.
const SOCIAL_HOSTS: [(&str, &str); 6] = [
    ("linkedin.com", "linkedin"),
    ("twitter.com", "twitter"),
    ("x.com", "twitter"),
    ("github.com", "github"),
    ("facebook.com", "facebook"),
    ("youtube.com", "youtube"),
];

/// Scrapes the company homepage for its self-description and social links.
pub struct WebsiteScraperAdapter {
    pages: Arc<HomepageFetcher>,
}

impl WebsiteScraperAdapter {
    pub fn new(pages: Arc<HomepageFetcher>) -> Self {
        Self { pages }
    }

    async fn lookup(&self, query: &CompanyQuery) -> Result<CompanyFields, AppError> {
        let url = site_url(query)?;
        tracing::info!("Scraping company website: {}", url);

        let page = self.pages.fetch(&url).await?;
        Ok(extract_site_details(&page.body, &url))
    }
}

#[async_trait]
impl SourceAdapter for WebsiteScraperAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::WebsiteScraper
    }

    async fn fetch(&self, query: &CompanyQuery) -> SourceResult {
        into_source_result(self.kind(), self.lookup(query).await)
    }
}

/// Extracts company details from a homepage. `site` is the URL the page was
/// served from and resolves relative links.
pub fn extract_site_details(html: &str, site: &Url) -> CompanyFields {
    let doc = Html::parse_document(html);

    let description = meta_content(&doc, r#"meta[name="description"]"#)
        .or_else(|| meta_content(&doc, r#"meta[property="og:description"]"#));

    let mut fields = CompanyFields {
        description,
        founded_year: founded_year(&page_text(&doc)),
        website: Some(site.origin().ascii_serialization()),
        ..Default::default()
    };

    if let Ok(link_sel) = Selector::parse("a[href]") {
        for href in doc.select(&link_sel).filter_map(|el| el.value().attr("href")) {
            let Ok(link) = site.join(href) else { continue };
            let Some(host) = link.host_str() else { continue };
            let host = host.trim_start_matches("www.");

            if let Some((_, network)) = SOCIAL_HOSTS
                .iter()
                .find(|(domain, _)| host == *domain || host.ends_with(&format!(".{}", domain)))
            {
                fields
                    .social_links
                    .entry(network.to_string())
                    .or_insert_with(|| link.to_string());
            }
        }
    }

    fields
}

fn meta_content(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    doc.select(&sel)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(String::from)
}

fn page_text(doc: &Html) -> String {
    match Selector::parse("body") {
        Ok(body_sel) => doc
            .select(&body_sel)
            .flat_map(|body| body.text())
            .collect::<Vec<_>>()
            .join(" "),
        Err(_) => String::new(),
    }
}

fn founded_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:founded|established|since)\s+(?:in\s+)?(1[89]\d{2}|20\d{2})\b")
            .expect("founded-year regex must compile")
    })
}

/// Year from phrases like "Founded in 2012" or "since 1998".
fn founded_year(text: &str) -> Option<i32> {
    founded_re()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOMEPAGE: &str = r#"
        <html>
          <head>
            <meta name="description" content="  Acme makes observability simple. ">
            <meta property="og:description" content="Ignored">
          </head>
          <body>
            <p>Founded in 2015 by two engineers.</p>
            <a href="https://www.linkedin.com/company/acme">LinkedIn</a>
            <a href="https://x.com/acmehq">X</a>
            <a href="https://twitter.com/acme_old">Old twitter</a>
            <a href="/careers">Careers</a>
          </body>
        </html>"#;

    #[test]
    fn test_extract_site_details() {
        let site = Url::parse("https://acme.io/").unwrap();
        let fields = extract_site_details(HOMEPAGE, &site);

        assert_eq!(
            fields.description.as_deref(),
            Some("Acme makes observability simple.")
        );
        assert_eq!(fields.founded_year, Some(2015));
        assert_eq!(fields.website.as_deref(), Some("https://acme.io"));
        assert_eq!(fields.social_links["linkedin"], "https://www.linkedin.com/company/acme");
        // First link per network wins
        assert_eq!(fields.social_links["twitter"], "https://x.com/acmehq");
        assert_eq!(fields.social_links.len(), 2);
    }

    #[test]
    fn test_og_description_fallback() {
        let html = r#"<html><head><meta property="og:description" content="From OG"></head><body></body></html>"#;
        let site = Url::parse("https://acme.io").unwrap();
        let fields = extract_site_details(html, &site);

        assert_eq!(fields.description.as_deref(), Some("From OG"));
        assert_eq!(fields.founded_year, None);
    }

    #[test]
    fn test_founded_year_phrases() {
        assert_eq!(founded_year("Serving customers since 1998."), Some(1998));
        assert_eq!(founded_year("ESTABLISHED IN 2004"), Some(2004));
        assert_eq!(founded_year("Call 2015 today"), None);
    }

    #[test]
    fn test_founded_pattern_compiled_once() {
        assert!(std::ptr::eq(founded_re(), founded_re()));
    }
}
