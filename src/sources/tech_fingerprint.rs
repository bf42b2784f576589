use async_trait::async_trait;
use reqwest::header::HeaderMap;
use scraper::{Html, Selector};
use std::sync::Arc;

use super::{into_source_result, site_url, AdapterKind, CompanyQuery, HomepageFetcher, SourceAdapter};
use crate::errors::AppError;
use crate::models::{union_case_insensitive, CompanyFields, SourceResult};

/// Where a signature is looked for.
#[derive(Debug, Clone, Copy)]
enum Signal {
    /// Response header whose value contains the needle.
    Header(&'static str),
    /// Header that only needs to be present.
    HeaderPresent,
    /// Raw markup.
    Markup,
    /// `<script src>` attribute.
    ScriptSrc,
}

struct Signature {
    signal: Signal,
    needle: &'static str,
    technologies: &'static [&'static str],
}

const fn sig(signal: Signal, needle: &'static str, technologies: &'static [&'static str]) -> Signature {
    Signature {
        signal,
        needle,
        technologies,
    }
}

/// Signatures specific enough to report without corroboration. Needles are lowercase.
const SIGNATURES: &[Signature] = &[
    sig(Signal::Header("server"), "nginx", &["Nginx"]),
    sig(Signal::Header("server"), "cloudflare", &["Cloudflare"]),
    sig(Signal::Header("server"), "apache", &["Apache"]),
    sig(Signal::Header("server"), "amazons3", &["AWS"]),
    sig(Signal::Header("x-powered-by"), "express", &["Node.js", "Express"]),
    sig(Signal::Header("x-powered-by"), "next.js", &["Next.js", "React"]),
    sig(Signal::Header("x-powered-by"), "php", &["PHP"]),
    sig(Signal::Header("x-powered-by"), "asp.net", &["ASP.NET"]),
    sig(Signal::HeaderPresent, "x-amz-cf-id", &["AWS"]),
    sig(Signal::HeaderPresent, "x-vercel-id", &["Vercel"]),
    sig(Signal::HeaderPresent, "x-nf-request-id", &["Netlify"]),
    sig(Signal::HeaderPresent, "x-shopify-stage", &["Shopify"]),
    sig(Signal::Markup, "__next_data__", &["Next.js", "React"]),
    sig(Signal::Markup, "data-reactroot", &["React"]),
    sig(Signal::Markup, "ng-version=", &["Angular"]),
    sig(Signal::Markup, "window.__nuxt__", &["Nuxt", "Vue.js"]),
    sig(Signal::Markup, "data-v-app", &["Vue.js"]),
    sig(Signal::Markup, "/wp-content/", &["WordPress", "PHP"]),
    sig(Signal::Markup, "___gatsby", &["Gatsby", "React"]),
    sig(Signal::ScriptSrc, "react-dom", &["React"]),
    sig(Signal::ScriptSrc, "cdn.shopify.com", &["Shopify"]),
    sig(Signal::ScriptSrc, "googletagmanager.com", &["Google Tag Manager"]),
    sig(Signal::ScriptSrc, "js.stripe.com", &["Stripe"]),
    sig(Signal::ScriptSrc, "js.hs-scripts.com", &["HubSpot"]),
    sig(Signal::ScriptSrc, "widget.intercom.io", &["Intercom"]),
    sig(Signal::ScriptSrc, "cdn.segment.com", &["Segment"]),
    sig(Signal::ScriptSrc, "amazonaws.com", &["AWS"]),
];

/// Detects the technologies a company website is built and served with.
pub struct TechFingerprintAdapter {
    pages: Arc<HomepageFetcher>,
}

impl TechFingerprintAdapter {
    pub fn new(pages: Arc<HomepageFetcher>) -> Self {
        Self { pages }
    }

    async fn lookup(&self, query: &CompanyQuery) -> Result<CompanyFields, AppError> {
        let url = site_url(query)?;
        tracing::info!("Fingerprinting technologies for: {}", url);

        let page = self.pages.fetch(&url).await?;
        Ok(CompanyFields {
            tech_stack: detect_technologies(&page.headers, &page.body),
            ..Default::default()
        })
    }
}

#[async_trait]
impl SourceAdapter for TechFingerprintAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::TechFingerprint
    }

    async fn fetch(&self, query: &CompanyQuery) -> SourceResult {
        into_source_result(self.kind(), self.lookup(query).await)
    }
}

/// Technology labels evidenced by a response, in signature order, without
/// duplicates.
pub fn detect_technologies(headers: &HeaderMap, html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let markup = html.to_lowercase();

    let script_sources: Vec<String> = match Selector::parse("script[src]") {
        Ok(sel) => doc
            .select(&sel)
            .filter_map(|el| el.value().attr("src"))
            .map(str::to_lowercase)
            .collect(),
        Err(_) => Vec::new(),
    };

    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_lowercase)
    };

    let mut detected = Vec::new();
    for signature in SIGNATURES {
        let matched = match signature.signal {
            Signal::Header(name) => header_value(name)
                .map(|value| value.contains(signature.needle))
                .unwrap_or(false),
            Signal::HeaderPresent => headers.contains_key(signature.needle),
            Signal::Markup => markup.contains(signature.needle),
            Signal::ScriptSrc => script_sources.iter().any(|src| src.contains(signature.needle)),
        };

        if matched {
            let labels: Vec<String> = signature.technologies.iter().map(|t| t.to_string()).collect();
            union_case_insensitive(&mut detected, &labels);
        }
    }

    if let Some(generator) = generator_name(&doc) {
        union_case_insensitive(&mut detected, &[generator]);
    }

    detected
}

/// Product name from `<meta name="generator" content="WordPress 6.4.2">`.
fn generator_name(doc: &Html) -> Option<String> {
    let sel = Selector::parse(r#"meta[name="generator"]"#).ok()?;
    let content = doc.select(&sel).next()?.value().attr("content")?;
    let name: Vec<&str> = content
        .split_whitespace()
        .take_while(|word| !word.starts_with(|c: char| c.is_ascii_digit() || c == 'v'))
        .collect();

    if name.is_empty() {
        None
    } else {
        Some(name.join(" "))
    }
}
