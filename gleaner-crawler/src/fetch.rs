//! Fetch-layer seams and their default HTTP implementations.
//!
//! The orchestrator only sees the [`PageFetcher`] and [`SitemapTransport`]
//! traits; [`HttpFetcher`] is the production implementation of both, and
//! tests swap in wiremock-backed or hand-rolled fakes.

use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

/// Elements whose text is boilerplate, not page content.
const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "iframe", "svg",
];

/// One successful HTTP response, before any quality judgement.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub html: String,
    pub status_code: u16,
    pub response_time_ms: u64,
    pub content_type: Option<String>,
    pub final_url: String,
}

impl FetchedPage {
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false)
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches one page. Transport failures are errors; HTTP error statuses
    /// are not, the caller decides what a 404 means.
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;

    /// Lightweight reachability probe. Returns the response status.
    async fn head(&self, url: &str) -> Result<u16>;
}

#[async_trait]
pub trait SitemapTransport: Send + Sync {
    /// Plain GET returning the body as text. No auth.
    async fn get_xml(&self, url: &str) -> Result<String>;
}

/// Production fetcher. One pooled client per instance, cheap to clone.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        let client = Client::builder()
            .user_agent("Gleaner/0.1 (https://github.com/mottgrove/gleaner)")
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs((timeout_secs / 2).max(1)))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .http2_adaptive_window(true)
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        debug!("Fetching {}", url);
        let start = Instant::now();
        let response = self.client.get(url).send().await?;
        let response_time_ms = start.elapsed().as_millis() as u64;

        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let final_url = response.url().to_string();
        let html = response.text().await?;

        Ok(FetchedPage {
            html,
            status_code,
            response_time_ms,
            content_type,
            final_url,
        })
    }

    async fn head(&self, url: &str) -> Result<u16> {
        let response = self.client.head(url).send().await?;
        Ok(response.status().as_u16())
    }
}

#[async_trait]
impl SitemapTransport for HttpFetcher {
    async fn get_xml(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(crate::error::CrawlError::Parse(format!(
                "Sitemap request returned HTTP {}",
                status.as_u16()
            )));
        }
        Ok(response.text().await?)
    }
}

/// Parsed view of one HTML document, scoped to a base URL for link
/// resolution.
pub struct PageDocument {
    document: Html,
    base_url: String,
}

impl PageDocument {
    pub fn parse(html: &str, base_url: &str) -> Self {
        Self {
            document: Html::parse_document(html),
            base_url: base_url.to_string(),
        }
    }

    pub fn title(&self) -> String {
        let selector = Selector::parse("title").expect("title selector");
        self.document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default()
    }

    /// Visible body text with boilerplate elements stripped and whitespace
    /// collapsed. Prefers `<article>`/`<main>` as the content root when
    /// present.
    pub fn body_text(&self) -> String {
        let root = ["article", "main", "body"]
            .iter()
            .find_map(|tag| {
                let selector = Selector::parse(tag).expect("content root selector");
                self.document.select(&selector).next()
            });
        let Some(root) = root else {
            return String::new();
        };
        let mut out = String::new();
        collect_text(root, &mut out);
        collapse_whitespace(&out)
    }

    /// Absolute same-document links. Empty, `javascript:`, `mailto:`,
    /// `tel:` and pure-fragment hrefs are dropped; fragments are stripped
    /// from the rest.
    pub fn links(&self) -> Vec<String> {
        let selector = Selector::parse("a[href]").expect("link selector");
        self.document
            .select(&selector)
            .filter_map(|el| el.value().attr("href"))
            .filter_map(|href| resolve_link(&self.base_url, href))
            .collect()
    }
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    if SKIP_TAGS.contains(&element.value().name()) {
        return;
    }
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(child_el) = ElementRef::wrap(child) {
            collect_text(child_el, out);
        }
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn resolve_link(base: &str, href: &str) -> Option<String> {
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }
    let base_url = Url::parse(base).ok()?;
    let mut resolved = base_url.join(href).ok()?;
    resolved.set_fragment(None);
    Some(resolved.to_string())
}
