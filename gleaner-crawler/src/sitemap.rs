//! Sitemap discovery: candidate generation, structural XML validation,
//! `<loc>` extraction, and bounded nested-index expansion.

use crate::error::Result;
use crate::fetch::SitemapTransport;
use crate::normalize;
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};
use url::Url;

/// Nested sitemap indexes are expanded at most this many levels deep.
const MAX_NESTED_DEPTH: usize = 2;
/// Hard cap on nested documents fetched per discovery, regardless of depth.
const MAX_NESTED_DOCUMENTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SitemapKind {
    Index,
    Standard,
    Compressed,
    Nested,
}

impl SitemapKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SitemapKind::Index => "index",
            SitemapKind::Standard => "standard",
            SitemapKind::Compressed => "compressed",
            SitemapKind::Nested => "nested",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapCandidate {
    pub url: String,
    pub priority: u8,
    pub kind: SitemapKind,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoveryOptions {
    /// Try the `.xml.gz` candidate first (bandwidth-constrained callers).
    pub prioritize_compressed: bool,
}

/// Yield metrics for one discovery run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryMetrics {
    pub attempted: usize,
    pub successful: usize,
    pub extracted: usize,
    pub success_rate: f64,
    pub avg_urls_per_sitemap: f64,
}

/// Outcome of a full discovery pass.
#[derive(Debug, Clone)]
pub struct SitemapDiscovery {
    pub urls: Vec<String>,
    pub metrics: DiscoveryMetrics,
}

/// `<loc>` values of one document, page entries and nested sitemap entries
/// kept apart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SitemapContent {
    pub page_urls: Vec<String>,
    pub nested_sitemaps: Vec<String>,
}

/// Ordered candidate sitemap locations for a site. Lower priority is tried
/// first; the sort is stable, so a compressed tie at priority 1 stays
/// behind the index candidate.
pub fn candidates(base_url: &str, opts: &DiscoveryOptions) -> Vec<SitemapCandidate> {
    let Ok(parsed) = Url::parse(base_url) else {
        return Vec::new();
    };
    let Some(host) = parsed.host_str() else {
        return Vec::new();
    };
    let origin = match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    };

    let compressed_priority = if opts.prioritize_compressed { 1 } else { 3 };
    let mut list = vec![
        SitemapCandidate {
            url: format!("{origin}/sitemap_index.xml"),
            priority: 1,
            kind: SitemapKind::Index,
        },
        SitemapCandidate {
            url: format!("{origin}/sitemap.xml"),
            priority: 2,
            kind: SitemapKind::Standard,
        },
        SitemapCandidate {
            url: format!("{origin}/sitemap.xml.gz"),
            priority: compressed_priority,
            kind: SitemapKind::Compressed,
        },
        SitemapCandidate {
            url: format!("{origin}/sitemap/sitemap.xml"),
            priority: 4,
            kind: SitemapKind::Nested,
        },
    ];
    list.sort_by_key(|candidate| candidate.priority);
    list
}

/// Structural validity: a `<urlset>` or `<sitemapindex>` root, at least one
/// well-formed `<loc>`, and at least one `<loc>` on the base hostname
/// exactly. Mixed-domain sitemaps pass if any entry matches; subdomains do
/// not count.
pub fn is_valid_sitemap(xml: &str, base_url: &str) -> bool {
    let lowered = xml.to_lowercase();
    if !lowered.contains("<urlset") && !lowered.contains("<sitemapindex") {
        return false;
    }
    let Some(base_host) = Url::parse(base_url).ok().and_then(|u| u.host_str().map(String::from))
    else {
        return false;
    };

    let content = extract(xml);
    let locs: Vec<&String> = content
        .page_urls
        .iter()
        .chain(content.nested_sitemaps.iter())
        .collect();
    if locs.is_empty() {
        return false;
    }
    locs.iter().any(|loc| {
        Url::parse(loc)
            .ok()
            .and_then(|u| u.host_str().map(|h| h == base_host))
            .unwrap_or(false)
    })
}

/// Pulls `<loc>` values out of a sitemap document, separating page entries
/// (`<url><loc>`) from nested sitemap entries (`<sitemap><loc>`). Tolerant
/// of malformed trailing input: whatever parsed before the error is kept.
pub fn extract(xml: &str) -> SitemapContent {
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text(true);

    let mut content = SitemapContent::default();
    let mut in_loc = false;
    let mut in_sitemap_entry = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sitemap" => in_sitemap_entry = true,
                b"url" => in_sitemap_entry = false,
                b"loc" => in_loc = true,
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_loc => {
                if let Ok(text) = e.unescape() {
                    let loc = text.trim().to_string();
                    if !loc.is_empty() && Url::parse(&loc).is_ok() {
                        if in_sitemap_entry {
                            content.nested_sitemaps.push(loc);
                        } else {
                            content.page_urls.push(loc);
                        }
                    }
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"sitemap" => in_sitemap_entry = false,
                b"loc" => in_loc = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!("Sitemap XML parse stopped early: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }
    content
}

fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().rposition(|b| *b == b':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

/// Computes yield metrics for a discovery run.
pub fn metrics(attempted: usize, successful: usize, extracted: usize) -> DiscoveryMetrics {
    let success_rate = if attempted == 0 {
        0.0
    } else {
        successful as f64 / attempted as f64
    };
    let avg_urls_per_sitemap = if successful == 0 {
        0.0
    } else {
        extracted as f64 / successful as f64
    };
    DiscoveryMetrics {
        attempted,
        successful,
        extracted,
        success_rate,
        avg_urls_per_sitemap,
    }
}

/// Tries candidate locations in priority order and returns the same-domain
/// page URLs of the first valid document, expanding nested indexes up to
/// [`MAX_NESTED_DEPTH`] levels and [`MAX_NESTED_DOCUMENTS`] documents.
/// Transport errors move discovery to the next candidate; they never fail
/// the crawl.
pub async fn discover(
    transport: &dyn SitemapTransport,
    base_url: &str,
    opts: &DiscoveryOptions,
) -> Result<SitemapDiscovery> {
    let base_host = Url::parse(base_url)
        .ok()
        .and_then(|u| u.host_str().map(String::from));

    let mut attempted = 0;
    let mut successful = 0;
    let mut extracted = 0;
    let mut urls = Vec::new();
    let mut seen = HashSet::new();

    for candidate in candidates(base_url, opts) {
        attempted += 1;
        debug!("Trying sitemap candidate {} ({})", candidate.url, candidate.kind.as_str());
        let xml = match transport.get_xml(&candidate.url).await {
            Ok(xml) => xml,
            Err(e) => {
                debug!("Sitemap candidate {} failed: {}", candidate.url, e);
                continue;
            }
        };
        if !is_valid_sitemap(&xml, base_url) {
            debug!("Sitemap candidate {} is not a valid sitemap", candidate.url);
            continue;
        }

        successful += 1;
        let content = extract(&xml);
        extracted += content.page_urls.len();
        collect_page_urls(&content.page_urls, &base_host, &mut seen, &mut urls);

        // Expand nested indexes breadth-first, one bounded wave per level.
        let mut nested = content.nested_sitemaps;
        let mut fetched_nested = 0;
        for _ in 0..MAX_NESTED_DEPTH {
            if nested.is_empty() {
                break;
            }
            let mut next_level = Vec::new();
            for nested_url in nested {
                if fetched_nested >= MAX_NESTED_DOCUMENTS {
                    warn!("Nested sitemap budget exhausted, ignoring remaining entries");
                    break;
                }
                fetched_nested += 1;
                attempted += 1;
                let nested_xml = match transport.get_xml(&nested_url).await {
                    Ok(xml) => xml,
                    Err(e) => {
                        debug!("Nested sitemap {} failed: {}", nested_url, e);
                        continue;
                    }
                };
                if !is_valid_sitemap(&nested_xml, base_url) {
                    continue;
                }
                successful += 1;
                let nested_content = extract(&nested_xml);
                extracted += nested_content.page_urls.len();
                collect_page_urls(&nested_content.page_urls, &base_host, &mut seen, &mut urls);
                next_level.extend(nested_content.nested_sitemaps);
            }
            nested = next_level;
        }

        // First valid candidate wins; the rest are fallbacks.
        break;
    }

    Ok(SitemapDiscovery {
        urls,
        metrics: metrics(attempted, successful, extracted),
    })
}

fn collect_page_urls(
    page_urls: &[String],
    base_host: &Option<String>,
    seen: &mut HashSet<String>,
    out: &mut Vec<String>,
) {
    for url in page_urls {
        let on_base_host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(String::from))
            .is_some_and(|host| base_host.as_deref() == Some(host.as_str()));
        if !on_base_host {
            continue;
        }
        if seen.insert(normalize::normalize(url)) {
            out.push(url.clone());
        }
    }
}
