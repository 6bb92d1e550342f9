//! Mapping quality pages into ranked, content-addressed knowledge items.

use chrono::{DateTime, Utc};
use gleaner_crawler::page::CrawledPage;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

/// One ingestable unit of site knowledge. `id` is derived from the page
/// URL alone, so re-crawling the same page upserts rather than duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub relevance_score: f64,
    pub source: String,
    pub last_updated: DateTime<Utc>,
}

impl KnowledgeItem {
    /// Builds an item from a quality-passing page. The caller is expected
    /// to have applied the quality filter already.
    pub fn from_page(page: &CrawledPage) -> Self {
        Self {
            id: knowledge_id(&page.url),
            title: compose_title(&page.title, &page.url),
            content: page.content.clone(),
            category: "website".to_string(),
            tags: vec![
                "website".to_string(),
                "crawled".to_string(),
                format!("depth-{}", page.depth),
            ],
            relevance_score: relevance_score(page),
            source: page.url.clone(),
            last_updated: page.crawled_at,
        }
    }
}

/// Deterministic, content-addressed identifier: query and fragment are
/// stripped so tracking-parameter variants of a URL share one id.
pub fn knowledge_id(url: &str) -> String {
    let stable = match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    };
    let digest = Sha256::digest(stable.as_bytes());
    format!("website_{}", &hex::encode(digest)[..16])
}

fn compose_title(page_title: &str, url: &str) -> String {
    let path = Url::parse(url).map(|u| u.path().to_string()).unwrap_or_default();
    if path.is_empty() || path == "/" {
        page_title.to_string()
    } else {
        format!("{page_title} | {path}")
    }
}

/// Base 0.5, content-length tiers at 500/1000/2000 chars, depth decay,
/// fast-response and good-title bonuses, clamped to [0.1, 1.0].
pub fn relevance_score(page: &CrawledPage) -> f64 {
    let mut score = 0.5;
    for tier in [500, 1000, 2000] {
        if page.content.len() > tier {
            score += 0.1;
        }
    }
    score -= 0.05 * page.depth as f64;
    if page.response_time_ms.is_some_and(|ms| ms < 1000) {
        score += 0.05;
    }
    let title_len = page.title.len();
    if title_len > 10 && title_len < 100 {
        score += 0.1;
    }
    score.clamp(0.1, 1.0)
}
