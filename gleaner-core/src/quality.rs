//! Content-quality heuristics and aggregate crawl metrics.

use gleaner_crawler::page::{CrawledPage, PageStatus};
use serde::{Deserialize, Serialize};

/// Minimum raw content length for a page to be worth keeping.
const MIN_CONTENT_LENGTH: usize = 100;
/// Minimum whitespace-collapsed text length.
const MIN_TEXT_LENGTH: usize = 50;
/// Minimum ratio of markup-stripped text to raw content; lower means the
/// page is mostly tags.
const MIN_TEXT_RATIO: f64 = 0.3;

/// Aggregate metrics over one crawl's recorded pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlMetrics {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub quality: usize,
    pub average_response_time_ms: u64,
    pub success_rate: f64,
    pub quality_score: f64,
}

/// Whether a page clears the bar for knowledge-item extraction.
pub fn is_quality_content(page: &CrawledPage) -> bool {
    if page.status != PageStatus::Success {
        return false;
    }
    if page.content.len() < MIN_CONTENT_LENGTH {
        return false;
    }
    if page.title.trim().is_empty() {
        return false;
    }
    let collapsed = collapse_whitespace(&page.content);
    if collapsed.len() < MIN_TEXT_LENGTH {
        return false;
    }
    let stripped = strip_markup(&page.content);
    stripped.len() as f64 >= page.content.len() as f64 * MIN_TEXT_RATIO
}

/// Counts by status plus a blended 0-100 quality score: 40% success rate,
/// 40% quality rate, up to 20 points for average quality-content length.
pub fn compute_metrics(pages: &[CrawledPage]) -> CrawlMetrics {
    let total = pages.len();
    let successful = pages.iter().filter(|p| p.status == PageStatus::Success).count();
    let failed = pages.iter().filter(|p| p.status == PageStatus::Failed).count();
    let skipped = pages.iter().filter(|p| p.status == PageStatus::Skipped).count();

    let response_times: Vec<u64> = pages
        .iter()
        .filter(|p| p.status == PageStatus::Success)
        .filter_map(|p| p.response_time_ms)
        .collect();
    let average_response_time_ms = if response_times.is_empty() {
        0
    } else {
        response_times.iter().sum::<u64>() / response_times.len() as u64
    };

    let quality_pages: Vec<&CrawledPage> =
        pages.iter().filter(|p| is_quality_content(p)).collect();
    let quality = quality_pages.len();

    let success_rate = if total == 0 {
        0.0
    } else {
        successful as f64 / total as f64 * 100.0
    };
    let quality_rate = if total == 0 {
        0.0
    } else {
        quality as f64 / total as f64 * 100.0
    };
    let avg_quality_len = if quality == 0 {
        0.0
    } else {
        quality_pages.iter().map(|p| p.content.len()).sum::<usize>() as f64 / quality as f64
    };
    let quality_score = (success_rate * 0.4
        + quality_rate * 0.4
        + (avg_quality_len / 1000.0 * 20.0).min(20.0))
    .min(100.0);

    CrawlMetrics {
        total,
        successful,
        failed,
        skipped,
        quality,
        average_response_time_ms,
        success_rate,
        quality_score,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes `<...>` tag spans, leaving only text content.
fn strip_markup(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut in_tag = false;
    for ch in content.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}
