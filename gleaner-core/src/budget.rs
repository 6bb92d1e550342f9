//! Crawl budget planning: clamped limits, time/cost estimates, risk
//! scoring, and human-readable optimization recommendations.

use gleaner_crawler::settings::{CrawlSettings, MAX_DEPTH_LIMIT, MAX_PAGES_LIMIT};
use serde::{Deserialize, Serialize};

/// Seconds budgeted per page before depth and retry adjustments.
const SECONDS_PER_PAGE: f64 = 2.5;
/// Each depth level past the first adds this much relative time.
const DEPTH_TIME_FACTOR: f64 = 0.2;
/// Retry and network slack on top of the raw estimate.
const NETWORK_BUFFER: f64 = 1.2;

const LONG_CRAWL_SECS: u64 = 300;
// The clamped maximum is 540s (100 pages at depth 5), so this fires only
// for near-maximal configurations.
const VERY_LONG_CRAWL_SECS: u64 = 480;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// Derived planning artifact, read-only after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlBudget {
    pub max_pages: usize,
    pub max_depth: usize,
    pub estimated_time_secs: u64,
    pub recommended_concurrency: usize,
    pub estimated_cost: f64,
    pub risk_level: RiskLevel,
    pub recommendations: Vec<String>,
}

/// Plans a budget from requested settings. Pure and deterministic; limits
/// over the hard maxima are clamped, never rejected.
pub fn plan(settings: &CrawlSettings) -> CrawlBudget {
    let max_pages = settings.max_pages.min(MAX_PAGES_LIMIT);
    let max_depth = settings.max_depth.min(MAX_DEPTH_LIMIT);

    let depth_multiplier = 1.0 + (max_depth.saturating_sub(1) as f64) * DEPTH_TIME_FACTOR;
    let estimated_time_secs =
        (max_pages as f64 * SECONDS_PER_PAGE * depth_multiplier * NETWORK_BUFFER).ceil() as u64;

    let recommended_concurrency = concurrency_for(max_pages);
    let estimated_cost = round3(
        estimated_time_secs as f64 * 0.001 + max_pages as f64 * 0.005 + max_pages as f64 * 0.002,
    );
    let risk_level = risk_level(max_pages, max_depth, recommended_concurrency);
    let recommendations = recommendations(
        max_pages,
        max_depth,
        estimated_time_secs,
        risk_level,
    );

    CrawlBudget {
        max_pages,
        max_depth,
        estimated_time_secs,
        recommended_concurrency,
        estimated_cost,
        risk_level,
        recommendations,
    }
}

fn concurrency_for(max_pages: usize) -> usize {
    if max_pages <= 10 {
        1
    } else if max_pages <= 50 {
        2
    } else if max_pages <= 100 {
        3
    } else {
        (max_pages as f64 / 30.0).ceil().min(4.0) as usize
    }
}

fn risk_level(max_pages: usize, max_depth: usize, concurrency: usize) -> RiskLevel {
    let mut score = 0;
    if max_pages > 75 {
        score += 2;
    } else if max_pages > 25 {
        score += 1;
    }
    if max_depth > 4 {
        score += 2;
    } else if max_depth > 2 {
        score += 1;
    }
    if concurrency > 3 {
        score += 1;
    }
    if score >= 4 {
        RiskLevel::High
    } else if score >= 2 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Each condition fires independently; the default message only appears
/// when nothing else did.
fn recommendations(
    max_pages: usize,
    max_depth: usize,
    estimated_time_secs: u64,
    risk_level: RiskLevel,
) -> Vec<String> {
    let mut out = Vec::new();
    if estimated_time_secs > LONG_CRAWL_SECS {
        out.push(format!(
            "Estimated crawl time is {estimated_time_secs}s; consider lowering max_pages for faster turnaround"
        ));
    }
    if risk_level == RiskLevel::High {
        out.push(
            "High-risk configuration; reduce page count or depth to avoid rate limiting".to_string(),
        );
    }
    if max_pages > 50 && max_depth <= 2 {
        out.push(
            "Wide, shallow crawl; deeper pages may hold more specific content than breadth alone finds"
                .to_string(),
        );
    }
    if max_depth >= 4 && max_pages <= 20 {
        out.push(
            "Deep, narrow crawl; the page budget may be exhausted before reaching the deepest levels"
                .to_string(),
        );
    }
    if estimated_time_secs > VERY_LONG_CRAWL_SECS {
        out.push(
            "Crawl will run over eight minutes; schedule it off-peak and monitor progress"
                .to_string(),
        );
    }
    if out.is_empty() {
        out.push("Configuration looks good for the requested scope".to_string());
    }
    out
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
