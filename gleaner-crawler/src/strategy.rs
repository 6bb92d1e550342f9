//! Execution strategy selection, keyed entirely off the page budget.

use crate::settings::CrawlSettings;
use serde::{Deserialize, Serialize};

/// Floor and ceiling for the frontier queue capacity.
const MIN_QUEUE_SIZE: usize = 5;
const MAX_QUEUE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StrategyKind {
    SitemapFirst,
    Hybrid,
    BreadthFirst,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::SitemapFirst => "sitemap-first",
            StrategyKind::Hybrid => "hybrid",
            StrategyKind::BreadthFirst => "breadth-first",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlStrategy {
    pub kind: StrategyKind,
    pub prioritize_sitemaps: bool,
    pub max_concurrency: usize,
    pub retry_policy: RetryPolicy,
}

/// Picks the execution strategy for a crawl. Small crawls trust the
/// sitemap; large crawls must not depend on sitemap completeness, so
/// breadth-first does not prioritize it.
pub fn select(settings: &CrawlSettings) -> CrawlStrategy {
    let max_pages = settings.clamped().max_pages;
    if max_pages <= 10 {
        CrawlStrategy {
            kind: StrategyKind::SitemapFirst,
            prioritize_sitemaps: true,
            max_concurrency: 2,
            retry_policy: RetryPolicy {
                max_retries: 2,
                backoff_multiplier: 1.5,
            },
        }
    } else if max_pages <= 50 {
        CrawlStrategy {
            kind: StrategyKind::Hybrid,
            prioritize_sitemaps: true,
            max_concurrency: 3,
            retry_policy: RetryPolicy {
                max_retries: 3,
                backoff_multiplier: 2.0,
            },
        }
    } else {
        CrawlStrategy {
            kind: StrategyKind::BreadthFirst,
            prioritize_sitemaps: false,
            max_concurrency: 5,
            retry_policy: RetryPolicy {
                max_retries: 2,
                backoff_multiplier: 1.8,
            },
        }
    }
}

/// Bounded frontier capacity. The memory budget, when supplied, can only
/// lower the size, never raise it.
pub fn frontier_capacity(
    max_concurrency: usize,
    max_pages: usize,
    available_memory_bytes: Option<u64>,
) -> usize {
    let scaled = max_concurrency as f64 * 10.0 * (max_pages as f64 / 10.0).min(5.0);
    let mut size = scaled.clamp(MIN_QUEUE_SIZE as f64, MAX_QUEUE_SIZE as f64) as usize;

    if let Some(bytes) = available_memory_bytes
        && bytes > 0
    {
        let memory_cap = ((bytes / (1024 * 1024)) / 2).max(1) as usize;
        size = size.min(memory_cap);
    }
    size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_crawls_go_sitemap_first() {
        let strategy = select(&CrawlSettings::new(5, 2));
        assert_eq!(strategy.kind, StrategyKind::SitemapFirst);
        assert!(strategy.prioritize_sitemaps);
        assert_eq!(strategy.max_concurrency, 2);
        assert_eq!(strategy.retry_policy.max_retries, 2);
        assert!((strategy.retry_policy.backoff_multiplier - 1.5).abs() < 1e-9);
    }

    #[test]
    fn medium_crawls_go_hybrid() {
        let strategy = select(&CrawlSettings::new(25, 3));
        assert_eq!(strategy.kind, StrategyKind::Hybrid);
        assert!(strategy.prioritize_sitemaps);
        assert_eq!(strategy.max_concurrency, 3);
        assert_eq!(strategy.retry_policy.max_retries, 3);
    }

    #[test]
    fn large_crawls_go_breadth_first_without_sitemap_trust() {
        let strategy = select(&CrawlSettings::new(100, 3));
        assert_eq!(strategy.kind, StrategyKind::BreadthFirst);
        assert!(!strategy.prioritize_sitemaps);
        assert_eq!(strategy.max_concurrency, 5);
    }

    #[test]
    fn concurrency_is_monotone_across_tiers() {
        let sizes = [5, 25, 100];
        let picks: Vec<usize> = sizes
            .iter()
            .map(|pages| select(&CrawlSettings::new(*pages, 3)).max_concurrency)
            .collect();
        assert!(picks.windows(2).all(|w| w[0] <= w[1]), "got {picks:?}");
    }

    #[test]
    fn over_limit_pages_select_like_the_clamped_value() {
        let strategy = select(&CrawlSettings::new(1000, 3));
        assert_eq!(strategy.kind, StrategyKind::BreadthFirst);
    }

    #[test]
    fn queue_size_is_clamped() {
        // 2 workers x 10 x min(5, 0.5) = 10
        assert_eq!(frontier_capacity(2, 5, None), 10);
        // small product floors at 5
        assert_eq!(frontier_capacity(1, 1, None), 5);
        // 5 workers x 10 x 5 = 250 caps at 100
        assert_eq!(frontier_capacity(5, 100, None), 100);
    }

    #[test]
    fn memory_budget_only_lowers_the_size() {
        let unconstrained = frontier_capacity(5, 100, None);
        // 40 MiB / 1 MiB / 2 = 20
        assert_eq!(frontier_capacity(5, 100, Some(40 * 1024 * 1024)), 20);
        // a huge budget never raises the bound
        assert_eq!(
            frontier_capacity(5, 100, Some(10 * 1024 * 1024 * 1024)),
            unconstrained
        );
        // zero means "unknown", not "none"
        assert_eq!(frontier_capacity(5, 100, Some(0)), unconstrained);
        // tiny budgets still leave room for one entry
        assert_eq!(frontier_capacity(5, 100, Some(1024)), 1);
    }
}
