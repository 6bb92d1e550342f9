//! High-level ingestion: plan, crawl, process, summarize.

use crate::budget;
use crate::knowledge::KnowledgeItem;
use crate::quality;
use gleaner_crawler::error::Result;
use gleaner_crawler::page::CrawledPage;
use gleaner_crawler::settings::CrawlSettings;
use gleaner_crawler::{Crawler, PageCallback};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

/// Final output of one crawl invocation. `crawled_pages` holds only the
/// quality-filtered pages; the counters cover everything attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    pub knowledge_items: Vec<KnowledgeItem>,
    pub crawled_pages: Vec<CrawledPage>,
    pub total_pages_attempted: usize,
    pub successful_pages: usize,
    pub failed_pages: usize,
    pub skipped_pages: usize,
}

/// Options for one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub url: String,
    pub settings: CrawlSettings,
    pub near_duplicate_detection: bool,
    pub time_budget: Option<Duration>,
}

impl IngestOptions {
    pub fn new(url: impl Into<String>, settings: CrawlSettings) -> Self {
        Self {
            url: url.into(),
            settings,
            near_duplicate_detection: true,
            time_budget: None,
        }
    }
}

/// Quality-filters recorded pages and maps the survivors into knowledge
/// items ranked by relevance, descending.
pub fn process(pages: Vec<CrawledPage>) -> CrawlResult {
    let metrics = quality::compute_metrics(&pages);
    let quality_pages: Vec<CrawledPage> = pages
        .into_iter()
        .filter(quality::is_quality_content)
        .collect();

    let mut knowledge_items: Vec<KnowledgeItem> =
        quality_pages.iter().map(KnowledgeItem::from_page).collect();
    knowledge_items.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    CrawlResult {
        knowledge_items,
        crawled_pages: quality_pages,
        total_pages_attempted: metrics.total,
        successful_pages: metrics.successful,
        failed_pages: metrics.failed,
        skipped_pages: metrics.skipped,
    }
}

/// Runs one full ingestion: budget the crawl, execute it, process the
/// pages. The optional callback streams every recorded page as it lands.
pub async fn execute_ingest(
    options: IngestOptions,
    page_callback: Option<PageCallback>,
) -> Result<CrawlResult> {
    let run_id = Uuid::new_v4();
    let span = info_span!("ingest", %run_id, url = %options.url);

    async move {
        let budget = budget::plan(&options.settings);
        info!(
            "Planned budget: {} pages, depth {}, ~{}s, risk {}",
            budget.max_pages,
            budget.max_depth,
            budget.estimated_time_secs,
            budget.risk_level.as_str()
        );
        for recommendation in &budget.recommendations {
            info!("Recommendation: {}", recommendation);
        }

        let mut crawler = Crawler::new(options.settings.clone())
            .with_near_duplicate_detection(options.near_duplicate_detection);
        if let Some(time_budget) = options.time_budget {
            crawler = crawler.with_time_budget(time_budget);
        }
        if let Some(callback) = page_callback {
            crawler = crawler.with_page_callback(callback);
        }

        let pages = crawler.crawl(&options.url).await?;
        let result = process(pages);
        info!(
            "Ingest complete: {} knowledge items from {} attempted pages",
            result.knowledge_items.len(),
            result.total_pages_attempted
        );
        Ok(result)
    }
    .instrument(span)
    .await
}

/// Plain-text summary of one ingestion run.
pub fn generate_ingest_summary(result: &CrawlResult) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!(
        "  Pages attempted: {}\n",
        result.total_pages_attempted
    ));
    report.push_str(&format!("  Successful: {}\n", result.successful_pages));
    report.push_str(&format!("  Failed: {}\n", result.failed_pages));
    report.push_str(&format!("  Skipped: {}\n", result.skipped_pages));
    report.push_str(&format!(
        "  Knowledge items: {}\n",
        result.knowledge_items.len()
    ));
    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    if !result.knowledge_items.is_empty() {
        report.push_str("## Knowledge items\n");
        for item in &result.knowledge_items {
            report.push_str(&format!(
                "  {:.2} {} ({})\n",
                item.relevance_score, item.title, item.source
            ));
        }
        report.push('\n');
    }
    report
}
