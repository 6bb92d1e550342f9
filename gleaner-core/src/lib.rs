pub mod budget;
pub mod ingest;
pub mod knowledge;
pub mod quality;

pub use budget::{CrawlBudget, RiskLevel};
pub use ingest::{CrawlResult, IngestOptions, execute_ingest, generate_ingest_summary, process};
pub use knowledge::KnowledgeItem;
pub use quality::{CrawlMetrics, compute_metrics, is_quality_content};
