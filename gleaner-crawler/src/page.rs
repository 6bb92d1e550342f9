use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PageStatus {
    Success,
    Failed,
    Skipped,
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageStatus::Success => "success",
            PageStatus::Failed => "failed",
            PageStatus::Skipped => "skipped",
        }
    }
}

/// One crawled page, immutable once recorded.
///
/// `content` holds the extracted body text for HTML responses and the raw
/// body otherwise. `error_message` carries the fetch error for failed pages
/// and the skip reason for skipped ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawledPage {
    pub url: String,
    pub title: String,
    pub content: String,
    pub depth: usize,
    pub crawled_at: DateTime<Utc>,
    pub status: PageStatus,
    pub response_time_ms: Option<u64>,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
}

impl CrawledPage {
    pub fn new(url: String, depth: usize) -> Self {
        Self {
            url,
            title: String::new(),
            content: String::new(),
            depth,
            crawled_at: Utc::now(),
            status: PageStatus::Success,
            response_time_ms: None,
            status_code: None,
            error_message: None,
        }
    }

    pub fn failed(url: String, depth: usize, error: String) -> Self {
        Self {
            status: PageStatus::Failed,
            error_message: Some(error),
            ..Self::new(url, depth)
        }
    }

    pub fn skipped(url: String, depth: usize, reason: String) -> Self {
        Self {
            status: PageStatus::Skipped,
            error_message: Some(reason),
            ..Self::new(url, depth)
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == PageStatus::Success
    }
}
