use crate::error::{CrawlError, Result};
use serde::{Deserialize, Serialize};

/// Hard upper bound on pages per crawl, enforced regardless of caller input.
pub const MAX_PAGES_LIMIT: usize = 100;
/// Hard upper bound on crawl depth.
pub const MAX_DEPTH_LIMIT: usize = 5;

/// Scheduling hint carried through from the caller. The engine never acts
/// on it; re-crawl cadence is an external concern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CrawlFrequency {
    Daily,
    Weekly,
    Monthly,
    Manual,
}

impl CrawlFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrawlFrequency::Daily => "daily",
            CrawlFrequency::Weekly => "weekly",
            CrawlFrequency::Monthly => "monthly",
            CrawlFrequency::Manual => "manual",
        }
    }
}

/// Caller-supplied crawl configuration.
///
/// `include_patterns`/`exclude_patterns` are advisory and part of the
/// contract, but the policy layer does not consult them yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSettings {
    pub max_pages: usize,
    pub max_depth: usize,
    pub respect_robots_txt: bool,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub crawl_frequency: CrawlFrequency,
}

impl CrawlSettings {
    pub fn new(max_pages: usize, max_depth: usize) -> Self {
        Self {
            max_pages,
            max_depth,
            ..Self::default()
        }
    }

    /// Returns a copy with both bounds clamped to the hard maxima.
    pub fn clamped(&self) -> Self {
        let mut settings = self.clone();
        settings.max_pages = self.max_pages.min(MAX_PAGES_LIMIT);
        settings.max_depth = self.max_depth.min(MAX_DEPTH_LIMIT);
        settings
    }

    /// Rejects settings no clamp can repair. Over-limit values are clamped,
    /// not rejected.
    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 {
            return Err(CrawlError::SettingsOutOfRange(
                "max_pages must be at least 1".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(CrawlError::SettingsOutOfRange(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_pages: 50,
            max_depth: 3,
            respect_robots_txt: true,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            crawl_frequency: CrawlFrequency::Manual,
        }
    }
}
