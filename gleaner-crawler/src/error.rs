use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Settings out of range: {0}")]
    SettingsOutOfRange(String),

    #[error("Target unreachable: {0}")]
    Unreachable(String),

    #[error("Blocked by robots.txt: {0}")]
    RobotsDisallowed(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl CrawlError {
    /// True for errors that abort planning before any page is fetched.
    pub fn is_fatal_to_planning(&self) -> bool {
        matches!(
            self,
            CrawlError::InvalidUrl(_)
                | CrawlError::SettingsOutOfRange(_)
                | CrawlError::Unreachable(_)
                | CrawlError::RobotsDisallowed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CrawlError>;
