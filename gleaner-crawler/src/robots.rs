//! Robots.txt enforcement behind a trait seam.

use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use texting_robots::{Robot, get_robots_url};
use tracing::debug;

#[async_trait]
pub trait RobotsChecker: Send + Sync {
    /// Whether robots.txt for this URL's host could be loaded (a missing
    /// file counts as loadable-and-permissive).
    async fn can_load(&self, url: &str) -> Result<bool>;

    /// Whether the given agent may fetch this URL.
    async fn is_allowed(&self, url: &str, user_agent: &str) -> Result<bool>;
}

/// Fetches and evaluates the real robots.txt. A missing or unfetchable
/// robots.txt allows everything, matching common crawler practice.
pub struct HttpRobotsChecker {
    client: Client,
}

impl HttpRobotsChecker {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent("Gleaner/0.1 (https://github.com/mottgrove/gleaner)")
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    async fn robots_body(&self, url: &str) -> Result<Option<String>> {
        let robots_url = get_robots_url(url)
            .map_err(|e| crate::error::CrawlError::InvalidUrl(format!("{url}: {e}")))?;
        match self.client.get(&robots_url).send().await {
            Ok(response) if response.status().is_success() => {
                Ok(Some(response.text().await.unwrap_or_default()))
            }
            Ok(response) => {
                debug!("robots.txt at {} returned HTTP {}", robots_url, response.status());
                Ok(None)
            }
            Err(e) => {
                debug!("robots.txt fetch failed for {}: {}", robots_url, e);
                Ok(None)
            }
        }
    }
}

impl Default for HttpRobotsChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RobotsChecker for HttpRobotsChecker {
    async fn can_load(&self, url: &str) -> Result<bool> {
        self.robots_body(url).await.map(|_| true)
    }

    async fn is_allowed(&self, url: &str, user_agent: &str) -> Result<bool> {
        let Some(body) = self.robots_body(url).await? else {
            return Ok(true);
        };
        let robot = Robot::new(user_agent, body.as_bytes())
            .map_err(|e| crate::error::CrawlError::Parse(format!("robots.txt: {e}")))?;
        Ok(robot.allowed(url))
    }
}

/// Checker for callers that opt out of robots enforcement.
pub struct AllowAllRobots;

#[async_trait]
impl RobotsChecker for AllowAllRobots {
    async fn can_load(&self, _url: &str) -> Result<bool> {
        Ok(true)
    }

    async fn is_allowed(&self, _url: &str, _user_agent: &str) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn allow_all_always_allows() {
        let checker = AllowAllRobots;
        assert!(checker.can_load("https://example.com/x").await.unwrap());
        assert!(
            checker
                .is_allowed("https://example.com/x", "Gleaner")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn disallowed_path_is_blocked() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("User-agent: *\nDisallow: /private/\n"),
            )
            .mount(&server)
            .await;

        let checker = HttpRobotsChecker::new();
        let blocked = format!("{}/private/data", server.uri());
        let open = format!("{}/public", server.uri());
        assert!(!checker.is_allowed(&blocked, "Gleaner").await.unwrap());
        assert!(checker.is_allowed(&open, "Gleaner").await.unwrap());
    }

    #[tokio::test]
    async fn missing_robots_txt_allows_everything() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let checker = HttpRobotsChecker::new();
        let url = format!("{}/anything", server.uri());
        assert!(checker.can_load(&url).await.unwrap());
        assert!(checker.is_allowed(&url, "Gleaner").await.unwrap());
    }
}
