//! The crawl orchestrator: planning checks, frontier seeding, and the
//! bounded worker pool that drains it.

use crate::error::{CrawlError, Result};
use crate::fetch::{HttpFetcher, PageDocument, PageFetcher, SitemapTransport};
use crate::frontier::{Frontier, FrontierEntry};
use crate::page::CrawledPage;
use crate::policy;
use crate::robots::{HttpRobotsChecker, RobotsChecker};
use crate::settings::CrawlSettings;
use crate::simhash::{self, SimHash};
use crate::sitemap::{self, DiscoveryOptions};
use crate::strategy::{self, CrawlStrategy};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

/// Invoked once per recorded page, success, failure and skip alike.
pub type PageCallback = Arc<dyn Fn(&CrawledPage) + Send + Sync>;

const USER_AGENT: &str = "Gleaner";
/// Base delay for per-page fetch retries; grows by the strategy's
/// backoff multiplier per attempt.
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Shared crawl state, mutated only under one mutex so that the budget
/// check, pop, visited-mark and push are a single atomic step.
struct CrawlState {
    frontier: Frontier,
    pages: Vec<CrawledPage>,
    fingerprints: Vec<(SimHash, String)>,
    attempted: usize,
    in_flight: usize,
}

pub struct Crawler {
    settings: CrawlSettings,
    fetcher: Arc<dyn PageFetcher>,
    sitemap_transport: Arc<dyn SitemapTransport>,
    robots: Arc<dyn RobotsChecker>,
    page_callback: Option<PageCallback>,
    near_duplicate_detection: bool,
    duplicate_threshold: f64,
    time_budget: Option<Duration>,
    available_memory_bytes: Option<u64>,
}

impl Crawler {
    pub fn new(settings: CrawlSettings) -> Self {
        let fetcher = Arc::new(HttpFetcher::new());
        Self {
            settings,
            sitemap_transport: fetcher.clone(),
            fetcher,
            robots: Arc::new(HttpRobotsChecker::new()),
            page_callback: None,
            near_duplicate_detection: true,
            duplicate_threshold: simhash::DEFAULT_DUPLICATE_THRESHOLD,
            time_budget: None,
            available_memory_bytes: None,
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_sitemap_transport(mut self, transport: Arc<dyn SitemapTransport>) -> Self {
        self.sitemap_transport = transport;
        self
    }

    pub fn with_robots_checker(mut self, robots: Arc<dyn RobotsChecker>) -> Self {
        self.robots = robots;
        self
    }

    pub fn with_page_callback(mut self, callback: PageCallback) -> Self {
        self.page_callback = Some(callback);
        self
    }

    /// Near-duplicate suppression is on by default; skipped duplicates
    /// still consume a budget slot.
    pub fn with_near_duplicate_detection(mut self, enabled: bool) -> Self {
        self.near_duplicate_detection = enabled;
        self
    }

    pub fn with_duplicate_threshold(mut self, threshold: f64) -> Self {
        self.duplicate_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Whole-crawl deadline. Workers observing an expired deadline stop
    /// claiming work; already-recorded pages are preserved.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    /// Caps the frontier queue by available memory. Never raises the
    /// strategy-computed capacity.
    pub fn with_memory_budget(mut self, bytes: u64) -> Self {
        self.available_memory_bytes = Some(bytes);
        self
    }

    /// Runs one full crawl: planning, seeding, draining. Planning failures
    /// abort with a matchable error and zero pages; per-page failures are
    /// recorded and never abort.
    pub async fn crawl(&self, start_url: &str) -> Result<Vec<CrawledPage>> {
        let settings = self.plan(start_url).await?;
        let strategy = strategy::select(&settings);
        info!(
            "Starting crawl of {} ({}, {} workers, {} pages, depth {})",
            start_url,
            strategy.kind.as_str(),
            strategy.max_concurrency,
            settings.max_pages,
            settings.max_depth
        );

        let state = self.seed(start_url, &settings, &strategy).await;
        let deadline = self.time_budget.map(|budget| Instant::now() + budget);
        self.drain(start_url, &settings, &strategy, state.clone(), deadline)
            .await?;

        let state = Arc::try_unwrap(state)
            .map_err(|_| CrawlError::Parse("crawl state still shared after join".to_string()))?
            .into_inner();
        info!(
            "Crawl of {} complete: {} pages recorded, {} URLs seen",
            start_url,
            state.pages.len(),
            state.frontier.visited_count()
        );
        Ok(state.pages)
    }

    /// Planning phase. Everything here fails before any page is fetched.
    async fn plan(&self, start_url: &str) -> Result<CrawlSettings> {
        let parsed = Url::parse(start_url)
            .map_err(|e| CrawlError::InvalidUrl(format!("{start_url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CrawlError::InvalidUrl(format!(
                "{start_url}: unsupported scheme {}",
                parsed.scheme()
            )));
        }
        if parsed.host_str().is_none() {
            return Err(CrawlError::InvalidUrl(format!("{start_url}: missing host")));
        }

        self.settings.validate()?;
        let settings = self.settings.clamped();

        self.fetcher
            .head(start_url)
            .await
            .map_err(|e| CrawlError::Unreachable(format!("{start_url}: {e}")))?;

        if settings.respect_robots_txt {
            let loadable = self
                .robots
                .can_load(start_url)
                .await
                .map_err(|e| CrawlError::RobotsDisallowed(format!("{start_url}: {e}")))?;
            if !loadable {
                return Err(CrawlError::RobotsDisallowed(format!(
                    "{start_url}: robots.txt could not be loaded"
                )));
            }
            let allowed = self
                .robots
                .is_allowed(start_url, USER_AGENT)
                .await
                .map_err(|e| CrawlError::RobotsDisallowed(format!("{start_url}: {e}")))?;
            if !allowed {
                return Err(CrawlError::RobotsDisallowed(format!(
                    "{start_url}: disallowed for {USER_AGENT}"
                )));
            }
        }
        Ok(settings)
    }

    /// Seeding phase: sitemap URLs where discovery succeeds, the homepage
    /// otherwise. Hybrid and breadth-first crawls seed the homepage ahead
    /// of the sitemap so organic expansion always has a root.
    async fn seed(
        &self,
        start_url: &str,
        settings: &CrawlSettings,
        strategy: &CrawlStrategy,
    ) -> Arc<Mutex<CrawlState>> {
        let capacity = strategy::frontier_capacity(
            strategy.max_concurrency,
            settings.max_pages,
            self.available_memory_bytes,
        );
        let mut frontier = Frontier::new(capacity);

        let discovery = sitemap::discover(
            self.sitemap_transport.as_ref(),
            start_url,
            &DiscoveryOptions::default(),
        )
        .await
        .unwrap_or_else(|e| {
            debug!("Sitemap discovery errored: {}", e);
            sitemap::SitemapDiscovery {
                urls: Vec::new(),
                metrics: sitemap::metrics(0, 0, 0),
            }
        });

        let seed_homepage_first = !strategy.prioritize_sitemaps
            || matches!(strategy.kind, crate::strategy::StrategyKind::Hybrid);
        if seed_homepage_first || discovery.urls.is_empty() {
            frontier.push(start_url.to_string(), 0, false);
        }

        let mut seeded = 0;
        for url in &discovery.urls {
            let evaluation = policy::evaluate(url, start_url, 0, settings);
            if !evaluation.should_crawl {
                debug!("Sitemap URL {} filtered: {}", url, evaluation.reason);
                continue;
            }
            if frontier.push(url.clone(), 0, true) {
                seeded += 1;
            }
        }
        info!(
            "Seeded {} sitemap URLs (discovery success rate {:.2}), frontier capacity {}",
            seeded, discovery.metrics.success_rate, capacity
        );
        if frontier.is_empty() {
            // Everything from the sitemap was filtered out; fall back.
            frontier.push(start_url.to_string(), 0, false);
        }

        Arc::new(Mutex::new(CrawlState {
            frontier,
            pages: Vec::new(),
            fingerprints: Vec::new(),
            attempted: 0,
            in_flight: 0,
        }))
    }

    /// Draining phase: a pool of workers claims frontier entries under the
    /// state mutex and fetches outside it.
    async fn drain(
        &self,
        start_url: &str,
        settings: &CrawlSettings,
        strategy: &CrawlStrategy,
        state: Arc<Mutex<CrawlState>>,
        deadline: Option<Instant>,
    ) -> Result<()> {
        let mut handles = Vec::new();
        for worker_id in 0..strategy.max_concurrency {
            let worker = Worker {
                id: worker_id,
                base_url: start_url.to_string(),
                settings: settings.clone(),
                strategy: strategy.clone(),
                fetcher: self.fetcher.clone(),
                page_callback: self.page_callback.clone(),
                near_duplicate_detection: self.near_duplicate_detection,
                duplicate_threshold: self.duplicate_threshold,
                state: state.clone(),
                deadline,
            };
            handles.push(tokio::spawn(async move { worker.run().await }));
        }
        for handle in handles {
            handle.await?;
        }
        Ok(())
    }
}

struct Worker {
    id: usize,
    base_url: String,
    settings: CrawlSettings,
    strategy: CrawlStrategy,
    fetcher: Arc<dyn PageFetcher>,
    page_callback: Option<PageCallback>,
    near_duplicate_detection: bool,
    duplicate_threshold: f64,
    state: Arc<Mutex<CrawlState>>,
    deadline: Option<Instant>,
}

impl Worker {
    async fn run(&self) {
        debug!("Worker {} started", self.id);
        loop {
            let entry = {
                let mut state = self.state.lock().await;
                if state.attempted >= self.settings.max_pages {
                    break;
                }
                if self.deadline.is_some_and(|d| Instant::now() >= d) {
                    debug!("Worker {} stopping: time budget exhausted", self.id);
                    break;
                }
                match state.frontier.pop() {
                    Some(entry) => {
                        // Every claimed entry consumes a budget slot, even
                        // if it ends up failed or skipped.
                        state.attempted += 1;
                        state.in_flight += 1;
                        entry
                    }
                    None if state.in_flight == 0 => break,
                    None => {
                        drop(state);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        continue;
                    }
                }
            };

            let page = self.crawl_one(&entry).await;
            {
                let mut state = self.state.lock().await;
                state.in_flight -= 1;
            }
            if let Some(ref callback) = self.page_callback {
                callback(&page);
            }
            let mut state = self.state.lock().await;
            state.pages.push(page);
        }
        debug!("Worker {} finished", self.id);
    }

    /// Fetches, parses and records one frontier entry, expanding its links
    /// back into the frontier. Never returns an error; failures become
    /// `Failed` pages.
    async fn crawl_one(&self, entry: &FrontierEntry) -> CrawledPage {
        let fetched = match self.fetch_with_retries(&entry.url).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("Fetch failed for {}: {}", entry.url, e);
                return CrawledPage::failed(entry.url.clone(), entry.depth, e.to_string());
            }
        };

        if fetched.status_code >= 400 {
            warn!("HTTP {} for {}", fetched.status_code, entry.url);
            let mut page = CrawledPage::failed(
                entry.url.clone(),
                entry.depth,
                format!("HTTP {}", fetched.status_code),
            );
            page.status_code = Some(fetched.status_code);
            page.response_time_ms = Some(fetched.response_time_ms);
            return page;
        }

        // Parse synchronously and drop the document before any await; the
        // parsed DOM is not Send.
        let (title, content, links) = if fetched.is_html() {
            let document = PageDocument::parse(&fetched.html, &fetched.final_url);
            (document.title(), document.body_text(), document.links())
        } else {
            (String::new(), fetched.html.clone(), Vec::new())
        };

        let mut page = CrawledPage::new(entry.url.clone(), entry.depth);
        page.title = title;
        page.content = content;
        page.status_code = Some(fetched.status_code);
        page.response_time_ms = Some(fetched.response_time_ms);

        let fingerprint = SimHash::compute(&page.content);
        let expand_links = !(entry.from_sitemap && self.strategy.prioritize_sitemaps);

        let mut state = self.state.lock().await;
        if self.near_duplicate_detection
            && !page.content.trim().is_empty()
            && let Some((_, original)) = state.fingerprints.iter().find(|(existing, _)| {
                simhash::is_near_duplicate(existing, &fingerprint, self.duplicate_threshold)
            })
        {
            debug!("Skipping {} as near-duplicate of {}", entry.url, original);
            return CrawledPage::skipped(
                entry.url.clone(),
                entry.depth,
                format!("Near-duplicate of {original}"),
            );
        }
        state.fingerprints.push((fingerprint, entry.url.clone()));

        if expand_links {
            for link in links {
                let evaluation =
                    policy::evaluate(&link, &self.base_url, entry.depth + 1, &self.settings);
                if evaluation.should_crawl {
                    if state.frontier.push(link.clone(), entry.depth + 1, false) {
                        debug!(
                            "Queued {} (priority {}, value {:.2})",
                            link,
                            evaluation.priority.as_str(),
                            evaluation.estimated_value
                        );
                    }
                } else {
                    debug!("Filtered {}: {}", link, evaluation.reason);
                }
            }
        }
        page
    }

    async fn fetch_with_retries(&self, url: &str) -> Result<crate::fetch::FetchedPage> {
        let policy = &self.strategy.retry_policy;
        let mut delay_ms = RETRY_BASE_DELAY_MS as f64;
        let mut last_error = None;
        for attempt in 0..=policy.max_retries {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms as u64)).await;
                delay_ms *= policy.backoff_multiplier;
                debug!("Retry {} for {}", attempt, url);
            }
            match self.fetcher.fetch(url).await {
                Ok(fetched) => return Ok(fetched),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| CrawlError::Parse(format!("no fetch attempt for {url}"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CrawlError;
    use crate::fetch::FetchedPage;
    use crate::robots::AllowAllRobots;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BODY_FILLER: &str = "This page describes our warehouse automation services \
        in enough detail to pass any length heuristics applied downstream of the crawl.";

    fn html_page(title: &str, links: &[String]) -> String {
        let anchors: String = links
            .iter()
            .map(|href| format!(r#"<a href="{href}">{href}</a>"#))
            .collect();
        format!(
            "<html><head><title>{title}</title></head><body><main><h1>{title}</h1>\
             <p>{BODY_FILLER}</p>{anchors}</main></body></html>"
        )
    }

    async fn mount_page(server: &MockServer, route: &str, title: &str, links: &[String]) {
        let body = html_page(title, links);
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(body.as_bytes()),
            )
            .mount(server)
            .await;
    }

    async fn mount_basics(server: &MockServer) {
        Mock::given(method("HEAD"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
        // No sitemaps: discovery falls back to the homepage.
        for route in [
            "/sitemap_index.xml",
            "/sitemap.xml",
            "/sitemap.xml.gz",
            "/sitemap/sitemap.xml",
        ] {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(404))
                .mount(server)
                .await;
        }
    }

    fn crawler(settings: CrawlSettings) -> Crawler {
        Crawler::new(settings).with_robots_checker(Arc::new(AllowAllRobots))
    }

    #[tokio::test]
    async fn crawls_homepage_and_discovered_links() {
        let server = MockServer::start().await;
        mount_basics(&server).await;
        let base = server.uri();
        mount_page(
            &server,
            "/",
            "Home",
            &[format!("{base}/about"), format!("{base}/services")],
        )
        .await;
        mount_page(&server, "/about", "About our team history", &[]).await;
        mount_page(&server, "/services", "Services we sell today", &[]).await;

        let pages = crawler(CrawlSettings::new(15, 2))
            .crawl(&base)
            .await
            .unwrap();
        assert_eq!(pages.len(), 3);
        assert!(pages.iter().all(|p| p.is_success()));
        let home = pages.iter().find(|p| p.depth == 0).unwrap();
        assert_eq!(home.title, "Home");
        assert!(home.content.contains("warehouse automation"));
    }

    #[tokio::test]
    async fn page_budget_bounds_the_crawl() {
        let server = MockServer::start().await;
        mount_basics(&server).await;
        let base = server.uri();
        let links: Vec<String> = (1..=20).map(|i| format!("{base}/leaf-{i}")).collect();
        mount_page(&server, "/", "Hub", &links).await;
        for i in 1..=20 {
            mount_page(
                &server,
                &format!("/leaf-{i}"),
                &format!("Leaf number {i} content"),
                &[],
            )
            .await;
        }

        let pages = crawler(CrawlSettings::new(3, 3)).crawl(&base).await.unwrap();
        assert_eq!(pages.len(), 3);
    }

    #[tokio::test]
    async fn depth_limit_stops_expansion() {
        let server = MockServer::start().await;
        mount_basics(&server).await;
        let base = server.uri();
        mount_page(&server, "/", "Home", &[format!("{base}/level-one")]).await;
        mount_page(
            &server,
            "/level-one",
            "Level one content page",
            &[format!("{base}/level-two")],
        )
        .await;
        mount_page(&server, "/level-two", "Level two content page", &[]).await;

        let pages = crawler(CrawlSettings::new(15, 2)).crawl(&base).await.unwrap();
        let urls: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(pages.len(), 2, "crawled {urls:?}");
        assert!(!urls.iter().any(|u| u.contains("level-two")));
    }

    #[tokio::test]
    async fn seeds_from_sitemap_without_expanding_links() {
        let server = MockServer::start().await;
        let base = server.uri();
        Mock::given(method("HEAD"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sitemap_index.xml"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let sitemap = format!(
            "<urlset><url><loc>{base}/</loc></url><url><loc>{base}/pricing</loc></url></urlset>"
        );
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/xml")
                    .set_body_bytes(sitemap.as_bytes()),
            )
            .mount(&server)
            .await;
        mount_page(&server, "/", "Home", &[format!("{base}/organic-find")]).await;
        mount_page(&server, "/pricing", "Pricing plans detail", &[]).await;
        mount_page(&server, "/organic-find", "Organic page content", &[]).await;

        // 5 pages => sitemap-first: sitemap URLs only, no link expansion.
        let pages = crawler(CrawlSettings::new(5, 3)).crawl(&base).await.unwrap();
        let urls: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(pages.len(), 2, "crawled {urls:?}");
        assert!(!urls.iter().any(|u| u.contains("organic-find")));
        assert!(pages.iter().all(|p| p.depth == 0));
    }

    #[tokio::test]
    async fn near_duplicates_are_skipped_but_consume_budget() {
        let server = MockServer::start().await;
        mount_basics(&server).await;
        let base = server.uri();
        mount_page(
            &server,
            "/",
            "Original page",
            &[format!("{base}/copy"), format!("{base}/unique")],
        )
        .await;
        // Byte-identical body to the homepage.
        mount_page(
            &server,
            "/copy",
            "Original page",
            &[format!("{base}/copy"), format!("{base}/unique")],
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/unique"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(
                        b"<html><head><title>Unique</title></head><body><main>\
                         Entirely different gardening content about soil, seeds, \
                         compost and watering schedules for spring planting.\
                         </main></body></html>",
                    ),
            )
            .mount(&server)
            .await;

        let pages = crawler(CrawlSettings::new(10, 2)).crawl(&base).await.unwrap();
        assert_eq!(pages.len(), 3);
        let skipped: Vec<&CrawledPage> = pages
            .iter()
            .filter(|p| p.status == crate::page::PageStatus::Skipped)
            .collect();
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].url.contains("/copy"));
        assert!(
            skipped[0]
                .error_message
                .as_deref()
                .unwrap()
                .starts_with("Near-duplicate of")
        );
    }

    #[tokio::test]
    async fn duplicate_detection_can_be_disabled() {
        let server = MockServer::start().await;
        mount_basics(&server).await;
        let base = server.uri();
        mount_page(&server, "/", "Original page", &[format!("{base}/copy")]).await;
        mount_page(&server, "/copy", "Original page", &[]).await;

        let pages = crawler(CrawlSettings::new(10, 2))
            .with_near_duplicate_detection(false)
            .crawl(&base)
            .await
            .unwrap();
        assert!(pages.iter().all(|p| p.is_success()));
    }

    #[tokio::test]
    async fn http_errors_become_failed_pages_not_crawl_errors() {
        let server = MockServer::start().await;
        mount_basics(&server).await;
        let base = server.uri();
        mount_page(&server, "/", "Home", &[format!("{base}/broken")]).await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let pages = crawler(CrawlSettings::new(10, 2)).crawl(&base).await.unwrap();
        let failed = pages
            .iter()
            .find(|p| p.url.contains("/broken"))
            .expect("failed page recorded");
        assert_eq!(failed.status, crate::page::PageStatus::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("HTTP 500"));
        assert_eq!(failed.status_code, Some(500));
        // The crawl itself still completed.
        assert!(pages.iter().any(|p| p.is_success()));
    }

    #[tokio::test]
    async fn invalid_url_fails_planning() {
        let err = crawler(CrawlSettings::new(10, 2))
            .crawl("ftp://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::InvalidUrl(_)));
        assert!(err.is_fatal_to_planning());

        let err = crawler(CrawlSettings::new(10, 2))
            .crawl("not a url")
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn zero_page_budget_fails_planning() {
        let err = crawler(CrawlSettings::new(0, 2))
            .crawl("https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::SettingsOutOfRange(_)));
    }

    #[tokio::test]
    async fn unreachable_target_fails_planning() {
        // Nothing listens on port 1.
        let err = crawler(CrawlSettings::new(10, 2))
            .crawl("http://127.0.0.1:1/")
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::Unreachable(_)));
    }

    #[tokio::test]
    async fn robots_disallow_aborts_with_zero_pages() {
        let server = MockServer::start().await;
        let base = server.uri();
        Mock::given(method("HEAD"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /\n"))
            .mount(&server)
            .await;
        let fetch_count = Arc::new(AtomicUsize::new(0));
        let counting = CountingFetcher {
            inner: HttpFetcher::with_timeout(5),
            fetches: fetch_count.clone(),
        };

        let err = Crawler::new(CrawlSettings::new(10, 2))
            .with_fetcher(Arc::new(counting))
            .with_robots_checker(Arc::new(HttpRobotsChecker::new()))
            .crawl(&base)
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::RobotsDisallowed(_)));
        assert_eq!(fetch_count.load(Ordering::SeqCst), 0, "pages fetched before abort");
    }

    #[tokio::test]
    async fn expired_time_budget_preserves_empty_partial_result() {
        let server = MockServer::start().await;
        mount_basics(&server).await;
        mount_page(&server, "/", "Home", &[]).await;

        let pages = crawler(CrawlSettings::new(10, 2))
            .with_time_budget(Duration::ZERO)
            .crawl(&server.uri())
            .await
            .unwrap();
        assert!(pages.is_empty());
    }

    #[tokio::test]
    async fn retries_recover_transient_fetch_failures() {
        let flaky = FlakyFetcher {
            failures_remaining: AtomicUsize::new(2),
        };
        // Hybrid strategy allows 3 retries.
        let pages = Crawler::new(CrawlSettings::new(25, 2))
            .with_robots_checker(Arc::new(AllowAllRobots))
            .with_fetcher(Arc::new(flaky))
            .with_sitemap_transport(Arc::new(NoSitemaps))
            .crawl("https://example.com")
            .await
            .unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_success());
    }

    #[tokio::test]
    async fn page_callback_sees_every_recorded_page() {
        let server = MockServer::start().await;
        mount_basics(&server).await;
        let base = server.uri();
        mount_page(&server, "/", "Home", &[format!("{base}/about")]).await;
        mount_page(&server, "/about", "About page content", &[]).await;

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let pages = crawler(CrawlSettings::new(10, 2))
            .with_page_callback(Arc::new(move |page: &CrawledPage| {
                seen_clone.lock().unwrap().push(page.url.clone());
            }))
            .crawl(&base)
            .await
            .unwrap();
        assert_eq!(seen.lock().unwrap().len(), pages.len());
    }

    #[tokio::test]
    async fn equivalent_urls_are_crawled_once() {
        let server = MockServer::start().await;
        mount_basics(&server).await;
        let base = server.uri();
        mount_page(
            &server,
            "/",
            "Home",
            &[format!("{base}/about"), format!("{base}/about/")],
        )
        .await;
        mount_page(&server, "/about", "About page content", &[]).await;

        let pages = crawler(CrawlSettings::new(10, 2)).crawl(&base).await.unwrap();
        let about_count = pages.iter().filter(|p| p.url.contains("about")).count();
        assert_eq!(about_count, 1);
    }

    struct CountingFetcher {
        inner: HttpFetcher,
        fetches: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PageFetcher for CountingFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(url).await
        }

        async fn head(&self, url: &str) -> Result<u16> {
            self.inner.head(url).await
        }
    }

    struct FlakyFetcher {
        failures_remaining: AtomicUsize,
    }

    #[async_trait]
    impl PageFetcher for FlakyFetcher {
        async fn fetch(&self, _url: &str) -> Result<FetchedPage> {
            if self
                .failures_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(CrawlError::Parse("transient failure".to_string()));
            }
            Ok(FetchedPage {
                html: html_page("Recovered page", &[]),
                status_code: 200,
                response_time_ms: 5,
                content_type: Some("text/html".to_string()),
                final_url: "https://example.com/".to_string(),
            })
        }

        async fn head(&self, _url: &str) -> Result<u16> {
            Ok(200)
        }
    }

    struct NoSitemaps;

    #[async_trait]
    impl SitemapTransport for NoSitemaps {
        async fn get_xml(&self, url: &str) -> Result<String> {
            Err(CrawlError::Parse(format!("no sitemap at {url}")))
        }
    }
}
