pub mod crawler;
pub mod error;
pub mod fetch;
pub mod frontier;
pub mod normalize;
pub mod page;
pub mod policy;
pub mod robots;
pub mod settings;
pub mod simhash;
pub mod sitemap;
pub mod strategy;

pub use crawler::{Crawler, PageCallback};
pub use error::{CrawlError, Result};
pub use fetch::{FetchedPage, HttpFetcher, PageDocument, PageFetcher, SitemapTransport};
pub use frontier::{Frontier, FrontierEntry};
pub use page::{CrawledPage, PageStatus};
pub use policy::{ContentClass, Priority, UrlEvaluation};
pub use robots::{AllowAllRobots, HttpRobotsChecker, RobotsChecker};
pub use settings::{CrawlFrequency, CrawlSettings, MAX_DEPTH_LIMIT, MAX_PAGES_LIMIT};
pub use simhash::{SimHash, SimilarityResult};
pub use sitemap::{DiscoveryMetrics, SitemapCandidate, SitemapKind};
pub use strategy::{CrawlStrategy, RetryPolicy, StrategyKind};
