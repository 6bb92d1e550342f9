//! Pure predicates and scoring for deciding what is worth crawling.

use crate::settings::CrawlSettings;
use serde::{Deserialize, Serialize};
use url::Url;

/// URLs longer than this are rejected outright.
const MAX_URL_LENGTH: usize = 200;
/// URLs longer than this lose estimated value.
const LONG_URL_PENALTY_LENGTH: usize = 100;

/// Extensions for assets and documents the text pipeline cannot use.
const SKIP_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx",
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".ico",
    ".mp3", ".mp4", ".avi", ".mov", ".wmv",
    ".zip", ".tar", ".gz", ".rar", ".7z", ".exe", ".dmg",
    ".css", ".js", ".woff", ".woff2", ".ttf", ".eot",
];

/// Path fragments for admin, auth, and transactional areas.
const SKIP_PATH_SEGMENTS: &[&str] = &[
    "/admin", "/login", "/logout", "/signin", "/signup", "/register",
    "/cart", "/checkout", "/account", "/wp-admin", "/wp-login",
    "/search", "/feed", "/rss",
];

/// Recognized content patterns and their estimated-value boost.
/// First match wins.
const VALUE_PATTERNS: &[(&str, f64)] = &[
    ("/pricing", 0.3),
    ("/services", 0.3),
    ("/products", 0.25),
    ("/solutions", 0.25),
    ("/case-studies", 0.2),
    ("/about", 0.2),
    ("/contact", 0.2),
    ("/docs", 0.15),
    ("/help", 0.15),
    ("/faq", 0.1),
    ("/blog", 0.1),
];

/// Pages that never qualify a sales prospect.
const LEAD_GEN_EXCLUDED_SEGMENTS: &[&str] = &[
    "/careers", "/career", "/jobs", "/team", "/staff",
    "/legal", "/privacy", "/terms", "/cookie",
    "/account", "/unsubscribe", "/404", "/error",
];

/// Keywords that keep a blog or article URL in the lead-gen set.
const SERVICE_KEYWORDS: &[&str] = &[
    "service", "pricing", "solution", "product", "case-stud",
    "consult", "integration", "automation", "implementation", "review",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// Coarse classification driving the valuable-content filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContentClass {
    Binary,
    Admin,
    Tracking,
    Oversized,
    Valuable,
}

/// The policy verdict on one URL at one depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlEvaluation {
    pub should_crawl: bool,
    pub reason: String,
    pub priority: Priority,
    pub estimated_value: f64,
}

impl UrlEvaluation {
    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            should_crawl: false,
            reason: reason.into(),
            priority: Priority::Low,
            estimated_value: 0.0,
        }
    }
}

/// Evaluates one URL against the policy. Rejections short-circuit in
/// order: depth, domain, content class.
pub fn evaluate(
    url: &str,
    base_url: &str,
    depth: usize,
    settings: &CrawlSettings,
) -> UrlEvaluation {
    if depth >= settings.max_depth {
        return UrlEvaluation::rejected(format!("Exceeds max depth of {}", settings.max_depth));
    }
    if !is_same_domain(url, base_url) {
        return UrlEvaluation::rejected("Outside target domain");
    }
    match classify(url) {
        ContentClass::Binary => UrlEvaluation::rejected("Binary or asset content"),
        ContentClass::Admin => UrlEvaluation::rejected("Admin or transactional page"),
        ContentClass::Tracking => UrlEvaluation::rejected("Tracking parameters or fragment link"),
        ContentClass::Oversized => {
            UrlEvaluation::rejected(format!("URL exceeds {MAX_URL_LENGTH} characters"))
        }
        ContentClass::Valuable => UrlEvaluation {
            should_crawl: true,
            reason: "Valuable content".to_string(),
            priority: priority(url, depth),
            estimated_value: estimated_value(url, depth),
        },
    }
}

/// Exact hostname equality. Subdomains are different sites by default;
/// `www.` variants collapse earlier, in normalization.
pub fn is_same_domain(url: &str, base_url: &str) -> bool {
    let (Ok(parsed), Ok(base)) = (Url::parse(url), Url::parse(base_url)) else {
        return false;
    };
    match (parsed.host_str(), base.host_str()) {
        (Some(host), Some(base_host)) => host == base_host,
        _ => false,
    }
}

pub fn classify(url: &str) -> ContentClass {
    let path = url_path_lowercase(url);
    if SKIP_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return ContentClass::Binary;
    }
    if SKIP_PATH_SEGMENTS.iter().any(|seg| path.contains(seg)) {
        return ContentClass::Admin;
    }
    if url.contains('#') || url.contains("utm_") {
        return ContentClass::Tracking;
    }
    if url.len() > MAX_URL_LENGTH {
        return ContentClass::Oversized;
    }
    ContentClass::Valuable
}

pub fn is_valuable_content(url: &str) -> bool {
    classify(url) == ContentClass::Valuable
}

/// Stricter filter for lead-generation crawls: drops career, legal, team
/// and account pages, and keeps blog/article URLs only when they carry a
/// service-oriented keyword.
pub fn is_valuable_lead_gen_content(url: &str) -> bool {
    if !is_valuable_content(url) {
        return false;
    }
    let path = url_path_lowercase(url);
    if LEAD_GEN_EXCLUDED_SEGMENTS.iter().any(|seg| path.contains(seg)) {
        return false;
    }
    if path.contains("/blog") || path.contains("/article") || path.contains("/news") {
        return SERVICE_KEYWORDS.iter().any(|kw| path.contains(kw));
    }
    true
}

/// High at the root, decaying with depth; recognized content patterns
/// decay slower.
pub fn priority(url: &str, depth: usize) -> Priority {
    if depth == 0 {
        return Priority::High;
    }
    let path = url_path_lowercase(url);
    let recognized = VALUE_PATTERNS.iter().any(|(pattern, _)| path.contains(pattern));
    if recognized {
        if depth <= 1 {
            Priority::High
        } else if depth <= 3 {
            Priority::Medium
        } else {
            Priority::Low
        }
    } else if depth <= 1 {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// Base 0.5, pattern boost, depth decay, small bonuses and penalties for
/// URL shape, clamped to [0.1, 1.0].
pub fn estimated_value(url: &str, depth: usize) -> f64 {
    let path = url_path_lowercase(url);
    let mut value = 0.5;
    for (pattern, boost) in VALUE_PATTERNS {
        if path.contains(pattern) {
            value += boost;
            break;
        }
    }
    value -= 0.1 * depth as f64;
    if is_clean_short_path(&path) {
        value += 0.1;
    }
    if url.len() > LONG_URL_PENALTY_LENGTH {
        value -= 0.1;
    }
    value.clamp(0.1, 1.0)
}

fn is_clean_short_path(path: &str) -> bool {
    path.len() < 30
        && !path.chars().any(|c| c.is_ascii_digit())
        && path.matches('/').count() <= 2
}

fn url_path_lowercase(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.path().to_lowercase())
        .unwrap_or_else(|_| url.to_lowercase())
}
