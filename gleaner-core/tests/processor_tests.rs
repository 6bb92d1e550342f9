// Tests for quality filtering and knowledge-item mapping

use gleaner_core::knowledge::{KnowledgeItem, knowledge_id};
use gleaner_core::{is_quality_content, process};
use gleaner_crawler::page::CrawledPage;

fn page_with_content(url: &str, depth: usize, content: &str) -> CrawledPage {
    let mut page = CrawledPage::new(url.to_string(), depth);
    page.title = "Industrial automation guide".to_string();
    page.content = content.to_string();
    page.response_time_ms = Some(250);
    page.status_code = Some(200);
    page
}

fn substantial_page(url: &str, depth: usize) -> CrawledPage {
    page_with_content(
        url,
        depth,
        "A practical guide to planning warehouse automation projects: scoping \
         conveyor layouts, selecting barcode hardware, and integrating stock \
         levels with the rest of the business.",
    )
}

// ============================================================================
// Quality Filter Tests
// ============================================================================

#[test]
fn test_substantial_page_passes() {
    assert!(is_quality_content(&substantial_page("https://example.com/guide", 1)));
}

#[test]
fn test_thin_page_fails() {
    let page = page_with_content("https://example.com/stub", 1, "Coming soon.");
    assert!(!is_quality_content(&page));
}

#[test]
fn test_failed_page_fails_regardless_of_content() {
    let mut page = CrawledPage::failed("https://example.com/x".into(), 1, "HTTP 500".into());
    page.content = substantial_page("https://example.com/x", 1).content;
    page.title = "A perfectly fine title".to_string();
    assert!(!is_quality_content(&page));
}

#[test]
fn test_markup_heavy_page_fails() {
    let page = page_with_content(
        "https://example.com/tags",
        1,
        &format!("<div>{}</div><span>ok</span>", "<br/><hr/>".repeat(30)),
    );
    assert!(!is_quality_content(&page));
}

// ============================================================================
// Knowledge Item Tests
// ============================================================================

#[test]
fn test_id_is_stable_across_crawls() {
    let first = KnowledgeItem::from_page(&substantial_page("https://example.com/guide", 1));
    let second = KnowledgeItem::from_page(&substantial_page("https://example.com/guide", 1));
    assert_eq!(first.id, second.id);
}

#[test]
fn test_id_strips_query_and_fragment() {
    assert_eq!(
        knowledge_id("https://example.com/guide?ref=newsletter#intro"),
        knowledge_id("https://example.com/guide")
    );
}

#[test]
fn test_item_fields_map_from_page() {
    let item = KnowledgeItem::from_page(&substantial_page("https://example.com/guide", 2));
    assert_eq!(item.title, "Industrial automation guide | /guide");
    assert_eq!(item.category, "website");
    assert_eq!(item.source, "https://example.com/guide");
    assert_eq!(item.tags, vec!["website", "crawled", "depth-2"]);
    assert!(item.relevance_score >= 0.1 && item.relevance_score <= 1.0);
}

#[test]
fn test_items_serialize_to_json() {
    let item = KnowledgeItem::from_page(&substantial_page("https://example.com/guide", 0));
    let json = serde_json::to_value(&item).unwrap();
    assert_eq!(json["category"], "website");
    assert!(json["id"].as_str().unwrap().starts_with("website_"));
    assert!(json["relevance_score"].as_f64().unwrap() > 0.0);
}

// ============================================================================
// Result Processing Tests
// ============================================================================

#[test]
fn test_process_keeps_only_quality_pages() {
    let result = process(vec![
        substantial_page("https://example.com/", 0),
        page_with_content("https://example.com/stub", 1, "short"),
        CrawledPage::failed("https://example.com/broken".into(), 1, "HTTP 404".into()),
    ]);
    assert_eq!(result.total_pages_attempted, 3);
    assert_eq!(result.successful_pages, 2);
    assert_eq!(result.failed_pages, 1);
    assert_eq!(result.knowledge_items.len(), 1);
    assert_eq!(result.crawled_pages.len(), 1);
}

#[test]
fn test_ranking_prefers_shallow_pages() {
    let result = process(vec![
        substantial_page("https://example.com/deep", 3),
        substantial_page("https://example.com/", 0),
    ]);
    assert_eq!(result.knowledge_items[0].source, "https://example.com/");
    assert!(
        result.knowledge_items[0].relevance_score
            >= result.knowledge_items[1].relevance_score
    );
}

#[test]
fn test_empty_crawl_produces_empty_result() {
    let result = process(Vec::new());
    assert_eq!(result.total_pages_attempted, 0);
    assert!(result.knowledge_items.is_empty());
    assert!(result.crawled_pages.is_empty());
}
