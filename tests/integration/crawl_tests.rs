//! Integration tests for the research crawler
//!
//! These tests use wiremock to serve small websites and run the full
//! crawl, findings, storage and report pipeline end-to-end.

use site_research::crawler::{CrawlErrorKind, CrawlRequest, CrawlSettings, Crawler, PageType};
use site_research::output::{build_output, write_json_report, ResearchOutput};
use site_research::storage::{open_storage, persist_result, Storage};
use site_research::{research_site, ResearchError};
use std::collections::HashSet;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Settings with no pacing so tests run quickly
fn test_settings() -> CrawlSettings {
    CrawlSettings::default().with_request_delay(Duration::ZERO)
}

fn html_page(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!(
            "<html lang=\"en\"><head><title>{}</title></head><body>{}</body></html>",
            title, body
        ),
        "text/html; charset=utf-8",
    )
}

async fn mount_page(server: &MockServer, route: &str, title: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(title, body))
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, content: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(content.to_string(), "text/plain"))
        .mount(server)
        .await;
}

/// Serves home → {/about, /pricing}
async fn three_page_site() -> MockServer {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /admin\n").await;

    mount_page(
        &server,
        "/",
        "Acme | Home",
        r#"<h1>Acme helps growing teams launch better campaigns in minutes.</h1>
           <a href="/about">About</a> <a href="/pricing">Pricing</a>
           <a href="https://elsewhere.test/">Elsewhere</a>"#,
    )
    .await;
    mount_page(
        &server,
        "/about",
        "About us",
        "<p>Our team builds tools for marketers.</p><a href=\"/\">Home</a>",
    )
    .await;
    mount_page(
        &server,
        "/pricing",
        "Pricing",
        "<p>Plans start at $49/month billed annually.</p>",
    )
    .await;

    server
}

fn start_url(server: &MockServer) -> String {
    format!("{}/", server.uri())
}

#[tokio::test]
async fn test_full_crawl_three_pages() {
    let server = three_page_site().await;
    let request = CrawlRequest::new(start_url(&server))
        .with_max_depth(1)
        .with_max_pages(10);

    let result = research_site(&request, &test_settings())
        .await
        .expect("Crawl failed");

    assert_eq!(result.pages.len(), 3);
    assert!(result.errors.is_empty(), "Unexpected errors: {:?}", result.errors);

    let depths: Vec<u32> = result.pages.iter().map(|p| p.depth).collect();
    assert_eq!(depths, vec![0, 1, 1]);

    let home = &result.pages[0];
    assert_eq!(home.url, start_url(&server));
    assert_eq!(home.parent_url, None);
    assert_eq!(home.classification.page_type, PageType::Home);
    assert_eq!(home.language.as_deref(), Some("en"));

    let pricing = result
        .pages
        .iter()
        .find(|p| p.url.ends_with("/pricing"))
        .expect("Pricing page missing");
    assert_eq!(pricing.parent_url.as_deref(), Some(home.url.as_str()));
    assert_eq!(pricing.classification.page_type, PageType::Pricing);

    assert!(result.findings.mentions_pricing);
    assert_eq!(result.findings.pricing_page_urls, vec![pricing.url.clone()]);
    assert_eq!(result.findings.coverage.pages_considered, 3);
}

#[tokio::test]
async fn test_no_url_is_crawled_twice() {
    let server = three_page_site().await;
    let request = CrawlRequest::new(start_url(&server)).with_max_depth(3);

    let result = research_site(&request, &test_settings())
        .await
        .expect("Crawl failed");

    let urls: HashSet<&str> = result.pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(urls.len(), result.pages.len());
    assert_eq!(urls.len(), 3);
}

#[tokio::test]
async fn test_robots_disallow_all() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /\n").await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Home", "hello"))
        .expect(0)
        .mount(&server)
        .await;

    let result = research_site(&CrawlRequest::new(start_url(&server)), &test_settings())
        .await
        .expect("Crawl failed");

    assert!(result.pages.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, CrawlErrorKind::RobotsBlocked);
    assert_eq!(result.errors[0].error, "Blocked by robots.txt");
    assert!(!result.findings.mentions_pricing);
}

#[tokio::test]
async fn test_page_budget_is_respected() {
    let server = MockServer::start().await;
    let links: String = (1..=6)
        .map(|i| format!("<a href=\"/p{}\">Page {}</a>", i, i))
        .collect();
    mount_page(&server, "/", "Home", &links).await;
    for i in 1..=6 {
        mount_page(&server, &format!("/p{}", i), &format!("Page {}", i), "text").await;
    }

    let request = CrawlRequest::new(start_url(&server)).with_max_pages(3);
    let result = research_site(&request, &test_settings())
        .await
        .expect("Crawl failed");

    assert_eq!(result.pages.len(), 3);
    assert!(result.pages[1].url.ends_with("/p1"));
    assert!(result.pages[2].url.ends_with("/p2"));
}

#[tokio::test]
async fn test_depth_zero_fetches_only_start() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Home", "<a href=\"/about\">About</a>").await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html_page("About", "text"))
        .expect(0)
        .mount(&server)
        .await;

    let request = CrawlRequest::new(start_url(&server)).with_max_depth(0);
    let result = research_site(&request, &test_settings())
        .await
        .expect("Crawl failed");

    assert_eq!(result.pages.len(), 1);
    assert_eq!(result.pages[0].outbound_links.len(), 1);
}

#[tokio::test]
async fn test_non_html_skipped_and_404_recorded() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Home",
        r#"<a href="/brochure.pdf">Brochure</a> <a href="/gone">Gone</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/brochure.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x25, 0x50, 0x44, 0x46], "application/pdf"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = research_site(&CrawlRequest::new(start_url(&server)), &test_settings())
        .await
        .expect("Crawl failed");

    assert_eq!(result.pages.len(), 1);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].url.ends_with("/gone"));
    assert_eq!(result.errors[0].kind, CrawlErrorKind::FetchFailed);
    assert_eq!(result.errors[0].error, "HTTP 404");
    assert_eq!(result.errors[0].depth, 1);
}

#[tokio::test]
async fn test_redirect_target_counts_as_visited() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Home",
        r#"<a href="/old">Old</a> <a href="/about">About</a>"#,
    )
    .await;
    let location = format!("{}/about", server.uri());
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", location.as_str()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html_page("About", "About Acme"))
        .expect(1)
        .mount(&server)
        .await;

    let result = research_site(&CrawlRequest::new(start_url(&server)), &test_settings())
        .await
        .expect("Crawl failed");

    assert_eq!(result.pages.len(), 2);
    assert!(result.pages[1].url.ends_with("/about"));
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_off_origin_redirect_of_linked_page_is_an_error() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;
    mount_page(&other, "/landing", "Elsewhere", "text").await;

    mount_page(&server, "/", "Home", r#"<a href="/out">Out</a>"#).await;
    let location = format!("{}/landing", other.uri());
    Mock::given(method("GET"))
        .and(path("/out"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", location.as_str()))
        .mount(&server)
        .await;

    let result = research_site(&CrawlRequest::new(start_url(&server)), &test_settings())
        .await
        .expect("Crawl failed");

    assert_eq!(result.pages.len(), 1);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0]
        .error
        .starts_with("Redirected to another origin:"));
}

#[tokio::test]
async fn test_start_redirect_to_another_origin_is_followed() {
    let entry = MockServer::start().await;
    let site = MockServer::start().await;

    let location = start_url(&site);
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", location.as_str()))
        .mount(&entry)
        .await;
    mount_page(&site, "/", "Home", r#"<a href="/about">About</a>"#).await;
    mount_page(&site, "/about", "About", "About Acme").await;

    let request = CrawlRequest::new(start_url(&entry)).with_max_depth(1);
    let result = research_site(&request, &test_settings())
        .await
        .expect("Crawl failed");

    assert!(result.errors.is_empty(), "Unexpected errors: {:?}", result.errors);
    assert_eq!(result.pages.len(), 2);
    assert_eq!(result.pages[0].url, start_url(&site));
    assert_eq!(result.pages[0].depth, 0);
    assert!(result.pages[1].url.starts_with(&site.uri()));
    assert_eq!(result.pages[1].parent_url.as_deref(), Some(location.as_str()));
}

#[tokio::test]
async fn test_over_cap_request_is_clamped() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Home", r#"<a href="/d1">Next</a>"#).await;
    for i in 1..=6 {
        let body = format!("<a href=\"/d{}\">Next</a>", i + 1);
        mount_page(&server, &format!("/d{}", i), &format!("Level {}", i), &body).await;
    }

    let request = CrawlRequest {
        start_url: start_url(&server),
        max_pages: 1000,
        max_depth: 9,
        include_sitemap: true,
    };
    let result = research_site(&request, &test_settings())
        .await
        .expect("Crawl failed");

    let deepest = result.pages.iter().map(|p| p.depth).max();
    assert_eq!(deepest, Some(3));
    assert_eq!(result.pages.len(), 4);
}

#[tokio::test]
async fn test_invalid_start_url() {
    let result = research_site(&CrawlRequest::new("not a url"), &test_settings()).await;
    assert!(matches!(result, Err(ResearchError::InvalidUrl(_))));

    let result = research_site(
        &CrawlRequest::new("https://example.com").with_max_pages(0),
        &test_settings(),
    )
    .await;
    assert!(matches!(result, Err(ResearchError::EmptyBudget)));
}

#[tokio::test]
async fn test_robots_cache_shared_between_crawls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("User-agent: *\nAllow: /\n", "text/plain"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/", "Home", "hello").await;

    let crawler = Crawler::new(test_settings()).expect("Failed to build crawler");
    let request = CrawlRequest::new(start_url(&server));
    crawler.run(&request).await.expect("First crawl failed");

    let second = Crawler::with_robots_cache(test_settings(), crawler.robots_cache())
        .expect("Failed to build crawler");
    let result = second.run(&request).await.expect("Second crawl failed");
    assert_eq!(result.pages.len(), 1);
}

#[tokio::test]
async fn test_persist_and_report() {
    let server = three_page_site().await;
    let request = CrawlRequest::new(start_url(&server)).with_max_depth(1);
    let result = research_site(&request, &test_settings())
        .await
        .expect("Crawl failed");

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut storage = open_storage(&dir.path().join("research.db")).expect("Failed to open DB");

    let crawl_id = persist_result(&mut storage, &request, "test-hash", &result)
        .expect("Failed to persist");
    for page in &result.pages {
        storage.upsert_page(crawl_id, page).expect("Re-persist failed");
    }
    assert_eq!(storage.count_pages(crawl_id).unwrap(), 3);
    assert_eq!(storage.get_findings(crawl_id).unwrap(), Some(result.findings.clone()));

    let latest = storage
        .latest_crawl_for(&request.start_url)
        .unwrap()
        .expect("Crawl not found");
    assert_eq!(latest.id, crawl_id);
    assert_eq!(latest.config_hash, "test-hash");

    let report_path = dir.path().join("research.json");
    let output = build_output(&result, request.include_sitemap, &[]);
    write_json_report(&output, &report_path).expect("Failed to write report");

    let written: ResearchOutput =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(written.pages.len(), 3);
    assert_eq!(written.sitemap.map(|s| s.flat.len()), Some(3));
    assert!(written.highlights[0].starts_with("Crawled 3 pages"));
}
