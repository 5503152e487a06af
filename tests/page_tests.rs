mod common;

use chrono::Local;
use common::FakeTransport;
use page_mirror::{FileManager, Mode, Page, PageError};
use std::fs;
use tempfile::tempdir;

const URL: &str = "http://example.com/test_page";
const SAMPLE_HTML: &str = "<html><body><a href='link1'></a><img src='img1'></img></body></html>";

fn sample_transport() -> FakeTransport {
    FakeTransport::new().with(URL, SAMPLE_HTML)
}

#[test]
fn test_new_sets_url() {
    let page = Page::new(URL, sample_transport(), FileManager::default());
    assert_eq!(page.url(), URL);
    assert!(page.last_fetched_at().is_none());
}

#[tokio::test]
async fn test_fetch_returns_page_source() {
    let mut page = Page::new(URL, sample_transport(), FileManager::default());
    let body = page.fetch().await.unwrap().to_vec();
    assert_eq!(body, SAMPLE_HTML.as_bytes());
    assert_eq!(page.html().await.unwrap(), SAMPLE_HTML.as_bytes());
}

#[tokio::test]
async fn test_fetch_failure_message() {
    let mut page = Page::new(URL, FakeTransport::new(), FileManager::default());
    let err = page.fetch().await.unwrap_err();

    assert!(matches!(err, PageError::Fetch { .. }));
    assert_eq!(
        err.to_string(),
        "The page could not be fetched (http://example.com/test_page)"
    );
    assert!(page.last_fetched_at().is_none());
}

#[tokio::test]
async fn test_fetch_transport_error_message() {
    let transport = FakeTransport::new().unreachable(URL);
    let mut page = Page::new(URL, transport, FileManager::default());
    let err = page.fetch().await.unwrap_err();

    assert!(matches!(err, PageError::Fetch { .. }));
    assert_eq!(
        err.to_string(),
        "The page could not be fetched (http://example.com/test_page)"
    );
    assert!(matches!(page.num_links(), Err(PageError::NotFetched { .. })));
}

#[tokio::test]
async fn test_fetch_sets_last_fetched_time() {
    let mut page = Page::new(URL, sample_transport(), FileManager::default());
    let before = Local::now();
    page.fetch().await.unwrap();
    let after = Local::now();

    let fetched_at = page.last_fetched_at().unwrap();
    assert!(fetched_at >= before && fetched_at <= after);
}

#[tokio::test]
async fn test_counts_after_fetch() {
    let mut page = Page::new(URL, sample_transport(), FileManager::default());
    page.fetch().await.unwrap();

    assert_eq!(page.num_images().unwrap(), 1);
    assert_eq!(page.num_links().unwrap(), 1);
}

#[test]
fn test_counts_require_fetch() {
    let page = Page::new(URL, sample_transport(), FileManager::default());
    assert!(matches!(page.num_images(), Err(PageError::NotFetched { .. })));
    assert!(matches!(page.metadata(), Err(PageError::NotFetched { .. })));
}

#[tokio::test]
async fn test_images_and_links_fetch_lazily_once() {
    let transport = sample_transport();
    let mut page = Page::new(URL, &transport, FileManager::default());

    let images = page.images().await.unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].attr("src").as_deref(), Some("img1"));

    let links = page.links().await.unwrap();
    assert_eq!(links[0].attr("href").as_deref(), Some("link1"));

    assert_eq!(transport.requests(), vec![URL.to_string()]);
}

#[tokio::test]
async fn test_metadata_report() {
    let mut page = Page::new(URL, sample_transport(), FileManager::default());
    page.fetch().await.unwrap();

    let metadata = page.metadata().unwrap();
    assert_eq!(metadata.num_links, 1);
    assert_eq!(metadata.images, 1);

    let printed = metadata.to_string();
    assert!(printed.contains("site: http://example.com/test_page"));
    assert!(printed.contains("num_links: 1"));
    assert!(printed.contains("images: 1"));
    assert!(printed.contains("last_fetch:"));

    let json: serde_json::Value = serde_json::to_value(&metadata).unwrap();
    assert_eq!(json["site"], URL);
    assert_eq!(json["num_links"], 1);
}

#[tokio::test]
async fn test_download_writes_raw_html() {
    let temp_dir = tempdir().unwrap();
    let mut page = Page::new(URL, sample_transport(), FileManager::new(Some(temp_dir.path())));

    let saved = page.download().await.unwrap();
    assert_eq!(saved, temp_dir.path().join("test-page.html"));
    assert_eq!(fs::read_to_string(saved).unwrap(), SAMPLE_HTML);
}

#[tokio::test]
async fn test_metadata_mode_writes_nothing() {
    let temp_dir = tempdir().unwrap();
    let mut page = Page::new(URL, sample_transport(), FileManager::new(Some(temp_dir.path())));

    page.process(Mode::Metadata { json: false }).await.unwrap();
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    assert!(page.last_fetched_at().is_some());
}

#[tokio::test]
async fn test_process_reports_fetch_failure() {
    let temp_dir = tempdir().unwrap();
    let mut page = Page::new(URL, FakeTransport::new(), FileManager::new(Some(temp_dir.path())));

    let err = page.process(Mode::Download).await.unwrap_err();
    assert!(matches!(err, PageError::Fetch { .. }));
    assert!(!temp_dir.path().join("test-page.html").exists());
}

#[test]
fn test_output_filename() {
    let named = |url: &str| Page::new(url, FakeTransport::new(), FileManager::default()).filename();

    assert_eq!(named("http://example.com/test_page"), "test-page.html");
    assert_eq!(named("http://example.com"), "example.com.html");
    assert_eq!(named("http://example.com/docs/"), "docs.html");
    assert_eq!(named("http://example.com/a b?c=1"), "a-b-c-1.html");
}
