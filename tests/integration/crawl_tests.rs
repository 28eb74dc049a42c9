//! Integration tests for the crawler
//!
//! These tests use wiremock to stand up a mock shop and exercise the HTTP
//! renderer, a full worker run, and the running service end-to-end.

use catalog_crawler::config::{parse_config, Config};
use catalog_crawler::crawler::{build_worker, stop_channel, Coordinator, StopSignal, WorkerOutcome};
use catalog_crawler::render::{HttpRenderer, PageRenderer, RenderRequest};
use catalog_crawler::storage::{FsStorage, StorageHandles};
use catalog_crawler::CrawlError;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with discovery switched off
fn create_test_config(data_dir: &str) -> Config {
    parse_config(&format!(
        r#"
[scheduler]
poll-interval-ms = 100
max-concurrent-workers = 2

[crawler]
page-batch-size = 2
inter-page-delay-ms = 0
page-timeout-ms = 5000
job-retry-interval-ms = 100
job-wait-attempts = 3

[discovery]
enabled = false

[storage]
data-dir = "{}"

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"
"#,
        data_dir
    ))
    .expect("valid test config")
}

fn renderer() -> Arc<HttpRenderer> {
    let config = create_test_config("./unused");
    Arc::new(HttpRenderer::from_config(&config.user_agent).unwrap())
}

fn html_page(title: &str, links: &[String]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">item</a>"#, href))
        .collect();
    ResponseTemplate::new(200)
        .set_body_string(format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, anchors
        ))
        .insert_header("content-type", "text/html")
}

/// Mounts `pages` product pages under `category`, one product each; later pages are empty
async fn mount_category(server: &MockServer, category: &str, pages: u32) {
    let base_url = server.uri();
    for page in 1..=pages {
        let product = format!("{}/products/{}-{}", base_url, category, page);
        Mock::given(method("GET"))
            .and(path(format!("/{}", category)))
            .and(query_param("page", page.to_string()))
            .respond_with(html_page("Shop", &[product]))
            .mount(server)
            .await;
    }

    // Past the last page the listing is empty
    Mock::given(method("GET"))
        .and(path(format!("/{}", category)))
        .respond_with(html_page("Shop", &[]))
        .with_priority(10)
        .mount(server)
        .await;
}

fn mock_domain(server: &MockServer) -> String {
    url::Url::parse(&server.uri())
        .expect("Failed to parse base URL")
        .host_str()
        .expect("Failed to extract host")
        .to_string()
}

#[tokio::test]
async fn test_http_renderer_resolves_anchors() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/shoes"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(
                    r##"<html><head><title>Shoes</title></head><body>
                    <a href="/products/runner">Runner</a>
                    <a href="https://other.org/x">Elsewhere</a>
                    <a href="#top">Top</a>
                    <a href="mailto:shop@example.com">Mail</a>
                    </body></html>"##,
                )
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let request = RenderRequest::new(
        format!("{}/shoes?page=1", base_url),
        Duration::from_secs(5),
        Duration::ZERO,
    );
    let anchors = renderer().render_anchors(&request).await.unwrap();

    assert_eq!(
        anchors,
        vec![
            format!("{}/products/runner", base_url),
            "https://other.org/x".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_http_renderer_reports_block_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let request = RenderRequest::new(
        format!("{}/shoes?page=1", mock_server.uri()),
        Duration::from_secs(5),
        Duration::ZERO,
    );
    let err = renderer().render_anchors(&request).await.unwrap_err();

    assert!(err.is_render_failure());
    assert!(err.to_string().contains("automation blocked"));
}

#[tokio::test]
async fn test_http_renderer_detects_challenge_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html_page("Just a moment...", &[]))
        .mount(&mock_server)
        .await;

    let request = RenderRequest::new(
        format!("{}/", mock_server.uri()),
        Duration::from_secs(5),
        Duration::ZERO,
    );
    let err = renderer().render_anchors(&request).await.unwrap_err();

    assert!(matches!(err, CrawlError::RenderFailure { .. }));
}

#[tokio::test]
async fn test_http_renderer_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html_page("Slow", &[]).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let request = RenderRequest::new(
        format!("{}/", mock_server.uri()),
        Duration::from_millis(200),
        Duration::ZERO,
    );
    let err = renderer().render_anchors(&request).await.unwrap_err();

    assert!(err.is_render_failure());
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn test_worker_crawls_mock_shop() {
    let mock_server = MockServer::start().await;
    mount_category(&mock_server, "shoes", 3).await;
    mount_category(&mock_server, "bags", 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir.path().display().to_string());
    let storage = StorageHandles::from_backend(FsStorage::open(dir.path()).unwrap());
    let domain = mock_domain(&mock_server);
    let base_url = mock_server.uri();

    storage
        .queue
        .enqueue(
            &domain,
            &[format!("{}/shoes", base_url), format!("{}/bags", base_url)],
        )
        .unwrap();

    let worker = build_worker(&config, &storage, renderer());
    let outcome = worker.run_job(&domain, &StopSignal::never()).await;

    assert_eq!(outcome, WorkerOutcome::Completed { categories: 2, links: 4 });

    // Pages within a batch finish in any order
    let mut results = storage.results.read_results(&domain).unwrap();
    results.sort();
    assert_eq!(
        results,
        vec![
            format!("{}/products/bags-1", base_url),
            format!("{}/products/shoes-1", base_url),
            format!("{}/products/shoes-2", base_url),
            format!("{}/products/shoes-3", base_url),
        ]
    );
    assert!(storage.queue.read_job(&domain).unwrap_err().is_not_found());
    assert!(storage.checkpoints.load(&domain).unwrap().is_none());
    assert_eq!(storage.strategy.get(&domain).unwrap(), Some(true));
}

#[tokio::test]
async fn test_worker_failure_keeps_progress() {
    let mock_server = MockServer::start().await;
    mount_category(&mock_server, "shoes", 1).await;
    Mock::given(method("GET"))
        .and(path("/bags"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir.path().display().to_string());
    let storage = StorageHandles::from_backend(FsStorage::open(dir.path()).unwrap());
    let domain = mock_domain(&mock_server);
    let base_url = mock_server.uri();

    storage
        .queue
        .enqueue(
            &domain,
            &[format!("{}/shoes", base_url), format!("{}/bags", base_url)],
        )
        .unwrap();

    let worker = build_worker(&config, &storage, renderer());
    let outcome = worker.run_job(&domain, &StopSignal::never()).await;

    assert!(matches!(outcome, WorkerOutcome::Failed(_)));
    assert_eq!(storage.queue.read_job(&domain).unwrap().categories.len(), 2);
    let checkpoint = storage.checkpoints.load(&domain).unwrap().unwrap();
    assert_eq!(checkpoint.processed_categories, 1);
    assert_eq!(
        storage.results.read_results(&domain).unwrap(),
        vec![format!("{}/products/shoes-1", base_url)]
    );
}

#[tokio::test]
async fn test_service_completes_queued_site() {
    let mock_server = MockServer::start().await;
    mount_category(&mock_server, "shoes", 2).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir.path().display().to_string());
    let storage = StorageHandles::from_backend(FsStorage::open(dir.path()).unwrap());
    let domain = mock_domain(&mock_server);

    storage
        .queue
        .enqueue(&domain, &[format!("{}/shoes", mock_server.uri())])
        .unwrap();

    let coordinator = Coordinator::with_parts(config, storage.clone(), renderer());
    let (handle, signal) = stop_channel();
    let service = tokio::spawn(coordinator.run(signal));

    let mut completed = false;
    for _ in 0..500 {
        if storage.queue.read_job(&domain).is_err() {
            completed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    handle.stop();
    service.await.unwrap().unwrap();

    assert!(completed, "site was never completed");
    assert_eq!(storage.results.read_results(&domain).unwrap().len(), 2);
}
