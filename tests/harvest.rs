// tests/harvest.rs

mod common;

use std::sync::Arc;

use harvester::models::{Config, HarvestSource, LocalDataset};
use harvester::pipeline::Harvester;
use harvester::storage::{HarvestStore, LocalStorage};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::{path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source(server: &MockServer, config: Option<&str>) -> HarvestSource {
    HarvestSource {
        id: "city".into(),
        url: format!("{}/data.json", server.uri()),
        owner_org: Some("org-1".into()),
        config: config.map(str::to_string),
    }
}

fn harvester(storage: &Arc<LocalStorage>) -> Harvester {
    Harvester::new(&Config::default(), storage.clone(), storage.clone())
}

async fn serve_page(server: &MockServer, page: Option<&str>, status: u16, body: &str) {
    let mock = Mock::given(path("/data.json"));
    let mock = match page {
        Some(page) => mock.and(query_param("page", page)),
        None => mock,
    };
    mock.respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

async fn active_titles(storage: &LocalStorage) -> Vec<String> {
    let mut titles: Vec<String> = storage
        .list_records()
        .await
        .unwrap()
        .into_iter()
        .filter(LocalDataset::is_active)
        .filter_map(|r| r.title)
        .collect();
    titles.sort();
    titles
}

#[tokio::test]
async fn paginated_catalog_ends_on_missing_page() {
    let server = MockServer::start().await;
    // Page-specific mocks first: the catch-all below matches every query.
    serve_page(&server, Some("3"), 404, "").await;
    serve_page(&server, Some("2"), 200, r#"[{"identifier": "C", "title": "Crime"}]"#).await;
    serve_page(
        &server,
        None,
        200,
        r#"[{"identifier": "A", "title": "Arts"}, {"identifier": "B", "title": "Bikes"}]"#,
    )
    .await;

    let tmp = TempDir::new().unwrap();
    let storage = Arc::new(LocalStorage::new(tmp.path()));
    let report = harvester(&storage).run(&source(&server, None)).await.unwrap();

    assert!(report.is_clean(), "{report:?}");
    assert_eq!(report.created, 3);
    assert_eq!(active_titles(&storage).await, vec!["Arts", "Bikes", "Crime"]);

    let records = storage.list_records().await.unwrap();
    assert!(records.iter().all(|r| r.owner_org.as_deref() == Some("org-1")));
}

#[tokio::test]
async fn server_ignoring_page_parameter_stops_on_repeat() {
    let server = MockServer::start().await;
    serve_page(
        &server,
        None,
        200,
        r#"{"dataset": [{"identifier": "A", "title": "Arts"}]}"#,
    )
    .await;

    let tmp = TempDir::new().unwrap();
    let storage = Arc::new(LocalStorage::new(tmp.path()));
    let report = harvester(&storage).run(&source(&server, None)).await.unwrap();

    assert!(report.is_clean(), "{report:?}");
    assert_eq!((report.gathered, report.created), (1, 1));
}

#[tokio::test]
async fn missing_first_page_is_a_run_error() {
    let server = MockServer::start().await;
    serve_page(&server, None, 404, "").await;

    let tmp = TempDir::new().unwrap();
    let storage = Arc::new(LocalStorage::new(tmp.path()));
    let report = harvester(&storage).run(&source(&server, None)).await.unwrap();

    let error = report.gather_error.expect("gather error recorded");
    assert!(error.contains("404"), "{error}");
    assert_eq!(report.gathered, 0);
    assert!(storage.latest_run("city").await.unwrap().is_some());
}

#[tokio::test]
async fn unreachable_source_keeps_existing_records() {
    let server = MockServer::start().await;
    serve_page(&server, None, 200, r#"[{"identifier": "A", "title": "Arts"}]"#).await;

    let tmp = TempDir::new().unwrap();
    let storage = Arc::new(LocalStorage::new(tmp.path()));
    let harvester = harvester(&storage);
    harvester.run(&source(&server, None)).await.unwrap();

    server.reset().await;
    serve_page(&server, None, 500, "").await;
    let report = harvester.run(&source(&server, None)).await.unwrap();

    assert!(report.gather_error.is_some());
    assert_eq!(report.deleted, 0);
    assert_eq!(active_titles(&storage).await, vec!["Arts"]);
    assert!(storage.current_guids("city").await.unwrap().contains_key("A"));
}

#[tokio::test]
async fn publisher_filter_skips_and_retires() {
    let server = MockServer::start().await;
    serve_page(
        &server,
        None,
        200,
        r#"[
            {"identifier": "A", "title": "Arts", "publisher": {"name": "Parks Dept"}},
            {"identifier": "B", "title": "Bikes", "publisher": "Transit"}
        ]"#,
    )
    .await;

    let tmp = TempDir::new().unwrap();
    let storage = Arc::new(LocalStorage::new(tmp.path()));
    let harvester = harvester(&storage);

    let first = harvester.run(&source(&server, None)).await.unwrap();
    assert_eq!(first.created, 2);

    let filtered = source(&server, Some(r#"{"organizations_filter_exclude": ["Transit"]}"#));
    let second = harvester.run(&filtered).await.unwrap();
    assert!(second.is_clean(), "{second:?}");
    assert_eq!((second.updated, second.deleted), (1, 1));
    assert_eq!(second.skipped, 1);
    assert_eq!(active_titles(&storage).await, vec!["Arts"]);
}

#[tokio::test]
async fn keyword_splitting_follows_source_profile() {
    let server = MockServer::start().await;
    serve_page(
        &server,
        None,
        200,
        r#"[{"identifier": "A", "title": "Arts", "keyword": ["Parks; Trees", "Roads & Bridges", "x"]}]"#,
    )
    .await;

    let tmp = TempDir::new().unwrap();
    let storage = Arc::new(LocalStorage::new(tmp.path()));
    let config = r#"{
        "profile": {"split_keywords": true},
        "default_tags": [{"name": "harvested"}],
        "default_extras": {"source": "city"}
    }"#;
    let report = harvester(&storage)
        .run(&source(&server, Some(config)))
        .await
        .unwrap();
    assert!(report.is_clean(), "{report:?}");

    let records = storage.list_records().await.unwrap();
    let tags: Vec<&str> = records[0].tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tags, vec!["Parks", "Trees", "Roads and Bridges", "harvested"]);
    assert_eq!(records[0].extra("source"), Some("city"));
}

#[tokio::test]
async fn oversized_stream_keeps_existing_records() {
    let server = MockServer::start().await;
    serve_page(&server, None, 200, r#"[{"identifier": "A", "title": "Arts"}]"#).await;

    let tmp = TempDir::new().unwrap();
    let storage = Arc::new(LocalStorage::new(tmp.path()));
    let harvester = harvester(&storage);
    harvester.run(&source(&server, None)).await.unwrap();

    let oversized = HarvestSource {
        id: "city".into(),
        url: common::serve_chunked("x".repeat(4096), 256).await,
        owner_org: None,
        config: Some(r#"{"max_file_size": 1024}"#.into()),
    };
    let report = harvester.run(&oversized).await.unwrap();

    let error = report.gather_error.expect("gather error recorded");
    assert!(error.contains("too big"), "{error}");
    assert_eq!((report.gathered, report.deleted), (0, 0));
    assert_eq!(active_titles(&storage).await, vec!["Arts"]);
    assert!(storage.current_guids("city").await.unwrap().contains_key("A"));
}
