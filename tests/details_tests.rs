//! Detail-phase integration tests against a local HTTP server

use medharvest::config::{
    CatalogConfig, Config, DetailSelectors, FetchConfig, OutputConfig, SelectorConfig,
    UserAgentConfig,
};
use medharvest::crawler::run_details;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn harvest_config(server_uri: &str, dir: &Path) -> Config {
    Config {
        catalog: CatalogConfig {
            index_url: format!("{}/catalog", server_uri),
            page_url_template: format!("{}/list?page={{page}}&label={{category}}", server_uri),
            categories: vec!["A".to_string()],
        },
        selectors: SelectorConfig {
            product_link: "a.product-name".to_string(),
            next_page: "a.link-next".to_string(),
            detail: DetailSelectors {
                name: "#drug_header h1".to_string(),
                uses: "#uses ul li a".to_string(),
                benefit_titles: "#uses .tile h3".to_string(),
                benefit_descriptions: "#uses .tile p".to_string(),
                side_effects_general: "#side_effects .overview".to_string(),
                side_effects_common: "#side_effects ul li".to_string(),
                mechanism: "#how_drug_works .overview".to_string(),
                administration: "#how_to_use .overview".to_string(),
            },
        },
        fetch: FetchConfig {
            request_timeout_ms: 5_000,
            element_timeout_ms: 10,
            max_attempts: 3,
            retry_backoff_min_ms: 0,
            retry_backoff_max_ms: 0,
            page_delay_min_ms: 0,
            page_delay_max_ms: 0,
            settle_delay_ms: 0,
            link_retry_step_ms: 0,
        },
        user_agent: UserAgentConfig {
            crawler_name: "medharvest-test".to_string(),
            crawler_version: "0.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        },
        output: OutputConfig {
            links_path: dir.join("links.txt").to_string_lossy().into_owned(),
            results_path: dir.join("drugs_data.json").to_string_lossy().into_owned(),
            checkpoint_path: dir.join("checkpoint.json").to_string_lossy().into_owned(),
            audit_log_path: dir.join("harvest.log").to_string_lossy().into_owned(),
        },
    }
}

const DETAIL_PAGE: &str = r#"<html><body>
    <div id="drug_header"><h1>Alpha 100mg</h1></div>
    <div id="uses">
        <ul><li><a>Fever</a></li><li><a>Pain</a></li></ul>
        <div class="tile"><h3>Fever relief</h3><p>Reduces body temperature</p></div>
    </div>
    <div id="side_effects">
        <div class="overview">Usually well tolerated</div>
        <ul><li>Nausea</li></ul>
    </div>
    <div id="how_drug_works"><div class="overview">Blocks prostaglandins</div></div>
    <div id="how_to_use"><div class="overview">Take with food</div></div>
</body></html>"#;

fn write_links(dir: &TempDir, server_uri: &str, tails: &[&str]) {
    let lines: String = tails
        .iter()
        .map(|t| format!("{}/drug/{}\n", server_uri, t))
        .collect();
    std::fs::write(dir.path().join("links.txt"), lines).unwrap();
}

fn result_document(dir: &TempDir) -> serde_json::Value {
    let content = std::fs::read_to_string(dir.path().join("drugs_data.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

fn no_shutdown() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

#[tokio::test]
async fn fetches_extracts_and_persists_a_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drug/alpha"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DETAIL_PAGE))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write_links(&dir, &server.uri(), &["alpha"]);

    run_details(harvest_config(&server.uri(), dir.path()), no_shutdown())
        .await
        .unwrap();

    let document = result_document(&dir);
    let drugs = document["drugs"].as_array().unwrap();
    assert_eq!(drugs.len(), 1);
    assert_eq!(drugs[0]["identifier"], "Alpha 100mg");
    assert_eq!(
        drugs[0]["source_url"],
        format!("{}/drug/alpha", server.uri())
    );
    assert_eq!(
        drugs[0]["attribute_groups"]["uses"][0]["condition"],
        "Fever"
    );
    assert_eq!(
        drugs[0]["attribute_groups"]["side_effects"]["common"][0],
        "Nausea"
    );
}

#[tokio::test]
async fn transient_server_errors_are_retried() {
    let server = MockServer::start().await;

    // The first two responses are 500s; the mock then expires and the 200
    // behind it takes over.
    Mock::given(method("GET"))
        .and(path("/drug/alpha"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drug/alpha"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DETAIL_PAGE))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write_links(&dir, &server.uri(), &["alpha"]);

    run_details(harvest_config(&server.uri(), dir.path()), no_shutdown())
        .await
        .unwrap();

    let document = result_document(&dir);
    assert_eq!(document["drugs"].as_array().unwrap().len(), 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn rerun_skips_already_fetched_urls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drug/alpha"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DETAIL_PAGE))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write_links(&dir, &server.uri(), &["alpha"]);
    let config = harvest_config(&server.uri(), dir.path());

    run_details(config.clone(), no_shutdown()).await.unwrap();
    run_details(config, no_shutdown()).await.unwrap();

    // One record, one request: the second run recognized the URL as done.
    let document = result_document(&dir);
    assert_eq!(document["drugs"].as_array().unwrap().len(), 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn page_without_name_is_logged_and_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drug/nameless"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drug/alpha"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DETAIL_PAGE))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write_links(&dir, &server.uri(), &["nameless", "alpha"]);

    run_details(harvest_config(&server.uri(), dir.path()), no_shutdown())
        .await
        .unwrap();

    let document = result_document(&dir);
    let drugs = document["drugs"].as_array().unwrap();
    assert_eq!(drugs.len(), 1);
    assert_eq!(drugs[0]["identifier"], "Alpha 100mg");

    let log = std::fs::read_to_string(dir.path().join("harvest.log")).unwrap();
    assert!(log.contains("DATA_ERROR"));
    assert!(log.contains("/drug/nameless"));
}

#[tokio::test]
async fn missing_url_list_is_a_clean_no_op() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    run_details(harvest_config(&server.uri(), dir.path()), no_shutdown())
        .await
        .unwrap();

    assert!(!dir.path().join("drugs_data.json").exists());
    assert!(server.received_requests().await.unwrap().is_empty());
}
