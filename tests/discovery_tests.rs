//! Discovery-phase integration tests against a local HTTP server

use medharvest::config::{
    CatalogConfig, Config, DetailSelectors, FetchConfig, OutputConfig, SelectorConfig,
    UserAgentConfig,
};
use medharvest::crawler::run_discovery;
use medharvest::state::{Checkpoint, CheckpointStore};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn harvest_config(server_uri: &str, dir: &Path, categories: &[&str]) -> Config {
    Config {
        catalog: CatalogConfig {
            index_url: format!("{}/catalog", server_uri),
            page_url_template: format!("{}/list?page={{page}}&label={{category}}", server_uri),
            categories: categories.iter().map(|c| c.to_string()).collect(),
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
            max_attempts: 2,
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

fn listing_page(product_hrefs: &[&str], next_href: Option<&str>) -> String {
    let mut body = String::from("<html><body>");
    for href in product_hrefs {
        body.push_str(&format!(
            r#"<a class="product-name" href="{}">product</a>"#,
            href
        ));
    }
    if let Some(href) = next_href {
        body.push_str(&format!(
            r#"<a class="button-text link-next" href="{}">Next</a>"#,
            href
        ));
    }
    body.push_str("</body></html>");
    body
}

fn links_in(dir: &TempDir) -> Vec<String> {
    std::fs::read_to_string(dir.path().join("links.txt"))
        .unwrap_or_default()
        .lines()
        .map(String::from)
        .collect()
}

fn no_shutdown() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

async fn mount_two_category_catalog(server: &MockServer) {
    // Default view: two products and a next-page control for category A.
    Mock::given(method("GET"))
        .and(path("/catalog"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(
            &["/drug/l1", "/drug/l2"],
            Some("/list?page=2&label=a"),
        )))
        .mount(server)
        .await;

    // Last page of A: one product, no next control.
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "2"))
        .and(query_param("label", "a"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_page(&["/drug/l3"], None)),
        )
        .mount(server)
        .await;

    // Only page of B.
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "1"))
        .and(query_param("label", "b"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_page(&["/drug/l4"], None)),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn discovers_all_links_across_categories_and_pages() {
    let server = MockServer::start().await;
    mount_two_category_catalog(&server).await;

    let dir = TempDir::new().unwrap();
    let config = harvest_config(&server.uri(), dir.path(), &["A", "B"]);

    run_discovery(config, false, no_shutdown()).await.unwrap();

    let expected: Vec<String> = ["l1", "l2", "l3", "l4"]
        .iter()
        .map(|l| format!("{}/drug/{}", server.uri(), l))
        .collect();
    assert_eq!(links_in(&dir), expected);

    let checkpoint = CheckpointStore::new(dir.path().join("checkpoint.json")).load();
    assert_eq!(
        checkpoint,
        Checkpoint {
            category_index: 2,
            page_number: 1
        }
    );
}

#[tokio::test]
async fn rerun_after_completion_changes_nothing() {
    let server = MockServer::start().await;
    mount_two_category_catalog(&server).await;

    let dir = TempDir::new().unwrap();
    let config = harvest_config(&server.uri(), dir.path(), &["A", "B"]);

    run_discovery(config.clone(), false, no_shutdown())
        .await
        .unwrap();
    let first = links_in(&dir);
    let requests_after_first = server.received_requests().await.unwrap().len();

    run_discovery(config, false, no_shutdown()).await.unwrap();

    // The saved checkpoint already points past the last category; the
    // second run makes no requests and appends nothing.
    assert_eq!(links_in(&dir), first);
    assert_eq!(
        server.received_requests().await.unwrap().len(),
        requests_after_first
    );
}

#[tokio::test]
async fn resumes_from_saved_checkpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "1"))
        .and(query_param("label", "b"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_page(&["/drug/l4"], None)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    CheckpointStore::new(dir.path().join("checkpoint.json"))
        .save(&Checkpoint {
            category_index: 1,
            page_number: 1,
        })
        .unwrap();

    let config = harvest_config(&server.uri(), dir.path(), &["A", "B"]);
    run_discovery(config, false, no_shutdown()).await.unwrap();

    assert_eq!(links_in(&dir), vec![format!("{}/drug/l4", server.uri())]);

    // Category A (the default view) was never revisited.
    let touched_catalog = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .any(|r| r.url.path() == "/catalog");
    assert!(!touched_catalog);
}

#[tokio::test]
async fn fresh_flag_discards_checkpoint_and_url_list() {
    let server = MockServer::start().await;
    mount_two_category_catalog(&server).await;

    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("links.txt"), "http://stale/drug/old\n").unwrap();
    CheckpointStore::new(dir.path().join("checkpoint.json"))
        .save(&Checkpoint {
            category_index: 2,
            page_number: 1,
        })
        .unwrap();

    let config = harvest_config(&server.uri(), dir.path(), &["A", "B"]);
    run_discovery(config, true, no_shutdown()).await.unwrap();

    let expected: Vec<String> = ["l1", "l2", "l3", "l4"]
        .iter()
        .map(|l| format!("{}/drug/{}", server.uri(), l))
        .collect();
    assert_eq!(links_in(&dir), expected);
}
