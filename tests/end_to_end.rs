mod common;

use common::{
    append_path, append_response, audit_body, mount_audit, pagespeed_endpoint, RUN_PAGESPEED,
    SHEET_ID,
};
use pagespeed_sheets::audit::Strategy;
use pagespeed_sheets::config::{ConfigLoader, Endpoints, OutputConfig, RunConfig, SourceConfig};
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_KEY: &str = include_str!("fixtures/test_key.pem");

struct Harness {
    server: MockServer,
    dir: TempDir,
}

impl Harness {
    async fn start() -> Self {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.e2e",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;

        Self {
            server,
            dir: TempDir::new().unwrap(),
        }
    }

    fn config(&self, source: SourceConfig, strategies: Vec<Strategy>) -> RunConfig {
        let key_path = self.dir.path().join("service-account.json");
        fs::write(
            &key_path,
            serde_json::to_string(&json!({
                "type": "service_account",
                "private_key": TEST_KEY,
                "client_email": "bot@perf-tracking.iam.gserviceaccount.com",
                "token_uri": format!("{}/token", self.server.uri())
            }))
            .unwrap(),
        )
        .unwrap();

        RunConfig {
            spreadsheet_id: Some(SHEET_ID.into()),
            api_key: Some("test-key".into()),
            source,
            strategies,
            retry_backoff_ms: 0,
            output: OutputConfig::Sheets,
            endpoints: Endpoints {
                pagespeed: pagespeed_endpoint(&self.server),
                sheets: self.server.uri(),
            },
            credentials_path: Some(key_path.display().to_string()),
            ..Default::default()
        }
    }

    fn urls_file(&self, content: &str) -> SourceConfig {
        let path = self.dir.path().join("urls.txt");
        fs::write(&path, content).unwrap();
        SourceConfig::File {
            path: path.display().to_string(),
        }
    }
}

#[tokio::test]
async fn routes_two_urls_and_skips_the_unmatched_one() {
    let harness = Harness::start().await;
    let server = &harness.server;

    Mock::given(method("GET"))
        .and(path(format!("/v4/spreadsheets/{}/values/URLList!A2:A", SHEET_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [
                ["https://i-travel.com.ua/home"],
                ["https://goit.global/about"],
                ["https://other.com"]
            ]
        })))
        .expect(1)
        .mount(server)
        .await;

    mount_audit(server, "https://i-travel.com.ua/home", 0.87).await;
    mount_audit(server, "https://goit.global/about", 0.42).await;
    mount_audit(server, "https://other.com", 0.99).await;

    Mock::given(method("POST"))
        .and(path(append_path("Results_NEO!A1:I")))
        .and(body_string_contains("https://i-travel.com.ua/home"))
        .and(body_string_contains("87"))
        .respond_with(append_response(9))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(append_path("Results_Goit!A1:I")))
        .and(body_string_contains("https://goit.global/about"))
        .respond_with(append_response(9))
        .expect(1)
        .mount(server)
        .await;

    let config = harness.config(SourceConfig::default(), vec![Strategy::Mobile]);
    let summary = ConfigLoader::create_pipeline(&config, None)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.urls_succeeded, 2);
    assert_eq!(summary.urls_skipped, 1);
    assert_eq!(summary.urls_failed, 0);
    assert_eq!(summary.rows_appended, 2);
    assert_eq!(summary.cells_appended, 18);
}

#[tokio::test]
async fn bad_audit_response_does_not_abort_remaining_urls() {
    let harness = Harness::start().await;
    let server = &harness.server;

    let mut broken = audit_body(0.5);
    broken["lighthouseResult"]["audits"]
        .as_object_mut()
        .unwrap()
        .remove("largest-contentful-paint");
    Mock::given(method("GET"))
        .and(path(RUN_PAGESPEED))
        .and(query_param("url", "https://goit.global/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(broken))
        .mount(server)
        .await;
    mount_audit(server, "https://goit.global/fine", 0.7).await;

    Mock::given(method("POST"))
        .and(path(append_path("Results_Goit!A1:I")))
        .respond_with(append_response(9))
        .expect(1)
        .mount(server)
        .await;

    let source = harness.urls_file("https://goit.global/broken\nhttps://goit.global/fine\n");
    let config = harness.config(source, vec![Strategy::Mobile]);
    let summary = ConfigLoader::create_pipeline(&config, None)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.urls_failed, 1);
    assert_eq!(summary.urls_succeeded, 1);
    assert_eq!(summary.fetches_failed, 1);
}

#[tokio::test]
async fn both_strategies_append_one_labelled_row_each() {
    let harness = Harness::start().await;
    let server = &harness.server;

    Mock::given(method("GET"))
        .and(path(RUN_PAGESPEED))
        .and(query_param("strategy", "mobile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(audit_body(0.55)))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(RUN_PAGESPEED))
        .and(query_param("strategy", "desktop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(audit_body(0.93)))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(append_path("Results_NEO!A1:I")))
        .and(body_string_contains("\"mobile\""))
        .respond_with(append_response(10))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(append_path("Results_NEO!A1:I")))
        .and(body_string_contains("\"desktop\""))
        .respond_with(append_response(10))
        .expect(1)
        .mount(server)
        .await;

    let source = harness.urls_file("  https://i-travel.com.ua/tours  \n\n");
    let config = harness.config(source, vec![Strategy::Mobile, Strategy::Desktop]);
    let summary = ConfigLoader::create_pipeline(&config, None)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.urls_succeeded, 1);
    assert_eq!(summary.rows_appended, 2);
}

#[tokio::test]
async fn rerunning_appends_duplicate_rows() {
    let harness = Harness::start().await;
    let server = &harness.server;

    mount_audit(server, "https://goit.global/", 0.8).await;
    Mock::given(method("POST"))
        .and(path(append_path("Results_Goit!A1:I")))
        .respond_with(append_response(9))
        .expect(2)
        .mount(server)
        .await;

    let source = harness.urls_file("https://goit.global/\n");
    let config = harness.config(source, vec![Strategy::Mobile]);

    for _ in 0..2 {
        let summary = ConfigLoader::create_pipeline(&config, None)
            .unwrap()
            .run()
            .await
            .unwrap();
        assert_eq!(summary.rows_appended, 1);
    }
}
