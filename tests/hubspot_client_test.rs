//! Integration tests for the HubSpot client against a mock server
//!
//! These tests verify:
//! - Paging requests and cursor extraction
//! - Retry-After handling for 429 responses
//! - Backoff retries for error statuses and transport failures
//! - Credential validation and the connection report
//! - The client driving a full extraction run, including an unreachable server

use deal_etl::adapters::hubspot::HubSpotClient;
use deal_etl::config::{secret_string, HubSpotConfig};
use deal_etl::core::extract::{DealExtractor, ExtractionOutcome, ExtractionSettings};
use deal_etl::core::state::{
    CheckpointDetail, CheckpointPhase, CheckpointRecorder, MemoryCheckpointSink, ResumeState,
};
use deal_etl::domain::{Cursor, EtlError, RemoteError, ScanId, TransformedDeal};
use mockito::{Matcher, Server};
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEALS: &str = "/crm/v3/objects/deals";
const FIRST_PAGE: &str = "^limit=100&archived=false&properties=";

fn config(base_url: &str) -> HubSpotConfig {
    let mut config = HubSpotConfig::new(base_url, secret_string("pat-test".to_string()));
    config.rate_limit.requests = 1000;
    config.rate_limit.period_seconds = 1;
    config.retry.initial_delay_ms = 10;
    config.retry.max_jitter_ms = 0;
    config
}

/// Base URL of a local port nothing listens on
fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

fn client(server: &Server) -> HubSpotClient {
    HubSpotClient::new(&config(&server.url())).unwrap()
}

fn page_body(ids: &[&str], after: Option<&str>) -> String {
    let results: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "id": id,
                "properties": {
                    "dealname": format!("Deal {id}"),
                    "amount": "2500.50",
                    "dealstage": "closedwon",
                    "hs_deal_stage_probability": "90",
                },
                "archived": false,
            })
        })
        .collect();

    let mut body = serde_json::json!({ "results": results });
    if let Some(after) = after {
        body["paging"] = serde_json::json!({
            "next": { "after": after, "link": format!("?after={after}") }
        });
    }
    body.to_string()
}

#[tokio::test]
async fn test_list_page_sends_auth_and_parses_cursor() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", DEALS)
        .match_header("authorization", "Bearer pat-test")
        .match_header("user-agent", "HubSpot-Deals-ETL-Service/1.0")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("limit".into(), "100".into()),
            Matcher::UrlEncoded("archived".into(), "false".into()),
            Matcher::UrlEncoded("properties".into(), "dealname,amount".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(page_body(&["1", "2"], Some("c1")))
        .create_async()
        .await;

    let properties = vec!["dealname".to_string(), "amount".to_string()];
    let page = client(&server)
        .list_page(100, None, Some(&properties), false)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(page.results.len(), 2);
    assert_eq!(page.results[0].id.as_deref(), Some("1"));
    assert_eq!(page.next_cursor, Some(Cursor::new("c1")));
}

#[tokio::test]
async fn test_list_page_clamps_limit_and_defaults_properties() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", DEALS)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("limit".into(), "100".into()),
            Matcher::UrlEncoded("archived".into(), "true".into()),
            Matcher::UrlEncoded("after".into(), "c7".into()),
            Matcher::Regex("properties=dealname".into()),
        ]))
        .with_status(200)
        .with_body(page_body(&[], None))
        .create_async()
        .await;

    let page = client(&server)
        .list_page(500, Some(&Cursor::new("c7")), None, true)
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(page.results.is_empty());
    assert!(!page.has_more());
}

#[tokio::test]
async fn test_rate_limited_request_waits_for_retry_after() {
    let mut server = Server::new_async().await;
    let limited = server
        .mock("GET", DEALS)
        .match_query(Matcher::Any)
        .with_status(429)
        .with_header("retry-after", "2")
        .expect(1)
        .create_async()
        .await;
    let ok = server
        .mock("GET", DEALS)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(page_body(&["1"], None))
        .expect(1)
        .create_async()
        .await;

    // A 429 does not use up an attempt
    let mut cfg = config(&server.url());
    cfg.retry.max_attempts = 1;
    let client = HubSpotClient::new(&cfg).unwrap();

    let started = Instant::now();
    let page = client.list_page(100, None, None, false).await.unwrap();

    // Exactly one wait of the advertised length
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed < Duration::from_secs(3));
    assert_eq!(page.results.len(), 1);
    limited.assert_async().await;
    ok.assert_async().await;
}

#[tokio::test]
async fn test_oversized_retry_after_is_capped() {
    let mut server = Server::new_async().await;
    let limited = server
        .mock("GET", DEALS)
        .match_query(Matcher::Any)
        .with_status(429)
        .with_header("retry-after", "1e20")
        .expect(1)
        .create_async()
        .await;
    let ok = server
        .mock("GET", DEALS)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(page_body(&["1"], None))
        .expect(1)
        .create_async()
        .await;

    let mut cfg = config(&server.url());
    cfg.retry.max_retry_after_ms = 50;
    let client = HubSpotClient::new(&cfg).unwrap();

    let started = Instant::now();
    let page = client.list_page(100, None, None, false).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(page.results.len(), 1);
    limited.assert_async().await;
    ok.assert_async().await;
}

#[tokio::test]
async fn test_rate_limit_waits_are_capped() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", DEALS)
        .match_query(Matcher::Any)
        .with_status(429)
        .with_header("retry-after", "0")
        .expect(3)
        .create_async()
        .await;

    let mut cfg = config(&server.url());
    cfg.retry.max_rate_limit_waits = 2;
    let client = HubSpotClient::new(&cfg).unwrap();

    let err = client.list_page(100, None, None, false).await.unwrap_err();

    mock.assert_async().await;
    assert!(matches!(
        err,
        EtlError::Remote(RemoteError::RateLimitExceeded { waits: 3 })
    ));
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("GET", DEALS)
        .match_query(Matcher::Any)
        .with_status(503)
        .expect(2)
        .create_async()
        .await;
    let ok = server
        .mock("GET", DEALS)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(page_body(&["1"], None))
        .expect(1)
        .create_async()
        .await;

    let page = client(&server)
        .list_page(100, None, None, false)
        .await
        .unwrap();

    failing.assert_async().await;
    ok.assert_async().await;
    assert_eq!(page.results.len(), 1);
}

#[tokio::test]
async fn test_retries_exhausted_after_max_attempts() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", DEALS)
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("boom")
        .expect(3)
        .create_async()
        .await;

    let err = client(&server)
        .list_page(100, None, None, false)
        .await
        .unwrap_err();

    mock.assert_async().await;
    match err {
        EtlError::Remote(RemoteError::RetriesExhausted {
            attempts,
            status,
            message,
        }) => {
            assert_eq!(attempts, 3);
            assert_eq!(status, Some(500));
            assert!(message.contains("boom"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_client_errors_use_the_retry_budget() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", DEALS)
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(r#"{"message":"bad property"}"#)
        .expect(3)
        .create_async()
        .await;

    let err = client(&server)
        .list_page(100, None, None, false)
        .await
        .unwrap_err();

    mock.assert_async().await;
    match err {
        EtlError::Remote(remote) => {
            assert_eq!(remote.status(), Some(400));
            assert!(matches!(
                remote,
                RemoteError::RetriesExhausted { attempts: 3, .. }
            ));
            assert!(remote.to_string().contains("bad property"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", DEALS)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let err = client(&server)
        .list_page(100, None, None, false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EtlError::Remote(RemoteError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_validate_credentials() {
    let mut server = Server::new_async().await;
    let ok = server
        .mock("GET", DEALS)
        .match_query(Matcher::UrlEncoded("limit".into(), "1".into()))
        .with_status(200)
        .with_body(page_body(&[], None))
        .create_async()
        .await;

    assert!(client(&server).validate_credentials().await);
    ok.assert_async().await;

    let mut server = Server::new_async().await;
    let rejected = server
        .mock("GET", DEALS)
        .match_query(Matcher::Any)
        .with_status(401)
        .expect(3)
        .create_async()
        .await;

    assert!(!client(&server).validate_credentials().await);
    rejected.assert_async().await;
}

#[tokio::test]
async fn test_get_deal() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/crm/v3/objects/deals/42")
        .match_query(Matcher::UrlEncoded("properties".into(), "dealname".into()))
        .with_status(200)
        .with_body(r#"{"id":"42","properties":{"dealname":"Big deal"},"archived":false}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/crm/v3/objects/deals/404")
        .with_status(404)
        .with_body(r#"{"message":"resource not found"}"#)
        .create_async()
        .await;

    let client = client(&server);
    let properties = vec!["dealname".to_string()];

    let deal = client.get_deal("42", Some(&properties)).await.unwrap();
    assert_eq!(deal.id.as_deref(), Some("42"));
    assert_eq!(deal.properties["dealname"], "Big deal");

    let err = client.get_deal("404", None).await.unwrap_err();
    assert!(matches!(err, EtlError::Remote(RemoteError::NotFound(_))));
}

#[tokio::test]
async fn test_schema_endpoints() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/crm/v3/properties/deals")
        .with_status(200)
        .with_body(
            r#"{"results":[{"name":"amount","label":"Amount","type":"number","fieldType":"number","groupName":"dealinformation","calculated":false}]}"#,
        )
        .create_async()
        .await;
    server
        .mock("GET", "/crm/v3/pipelines/deals")
        .with_status(200)
        .with_body(
            r#"{"results":[{"id":"default","label":"Sales Pipeline","displayOrder":0,"archived":false,
                "stages":[{"id":"closedwon","label":"Closed Won","displayOrder":5,"metadata":{"probability":"1.0","isClosed":"true"}}]}]}"#,
        )
        .create_async()
        .await;

    let client = client(&server);

    let properties = client.get_deal_properties().await.unwrap();
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0].name, "amount");
    assert_eq!(properties[0].property_type.as_deref(), Some("number"));
    assert_eq!(properties[0].extra["calculated"], false);

    let pipelines = client.get_pipelines().await.unwrap();
    assert_eq!(pipelines[0].id, "default");
    assert_eq!(pipelines[0].stages[0].id, "closedwon");
    assert_eq!(pipelines[0].stages[0].metadata["isClosed"], "true");
}

#[tokio::test]
async fn test_connection_report_all_green() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", DEALS)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(page_body(&["1"], None))
        .expect(2)
        .create_async()
        .await;
    server
        .mock("GET", "/crm/v3/properties/deals")
        .with_status(200)
        .with_body(r#"{"results":[]}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/crm/v3/pipelines/deals")
        .with_status(200)
        .with_body(r#"{"results":[]}"#)
        .create_async()
        .await;

    let report = client(&server).test_connection().await;

    assert!(report.credentials_valid);
    assert!(report.api_reachable);
    assert!(report.deals_accessible);
    assert!(report.properties_accessible);
    assert!(report.pipelines_accessible);
    assert!(report.error.is_none());
    assert!(report.is_ready());
    let info = report.rate_limit_info.unwrap();
    assert_eq!(info.limit, 1000);
    assert_eq!(info.period_seconds, 1);
}

#[tokio::test]
async fn test_connection_report_stops_at_first_failure() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", DEALS)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(page_body(&[], None))
        .create_async()
        .await;
    server
        .mock("GET", "/crm/v3/properties/deals")
        .with_status(403)
        .with_body(r#"{"message":"missing scopes"}"#)
        .create_async()
        .await;
    let pipelines = server
        .mock("GET", "/crm/v3/pipelines/deals")
        .expect(0)
        .create_async()
        .await;

    let report = client(&server).test_connection().await;

    assert!(report.credentials_valid);
    assert!(report.deals_accessible);
    assert!(!report.properties_accessible);
    assert!(!report.pipelines_accessible);
    assert!(report.error.as_deref().unwrap().contains("Properties"));
    assert!(report.is_ready());
    pipelines.assert_async().await;
}

#[tokio::test]
async fn test_connection_report_bad_token() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", DEALS)
        .match_query(Matcher::Any)
        .with_status(401)
        .create_async()
        .await;

    let report = client(&server).test_connection().await;

    assert!(!report.credentials_valid);
    assert!(!report.deals_accessible);
    assert!(!report.is_ready());
    assert_eq!(report.error.as_deref(), Some("Invalid credentials"));
}

#[tokio::test]
async fn test_extraction_over_http() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", DEALS)
        .match_query(Matcher::Regex(FIRST_PAGE.into()))
        .with_status(200)
        .with_body(page_body(&["1", "2"], Some("c1")))
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", DEALS)
        .match_query(Matcher::Regex(
            "^limit=100&archived=false&after=c1&properties=".into(),
        ))
        .with_status(200)
        .with_body(page_body(&["3"], None))
        .expect(1)
        .create_async()
        .await;

    let extractor = DealExtractor::new(
        Arc::new(client(&server)),
        ScanId::new("scan-http").unwrap(),
    )
    .with_settings(ExtractionSettings::default());

    let mut rows: Vec<TransformedDeal> = Vec::new();
    let summary = extractor.run(None, &mut rows).await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(summary.outcome, ExtractionOutcome::Completed);
    assert_eq!(summary.total_records, 3);

    let ids: Vec<&str> = rows.iter().filter_map(|r| r.deal_id.as_deref()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(rows[0].amount, Some(2500.5));
    assert_eq!(rows[0].deal_stage_probability, Some(0.9));
    assert_eq!(rows[2].page_number, 2);
}

#[tokio::test]
async fn test_transport_failures_exhaust_retries() {
    let mut cfg = config(&unreachable_url());
    cfg.timeout_seconds = 2;
    let client = HubSpotClient::new(&cfg).unwrap();

    let err = client.list_page(100, None, None, false).await.unwrap_err();

    match err {
        EtlError::Remote(RemoteError::RetriesExhausted {
            attempts, status, ..
        }) => {
            assert_eq!(attempts, 3);
            assert_eq!(status, None);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_server_leaves_error_checkpoint_at_cursor() {
    let mut cfg = config(&unreachable_url());
    cfg.timeout_seconds = 2;
    let checkpoints = Arc::new(MemoryCheckpointSink::new());

    let extractor = DealExtractor::new(
        Arc::new(HubSpotClient::new(&cfg).unwrap()),
        ScanId::new("scan-offline").unwrap(),
    )
    .with_checkpoints(CheckpointRecorder::new(checkpoints.clone()));

    let resume = ResumeState {
        cursor: Some(Cursor::new("c7")),
        page_number: 3,
        records_processed: 300,
    };
    let mut rows: Vec<TransformedDeal> = Vec::new();
    let err = extractor.run(Some(resume.clone()), &mut rows).await.unwrap_err();

    assert!(matches!(
        err,
        EtlError::Remote(RemoteError::RetriesExhausted { status: None, .. })
    ));
    assert!(rows.is_empty());

    let failed = checkpoints.latest().unwrap();
    assert_eq!(failed.phase(), CheckpointPhase::Error);
    assert_eq!(failed.cursor, Some(Cursor::new("c7")));
    assert_eq!(failed.page_number, 3);
    assert_eq!(failed.records_processed, 300);
    assert!(matches!(
        &failed.detail,
        CheckpointDetail::Error { error_page: 4, .. }
    ));
    assert_eq!(failed.resume_state(), Some(resume));
}
