//! End-to-end client tests against a mock HTTP server

use super::{extract_single, BlockingDipClient, DipClient};
use crate::config::ClientConfig;
use crate::error::Error;
use crate::request::QueryParams;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::builder()
        .base_url(server.uri())
        .api_key("test-key")
        .base_delay(Duration::from_millis(1))
        .no_rate_limit()
        .no_cache()
        .build()
}

fn config_with_cache(server: &MockServer, dir: &TempDir) -> ClientConfig {
    ClientConfig::builder()
        .base_url(server.uri())
        .api_key("test-key")
        .base_delay(Duration::from_millis(1))
        .no_rate_limit()
        .cache_dir(dir.path())
        .cache_ttl(Duration::from_secs(3600))
        .build()
}

fn page(ids: &[u32], cursor: &str) -> serde_json::Value {
    let documents: Vec<_> = ids.iter().map(|id| json!({ "id": id.to_string() })).collect();
    json!({ "documents": documents, "cursor": cursor })
}

#[tokio::test]
async fn test_fetch_follows_cursors_across_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/person"))
        .and(query_param_is_missing("cursor"))
        .and(query_param("apikey", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[1, 2], "c1")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/person"))
        .and(query_param("cursor", "c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[3, 4], "")))
        .mount(&server)
        .await;

    let client = DipClient::new(config(&server)).unwrap();
    let records = client.fetch("person", 10, &QueryParams::new()).await.unwrap();

    assert_eq!(records.len(), 4);
    assert_eq!(records[0]["id"], json!("1"));
    assert_eq!(records[3]["id"], json!("4"));
}

#[tokio::test]
async fn test_fetch_truncates_to_requested_count() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vorgang"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[1, 2, 3, 4, 5], "")))
        .mount(&server)
        .await;

    let client = DipClient::new(config(&server)).unwrap();
    let records = client.fetch("vorgang", 3, &QueryParams::new()).await.unwrap();
    assert_eq!(records.len(), 3);
}

#[tokio::test]
async fn test_fetch_passes_filters_through() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drucksache"))
        .and(query_param("f.wahlperiode", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[1], "")))
        .expect(1)
        .mount(&server)
        .await;

    let client = DipClient::new(config(&server)).unwrap();
    let filters = QueryParams::new().push("f.wahlperiode", 20);
    let records = client.fetch("drucksache", 10, &filters).await.unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_fetch_fails_when_nothing_was_collected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/person"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = DipClient::new(config(&server)).unwrap();
    let err = client
        .fetch("person", 10, &QueryParams::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_fetch_returns_partial_records_on_mid_sequence_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/person"))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[1, 2], "c1")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/person"))
        .and(query_param("cursor", "c1"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let client = DipClient::new(config(&server)).unwrap();
    let records = client.fetch("person", 10, &QueryParams::new()).await.unwrap();
    assert_eq!(records.len(), 2, "partial progress is kept");
}

#[tokio::test]
async fn test_second_fetch_is_served_from_cache() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/person"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[1], "")))
        .expect(1)
        .mount(&server)
        .await;

    let client = DipClient::new(config_with_cache(&server, &dir)).unwrap();
    let first = client.fetch("person", 5, &QueryParams::new()).await.unwrap();
    let second = client.fetch("person", 5, &QueryParams::new()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_clear_cache_forces_a_fresh_request() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/person"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[1], "")))
        .expect(2)
        .mount(&server)
        .await;

    let client = DipClient::new(config_with_cache(&server, &dir)).unwrap();
    client.fetch("person", 5, &QueryParams::new()).await.unwrap();
    client.clear_cache();
    client.fetch("person", 5, &QueryParams::new()).await.unwrap();
}

#[tokio::test]
async fn test_concurrent_fetches_share_one_client() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/person"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[1, 2], "")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vorgang"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[3], "")))
        .mount(&server)
        .await;

    let client = DipClient::new(config(&server)).unwrap();
    let empty = QueryParams::new();
    let (people, proceedings) = futures::join!(
        client.fetch("person", 10, &empty),
        client.fetch("vorgang", 10, &empty),
    );
    assert_eq!(people.unwrap().len(), 2);
    assert_eq!(proceedings.unwrap().len(), 1);
}

#[tokio::test]
async fn test_fetch_one_returns_the_document() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/person/11000001/"))
        .and(query_param("apikey", "test-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "11000001", "titel": "Dr." })),
        )
        .mount(&server)
        .await;

    let client = DipClient::new(config(&server)).unwrap();
    let doc = client.fetch_one("person", 11000001).await.unwrap().unwrap();
    assert_eq!(doc["id"], json!("11000001"));
}

#[tokio::test]
async fn test_fetch_one_with_empty_documents_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/person/999/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "documents": [] })))
        .mount(&server)
        .await;

    let client = DipClient::new(config(&server)).unwrap();
    assert!(client.fetch_one("person", 999).await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_api_key_fails_construction() {
    let config = ClientConfig::builder().no_cache().build();
    if std::env::var(crate::config::API_KEY_ENV).is_err() {
        assert!(matches!(
            DipClient::new(config).unwrap_err(),
            Error::MissingApiKey
        ));
    }
}

#[tokio::test]
async fn test_blocking_client_fetches_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/person"))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[1], "c1")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/person"))
        .and(query_param("cursor", "c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[2], "")))
        .mount(&server)
        .await;

    let cfg = config(&server);
    let records = tokio::task::spawn_blocking(move || {
        let client = BlockingDipClient::new(cfg)?;
        client.fetch("person", 10, &QueryParams::new())
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_blocking_fetch_one() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vorgang/42/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "documents": [{ "id": "42" }] })),
        )
        .mount(&server)
        .await;

    let cfg = config(&server);
    let doc = tokio::task::spawn_blocking(move || {
        let client = BlockingDipClient::new(cfg)?;
        client.fetch_one("vorgang", 42)
    })
    .await
    .unwrap()
    .unwrap()
    .unwrap();

    assert_eq!(doc["id"], json!("42"));
}

#[test]
fn test_extract_single_shapes() {
    assert!(extract_single(serde_json::Value::Null).is_none());
    assert!(extract_single(json!({ "documents": [] })).is_none());
    assert_eq!(
        extract_single(json!({ "documents": [{ "id": "1" }, { "id": "2" }] })),
        Some(json!({ "id": "1" }))
    );
    assert_eq!(
        extract_single(json!({ "id": "7" })),
        Some(json!({ "id": "7" }))
    );
}
