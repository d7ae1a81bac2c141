//! Tests for the HTTP client module

use super::*;
use crate::auth::AuthConfig;
use crate::error::Error;
use reqwest::Method;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpClient {
    let config = HttpClientConfig::builder().base_url(server.uri()).build();
    HttpClient::with_config(config).unwrap()
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert!(config.base_url.is_none());
    assert!(config.rate_limit.is_none());
    assert!(config.user_agent.starts_with("page-fanout/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .base_url("https://api.example.com")
        .timeout(Duration::from_secs(60))
        .rate_limit(RateLimiterConfig::new(5, 5))
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.base_url, Some("https://api.example.com".to_string()));
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.rate_limit, Some(RateLimiterConfig::new(5, 5)));
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");

    let client = HttpClient::with_config(config).unwrap();
    assert!(client.has_rate_limiter());
}

#[test]
fn test_build_url() {
    let config = HttpClientConfig::builder()
        .base_url("https://api.example.com/v3/")
        .build();
    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(
        client.build_url("/videos"),
        "https://api.example.com/v3/videos"
    );
    assert_eq!(
        client.build_url("videos"),
        "https://api.example.com/v3/videos"
    );
    assert_eq!(
        client.build_url("https://other.example.com/x"),
        "https://other.example.com/x"
    );
}

#[test]
fn test_request_config_builder() {
    let config = RequestConfig::new()
        .query("part", "snippet")
        .header("X-Request-Id", "1")
        .raw_body("text/plain", "hello")
        .timeout(Duration::from_secs(5));

    assert_eq!(config.query.get("part"), Some(&"snippet".to_string()));
    assert_eq!(config.headers.get("X-Request-Id"), Some(&"1".to_string()));
    assert_eq!(
        config.body,
        Some(RequestBody::Raw {
            content_type: "text/plain".into(),
            data: "hello".into()
        })
    );
    assert_eq!(config.timeout, Some(Duration::from_secs(5)));
}

#[test]
fn test_response_meta_headers_case_insensitive() {
    let meta = ResponseMeta::new(200, [("ETag", "\"abc\""), ("Content-Type", "application/json")]);
    assert!(meta.is_success());
    assert_eq!(meta.etag(), Some("\"abc\""));
    assert_eq!(meta.header("content-type"), Some("application/json"));
    assert_eq!(meta.header("CONTENT-TYPE"), Some("application/json"));
    assert!(!ResponseMeta::new(404, Vec::<(String, String)>::new()).is_success());
}

#[tokio::test]
async fn test_send_returns_status_headers_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("part", "snippet"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "\"v1\"")
                .set_body_string(r#"{"items":[]}"#),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .send(
            Method::GET,
            "/videos",
            RequestConfig::new().query("part", "snippet"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.meta.etag(), Some("\"v1\""));
    assert_eq!(response.body, r#"{"items":[]}"#);
}

#[tokio::test]
async fn test_send_does_not_retry_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .send(
            Method::GET,
            "/flaky",
            RequestConfig::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), 503);
    assert!(!response.is_success());
}

#[tokio::test]
async fn test_send_headers_and_raw_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/batch"))
        .and(header("X-Default", "d"))
        .and(header("X-Request-Id", "req-456"))
        .and(header("content-type", "multipart/mixed; boundary=b"))
        .and(body_string("--b--"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .header("X-Default", "d")
        .build();
    let client = HttpClient::with_config(config).unwrap();
    let response = client
        .send(
            Method::POST,
            "/batch",
            RequestConfig::new()
                .header("X-Request-Id", "req-456")
                .raw_body("multipart/mixed; boundary=b", "--b--"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_send_applies_api_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("key", "secret"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let config = HttpClientConfig::builder().base_url(server.uri()).build();
    let client = HttpClient::with_auth(config, AuthConfig::api_key("secret")).unwrap();
    assert!(client.credential().is_some());

    let response = client
        .send(
            Method::GET,
            "/videos",
            RequestConfig::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_send_cancelled() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = client
        .send(Method::GET, "/slow", RequestConfig::new(), &cancel)
        .await;
    assert!(matches!(result, Err(Error::Cancelled)));
}
