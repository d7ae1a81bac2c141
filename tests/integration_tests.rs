//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: YAML service config → page tokens →
//! fanned-out HTTP requests → merged items

use page_fanout::fanout::BOUNDARY;
use page_fanout::pagination;
use page_fanout::{JsonListService, ListCall, PageTokenRange, RetrievalMode, ServiceConfig};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

// ============================================================================
// Fixtures
// ============================================================================

/// Page of items `0..total` addressed by an offset token
fn page_body(total: u32, query: &HashMap<String, String>) -> Value {
    let start = query
        .get("pageToken")
        .map_or(0, |t| pagination::decode(t).unwrap());
    let size: u32 = query.get("maxResults").map_or(5, |m| m.parse().unwrap());
    let end = (start + size).min(total);
    let items: Vec<u32> = (start..end).collect();

    let mut body = json!({
        "kind": "youtube#playlistItemListResponse",
        "etag": "\"list\"",
        "pageInfo": { "totalResults": total, "resultsPerPage": size },
        "items": items,
    });
    if end < total && start < end {
        body["nextPageToken"] = json!(pagination::encode(i64::from(end)).unwrap());
    }
    body
}

struct Playlist {
    total: u32,
}

impl Respond for Playlist {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let query = request.url.query_pairs().into_owned().collect();
        ResponseTemplate::new(200).set_body_json(page_body(self.total, &query))
    }
}

/// Batch endpoint answering each inner GET with a page of the playlist
struct PlaylistBatch {
    total: u32,
}

impl Respond for PlaylistBatch {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body = String::from_utf8_lossy(&request.body).replace("\r\n", "\n");
        let delimiter = format!("--{BOUNDARY}");

        let mut response = String::new();
        for part in body.split(delimiter.as_str()).skip(1) {
            if part.starts_with("--") {
                break;
            }
            let id = part
                .lines()
                .find_map(|l| l.strip_prefix("Content-ID: <item"))
                .and_then(|l| l.strip_suffix('>'))
                .unwrap();
            let target = part
                .lines()
                .find_map(|l| l.strip_prefix("GET "))
                .and_then(|l| l.strip_suffix(" HTTP/1.1"))
                .unwrap();
            let url = Url::parse(&format!("http://batch.local{target}")).unwrap();
            let query = url.query_pairs().into_owned().collect();

            response.push_str(&format!(
                "--batch_reply\r\nContent-Type: application/http\r\nContent-ID: <response-item{id}>\r\n\r\n\
                 HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nETag: \"page{id}\"\r\n\r\n{}\r\n",
                page_body(self.total, &query)
            ));
        }
        response.push_str("--batch_reply--\r\n");

        ResponseTemplate::new(200).set_body_raw(response, "multipart/mixed; boundary=batch_reply")
    }
}

fn config_yaml(uri: &str, extra: &str) -> String {
    format!(
        r#"
base_url: {uri}
{extra}
endpoints:
  - name: playlistItems
    path: /playlistItems
    params:
      part: snippet
    fields: [playlistId]
"#
    )
}

fn numbers(items: &[Value]) -> Vec<u64> {
    items.iter().map(|v| v.as_u64().unwrap()).collect()
}

// ============================================================================
// End-to-end retrieval
// ============================================================================

#[tokio::test]
async fn test_config_driven_retrieval() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .and(query_param("part", "snippet"))
        .and(query_param("playlistId", "PL1"))
        .and(query_param("key", "secret"))
        .respond_with(Playlist { total: 70 })
        .expect(2)
        .mount(&server)
        .await;

    let yaml = config_yaml(&server.uri(), "auth: { type: api_key, value: secret }");
    let config = ServiceConfig::from_yaml(&yaml).unwrap();
    let mut service = JsonListService::from_config(&config, "playlistItems").unwrap();
    service.template_mut().set_field("playlistId", "PL1").unwrap();

    let retrieved = service
        .fetch(
            PageTokenRange::new(0, 500, 50).unwrap(),
            RetrievalMode::ConcurrentWithDiscovery,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(retrieved.is_complete());
    assert_eq!(numbers(&retrieved.items), (0..70).collect::<Vec<_>>());
    assert_eq!(retrieved.stats.pages_requested, 2);
}

#[tokio::test]
async fn test_every_mode_returns_the_same_items() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .respond_with(Playlist { total: 45 })
        .mount(&server)
        .await;

    let config = ServiceConfig::from_yaml(&config_yaml(&server.uri(), "")).unwrap();
    let service = JsonListService::from_config(&config, "playlistItems").unwrap();
    let range = PageTokenRange::new(5, 40, 10).unwrap();

    let mut results = Vec::new();
    for mode in [
        RetrievalMode::Sequential,
        RetrievalMode::Concurrent,
        RetrievalMode::ConcurrentWithDiscovery,
    ] {
        let retrieved = service
            .fetch(range, mode, &CancellationToken::new())
            .await
            .unwrap();
        results.push(numbers(&retrieved.items));
    }

    assert_eq!(results[0], (5..45).collect::<Vec<_>>());
    assert_eq!(results[0], results[1]);
    assert_eq!(results[1], results[2]);
}

#[tokio::test]
async fn test_unknown_endpoint_is_a_config_error() {
    let config = ServiceConfig::from_yaml(&config_yaml("https://api.example.com", "")).unwrap();
    let err = JsonListService::from_config(&config, "videos").unwrap_err();
    assert!(err.to_string().contains("Unknown endpoint 'videos'"));
}

// ============================================================================
// Server-side batching
// ============================================================================

#[tokio::test]
async fn test_batch_mode_retrieval() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/batch"))
        .and(body_string_contains("Content-ID: <item3>"))
        .respond_with(PlaylistBatch { total: 180 })
        .expect(1)
        .mount(&server)
        .await;

    let extra = format!(
        "batch_url: {}/batch\nauth: {{ type: api_key, value: secret }}",
        server.uri()
    );
    let config = ServiceConfig::from_yaml(&config_yaml(&server.uri(), &extra)).unwrap();
    let service = JsonListService::from_config(&config, "playlistItems").unwrap();

    let retrieved = service
        .fetch_concurrent(
            PageTokenRange::new(0, 200, 50).unwrap(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(retrieved.is_complete());
    assert_eq!(numbers(&retrieved.items), (0..180).collect::<Vec<_>>());
    assert_eq!(retrieved.stats.pages_requested, 4);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("GET /playlistItems?"));
    assert!(body.contains("key=secret"));
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_oauth2_token_refreshed_once_before_fan_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(Playlist { total: 150 })
        .expect(3)
        .mount(&server)
        .await;

    let extra = format!(
        r#"auth:
  type: oauth2_refresh
  token_url: {}/token
  client_id: client
  client_secret: shh
  refresh_token: rt"#,
        server.uri()
    );
    let config = ServiceConfig::from_yaml(&config_yaml(&server.uri(), &extra)).unwrap();
    let service = JsonListService::from_config(&config, "playlistItems").unwrap();

    let retrieved = service
        .fetch_concurrent(
            PageTokenRange::new(0, 150, 50).unwrap(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(retrieved.len(), 150);
}

#[tokio::test]
async fn test_refresh_failure_sends_no_pages() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .respond_with(Playlist { total: 150 })
        .expect(0)
        .mount(&server)
        .await;

    let extra = format!(
        r#"auth:
  type: oauth2_refresh
  token_url: {}/token
  client_id: client
  client_secret: shh
  refresh_token: rt"#,
        server.uri()
    );
    let config = ServiceConfig::from_yaml(&config_yaml(&server.uri(), &extra)).unwrap();
    let service = JsonListService::from_config(&config, "playlistItems").unwrap();

    let err = service
        .fetch_concurrent(
            PageTokenRange::new(0, 150, 50).unwrap(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, page_fanout::Error::TokenRefresh { .. }));
}
