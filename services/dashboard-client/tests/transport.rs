//! HTTP-level transport checks against a local mock server

use dashboard_client::error::EXCERPT_LIMIT;
use dashboard_client::{
    DashboardApi, DashboardClient, HistoryRequest, JobOutcome, JobTracker, MemoryPresenter,
    PollPolicy, TransportError,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> DashboardClient {
    DashboardClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_error_status_carries_code_and_truncated_body() {
    let server = MockServer::start().await;
    let body = format!("Traceback: {}", "x".repeat(1000));
    Mock::given(method("GET"))
        .and(path("/api/bots"))
        .respond_with(ResponseTemplate::new(500).set_body_string(body.clone()))
        .mount(&server)
        .await;

    let err = client(&server).get_json("/api/bots").await.unwrap_err();
    match &err {
        TransportError::Status { status, excerpt } => {
            assert_eq!(*status, 500);
            assert_eq!(excerpt.chars().count(), EXCERPT_LIMIT);
            assert!(body.starts_with(excerpt.as_str()));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().starts_with("HTTP 500: Traceback"));
}

#[tokio::test]
async fn test_error_status_wins_over_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/bots/stop"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"ok": false, "message": "Bot not found"})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .post_json("/api/bots/stop", json!({"symbol": "BTCUSDT"}))
        .await
        .unwrap_err();
    assert_eq!(err.http_status(), Some(400));
    assert!(err.to_string().contains("Bot not found"));
}

#[tokio::test]
async fn test_non_json_content_type_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pairs_status"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>login</html>", "text/html"))
        .mount(&server)
        .await;

    let err = client(&server).get_json("/api/pairs_status").await.unwrap_err();
    match err {
        TransportError::NotJson {
            content_type,
            excerpt,
        } => {
            assert!(content_type.starts_with("text/html"));
            assert_eq!(excerpt, "<html>login</html>");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/news"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{\"data\": [", "application/json"))
        .mount(&server)
        .await;

    let err = client(&server).get_json("/api/news?hours=24").await.unwrap_err();
    assert!(matches!(err, TransportError::Decode(_)));
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let server = MockServer::start().await;
    let body = json!({"symbol": "BTC/USDT", "years": 2, "timeframes": ["1h"]});
    Mock::given(method("POST"))
        .and(path("/api/sync_history"))
        .and(body_json(body.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client(&server).post_json("/api/sync_history", body).await.unwrap();
    assert_eq!(resp["status"], "ok");
}

#[tokio::test]
async fn test_unreachable_backend_is_a_network_error() {
    let client = DashboardClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
    let err = client.get_json("/api/bots").await.unwrap_err();
    assert!(matches!(err, TransportError::Network(_)));
    assert_eq!(err.http_status(), None);
}

#[tokio::test]
async fn test_training_job_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/train"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": 12, "status": "queued"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/training/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"data": {"id": 12, "status": "running", "progress": 0.5, "message": "fitting"}}),
        ))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/training/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"data": {"id": 12, "status": "finished", "progress": 1.0, "message": null}}),
        ))
        .mount(&server)
        .await;

    let presenter = Arc::new(MemoryPresenter::new());
    let policy = PollPolicy {
        interval: Duration::from_millis(20),
        max_attempts: Some(50),
    };
    let mut tracker = JobTracker::with_policy(Arc::new(client(&server)), presenter.clone(), policy);
    let req = HistoryRequest {
        symbol: "BTC/USDT".to_string(),
        years: 1,
        timeframes: vec!["1h".to_string()],
    };

    tracker.launch(&req).await.unwrap();
    assert!(matches!(tracker.wait().await, Some(JobOutcome::Finished(_))));

    let percents: Vec<u8> = presenter.job_renders().iter().map(|(_, p)| p.percent).collect();
    assert_eq!(percents, vec![0, 50, 100]);

    let polls = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/api/training/12")
        .count();
    assert_eq!(polls, 2);
}

#[tokio::test]
async fn test_query_string_reaches_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/trades"))
        .and(query_param("limit", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client(&server).get_json("/api/trades?limit=25").await.unwrap();
    assert_eq!(resp["data"], json!([]));
}
