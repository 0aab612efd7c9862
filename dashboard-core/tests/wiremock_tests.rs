//! Integration tests for the dispatcher using wiremock
//!
//! These run the real reqwest transport against a mock HTTP server to check
//! request paths, authentication headers, body decoding and error messages.

use dashboard_core::{
    Config, Credentials, DashboardError, Dispatcher, HttpTransport, Query, QueryKind, ResultView,
    render,
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{basic_auth, header, method, path},
};

fn credentials() -> Credentials {
    Credentials::new("user", "s3cret")
}

/// Dispatcher pointed at the mock server's `/api/v1` root
fn create_test_dispatcher(mock_server: &MockServer) -> Dispatcher<HttpTransport> {
    let config = Config {
        base_url: format!("{}/api/v1", mock_server.uri()),
        timeout_secs: 5,
        ..Config::default()
    };
    #[allow(clippy::expect_used)]
    Dispatcher::from_config(&config)
        .expect("Failed to create dispatcher")
}

// ============================================================================
// Success scenarios
// ============================================================================

#[tokio::test]
async fn current_sends_basic_auth_and_json_content_type() {
    let mock_server = MockServer::start().await;
    let body = json!({ "locationName": "London", "tempC": 7.25 });

    Mock::given(method("GET"))
        .and(path("/api/v1/weather/current/London"))
        .and(basic_auth("user", "s3cret"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dispatcher = create_test_dispatcher(&mock_server);
    let data = dispatcher
        .dispatch(&Query::current("London").unwrap(), &credentials())
        .await
        .expect("current weather should succeed");

    let ResultView::Current(card) = render(&data, QueryKind::Current, None) else {
        panic!("expected current card")
    };
    assert_eq!(card.location, "London");
    assert_eq!(card.temperature, "7.3°C");
}

#[tokio::test]
async fn forecast_path_carries_encoded_location_and_days() {
    let mock_server = MockServer::start().await;
    let body = json!({
        "locationName": "New York",
        "forecastDays": [
            { "date": "2025-01-20", "day": { "avgTempC": 26.0 }, "hour": [
                { "time": "2025-01-20 00:00", "tempC": 24.0 },
                { "time": "2025-01-20 01:00", "tempC": 27.0 }
            ]},
            { "date": "2025-01-21", "day": { "avgTempC": 22.0 } },
            { "date": "2025-01-22", "day": { "avgTempC": 20.0 } }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/api/v1/weather/forecast/New%20York/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dispatcher = create_test_dispatcher(&mock_server);
    let data = dispatcher
        .dispatch_raw(QueryKind::Forecast, "New York", "3", &credentials())
        .await
        .expect("forecast should succeed");

    let ResultView::Series(series) = render(&data, QueryKind::Forecast, None) else {
        panic!("expected series view")
    };
    assert_eq!(series.tiles.len(), 3);
    assert_eq!(series.status, "Forecast window (3 days)");
    assert!(series.tiles[0].sparkline.is_some());
}

#[tokio::test]
async fn history_path_carries_date() {
    let mock_server = MockServer::start().await;
    let body = json!({ "forecastDays": [] });

    Mock::given(method("GET"))
        .and(path("/api/v1/weather/history/Paris/2025-01-20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dispatcher = create_test_dispatcher(&mock_server);
    let query = Query::history("Paris", "2025-01-20").unwrap();
    let data = dispatcher
        .dispatch(&query, &credentials())
        .await
        .expect("history should succeed");

    assert_eq!(data, body);
}

#[tokio::test]
async fn text_response_is_kept_opaque() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/weather/current/London"))
        .respond_with(ResponseTemplate::new(200).set_body_string("all clear"))
        .mount(&mock_server)
        .await;

    let dispatcher = create_test_dispatcher(&mock_server);
    let data = dispatcher
        .dispatch(&Query::current("London").unwrap(), &credentials())
        .await
        .unwrap();

    assert_eq!(data, json!("all clear"));
}

// ============================================================================
// Error handling scenarios
// ============================================================================

#[tokio::test]
async fn missing_password_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dispatcher = create_test_dispatcher(&mock_server);
    let no_password = Credentials::new("user", "");
    let result = dispatcher
        .dispatch(&Query::current("London").unwrap(), &no_password)
        .await;

    assert!(
        matches!(result, Err(DashboardError::AuthenticationMissing)),
        "Expected AuthenticationMissing, got: {result:?}"
    );
}

#[tokio::test]
async fn json_error_message_is_surfaced() {
    let mock_server = MockServer::start().await;
    let body = json!({ "message": "Location not found" });

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(body))
        .mount(&mock_server)
        .await;

    let dispatcher = create_test_dispatcher(&mock_server);
    let err = dispatcher
        .dispatch(&Query::current("Atlantis").unwrap(), &credentials())
        .await
        .unwrap_err();

    assert!(matches!(err, DashboardError::Remote(_)));
    assert_eq!(err.to_string(), "Location not found");
}

#[tokio::test]
async fn error_field_used_when_message_absent() {
    let mock_server = MockServer::start().await;
    let body = json!({ "error": "Unauthorized" });

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(body))
        .mount(&mock_server)
        .await;

    let dispatcher = create_test_dispatcher(&mock_server);
    let err = dispatcher
        .dispatch(&Query::current("London").unwrap(), &credentials())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Unauthorized");
}

#[tokio::test]
async fn plain_text_failure_uses_body() {
    let mock_server = MockServer::start().await;
    let body = "Internal Server Error";

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string(body))
        .mount(&mock_server)
        .await;

    let dispatcher = create_test_dispatcher(&mock_server);
    let err = dispatcher
        .dispatch(&Query::current("London").unwrap(), &credentials())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Internal Server Error");
}

#[tokio::test]
async fn empty_failure_falls_back_to_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let dispatcher = create_test_dispatcher(&mock_server);
    let err = dispatcher
        .dispatch(&Query::current("London").unwrap(), &credentials())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Request failed with status 503");
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let config = Config {
        base_url: "http://127.0.0.1:1/api/v1".to_string(),
        timeout_secs: 2,
        ..Config::default()
    };
    let dispatcher = Dispatcher::from_config(&config).unwrap();

    let result = dispatcher
        .dispatch(&Query::current("London").unwrap(), &credentials())
        .await;
    assert!(
        matches!(result, Err(DashboardError::Transport(_))),
        "Expected Transport, got: {result:?}"
    );
}
