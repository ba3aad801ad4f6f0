//! End-to-end integration tests for health-e2e
//!
//! These tests verify the complete harness workflow by:
//! 1. Starting an in-process mock of the health service (axum)
//! 2. Writing feature files to a temporary directory
//! 3. Running them through the library runner and the compiled binary

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Path as UrlPath, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;

use health_e2e::testing::StepRegistry;
use health_e2e::{Error, HarnessConfig, Runner, Session};

const TIMESTAMP: &str = "2026-10-19T12:00:00Z";

/// Mock service state
#[derive(Default)]
struct MockState {
    /// Liveness probes to answer with 503 before answering 200
    ping_failures: usize,
    pings: AtomicUsize,
}

async fn ping(State(state): State<Arc<MockState>>) -> Response {
    let seen = state.pings.fetch_add(1, Ordering::SeqCst);
    if seen < state.ping_failures {
        return (StatusCode::SERVICE_UNAVAILABLE, "starting").into_response();
    }
    "pong".into_response()
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "timestamp": TIMESTAMP }))
}

fn database_body(open: u64, in_use: u64, idle: u64) -> Value {
    json!({
        "status": "ok",
        "database": {
            "status": "healthy",
            "message": "Database connection is healthy",
            "stats": {
                "max_open_connections": 25,
                "open_connections": open,
                "in_use": in_use,
                "idle": idle,
                "wait_count": 0,
                "wait_duration": 0,
                "max_idle_closed": 0,
                "max_lifetime_closed": 0
            }
        },
        "timestamp": TIMESTAMP
    })
}

async fn health_database() -> Json<Value> {
    Json(database_body(3, 1, 2))
}

async fn health_database_inconsistent() -> Json<Value> {
    Json(database_body(5, 1, 1))
}

async fn health_database_over_capacity() -> Json<Value> {
    let mut body = database_body(30, 30, 0);
    body["database"]["stats"]["max_open_connections"] = json!(10);
    Json(body)
}

async fn health_database_empty_stats() -> Json<Value> {
    let mut body = database_body(0, 0, 0);
    body["database"]["stats"] = json!({});
    Json(body)
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(std::time::Duration::from_secs(3)).await;
    Json(json!({ "status": "ok" }))
}

/// Connect unary handler: JSON only, one method
async fn connect_health(UrlPath(method): UrlPath<String>, headers: HeaderMap) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !content_type.starts_with("application/json") {
        return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
    }
    if method != "Check" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "code": "unimplemented", "message": format!("no method {}", method) })),
        )
            .into_response();
    }
    Json(json!({ "status": "SERVING_STATUS_SERVING" })).into_response()
}

/// Start the mock service on an ephemeral port
async fn start_service(ping_failures: usize) -> SocketAddr {
    let state = Arc::new(MockState {
        ping_failures,
        ..Default::default()
    });
    let app = Router::new()
        .route("/ping", get(ping))
        .route("/health", get(health))
        .route("/health/database", get(health_database))
        .route("/health/database/inconsistent", get(health_database_inconsistent))
        .route("/health/database/over-capacity", get(health_database_over_capacity))
        .route("/health/database/empty-stats", get(health_database_empty_stats))
        .route("/slow", get(slow))
        .route("/health.v1.HealthService/:method", post(connect_health))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn config_for(port: u16) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = port;
    config.readiness.retry_delay_ms = 20;
    config
}

/// A port nothing listens on
fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn write_feature(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write feature file");
    path
}

async fn runner_for(addr: SocketAddr) -> Runner {
    let (session, _) = Session::connect(config_for(addr.port())).await.unwrap();
    Runner::new(session, StepRegistry::standard().unwrap(), true)
}

const DATABASE_FEATURE: &str = r#"Feature: REST database health
  Background:
    Given the server is running on port 8080

  Scenario: Database health reports a healthy pool
    When I make a GET request to "/health/database"
    Then the HTTP response status should be 200
    And the JSON response should contain status "ok"
    And the JSON response should contain database information
    And the JSON response should contain connection statistics
    And the JSON response should contain a timestamp field
    And the database connection pool should be healthy
    And the connection statistics should be valid
    And the connection statistics should include max_open_connections
    And the connection statistics should include current usage metrics
    And the database status should be "healthy"
    And the content type should be "application/json"

  Scenario: Database health under concurrent load
    When I make 10 concurrent requests to "/health/database"
    Then all database health requests should succeed
    And all responses should contain valid connection statistics
    And all responses should contain status "ok"
"#;

const CONNECT_FEATURE: &str = r#"Feature: Connect health service
  Background:
    Given the server is running

  Scenario: Check over Connect
    When I make a health check request using Connect-Go client
    Then the response should indicate SERVING status
    And the response should not be empty
    And the response should contain proper Connect-Go headers

  Scenario: Check over HTTP/JSON
    When I make a health check request using HTTP/JSON
    Then the HTTP status should be 200
    And the JSON response should contain SERVING_STATUS_SERVING
    And the response should contain field "status" with value "SERVING_STATUS_SERVING"

  Scenario: Invalid content type is rejected
    When I make a health check request with invalid content type
    Then the server should reject the request
    And the HTTP response status should be 415

  Scenario: Unknown method fails
    When I make a request to a non-existent endpoint
    Then the request should fail
    And the response status should not be 200

  Scenario: Concurrent checks
    When I make 10 concurrent health check requests
    Then all requests should succeed
    And all responses should indicate SERVING status
"#;

const MONITORING_FEATURE: &str = r#"Feature: Monitoring
  Scenario: Health endpoint is cheap to poll
    Given the server is running
    When I make a GET request to "/health"
    Then the HTTP response status should be 200
    And the response should be lightweight for monitoring
    And the response should contain status "ok"
"#;

#[tokio::test]
async fn test_database_feature_passes() {
    let addr = start_service(0).await;
    let dir = TempDir::new().unwrap();
    let path = write_feature(&dir, "database.feature", DATABASE_FEATURE);

    let report = runner_for(addr).await.run_file(&path).await.unwrap();
    for scenario in &report.scenarios {
        assert!(scenario.passed, "{} failed: {:?}", scenario.name, scenario.error);
    }
    assert_eq!(report.scenarios.len(), 2);
}

#[tokio::test]
async fn test_connect_feature_passes() {
    let addr = start_service(0).await;
    let dir = TempDir::new().unwrap();
    let path = write_feature(&dir, "connect.feature", CONNECT_FEATURE);

    let report = runner_for(addr).await.run_file(&path).await.unwrap();
    for scenario in &report.scenarios {
        assert!(scenario.passed, "{} failed: {:?}", scenario.name, scenario.error);
    }
    assert_eq!(report.scenarios.len(), 5);
}

#[tokio::test]
async fn test_directory_run_covers_every_feature() {
    let addr = start_service(0).await;
    let dir = TempDir::new().unwrap();
    write_feature(&dir, "a_database.feature", DATABASE_FEATURE);
    write_feature(&dir, "b_connect.feature", CONNECT_FEATURE);
    write_feature(&dir, "c_monitoring.feature", MONITORING_FEATURE);

    let summary = runner_for(addr)
        .await
        .run_paths(&[dir.path().to_path_buf()])
        .await
        .unwrap();
    assert_eq!(summary.features.len(), 3);
    assert_eq!(summary.total(), 8);
    assert!(summary.success());
}

#[tokio::test]
async fn test_inconsistent_statistics_fail_the_scenario() {
    let addr = start_service(0).await;
    let dir = TempDir::new().unwrap();
    let path = write_feature(
        &dir,
        "inconsistent.feature",
        r#"Feature: Inconsistent pool
  Scenario: Open connections do not add up
    Given the server is running
    When I make a GET request to "/health/database/inconsistent"
    Then the HTTP response status should be 200
    And the connection statistics should be valid
    And the database status should be "healthy"
"#,
    );

    let report = runner_for(addr).await.run_file(&path).await.unwrap();
    let scenario = &report.scenarios[0];
    assert!(!scenario.passed);
    // Stops at the first failing step
    assert_eq!(scenario.steps_run, 4);
    assert_eq!(scenario.steps_total, 5);
    assert!(scenario.error.as_deref().unwrap().contains("should equal in_use"));
}

#[tokio::test]
async fn test_empty_statistics_block_fails_shape_step() {
    let addr = start_service(0).await;
    let dir = TempDir::new().unwrap();
    let path = write_feature(
        &dir,
        "empty_stats.feature",
        r#"Feature: Empty stats
  Scenario: Stats block has no counters
    When I make a GET request to "/health/database/empty-stats"
    Then the JSON response should contain database information
    And the JSON response should contain connection statistics
"#,
    );

    let report = runner_for(addr).await.run_file(&path).await.unwrap();
    let scenario = &report.scenarios[0];
    assert!(!scenario.passed);
    assert_eq!(scenario.steps_run, 3);
    assert!(scenario
        .error
        .as_deref()
        .unwrap()
        .contains("Stats does not contain 'max_open_connections' field"));
}

#[tokio::test]
async fn test_over_capacity_batch_fails_statistics_step() {
    let addr = start_service(0).await;
    let dir = TempDir::new().unwrap();
    let path = write_feature(
        &dir,
        "over_capacity.feature",
        r#"Feature: Over capacity
  Scenario: Consistent counters beyond the pool limit
    When I make 3 concurrent requests to "/health/database/over-capacity"
    Then all database health requests should succeed
    And all responses should contain valid connection statistics
"#,
    );

    let report = runner_for(addr).await.run_file(&path).await.unwrap();
    let scenario = &report.scenarios[0];
    assert!(!scenario.passed);
    let error = scenario.error.as_deref().unwrap();
    assert!(error.contains("3 of 3 concurrent requests failed"), "{}", error);
    assert!(error.contains("should not exceed max open connections"), "{}", error);
}

#[tokio::test]
async fn test_batch_failure_reports_aggregate() {
    let addr = start_service(0).await;
    let dir = TempDir::new().unwrap();
    let path = write_feature(
        &dir,
        "batch.feature",
        r#"Feature: Batch
  Scenario: Every entry is inconsistent
    Given the server is running
    When I make 4 concurrent GET requests to "/health/database/inconsistent"
    Then all database health requests should succeed
    And all responses should contain valid connection statistics
"#,
    );

    let report = runner_for(addr).await.run_file(&path).await.unwrap();
    let scenario = &report.scenarios[0];
    assert!(!scenario.passed);
    let error = scenario.error.as_deref().unwrap();
    assert!(error.contains("4 of 4 concurrent requests failed"), "{}", error);
}

#[tokio::test]
async fn test_batch_timeouts_only_fill_their_slots() {
    let addr = start_service(0).await;
    let mut config = config_for(addr.port());
    config.requests.concurrent_timeout_secs = 1;
    let (session, _) = Session::connect(config).await.unwrap();
    let runner = Runner::new(session, StepRegistry::standard().unwrap(), false);

    let feature = health_e2e::testing::parse_feature(
        r#"Feature: Slow
  Scenario: Every request times out
    When I make 3 concurrent requests to "/slow"
    Then all requests should succeed
"#,
        "slow.feature",
    )
    .unwrap();

    let started = std::time::Instant::now();
    let report = runner.run_feature(&feature).await;
    // Slots time out in parallel, not one after another
    assert!(started.elapsed() < std::time::Duration::from_millis(2500));

    let error = report.scenarios[0].error.as_deref().unwrap();
    assert!(error.contains("3 of 3 concurrent requests failed"), "{}", error);
    assert!(error.contains("timeout"), "{}", error);
}

#[tokio::test]
async fn test_scenarios_do_not_share_context() {
    let addr = start_service(0).await;
    let dir = TempDir::new().unwrap();
    let path = write_feature(
        &dir,
        "isolation.feature",
        r#"Feature: Isolation
  Scenario: First records a response
    When I make a GET request to "/ping"
    Then the HTTP response status should be 200

  Scenario: Second has nothing to check
    Then the HTTP response status should be 200
"#,
    );

    let report = runner_for(addr).await.run_file(&path).await.unwrap();
    assert!(report.scenarios[0].passed);
    assert!(!report.scenarios[1].passed);
    assert!(report.scenarios[1]
        .error
        .as_deref()
        .unwrap()
        .contains("Missing precedent"));
}

#[tokio::test]
async fn test_transport_error_fails_status_check() {
    // No readiness gate: requests go to a port nothing listens on
    let mut config = config_for(unused_port());
    config.requests.timeout_secs = 1;
    let dead = Arc::new(Session::new(config).unwrap());

    let feature = health_e2e::testing::parse_feature(
        r#"Feature: Down
  Scenario: Request cannot connect
    When I make a GET request to "/ping"
    Then the HTTP response status should be 200
"#,
        "down.feature",
    )
    .unwrap();
    let runner = Runner::new(dead, StepRegistry::standard().unwrap(), false);
    let report = runner.run_feature(&feature).await;
    let scenario = &report.scenarios[0];
    assert!(!scenario.passed);
    assert!(scenario
        .error
        .as_deref()
        .unwrap()
        .contains("No response received"));
}

#[tokio::test]
async fn test_readiness_retries_until_service_answers() {
    let addr = start_service(2).await;
    let (_, report) = Session::connect(config_for(addr.port())).await.unwrap();
    assert_eq!(report.attempts, 3);
    assert!(report.url.ends_with("/ping"));
}

#[tokio::test]
async fn test_readiness_gives_up_on_dead_service() {
    let port = unused_port();
    let mut config = config_for(port);
    config.readiness.max_attempts = 2;

    let err = Session::connect(config).await.unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, Error::ServerNotReady { attempts: 2, .. }));
    assert!(err.to_string().contains(&port.to_string()));
}

fn health_e2e_binary() -> &'static Path {
    Path::new(env!("CARGO_BIN_EXE_health-e2e"))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_binary_exit_codes() {
    let addr = start_service(0).await;
    let dir = TempDir::new().unwrap();
    let passing = write_feature(&dir, "monitoring.feature", MONITORING_FEATURE);
    let failing = write_feature(
        &dir,
        "failing.feature",
        r#"Feature: Failing
  Scenario: Wrong status
    Given the server is running
    When I make a GET request to "/ping"
    Then the HTTP response status should be 418
"#,
    );

    let run = |path: PathBuf| {
        tokio::process::Command::new(health_e2e_binary())
            .arg("run")
            .arg(path)
            .args(["--host", "127.0.0.1", "--port", &addr.port().to_string()])
            .output()
    };

    let output = run(passing).await.expect("Failed to run health-e2e");
    assert!(
        output.status.success(),
        "stdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    let output = run(failing).await.expect("Failed to run health-e2e");
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Expected status code 418, got 200"), "{}", stdout);
}

#[tokio::test]
async fn test_binary_ping_against_dead_service() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        "[readiness]\nmax_attempts = 2\nretry_delay_ms = 10\n",
    )
    .unwrap();

    let port = unused_port();
    let output = tokio::process::Command::new(health_e2e_binary())
        .arg("ping")
        .arg("--config")
        .arg(&config_path)
        .args(["--host", "127.0.0.1", "--port", &port.to_string()])
        .output()
        .await
        .expect("Failed to run health-e2e");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"), "{}", stderr);
    assert!(stderr.contains(&port.to_string()), "{}", stderr);
}

#[test]
fn test_binary_lists_steps() {
    let output = std::process::Command::new(health_e2e_binary())
        .arg("steps")
        .output()
        .expect("Failed to run health-e2e");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("I make {int} concurrent requests to {string}"));
    assert!(stdout.contains("the response should be lightweight for monitoring"));
}
