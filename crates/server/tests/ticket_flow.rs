use std::io::Write;
use std::net::TcpListener;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::{NamedTempFile, TempDir};
use tokio::time::sleep;

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a config with database path
fn config_with_db(port: u16, db_path: &str) -> String {
    format!(
        r#"
[server]
host = "127.0.0.1"
port = {}

[database]
path = "{}"

[dispatch]
counters = 3
"#,
        port, db_path
    )
}

/// Spawn the server and return a handle
async fn spawn_server(config_path: &std::path::Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_guichet"))
        .env("GUICHET_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

/// Helper to start a server for testing
async fn start_test_server() -> (u16, tokio::process::Child, TempDir, NamedTempFile) {
    let port = get_available_port();
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let config_content = config_with_db(port, db_path.to_str().unwrap());

    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let server = spawn_server(temp_file.path()).await;

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    // Give a moment for initialization
    sleep(Duration::from_millis(100)).await;

    (port, server, temp_dir, temp_file)
}

async fn issue_ticket(client: &Client, port: u16, class: &str) -> Value {
    let response = client
        .post(format!("http://127.0.0.1:{}/api/v1/tickets", port))
        .json(&json!({ "class": class }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse JSON")
}

async fn call_next(client: &Client, port: u16, counter: u32) -> Value {
    let response = client
        .post(format!("http://127.0.0.1:{}/api/v1/calls", port))
        .json(&json!({ "counter": counter }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);
    response.json().await.expect("Failed to parse JSON")
}

#[tokio::test]
async fn test_issue_ticket() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();
    let json = issue_ticket(&client, port, "SP").await;

    assert!(json["id"].is_i64());
    assert_eq!(json["class"], "SP");
    assert_eq!(json["status"], "queued");
    assert!(json["code"].as_str().unwrap().ends_with("SP001"));
    assert!(json["called_at"].is_null());
    assert!(json["counter"].is_null());

    server.kill().await.ok();
}

#[tokio::test]
async fn test_issue_invalid_class_rejected() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();
    let response = client
        .post(format!("http://127.0.0.1:{}/api/v1/tickets", port))
        .json(&json!({ "class": "XX" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_full_ticket_lifecycle() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();
    let ticket = issue_ticket(&client, port, "SG").await;
    let id = ticket["id"].as_i64().unwrap();

    let call = call_next(&client, port, 2).await;
    assert_eq!(call["ticket"]["id"], id);
    assert_eq!(call["ticket"]["status"], "called");
    assert_eq!(call["ticket"]["counter"], 2);

    // First finish performs the transition, the second reports false.
    let response = client
        .post(format!(
            "http://127.0.0.1:{}/api/v1/tickets/{}/finish",
            port, id
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["finished"], true);

    let response = client
        .post(format!(
            "http://127.0.0.1:{}/api/v1/tickets/{}/finish",
            port, id
        ))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["finished"], false);

    let response = client
        .get(format!("http://127.0.0.1:{}/api/v1/tickets/{}", port, id))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "served");
    assert!(body["served_at"].is_string());

    server.kill().await.ok();
}

#[tokio::test]
async fn test_rotation_across_classes() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();
    issue_ticket(&client, port, "SP").await;
    issue_ticket(&client, port, "SP").await;
    issue_ticket(&client, port, "SG").await;
    issue_ticket(&client, port, "SE").await;

    let order: Vec<String> = {
        let mut codes = Vec::new();
        for _ in 0..4 {
            let call = call_next(&client, port, 1).await;
            codes.push(call["ticket"]["code"].as_str().unwrap().to_string());
        }
        codes
    };

    assert!(order[0].ends_with("SP001"));
    assert!(order[1].ends_with("SE001"));
    assert!(order[2].ends_with("SP002"));
    assert!(order[3].ends_with("SG001"));

    // Queues drained, next call returns null.
    let call = call_next(&client, port, 1).await;
    assert!(call["ticket"].is_null());

    server.kill().await.ok();
}

#[tokio::test]
async fn test_call_with_invalid_counter() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();
    for counter in [0u32, 4] {
        let response = client
            .post(format!("http://127.0.0.1:{}/api/v1/calls", port))
            .json(&json!({ "counter": counter }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400, "counter {} accepted", counter);
    }

    server.kill().await.ok();
}

#[tokio::test]
async fn test_finish_unknown_ticket_is_404() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();
    let response = client
        .post(format!(
            "http://127.0.0.1:{}/api/v1/tickets/9999/finish",
            port
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_discard_ticket() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();
    let ticket = issue_ticket(&client, port, "SE").await;
    let id = ticket["id"].as_i64().unwrap();

    let response = client
        .post(format!(
            "http://127.0.0.1:{}/api/v1/tickets/{}/discard",
            port, id
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["discarded"], true);

    // Discarded tickets are out of the queue.
    let call = call_next(&client, port, 1).await;
    assert!(call["ticket"].is_null());

    server.kill().await.ok();
}

#[tokio::test]
async fn test_recent_calls() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();
    issue_ticket(&client, port, "SP").await;
    issue_ticket(&client, port, "SG").await;
    call_next(&client, port, 1).await;
    call_next(&client, port, 2).await;

    let response = client
        .get(format!("http://127.0.0.1:{}/api/v1/calls/recent", port))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();

    let calls = body["calls"].as_array().unwrap();
    assert_eq!(calls.len(), 2);
    // Most recent first.
    assert_eq!(calls[0]["counter"], 2);
    assert_eq!(calls[1]["counter"], 1);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_queue_status() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();
    issue_ticket(&client, port, "SP").await;
    issue_ticket(&client, port, "SP").await;
    issue_ticket(&client, port, "SG").await;

    let response = client
        .get(format!("http://127.0.0.1:{}/api/v1/queue", port))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["sp"], 2);
    assert_eq!(body["se"], 0);
    assert_eq!(body["sg"], 1);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_daily_report() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();
    issue_ticket(&client, port, "SP").await;
    issue_ticket(&client, port, "SE").await;
    call_next(&client, port, 1).await;

    let response = client
        .get(format!("http://127.0.0.1:{}/api/v1/reports/daily", port))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();

    assert_eq!(body["issued"]["total"], 2);
    assert_eq!(body["issued"]["by_class"]["sp"], 1);
    assert_eq!(body["issued"]["by_class"]["se"], 1);
    assert_eq!(body["called"]["total"], 1);
    assert_eq!(body["details"].as_array().unwrap().len(), 2);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_daily_report_invalid_date() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();
    let response = client
        .get(format!(
            "http://127.0.0.1:{}/api/v1/reports/daily?date=30-08-2026",
            port
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_monthly_report_invalid_month() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();
    let response = client
        .get(format!(
            "http://127.0.0.1:{}/api/v1/reports/monthly?month=13",
            port
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_health_config_and_metrics() {
    let (port, mut server, _temp_dir, _config) = start_test_server().await;

    let client = Client::new();

    let response = client
        .get(format!("http://127.0.0.1:{}/api/v1/health", port))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let response = client
        .get(format!("http://127.0.0.1:{}/api/v1/config", port))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["dispatch"]["counters"], 3);

    issue_ticket(&client, port, "SP").await;
    let response = client
        .get(format!("http://127.0.0.1:{}/metrics", port))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let text = response.text().await.unwrap();
    assert!(text.contains("guichet_tickets_issued_total"));
    assert!(text.contains("guichet_queue_depth"));
    assert!(text.contains("guichet_http_requests_total"));

    server.kill().await.ok();
}

#[tokio::test]
async fn test_sequence_survives_restart() {
    let port = get_available_port();
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let config_content = config_with_db(port, db_path.to_str().unwrap());

    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let client = Client::new();

    let mut server = spawn_server(temp_file.path()).await;
    assert!(wait_for_server(port, 40).await);
    let first = issue_ticket(&client, port, "SP").await;
    assert!(first["code"].as_str().unwrap().ends_with("SP001"));
    server.kill().await.ok();
    sleep(Duration::from_millis(200)).await;

    let mut server = spawn_server(temp_file.path()).await;
    assert!(wait_for_server(port, 40).await);
    let second = issue_ticket(&client, port, "SP").await;
    assert!(second["code"].as_str().unwrap().ends_with("SP002"));
    server.kill().await.ok();
}
