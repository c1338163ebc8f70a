//! Wire-level tests: real listeners, rule-set push through the admin API,
//! requests through the gateway listener.

use junction_gateway::admin::AdminServer;
use junction_gateway::config::ConnectionPoolConfig;
use junction_gateway::engine::{Engine, GatewayServer};
use junction_gateway::proxy::create_http_client;
use junction_gateway::rules::RuleStore;
use junction_gateway::trace::{MemorySink, TraceRecorder};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

struct Harness {
    gateway_addr: SocketAddr,
    admin_addr: SocketAddr,
    shutdown: broadcast::Sender<()>,
}

async fn start() -> Harness {
    let store = Arc::new(RuleStore::new());
    let traces = Arc::new(MemorySink::new(100));
    let recorder = TraceRecorder::new().with_sink(traces.clone());
    let client = create_http_client(&ConnectionPoolConfig::default());
    let engine = Arc::new(Engine::new(
        Arc::clone(&store),
        recorder,
        client,
        Duration::from_secs(5),
    ));

    let gateway = GatewayServer::bind("127.0.0.1:0".parse().unwrap(), engine)
        .await
        .unwrap();
    let gateway_addr = gateway.local_addr().unwrap();

    let admin = AdminServer::bind("127.0.0.1:0".parse().unwrap(), store, traces)
        .await
        .unwrap();
    let admin_addr = admin.local_addr().unwrap();

    let (shutdown, _) = broadcast::channel(1);
    tokio::spawn(gateway.run(shutdown.subscribe()));
    tokio::spawn(admin.run(shutdown.subscribe()));

    Harness {
        gateway_addr,
        admin_addr,
        shutdown,
    }
}

#[tokio::test]
async fn rules_pushed_over_the_admin_api_take_effect() {
    let harness = start().await;
    let client = reqwest::Client::new();

    // Before any rules: everything is a 404.
    let response = client
        .get(format!("http://{}/ping", harness.gateway_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    // Push a snapshot with one mock route.
    let rule_set = json!({
        "mappings": [],
        "incomingRoutes": [{
            "id": "in-1",
            "name": "ping",
            "path": "/ping",
            "method": "GET",
            "responseMode": "mock",
            "mockStatus": 200,
            "mockBody": "{\"pong\":true}"
        }],
        "outgoingRoutes": []
    });
    let response = client
        .put(format!("http://{}/rules", harness.admin_addr))
        .json(&rule_set)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let counts: Value = response.json().await.unwrap();
    assert_eq!(counts["incomingRoutes"], json!(1));

    // The new snapshot is live for the next request.
    let response = client
        .get(format!("http://{}/ping", harness.gateway_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"pong": true}));

    // The active snapshot reads back.
    let response = client
        .get(format!("http://{}/rules", harness.admin_addr))
        .send()
        .await
        .unwrap();
    let rules: Value = response.json().await.unwrap();
    assert_eq!(rules["incomingRoutes"][0]["id"], json!("in-1"));

    let _ = harness.shutdown.send(());
}

#[tokio::test]
async fn traces_are_served_and_cleared_by_the_admin_api() {
    let harness = start().await;
    let client = reqwest::Client::new();

    // Two unmatched requests leave two trace records.
    for path in ["/a", "/b"] {
        client
            .get(format!("http://{}{path}", harness.gateway_addr))
            .send()
            .await
            .unwrap();
    }

    let response = client
        .get(format!("http://{}/traces?limit=10", harness.admin_addr))
        .send()
        .await
        .unwrap();
    let traces: Value = response.json().await.unwrap();
    let records = traces.as_array().unwrap();
    assert_eq!(records.len(), 2);
    // Newest first.
    assert_eq!(records[0]["request"]["url"], json!("/b"));
    assert_eq!(records[0]["response"]["status"], json!(404));
    assert!(records[0]["error"].is_string());

    let response = client
        .delete(format!("http://{}/traces", harness.admin_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("http://{}/traces", harness.admin_addr))
        .send()
        .await
        .unwrap();
    let traces: Value = response.json().await.unwrap();
    assert!(traces.as_array().unwrap().is_empty());

    let _ = harness.shutdown.send(());
}

#[tokio::test]
async fn health_endpoint_responds() {
    let harness = start().await;
    let response = reqwest::get(format!("http://{}/health", harness.admin_addr))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": "ok"}));
    let _ = harness.shutdown.send(());
}
