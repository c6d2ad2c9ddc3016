use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use route_mesh::adapters::outbound::{init_noop_logger, GroqOptimizer, InMemoryAgentStore};
use route_mesh::application::CoordinationService;
use route_mesh::common::OptimizerError;
use route_mesh::config::CoordinationConfig;
use route_mesh::domains::agent::{Coordinate, RouteUpdate};
use route_mesh::domains::optimizer::RouteOptimizer;
use route_mesh::domains::registry::{AgentStore, ConnectionId};
use route_mesh::domains::simulation::GridMap;

/// Authorization header and JSON body of the last request to `/ok`.
type Captured = Arc<Mutex<Option<(String, Value)>>>;

async fn ok_completion(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    *captured.lock().unwrap() = Some((auth, body));

    let content = "```json\n{\"routes\": [{\"agent_id\": \"car-1\", \"waypoints\": [{\"lat\": 0.0, \"lon\": 0.0}, {\"lat\": 0.5, \"lon\": 0.5}]}]}\n```";
    Json(json!({"choices": [{"message": {"role": "assistant", "content": content}}]}))
}

async fn spawn_stub() -> (SocketAddr, Captured) {
    let captured: Captured = Arc::new(Mutex::new(None));
    let app = Router::new()
        .route("/ok/chat/completions", post(ok_completion))
        .route(
            "/down/chat/completions",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "over capacity") }),
        )
        .route(
            "/empty/chat/completions",
            post(|| async { Json(json!({"choices": []})) }),
        )
        .route(
            "/null/chat/completions",
            post(|| async { Json(json!({"choices": [{"message": {"content": null}}]})) }),
        )
        .with_state(captured.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, captured)
}

fn optimizer_at(addr: SocketAddr, prefix: &str) -> GroqOptimizer {
    GroqOptimizer::new("test-key", "test-model")
        .unwrap()
        .with_base_url(format!("http://{}/{}/", addr, prefix))
        .with_sampling(0.5, 256)
}

fn sample_routes() -> Vec<RouteUpdate> {
    vec![RouteUpdate {
        agent_id: "car-1".to_string(),
        waypoints: vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)],
    }]
}

#[tokio::test]
async fn test_request_shape_and_reply() {
    let (addr, captured) = spawn_stub().await;

    let routes = optimizer_at(addr, "ok").optimise(&sample_routes()).await.unwrap();

    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].agent_id, "car-1");
    assert_eq!(routes[0].waypoints[1], Coordinate::new(0.5, 0.5));

    let (auth, body) = captured.lock().unwrap().clone().unwrap();
    assert_eq!(auth, "Bearer test-key");
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["temperature"], 0.5);
    assert_eq!(body["max_tokens"], 256);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
    assert!(body["messages"][1]["content"].as_str().unwrap().contains("car-1"));
}

#[tokio::test]
async fn test_error_status_is_api_error() {
    let (addr, _) = spawn_stub().await;

    let err = optimizer_at(addr, "down").optimise(&sample_routes()).await.unwrap_err();

    match err {
        OptimizerError::Api { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "over capacity");
        }
        other => panic!("expected an API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_content_is_empty_reply() {
    let (addr, _) = spawn_stub().await;

    for prefix in ["empty", "null"] {
        let err = optimizer_at(addr, prefix).optimise(&sample_routes()).await.unwrap_err();
        assert!(matches!(err, OptimizerError::EmptyReply), "{}: {:?}", prefix, err);
    }
}

#[tokio::test]
async fn test_unavailable_api_keeps_routes() {
    let (addr, _) = spawn_stub().await;
    let service = CoordinationService::new(
        Arc::new(InMemoryAgentStore::new()),
        Arc::new(optimizer_at(addr, "down")),
        init_noop_logger(),
        CoordinationConfig::default(),
        GridMap::default(),
    );
    let (tx, _rx) = mpsc::unbounded_channel();
    let first = r#"{"id": "car-1", "location": {"lat": 0, "lon": 0}, "destination": {"lat": 1, "lon": 1}, "route": {"id": "r", "waypoints": [{"lat": 0, "lon": 0}, {"lat": 1, "lon": 1}]}}"#;
    service.connect(ConnectionId::new(), first, tx).await.unwrap();

    let summary = service.optimise().await;

    assert_eq!(summary.agents, vec!["car-1".to_string()]);
    let route = service.store().get("car-1").await.unwrap().route.unwrap();
    assert_eq!(route.waypoints, sample_routes()[0].waypoints);
}
