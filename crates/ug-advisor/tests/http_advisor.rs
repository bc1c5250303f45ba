//! ---
//! ug_section: "05-networking-external-interfaces"
//! ug_subsection: "tests"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Chat-completion client tests against a local endpoint."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use ug_advisor::{
    advise_or_fallback, AdvisorError, AdvisoryContext, AdvisoryService, ChatTurn, HttpAdvisor,
    FALLBACK_RESPONSE, IDLE_RESPONSE,
};
use ug_common::AdvisorConfig;
use ug_sim::City;

#[derive(Debug, Default)]
struct Captured {
    body: Option<Value>,
    authorization: Option<String>,
}

type Shared = Arc<Mutex<Captured>>;

async fn answer(
    State(captured): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut guard = captured.lock().await;
    guard.body = Some(body);
    guard.authorization = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    Json(json!({
        "choices": [{ "message": { "role": "assistant", "content": "Inspect Kathipara Flyover first." } }]
    }))
}

async fn empty() -> Json<Value> {
    Json(json!({ "choices": [] }))
}

async fn unavailable() -> (StatusCode, &'static str) {
    (StatusCode::SERVICE_UNAVAILABLE, "rate limited")
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(500)).await;
    Json(json!({ "choices": [] }))
}

async fn spawn_server() -> (SocketAddr, Shared) {
    let captured: Shared = Arc::new(Mutex::new(Captured::default()));
    let router = Router::new()
        .route("/answer", post(answer))
        .route("/empty", post(empty))
        .route("/unavailable", post(unavailable))
        .route("/slow", post(slow))
        .with_state(captured.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (addr, captured)
}

fn context() -> AdvisoryContext {
    AdvisoryContext {
        city: City::Chennai,
        asset_count: 38,
        overall_health: 86,
        critical_node_names: vec!["Kathipara Flyover".into(), "Kilpauk Pumping Station".into()],
    }
}

fn config(key_env: &str) -> AdvisorConfig {
    AdvisorConfig {
        api_key_env: key_env.to_owned(),
        timeout: Duration::from_millis(200),
        ..AdvisorConfig::default()
    }
}

#[tokio::test]
async fn completion_text_is_returned_and_request_is_well_formed() {
    std::env::set_var("UG_ADVISOR_TEST_KEY", "test-token");
    let (addr, captured) = spawn_server().await;
    let advisor = HttpAdvisor::new(format!("http://{addr}/answer"), &config("UG_ADVISOR_TEST_KEY")).unwrap();

    let history = vec![ChatTurn::user("hello"), ChatTurn::assistant("hi")];
    let answer = advisor
        .advise(&context(), "What needs attention?", &history)
        .await
        .unwrap();
    assert_eq!(answer, "Inspect Kathipara Flyover first.");

    let captured = captured.lock().await;
    let body = captured.body.as_ref().unwrap();
    assert_eq!(body["model"], "llama-3.3-70b-versatile");
    assert_eq!(body["max_tokens"], 1024);
    assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    assert_eq!(body["messages"][0]["role"], "system");
    let prompt = body["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains("Kathipara Flyover, Kilpauk Pumping Station"));
    assert!(prompt.contains("USER: hello"));
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "What needs attention?");
    assert_eq!(captured.authorization.as_deref(), Some("Bearer test-token"));
}

#[tokio::test]
async fn empty_completion_yields_idle_message() {
    let (addr, _) = spawn_server().await;
    let advisor = HttpAdvisor::new(format!("http://{addr}/empty"), &config("UG_ADVISOR_UNSET_KEY")).unwrap();
    let answer = advisor.advise(&context(), "status", &[]).await.unwrap();
    assert_eq!(answer, IDLE_RESPONSE);
}

#[tokio::test]
async fn http_error_surfaces_status_and_degrades() {
    let (addr, _) = spawn_server().await;
    let advisor =
        HttpAdvisor::new(format!("http://{addr}/unavailable"), &config("UG_ADVISOR_UNSET_KEY")).unwrap();
    let err = advisor.advise(&context(), "status", &[]).await.unwrap_err();
    assert!(matches!(err, AdvisorError::Status { status: 503, ref body } if body == "rate limited"));

    let reply = advise_or_fallback(&advisor, &context(), "status", &[]).await;
    assert!(reply.degraded);
    assert_eq!(reply.content, FALLBACK_RESPONSE);
}

#[tokio::test]
async fn timeout_degrades_to_fallback() {
    let (addr, _) = spawn_server().await;
    let advisor = HttpAdvisor::new(format!("http://{addr}/slow"), &config("UG_ADVISOR_UNSET_KEY")).unwrap();
    let reply = advise_or_fallback(&advisor, &context(), "status", &[]).await;
    assert!(reply.degraded);
    assert_eq!(reply.content, FALLBACK_RESPONSE);
}

#[tokio::test]
async fn unreachable_endpoint_degrades_to_fallback() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let advisor = HttpAdvisor::new(format!("http://{addr}/answer"), &config("UG_ADVISOR_UNSET_KEY")).unwrap();
    let reply = advise_or_fallback(&advisor, &context(), "status", &[]).await;
    assert!(reply.degraded);
}

#[test]
fn context_is_built_from_the_seeded_fleet() {
    let service = ug_core::SimulationService::new(
        ug_sim::FleetSeeder::default().seed().unwrap(),
        Box::new(ug_sim::ScriptedRandom::quiet()),
        ug_core::ServiceSettings::default(),
    )
    .unwrap();
    let snapshot = service.snapshot();

    let chennai = AdvisoryContext::for_city(&snapshot, City::Chennai);
    assert_eq!(chennai.asset_count, 38);
    assert_eq!(chennai.critical_node_names.len(), 6);
    assert_eq!(chennai.overall_health, service.city_health(City::Chennai));

    let coimbatore = AdvisoryContext::for_city(&snapshot, City::Coimbatore);
    assert_eq!(coimbatore.asset_count, 20);
    assert_eq!(coimbatore.critical_node_names[0], "Gandhipuram Flyover");
}
