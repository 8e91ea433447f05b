use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use ledgersim_ledger::{service::LedgerServiceConfig, LedgerService, MemoryStore};
use ledgersim_node::api::rest::{router, AppState};

fn app() -> Router {
    let service = LedgerService::open(Arc::new(MemoryStore::new()), LedgerServiceConfig::default()).unwrap();
    router(AppState::new(Arc::new(service)))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_join_vote_append_over_http() {
    let app = app();

    let (status, joined) = call(&app, Method::POST, "/peers", Some(json!({ "identity": "A" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["created"], true);
    assert_eq!(joined["blocks"][0]["data"], "Genesis Block");

    call(&app, Method::POST, "/peers", Some(json!({ "identity": "B" }))).await;

    let (status, vote) = call(&app, Method::POST, "/confirm", Some(json!({ "identity": "B", "index": 0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(vote["outcome"], "unchanged");

    let (status, receipt) =
        call(&app, Method::POST, "/blocks", Some(json!({ "identity": "A", "data": "hello" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["block"]["index"], 1);
    assert_eq!(receipt["block"]["addedBy"], "A");
    assert_eq!(receipt["skipped"], json!([]));

    let (_, peers) = call(&app, Method::GET, "/blocks", None).await;
    assert_eq!(peers.as_array().unwrap().len(), 2);
    assert_eq!(peers[1]["blocks"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_error_bodies_and_statuses() {
    let app = app();
    call(&app, Method::POST, "/peers", Some(json!({ "identity": "A" }))).await;
    call(&app, Method::POST, "/peers", Some(json!({ "identity": "B" }))).await;

    let (status, body) = call(&app, Method::POST, "/blocks", Some(json!({ "identity": "A", "data": " " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidInput");

    let (status, body) = call(&app, Method::GET, "/peers/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "UnknownPeer");

    call(&app, Method::POST, "/blocks", Some(json!({ "identity": "A", "data": "one" }))).await;
    let (status, body) = call(&app, Method::POST, "/blocks", Some(json!({ "identity": "A", "data": "two" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ConsensusNotReached");
    assert!(body["message"].as_str().unwrap().contains("0/2"));

    call(&app, Method::POST, "/confirm", Some(json!({ "identity": "A", "index": 1 }))).await;
    let (status, body) = call(&app, Method::POST, "/reject", Some(json!({ "identity": "A", "index": 1 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "VerdictConflict");

    let (status, body) = call(&app, Method::POST, "/tamper", Some(json!({ "identity": "A", "index": 9 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "UnknownBlock");
}

#[tokio::test]
async fn test_tamper_verify_and_reset() {
    let app = app();
    call(&app, Method::POST, "/peers", Some(json!({ "identity": "A" }))).await;
    call(&app, Method::POST, "/peers", Some(json!({ "identity": "B" }))).await;

    let (_, flagged) = call(&app, Method::POST, "/tamper", Some(json!({ "identity": "B", "index": 0 }))).await;
    assert_eq!(flagged["flagged"], 1);

    let (_, receipt) = call(&app, Method::POST, "/blocks", Some(json!({ "identity": "A", "data": "x" }))).await;
    assert_eq!(receipt["skipped"], json!(["B"]));

    let (status, body) = call(&app, Method::POST, "/blocks", Some(json!({ "identity": "B", "data": "y" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ChainCompromised");

    let (_, reports) = call(&app, Method::GET, "/verify?identity=B", None).await;
    assert_eq!(reports[0]["server_asserted"], false);
    assert_eq!(reports[0]["locally_verified"], true);

    let (status, _) = call(&app, Method::POST, "/reset", Some(json!({ "identity": "B" }))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, peer) = call(&app, Method::GET, "/peers/B", None).await;
    assert_eq!(peer["blocks"].as_array().unwrap().len(), 2);

    let (status, _) = call(&app, Method::POST, "/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, peers) = call(&app, Method::GET, "/blocks", None).await;
    assert!(peers.as_array().unwrap().iter().all(|p| p["blocks"].as_array().unwrap().len() == 1));
}

#[tokio::test]
async fn test_edit_then_rehash_is_caught_by_verify() {
    let app = app();
    call(&app, Method::POST, "/peers", Some(json!({ "identity": "A" }))).await;
    call(&app, Method::POST, "/blocks", Some(json!({ "identity": "A", "data": "one" }))).await;
    call(&app, Method::POST, "/confirm", Some(json!({ "identity": "A", "index": 1 }))).await;
    call(&app, Method::POST, "/blocks", Some(json!({ "identity": "A", "data": "two" }))).await;

    let (status, _) =
        call(&app, Method::POST, "/edit", Some(json!({ "identity": "A", "index": 1, "data": "forged" }))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, reports) = call(&app, Method::GET, "/verify", None).await;
    assert_eq!(reports[0]["first_mismatch"], 1);

    let (_, rehashed) = call(&app, Method::POST, "/rehash", Some(json!({ "identity": "A", "index": 1 }))).await;
    assert_eq!(rehashed["hash"].as_str().unwrap().len(), 64);

    let (_, reports) = call(&app, Method::GET, "/verify", None).await;
    assert_eq!(reports[0]["first_mismatch"], 2);
}

#[tokio::test]
async fn test_consensus_and_leave() {
    let app = app();
    for id in ["A", "B", "C"] {
        call(&app, Method::POST, "/peers", Some(json!({ "identity": id }))).await;
    }
    call(&app, Method::POST, "/blocks", Some(json!({ "identity": "A", "data": "one" }))).await;
    call(&app, Method::POST, "/confirm", Some(json!({ "identity": "A", "index": 1 }))).await;
    call(&app, Method::POST, "/confirm", Some(json!({ "identity": "B", "index": 1 }))).await;

    let (_, consensus) = call(&app, Method::GET, "/consensus/1", None).await;
    assert_eq!(consensus["confirmed"], 2);
    assert_eq!(consensus["total"], 3);
    assert_eq!(consensus["threshold"], 67);
    assert_eq!(consensus["reached"], false);

    call(&app, Method::DELETE, "/peers/C", None).await;
    let (_, consensus) = call(&app, Method::GET, "/consensus/1", None).await;
    assert_eq!(consensus["reached"], true);

    let (status, _) = call(&app, Method::DELETE, "/peers/ghost", None).await;
    assert_eq!(status, StatusCode::OK);
}
