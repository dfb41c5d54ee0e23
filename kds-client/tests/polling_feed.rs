//! Polling feed against an in-process HTTP endpoint

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, patch},
};
use kds_client::{
    ChangeType, ClientConfig, FeedEvent, FeedQuery, FeedSnapshot, LiveFeed, PollingFeed,
    Subscription,
};
use parking_lot::Mutex;
use serde_json::{Map, Value, json};
use std::collections::HashMap;

#[derive(Clone, Default)]
struct Endpoint {
    documents: Arc<Mutex<Vec<Value>>>,
    patches: Arc<Mutex<Vec<(String, Value, Option<String>)>>>,
    failing: Arc<AtomicBool>,
}

async fn list(
    State(endpoint): State<Endpoint>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Value>>, StatusCode> {
    if endpoint.failing.load(Ordering::SeqCst) {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    assert_eq!(params.get("orderBy").map(String::as_str), Some("createdAt"));
    Ok(Json(endpoint.documents.lock().clone()))
}

async fn update(
    State(endpoint): State<Endpoint>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    endpoint.patches.lock().push((id.clone(), body, auth));

    let documents = endpoint.documents.lock();
    match documents.iter().position(|d| d["orderId"] == id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

async fn start_endpoint(endpoint: Endpoint) -> String {
    let app = Router::new()
        .route("/orders", get(list))
        .route("/orders/{id}", patch(update))
        .with_state(endpoint);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn config(base_url: &str) -> ClientConfig {
    ClientConfig::new(base_url)
        .with_token("kitchen-token")
        .with_poll_interval(Duration::from_millis(20))
        .with_max_reconnect_delay(Duration::from_millis(80))
        .with_timeout(Duration::from_secs(2))
}

async fn next_event(sub: &mut Subscription) -> FeedEvent {
    tokio::time::timeout(Duration::from_secs(5), sub.recv())
        .await
        .expect("timed out waiting for feed event")
        .expect("subscription closed")
}

async fn next_snapshot(sub: &mut Subscription) -> FeedSnapshot {
    match next_event(sub).await {
        FeedEvent::Snapshot(snapshot) => snapshot,
        other => panic!("expected snapshot, got {:?}", other),
    }
}

fn order(id: &str, number: u32, created_at: i64) -> Value {
    json!({
        "orderId": id,
        "orderNumber": number,
        "status": "paid",
        "orderMode": "takeout",
        "createdAt": created_at,
        "items": []
    })
}

#[tokio::test]
async fn test_snapshots_follow_endpoint_changes() {
    let endpoint = Endpoint::default();
    endpoint.documents.lock().extend([
        order("b", 2, 2_000),
        order("a", 1, 1_000),
        order("too-old", 0, 10),
        json!({"orderNumber": 99}),
    ]);
    let base_url = start_endpoint(endpoint.clone()).await;

    let feed = PollingFeed::new(&config(&base_url)).unwrap();
    let mut sub = feed.subscribe(FeedQuery::new("orders", 500));

    // First delivery: backlog, ordered, filtered, malformed record skipped
    let snapshot = next_snapshot(&mut sub).await;
    let ids: Vec<_> = snapshot.records.iter().map(|r| r.order_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert!(snapshot.changes.iter().all(|c| c.change_type == ChangeType::Added));

    // A status change upstream arrives as a modified delta
    endpoint.documents.lock()[1]["kitchenStatus"] = json!("preparing");
    let snapshot = next_snapshot(&mut sub).await;
    assert_eq!(snapshot.changes.len(), 1);
    assert_eq!(snapshot.changes[0].change_type, ChangeType::Modified);
    assert_eq!(snapshot.changes[0].record.order_id, "a");
}

#[tokio::test]
async fn test_error_then_recovery() {
    let endpoint = Endpoint::default();
    endpoint.documents.lock().push(order("a", 1, 1_000));
    let base_url = start_endpoint(endpoint.clone()).await;

    let feed = PollingFeed::new(&config(&base_url)).unwrap();
    let mut sub = feed.subscribe(FeedQuery::new("orders", 0));
    let _ = next_snapshot(&mut sub).await;

    endpoint.failing.store(true, Ordering::SeqCst);
    assert!(matches!(next_event(&mut sub).await, FeedEvent::Error(_)));

    // Let a few more polls fail; only one error is reported per streak
    tokio::time::sleep(Duration::from_millis(150)).await;
    endpoint.failing.store(false, Ordering::SeqCst);

    let snapshot = next_snapshot(&mut sub).await;
    assert_eq!(snapshot.records.len(), 1);
    assert!(snapshot.changes.is_empty());
}

#[tokio::test]
async fn test_update_patches_single_field() {
    let endpoint = Endpoint::default();
    endpoint.documents.lock().push(order("a", 1, 1_000));
    let base_url = start_endpoint(endpoint.clone()).await;

    let feed = PollingFeed::new(&config(&base_url)).unwrap();
    let mut fields = Map::new();
    fields.insert("kitchenStatus".to_string(), json!("ready"));
    feed.update("a", fields).await.unwrap();

    let patches = endpoint.patches.lock().clone();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].0, "a");
    assert_eq!(patches[0].1, json!({"kitchenStatus": "ready"}));
    assert_eq!(patches[0].2.as_deref(), Some("Bearer kitchen-token"));

    let mut fields = Map::new();
    fields.insert("kitchenStatus".to_string(), json!("ready"));
    let err = feed.update("ghost", fields).await.unwrap_err();
    assert!(matches!(err, kds_client::ClientError::NotFound(_)));
}

#[tokio::test]
async fn test_unsubscribe_stops_polling() {
    let endpoint = Endpoint::default();
    let base_url = start_endpoint(endpoint.clone()).await;

    let feed = PollingFeed::new(&config(&base_url)).unwrap();
    let mut sub = feed.subscribe(FeedQuery::new("orders", 0));
    let snapshot = next_snapshot(&mut sub).await;
    assert!(snapshot.records.is_empty());

    sub.unsubscribe();
    // Nothing left to observe except that the runtime does not panic
    tokio::time::sleep(Duration::from_millis(60)).await;
}

#[tokio::test]
async fn test_update_keeps_opaque_ids_in_one_segment() {
    let endpoint = Endpoint::default();
    endpoint
        .documents
        .lock()
        .extend([order("a#b", 1, 1_000), order("x?y", 2, 2_000), order("p/q", 3, 3_000)]);
    let base_url = start_endpoint(endpoint.clone()).await;

    let feed = PollingFeed::new(&config(&base_url)).unwrap();
    for id in ["a#b", "x?y", "p/q"] {
        let mut fields = Map::new();
        fields.insert("kitchenStatus".to_string(), json!("preparing"));
        feed.update(id, fields).await.unwrap();
    }

    let ids: Vec<String> = endpoint
        .patches
        .lock()
        .iter()
        .map(|(id, _, _)| id.clone())
        .collect();
    assert_eq!(ids, vec!["a#b", "x?y", "p/q"]);
}

#[tokio::test]
async fn test_fetch_keeps_records_with_null_fields() {
    let endpoint = Endpoint::default();
    let mut null_mode = order("null-mode", 1, 1_000);
    null_mode["orderMode"] = Value::Null;
    let mut null_items = order("null-items", 2, 2_000);
    null_items["items"] = Value::Null;
    let mut null_number = order("null-number", 3, 3_000);
    null_number["orderNumber"] = Value::Null;
    endpoint
        .documents
        .lock()
        .extend([null_mode, null_items, null_number, order("ok", 4, 4_000)]);
    let base_url = start_endpoint(endpoint.clone()).await;

    let feed = PollingFeed::new(&config(&base_url)).unwrap();
    let records = feed.fetch(&FeedQuery::new("orders", 0)).await.unwrap();

    let ids: Vec<_> = records.iter().map(|r| r.order_id.as_str()).collect();
    assert_eq!(ids, vec!["null-mode", "null-items", "null-number", "ok"]);
    assert_eq!(records[0].order_mode, "");
    assert!(records[1].items.is_empty());
    assert_eq!(records[2].order_number, 0);
}
