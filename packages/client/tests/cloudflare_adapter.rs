//! Cloudflare adapter against a local axum server speaking the v4 envelope

mod common;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, put};
use parking_lot::Mutex;
use serde_json::{Value, json};
use url::Url;

use tlsaflare_client::SyncError;
use tlsaflare_client::config::{ProviderConfig, SyncConfig};
use tlsaflare_client::provider::{CloudflareRepository, RecordRepository, find_existing};
use tlsaflare_client::tlsa::{Action, OwnerName, RecordDescriptor, TlsaPolicy, Usage};

#[derive(Debug, Default)]
struct Captured {
    authorization: Vec<String>,
    bodies: Vec<(String, Value)>,
    deleted: Vec<String>,
}

type Shared = Arc<Mutex<Captured>>;

fn remember_auth(state: &Shared, headers: &HeaderMap) {
    let value = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.lock().authorization.push(value);
}

async fn list_zones(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    remember_auth(&state, &headers);
    let page = query.get("page").map_or("1", String::as_str);
    let result = if page == "1" {
        json!([{"id": "zone-a", "name": "example.org"}])
    } else {
        json!([{"id": "zone-b", "name": "example.com"}])
    };
    Json(json!({
        "success": true,
        "errors": [],
        "messages": [],
        "result": result,
        "result_info": {"page": page.parse::<u32>().unwrap_or(1), "per_page": 1, "total_pages": 2}
    }))
}

async fn list_records(State(state): State<Shared>, headers: HeaderMap, Path(zone_id): Path<String>) -> Json<Value> {
    remember_auth(&state, &headers);
    Json(json!({
        "success": true,
        "errors": [],
        "result": [
            {"id": "rec-1", "zone_id": zone_id, "name": "_25._tcp.mail.example.com", "type": "TLSA", "ttl": 600,
             "data": {"usage": 3, "selector": 1, "matching_type": 1, "certificate": "ab"}},
            {"id": "rec-2", "name": "mail.example.com", "type": "A", "ttl": 1, "content": "192.0.2.10"}
        ],
        "result_info": {"page": 1, "total_pages": 1}
    }))
}

async fn create_record(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(zone_id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    remember_auth(&state, &headers);
    state.lock().bodies.push((format!("POST {zone_id}"), body));
    Json(json!({"success": true, "errors": [], "result": {"id": "rec-new"}}))
}

async fn update_record(
    State(state): State<Shared>,
    Path((zone_id, record_id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if record_id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "errors": [{"code": 81044, "message": "Record does not exist."}], "result": null})),
        );
    }
    state.lock().bodies.push((format!("PUT {zone_id}/{record_id}"), body));
    (StatusCode::OK, Json(json!({"success": true, "errors": [], "result": {"id": record_id}})))
}

async fn delete_record(
    State(state): State<Shared>,
    Path((_zone_id, record_id)): Path<(String, String)>,
) -> (StatusCode, Json<Value>) {
    if record_id == "locked" {
        return (
            StatusCode::OK,
            Json(json!({"success": false, "errors": [{"code": 1000, "message": "Record is locked"}], "result": null})),
        );
    }
    state.lock().deleted.push(record_id.clone());
    (StatusCode::OK, Json(json!({"success": true, "errors": [], "result": {"id": record_id}})))
}

async fn serve() -> (SocketAddr, Shared) {
    let state: Shared = Arc::default();
    let api = Router::new()
        .route("/zones", get(list_zones))
        .route("/zones/:zone_id/dns_records", get(list_records).post(create_record))
        .route(
            "/zones/:zone_id/dns_records/:record_id",
            put(update_record).delete(delete_record),
        )
        .with_state(state.clone());
    let app = Router::new().nest("/client/v4", api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

fn repository(addr: SocketAddr) -> CloudflareRepository {
    let config = ProviderConfig::cloudflare("test-token")
        .with_api_base(Url::parse(&format!("http://{addr}/client/v4")).unwrap());
    CloudflareRepository::new(&config).unwrap()
}

fn descriptor() -> RecordDescriptor {
    let owner = OwnerName::new(25, "tcp", "mail", "example.com").unwrap();
    RecordDescriptor::build(
        &common::fullchain(),
        owner,
        Usage::DaneEe,
        TlsaPolicy::default(),
        Action::Created,
        &SyncConfig::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_list_zones_follows_pagination() {
    let (addr, state) = serve().await;
    let zones = repository(addr).list_zones().await.unwrap();

    let names: Vec<&str> = zones.iter().map(|z| z.name.as_str()).collect();
    assert_eq!(names, ["example.org", "example.com"]);
    let captured = state.lock();
    assert_eq!(captured.authorization.len(), 2);
    assert!(captured.authorization.iter().all(|a| a == "Bearer test-token"));
}

#[tokio::test]
async fn test_list_records_converts_tlsa_data() {
    let (addr, _state) = serve().await;
    let records = repository(addr).list_records("zone-b").await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].zone_id, "zone-b");
    assert_eq!(records[1].zone_id, "zone-b");
    assert!(records[1].tlsa.is_none());

    let existing = find_existing(&records, "_25._tcp.mail.example.com", Usage::DaneEe);
    assert_eq!(existing.len(), 1);
    assert_eq!(existing[0].id, "rec-1");
    assert_eq!(existing[0].ttl, 600);
}

#[tokio::test]
async fn test_create_posts_descriptor() {
    let (addr, state) = serve().await;
    let id = repository(addr).create_record("zone-b", &descriptor()).await.unwrap();
    assert_eq!(id, "rec-new");

    let captured = state.lock();
    let (target, body) = &captured.bodies[0];
    assert_eq!(target, "POST zone-b");
    assert_eq!(body["type"], "TLSA");
    assert_eq!(body["name"], "_25._tcp.mail.example.com");
    assert_eq!(body["data"]["usage"], 3);
    assert_eq!(body["proxied"], false);
    assert_eq!(captured.authorization[0], "Bearer test-token");
}

#[tokio::test]
async fn test_update_puts_descriptor() {
    let (addr, state) = serve().await;
    repository(addr).update_record("zone-b", "rec-1", &descriptor()).await.unwrap();
    assert_eq!(state.lock().bodies[0].0, "PUT zone-b/rec-1");
}

#[tokio::test]
async fn test_update_http_error_carries_status() {
    let (addr, _state) = serve().await;
    let err = repository(addr)
        .update_record("zone-b", "missing", &descriptor())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("Record does not exist."));
}

#[tokio::test]
async fn test_delete_and_unsuccessful_envelope() {
    let (addr, state) = serve().await;
    let repo = repository(addr);

    repo.delete_record("zone-b", "rec-1").await.unwrap();
    assert_eq!(state.lock().deleted, vec!["rec-1".to_string()]);

    let err = repo.delete_record("zone-b", "locked").await.unwrap_err();
    assert!(matches!(err, SyncError::ProviderApi { status: Some(200), .. }));
    assert!(err.to_string().contains("Record is locked"));
}

#[tokio::test]
async fn test_connection_refused_is_provider_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = repository(addr).list_zones().await.unwrap_err();
    assert!(matches!(err, SyncError::ProviderApi { status: None, .. }));
}
