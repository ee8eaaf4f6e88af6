//! `HttpRemote` against an in-process axum stub of the remote store.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde_json::json;
use stash_engine::{
    http::{ErrorBody, HealthResponse, RecordsBody, SearchHistoryBody},
    EngineConfig, Error, HttpRemote, LocalStore, MemoryStore, Record, RecordCollection,
    RemoteConfig, RemoteSyncClient, RetryConfig, SyncEngine, SyncEvent, TombstoneTracker,
};
use std::sync::{Arc, Mutex};

const TOKEN: &str = "test-token";

#[derive(Default)]
struct Stub {
    records: Mutex<RecordCollection>,
    history: Mutex<Vec<String>>,
}

type StubState = Arc<Stub>;

fn unauthorized() -> Response {
    let body = ErrorBody {
        error: "Unauthorized".into(),
        details: None,
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {TOKEN}"))
        .unwrap_or(false)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: "test".into(),
    })
}

async fn get_records(State(stub): State<StubState>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let records = stub.records.lock().unwrap().clone();
    Json(RecordsBody { records }).into_response()
}

async fn put_records(
    State(stub): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<RecordsBody>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    *stub.records.lock().unwrap() = body.records;
    StatusCode::NO_CONTENT.into_response()
}

async fn delete_record(
    State(stub): State<StubState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    match stub.records.lock().unwrap().remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => {
            let body = ErrorBody {
                error: "Not found".into(),
                details: Some(id),
            };
            (StatusCode::NOT_FOUND, Json(body)).into_response()
        }
    }
}

async fn get_history(State(stub): State<StubState>) -> Json<SearchHistoryBody> {
    let entries = stub.history.lock().unwrap().clone();
    Json(SearchHistoryBody { entries })
}

async fn put_history(
    State(stub): State<StubState>,
    Json(body): Json<SearchHistoryBody>,
) -> StatusCode {
    *stub.history.lock().unwrap() = body.entries;
    StatusCode::NO_CONTENT
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn spawn_stub() -> (String, StubState) {
    let stub = StubState::default();
    let router = Router::new()
        .route("/health", get(health))
        .route("/v1/records", get(get_records).put(put_records))
        .route("/v1/records/{id}", delete(delete_record))
        .route("/v1/search-history", get(get_history).put(put_history))
        .with_state(stub.clone());
    (serve(router).await, stub)
}

fn client(base_url: &str) -> HttpRemote {
    HttpRemote::new(RemoteConfig::new(base_url).with_auth_token(TOKEN)).unwrap()
}

#[tokio::test]
async fn health_check() {
    let (url, _stub) = spawn_stub().await;
    assert!(client(&url).check_availability().await);
}

#[tokio::test]
async fn push_fetch_and_delete() {
    let (url, stub) = spawn_stub().await;
    let remote = client(&url);

    let records: RecordCollection = vec![
        Record::new("a", json!({ "name": "Acme" })),
        Record::new("b/1", json!({ "name": "Slash" })),
    ]
    .into();
    remote.push_all(records.clone()).await.unwrap();
    assert_eq!(*stub.records.lock().unwrap(), records);
    assert_eq!(remote.fetch_all().await.unwrap(), records);

    remote.delete_by_id("b/1").await.unwrap();
    assert_eq!(stub.records.lock().unwrap().len(), 1);

    // Deleting what is already gone succeeds
    remote.delete_by_id("b/1").await.unwrap();
}

#[tokio::test]
async fn search_history_roundtrip() {
    let (url, stub) = spawn_stub().await;
    let remote = client(&url);

    remote
        .push_search_history(vec!["acme".into(), "globex".into()])
        .await
        .unwrap();
    assert_eq!(*stub.history.lock().unwrap(), ["acme", "globex"]);
    assert_eq!(
        remote.fetch_search_history().await.unwrap(),
        ["acme", "globex"]
    );
}

#[tokio::test]
async fn missing_token_is_a_fatal_remote_error() {
    let (url, _stub) = spawn_stub().await;
    let remote = HttpRemote::new(RemoteConfig::new(&url)).unwrap();

    let err = remote.fetch_all().await.unwrap_err();
    assert!(err.is_user_visible());
    assert!(!err.is_retryable());
    assert!(err.to_string().contains("Unauthorized"));
}

#[tokio::test]
async fn server_errors_are_retryable() {
    let router = Router::new().route(
        "/v1/records",
        get(|| async {
            let body = ErrorBody {
                error: "Database error".into(),
                details: None,
            };
            (StatusCode::SERVICE_UNAVAILABLE, Json(body))
        }),
    );
    let url = serve(router).await;

    let err = client(&url).fetch_all().await.unwrap_err();
    assert!(err.is_retryable());
    assert!(err.to_string().contains("Database error"));
}

#[tokio::test]
async fn unreachable_server_is_unavailable() {
    // Bind and drop to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let remote = client(&format!("http://{addr}"));
    assert!(!remote.check_availability().await);
    assert_eq!(remote.fetch_all().await, Err(Error::RemoteUnavailable));
}

#[tokio::test]
async fn engine_syncs_through_http() {
    let (url, stub) = spawn_stub().await;
    *stub.records.lock().unwrap() = vec![Record::new("server", json!(1))].into();
    *stub.history.lock().unwrap() = vec!["from server".into()];

    let store = LocalStore::new(MemoryStore::new_shared());
    let tombstones = TombstoneTracker::load(&store);
    let config = EngineConfig::default().with_retry(RetryConfig::no_retry());
    let mut engine = SyncEngine::new(config, store, tombstones, Arc::new(client(&url)));

    engine.start().await.unwrap();
    assert!(engine.get("server").is_some());
    assert_eq!(engine.search_history(), ["from server"]);

    engine.add(Record::new("local", json!(2))).unwrap();
    let events = engine.settle().await;
    assert_eq!(events, vec![SyncEvent::PushFinished { result: Ok(()) }]);
    assert_eq!(stub.records.lock().unwrap().len(), 2);

    engine.remove("server").unwrap();
    engine.settle().await;
    let remaining: Vec<String> = stub.records.lock().unwrap().ids().cloned().collect();
    assert_eq!(remaining, ["local"]);

    engine.shutdown().await;
}
