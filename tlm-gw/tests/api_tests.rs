//! Integration tests for tlm-gw API endpoints
//!
//! The router is driven with `oneshot`; IGDB, Twitch, Google Books and
//! Bangumi are replaced by one fake upstream on an ephemeral local port.
//!
//! Tests cover:
//! - Health endpoint
//! - Query validation (400) and unsupported media (404)
//! - Missing credentials (500)
//! - Per-request IGDB tokens and reshaping of every source
//! - Upstream failures and unreachable upstreams (502)

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, Request, StatusCode},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot` method

use tlm_gw::config::{Credentials, GatewaySettings, Upstreams};
use tlm_gw::sources::SourceRegistry;
use tlm_gw::{build_router, AppState};

// =============================================================================
// Fake upstream
// =============================================================================

#[derive(Clone, Default)]
struct Upstream {
    tokens_issued: Arc<AtomicUsize>,
    igdb_queries: Arc<Mutex<Vec<String>>>,
    books_params: Arc<Mutex<Vec<HashMap<String, String>>>>,
    bangumi_calls: Arc<Mutex<Vec<(HashMap<String, String>, Value)>>>,
}

async fn issue_token(
    State(upstream): State<Upstream>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if form.get("grant_type").map(String::as_str) != Some("client_credentials")
        || form.get("client_secret").map(String::as_str) != Some("secret")
    {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "bad client"})));
    }
    let n = upstream.tokens_issued.fetch_add(1, Ordering::SeqCst) + 1;
    (
        StatusCode::OK,
        Json(json!({"access_token": format!("token-{}", n), "expires_in": 5000000})),
    )
}

async fn igdb_games(
    State(upstream): State<Upstream>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<Value>) {
    let expected = format!("Bearer token-{}", upstream.tokens_issued.load(Ordering::SeqCst));
    let authorized = headers.get("authorization").and_then(|v| v.to_str().ok())
        == Some(expected.as_str())
        && headers.get("client-id").and_then(|v| v.to_str().ok()) == Some("client");
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "unauthorized"})));
    }

    upstream.igdb_queries.lock().unwrap().push(body.clone());
    if body.contains("boom") {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"message": "down"})));
    }
    (
        StatusCode::OK,
        Json(json!([
            {
                "id": 1942,
                "name": "The Witcher 3: Wild Hunt",
                "cover": {"id": 1, "url": "//images.igdb.com/igdb/image/upload/t_thumb/co1wyy.jpg"},
                "summary": "Geralt of Rivia",
                "rating": 93.1
            },
            {"id": 7, "name": "No Cover Game"},
            {"id": 8, "cover": {"id": 2, "url": "//images.igdb.com/x.jpg"}}
        ])),
    )
}

async fn books_volumes(
    State(upstream): State<Upstream>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    upstream.books_params.lock().unwrap().push(params);
    Json(json!({
        "totalItems": 2,
        "items": [
            {
                "id": "vol1",
                "volumeInfo": {
                    "title": "活着",
                    "authors": ["余华"],
                    "imageLinks": {"thumbnail": "http://books.google.com/content?id=vol1"},
                    "averageRating": 4.0,
                    "pageCount": 191
                }
            },
            {"id": "vol2", "volumeInfo": {}}
        ]
    }))
}

async fn bangumi_search(
    State(upstream): State<Upstream>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    upstream.bangumi_calls.lock().unwrap().push((params, body));
    Json(json!({
        "data": [
            {
                "id": 253,
                "name": "カウボーイビバップ",
                "name_cn": "星际牛仔",
                "images": {"large": "https://lain.bgm.tv/pic/cover/l/253.jpg"},
                "summary": "2071",
                "rating": {"score": 8.9}
            },
            {"id": 254, "name": "Untranslated", "name_cn": "", "summary": ""}
        ],
        "total": 2,
        "limit": 20,
        "offset": 0
    }))
}

async fn spawn_upstream() -> (String, Upstream) {
    let upstream = Upstream::default();
    let app = Router::new()
        .route("/oauth2/token", post(issue_token))
        .route("/v4/games", post(igdb_games))
        .route("/books/v1/volumes", get(books_volumes))
        .route("/v0/search/subjects", post(bangumi_search))
        .with_state(upstream.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), upstream)
}

// =============================================================================
// Helpers
// =============================================================================

fn upstreams_at(base: &str) -> Upstreams {
    Upstreams {
        twitch_token_url: format!("{}/oauth2/token", base),
        igdb_base_url: format!("{}/v4", base),
        google_books_base_url: format!("{}/books/v1", base),
        bangumi_base_url: base.to_string(),
    }
}

fn full_credentials() -> Credentials {
    Credentials {
        igdb_client_id: Some("client".to_string()),
        igdb_client_secret: Some("secret".to_string()),
        google_books_api_key: Some("books-key".to_string()),
        bangumi_access_token: None,
    }
}

fn setup_app(credentials: Credentials, upstreams: Upstreams) -> Router {
    let settings = GatewaySettings {
        credentials,
        upstreams,
        ..GatewaySettings::default()
    };
    let registry = SourceRegistry::from_settings(&settings).unwrap();
    build_router(AppState::new(registry))
}

fn search_request(media: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/search/{}", media))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, extract_json(response.into_body()).await)
}

// =============================================================================
// Health and validation
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app(Credentials::default(), Upstreams::default());
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "tlm-gw");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_blank_query_is_bad_request() {
    let (base, upstream) = spawn_upstream().await;
    let app = setup_app(full_credentials(), upstreams_at(&base));

    for body in [json!({}), json!({"query": "   "}), json!({"query": null})] {
        let (status, json) = send(&app, search_request("games", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    let request = Request::builder()
        .method("POST")
        .uri("/search/books")
        .body(Body::from("not json"))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nothing reached the upstreams.
    assert_eq!(upstream.tokens_issued.load(Ordering::SeqCst), 0);
    assert!(upstream.books_params.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unsupported_media_is_not_found() {
    let app = setup_app(full_credentials(), Upstreams::default());

    let (status, body) = send(&app, search_request("music", json!({"query": "x"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Unsupported media type: music");

    let (status, _) = send(&app, search_request("movies", json!({"query": "x"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_credentials_is_server_error() {
    let (base, upstream) = spawn_upstream().await;
    let app = setup_app(Credentials::default(), upstreams_at(&base));

    let (status, body) = send(&app, search_request("games", json!({"query": "zelda"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("IGDB"));

    let (status, _) = send(&app, search_request("books", json!({"query": "活着"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(upstream.tokens_issued.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Sources
// =============================================================================

#[tokio::test]
async fn test_games_fetches_token_per_request_and_reshapes() {
    let (base, upstream) = spawn_upstream().await;
    let app = setup_app(full_credentials(), upstreams_at(&base));

    let (status, body) = send(&app, search_request("games", json!({"query": "witcher"}))).await;
    assert_eq!(status, StatusCode::OK);
    let games = body.as_array().unwrap();
    assert_eq!(games.len(), 1, "games without name or cover are dropped");
    assert_eq!(games[0]["id"], "1942");
    assert_eq!(games[0]["title"], "The Witcher 3: Wild Hunt");
    assert_eq!(
        games[0]["cover"],
        "https://images.igdb.com/igdb/image/upload/t_cover_big/co1wyy.jpg"
    );
    assert_eq!(games[0]["description"], "Geralt of Rivia");

    let (status, _) = send(&app, search_request("games", json!({"query": "say \"hi\""}))).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(upstream.tokens_issued.load(Ordering::SeqCst), 2);
    let queries = upstream.igdb_queries.lock().unwrap();
    assert_eq!(
        queries[0],
        "search \"witcher\"; fields name,cover.url,summary,rating; limit 20;"
    );
    assert!(queries[1].starts_with(r#"search "say \"hi\"";"#));
}

#[tokio::test]
async fn test_books_reshape_and_parameters() {
    let (base, upstream) = spawn_upstream().await;
    let app = setup_app(full_credentials(), upstreams_at(&base));

    let (status, body) = send(
        &app,
        search_request("books", json!({"query": "余华", "maxResults": 100})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let books = body.as_array().unwrap();
    assert_eq!(books.len(), 2);
    assert_eq!(books[0]["title"], "活着");
    assert_eq!(books[0]["cover"], "https://books.google.com/content?id=vol1");
    assert_eq!(books[0]["authors"], "余华");
    assert_eq!(books[0]["rating"], 4.0);
    assert_eq!(books[1]["title"], "Unknown title");
    assert_eq!(books[1]["authors"], "Unknown author");
    assert_eq!(books[1]["cover"], Value::Null);

    let params = upstream.books_params.lock().unwrap();
    assert_eq!(params[0]["q"], "余华");
    assert_eq!(params[0]["key"], "books-key");
    assert_eq!(params[0]["maxResults"], "40");
    assert_eq!(params[0]["langRestrict"], "zh");
}

#[tokio::test]
async fn test_anime_reshape_and_filter() {
    let (base, upstream) = spawn_upstream().await;
    let app = setup_app(full_credentials(), upstreams_at(&base));

    let (status, body) = send(
        &app,
        search_request("anime", json!({"query": "bebop", "limit": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let anime = body.as_array().unwrap();
    assert_eq!(anime[0]["title"], "星际牛仔");
    assert_eq!(anime[0]["rating"], 8.9);
    assert_eq!(anime[1]["title"], "Untranslated");

    let calls = upstream.bangumi_calls.lock().unwrap();
    assert_eq!(calls[0].0["limit"], "5");
    assert_eq!(calls[0].1, json!({"keyword": "bebop", "filter": {"type": [2]}}));
}

// =============================================================================
// Upstream failures
// =============================================================================

#[tokio::test]
async fn test_upstream_failure_is_bad_gateway() {
    let (base, _) = spawn_upstream().await;
    let app = setup_app(full_credentials(), upstreams_at(&base));

    let (status, body) = send(&app, search_request("games", json!({"query": "boom"}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "IGDB request failed: HTTP 500 Internal Server Error");
}

#[tokio::test]
async fn test_rejected_token_request_is_bad_gateway() {
    let (base, upstream) = spawn_upstream().await;
    let credentials = Credentials {
        igdb_client_secret: Some("wrong".to_string()),
        ..full_credentials()
    };
    let app = setup_app(credentials, upstreams_at(&base));

    let (status, _) = send(&app, search_request("games", json!({"query": "zelda"}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(upstream.igdb_queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let app = setup_app(full_credentials(), upstreams_at(&base));
    let (status, body) = send(&app, search_request("anime", json!({"query": "bebop"}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().starts_with("Bangumi request failed"));
}
