//! Shared fixtures for showfav-server integration tests
//!
//! - A fake catalog served by a real axum listener on 127.0.0.1:0
//! - An app router wired to that catalog and an in-memory session store

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::{Path, Query};
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use std::time::Duration;

use showfav_common::config::DeploymentMode;
use showfav_server::session::CookiePolicy;
use showfav_server::store::SessionStore;
use showfav_server::upstream::CatalogClient;
use showfav_server::{build_router, AppState};

pub const TEST_SECRET: &str = "integration-secret";

/// Shows the fake catalog knows about
pub const KNOWN_SHOWS: [u64; 4] = [1, 3, 7, 82];

/// Id the fake catalog answers with a 500
pub const BROKEN_SHOW: u64 = 42;

pub fn show_json(id: u64) -> Value {
    json!({
        "id": id,
        "name": format!("Show {}", id),
        "summary": format!("<p>The <b>story</b> of show {}.</p>", id),
        "genres": ["Drama"],
        "image": { "medium": format!("{}-m.jpg", id), "original": format!("{}-o.jpg", id) }
    })
}

async fn catalog_show(Path(id): Path<String>) -> Response {
    match id.parse::<u64>() {
        Ok(id) if KNOWN_SHOWS.contains(&id) => Json(show_json(id)).into_response(),
        Ok(BROKEN_SHOW) => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({ "name": "Not Found", "status": 404 }))).into_response(),
    }
}

/// Episodes exist only for show 7; show 1 has a broken episodes endpoint
async fn catalog_episodes(Path(id): Path<String>) -> Response {
    match id.as_str() {
        "7" => Json(json!([
            { "id": 700, "name": "Pilot", "season": 1, "number": 1, "summary": "<p>It <i>begins</i>.</p>" },
            { "id": 701, "name": "Second", "season": 1, "number": 2, "summary": null }
        ]))
        .into_response(),
        "1" => (StatusCode::BAD_GATEWAY, "upstream of upstream failed").into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn catalog_cast(Path(id): Path<String>) -> Response {
    match id.as_str() {
        "1" | "7" => Json(json!([
            { "person": { "id": 1, "name": "Mike Vogel" }, "character": { "id": 1, "name": "Dale Barbara" }, "self": false }
        ]))
        .into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<u32>,
}

async fn catalog_listing(Query(query): Query<PageQuery>) -> Response {
    if query.page != Some(0) {
        return StatusCode::BAD_REQUEST.into_response();
    }
    Json(json!([show_json(1), show_json(3)])).into_response()
}

#[derive(Deserialize)]
struct SearchQuery {
    q: String,
}

async fn catalog_search(Query(query): Query<SearchQuery>) -> Response {
    if query.q == "explode" {
        return (StatusCode::SERVICE_UNAVAILABLE, "overloaded").into_response();
    }
    Json(json!([
        { "score": 0.9, "show": show_json(82) },
        { "score": 0.5, "show": show_json(7) }
    ]))
    .into_response()
}

pub fn fake_catalog() -> Router {
    Router::new()
        .route("/shows", get(catalog_listing))
        .route("/shows/:id", get(catalog_show))
        .route("/shows/:id/episodes", get(catalog_episodes))
        .route("/shows/:id/cast", get(catalog_cast))
        .route("/search/shows", get(catalog_search))
}

/// Serve `router` on an ephemeral port and return its base URL
pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Base URL on which nothing is listening
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub async fn memory_store() -> SessionStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    SessionStore::from_pool(pool, Duration::from_secs(3600))
        .await
        .unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub store: SessionStore,
    pub cookies: CookiePolicy,
}

impl TestApp {
    /// App backed by the fake catalog
    pub async fn start() -> Self {
        let url = spawn(fake_catalog()).await;
        Self::with_catalog(&url, DeploymentMode::Development).await
    }

    pub async fn with_catalog(catalog_url: &str, mode: DeploymentMode) -> Self {
        let store = memory_store().await;
        let cookies = CookiePolicy::new(mode, TEST_SECRET, Duration::from_secs(3600));
        let catalog = CatalogClient::new(catalog_url).unwrap();
        let state = AppState::new(catalog, store.clone(), cookies.clone());
        Self {
            router: build_router(state),
            store,
            cookies,
        }
    }
}

pub fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// `name=value` part of the response's Set-Cookie header, if any
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|pair| pair.trim().to_string())
}
