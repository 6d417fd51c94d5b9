//! showfav-server library
//!
//! Show catalog aggregator with per-session favorites:
//! - Upstream catalog client with a uniform failure taxonomy
//! - Fan-out aggregation of favorited shows with per-item failure markers
//! - Favorites reconciliation into a store-backed session record

use axum::http::{header, HeaderValue};
use axum::Router;
use chrono::{DateTime, Utc};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

pub mod aggregate;
pub mod api;
pub mod error;
pub mod favorites;
pub mod session;
pub mod store;
pub mod upstream;

pub use crate::error::{ApiError, ApiResult};

use favorites::FavoritesReconciler;
use session::CookiePolicy;
use store::SessionStore;
use upstream::CatalogClient;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Upstream show catalog
    pub catalog: CatalogClient,
    /// Shared session store (also pinged by /health)
    pub store: SessionStore,
    /// Favorites rules on top of the store
    pub reconciler: FavoritesReconciler,
    /// Session cookie signing and attributes
    pub cookies: CookiePolicy,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(catalog: CatalogClient, store: SessionStore, cookies: CookiePolicy) -> Self {
        Self {
            catalog,
            reconciler: FavoritesReconciler::new(store.clone()),
            store,
            cookies,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// Page routes return the JSON view model a renderer consumes.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let production = state.cookies.mode().is_production();

    let router = Router::new()
        .route("/", get(api::home))
        .route("/shows/:id", get(api::show_detail))
        .route("/search", get(api::search))
        .route("/favourites", get(api::favourites))
        .route("/favorites-builder", post(api::favorites_builder))
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if production {
        router
    } else {
        // Development: never let a browser cache a response
        router.layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
    }
}
