//! Catalog page handlers: home listing, show detail, search
//!
//! Upstream failures never fail these routes. Each page section that could
//! not be fetched carries its own friendly message instead.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use showfav_common::ShowId;

use crate::upstream::{CastCredit, Episode, SearchResult, Show, UpstreamError};
use crate::{ApiError, ApiResult, AppState};

/// View model for `GET /`
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shows: Option<Vec<Show>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendly_message: Option<String>,
}

/// View model for `GET /shows/:id`; every section errors independently
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowDetailView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<Show>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episodes: Option<Vec<Episode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cast: Option<Vec<CastCredit>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episodes_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cast_error: Option<String>,
}

/// View model for `GET /search`
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchView {
    pub q: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shows: Option<Vec<SearchResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shows_error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub show: Option<String>,
}

/// Split an upstream outcome into (value, friendly message), logging the cause
fn section<T>(name: &str, show_id: &str, outcome: Result<T, UpstreamError>) -> (Option<T>, Option<String>) {
    match outcome {
        Ok(value) => (Some(value), None),
        Err(e) => {
            warn!(section = name, show_id, error = %e, "Upstream lookup failed");
            (None, Some(e.friendly_message().to_string()))
        }
    }
}

/// GET /
///
/// First page of the catalog listing.
pub async fn home(State(state): State<AppState>) -> Json<HomeView> {
    let view = match state.catalog.fetch_shows(0).await {
        Ok(shows) => HomeView {
            shows: Some(shows.into_iter().map(Show::sanitized).collect()),
            friendly_message: None,
        },
        Err(e) => {
            warn!(error = %e, "Home listing failed");
            HomeView {
                shows: None,
                friendly_message: Some(e.friendly_message().to_string()),
            }
        }
    };
    Json(view)
}

/// GET /shows/:id
///
/// Show, episodes and cast are fetched concurrently and settle independently.
pub async fn show_detail(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<ShowDetailView>> {
    let id = ShowId::parse(&raw_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let (show, episodes, cast) = tokio::join!(
        state.catalog.fetch_show(&id),
        state.catalog.fetch_episodes(&id),
        state.catalog.fetch_cast(&id),
    );

    let (show, show_error) = section("show", id.as_str(), show);
    let (episodes, episodes_error) = section("episodes", id.as_str(), episodes);
    let (cast, cast_error) = section("cast", id.as_str(), cast);

    Ok(Json(ShowDetailView {
        show: show.map(Show::sanitized),
        episodes: episodes.map(|list| list.into_iter().map(Episode::sanitized).collect()),
        cast,
        show_error,
        episodes_error,
        cast_error,
    }))
}

/// GET /search?show=<query>
///
/// A blank query returns an empty hit list without calling upstream.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<SearchView> {
    let q = query.show.unwrap_or_default().trim().to_string();

    if q.is_empty() {
        return Json(SearchView {
            q,
            shows: Some(Vec::new()),
            shows_error: None,
        });
    }

    let view = match state.catalog.search_shows(&q).await {
        Ok(hits) => SearchView {
            shows: Some(hits.into_iter().map(SearchResult::sanitized).collect()),
            shows_error: None,
            q,
        },
        Err(e) => {
            warn!(query = %q, error = %e, "Search failed");
            SearchView {
                shows: None,
                shows_error: Some(e.friendly_message().to_string()),
                q,
            }
        }
    };
    Json(view)
}
