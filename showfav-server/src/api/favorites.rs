//! Favorites handlers: the favorites builder and the favourites page

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use showfav_common::FavoritesSubmission;

use crate::aggregate::{aggregate, AggregatedShow};
use crate::error::{STORE_RETRY_AFTER_SECS, STORE_UNAVAILABLE_MESSAGE};
use crate::session::SessionToken;
use crate::store::StoreError;
use crate::{ApiError, ApiResult, AppState};

/// Acknowledgement for `POST /favorites-builder`
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub success: bool,
    /// The request body exactly as submitted
    pub favorites: Value,
}

/// View model for `GET /favourites`
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavouritesView {
    pub shows: Vec<AggregatedShow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorites_error: Option<String>,
}

/// POST /favorites-builder
///
/// Body: `{ "currentFavorites": [id, ...] }`. Overwrites the session's
/// favorites. Every successful write re-issues the session cookie so its
/// `Max-Age` slides along with the stored record's expiry.
pub async fn favorites_builder(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let submission: FavoritesSubmission = serde_json::from_value(body.clone())
        .map_err(|e| ApiError::BadRequest(format!("Invalid favorites body: {}", e)))?;

    let existing = state.cookies.token_from_headers(&headers);
    let token = existing.clone().unwrap_or_else(SessionToken::generate);

    state.reconciler.submit(&token, &submission).await?;

    let mut response = Json(SubmissionResponse {
        success: true,
        favorites: body,
    })
    .into_response();

    if existing.is_none() {
        debug!("Issuing new session cookie");
    }
    response
        .headers_mut()
        .insert(header::SET_COOKIE, state.cookies.set_cookie(&token));

    Ok(response)
}

/// GET /favourites
///
/// Aggregates every favorited show for the session. A store outage still
/// renders the page, with an empty list, a distinct message and a 503 so
/// the client knows to retry.
pub async fn favourites(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let token = state.cookies.token_from_headers(&headers);

    match state.reconciler.list_favorite_ids(token.as_ref()).await {
        Ok(ids) => Json(FavouritesView {
            shows: aggregate(&state.catalog, &ids).await,
            favorites_error: None,
        })
        .into_response(),
        Err(e) => {
            match &e {
                StoreError::Unavailable(cause) => {
                    error!(cause = %cause, "StoreUnavailable while loading favourites")
                }
                StoreError::Corrupt(cause) => {
                    error!(cause = %cause, "Unreadable session while loading favourites")
                }
            }
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [(header::RETRY_AFTER, STORE_RETRY_AFTER_SECS.to_string())],
                Json(FavouritesView {
                    shows: Vec::new(),
                    favorites_error: Some(STORE_UNAVAILABLE_MESSAGE.to_string()),
                }),
            )
                .into_response()
        }
    }
}
