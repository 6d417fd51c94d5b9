//! Client side of the favorites round-trip
//!
//! A toggle updates the [`ClientMirror`] optimistically, then sends the full
//! set of currently favorited ids to the server's favorites builder. The
//! server overwrites the session record with whatever arrives, so the mirror
//! and the server converge on the next successful submission. A failed
//! submission leaves the optimistic local state in place.

use reqwest::header::{COOKIE, SET_COOKIE};
use serde::Deserialize;
use tracing::{info, warn};

use crate::favorites::{FavoritesSubmission, ShowId};
use crate::mirror::{ClientMirror, MirrorStorage};
use crate::{Error, Result};

pub const FAVORITES_BUILDER_PATH: &str = "/favorites-builder";

/// Server acknowledgement of a submission
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionReceipt {
    pub success: bool,
    /// The submitted body, echoed back
    pub favorites: serde_json::Value,
}

/// Drives mirror updates and favorites submissions for one browser-like session
pub struct FavoritesSync<S: MirrorStorage> {
    http: reqwest::Client,
    endpoint: String,
    mirror: ClientMirror<S>,
    session_cookie: Option<String>,
}

impl<S: MirrorStorage> FavoritesSync<S> {
    pub fn new(server_url: &str, mirror: ClientMirror<S>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("showfav-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}{}", server_url.trim_end_matches('/'), FAVORITES_BUILDER_PATH),
            mirror,
            session_cookie: None,
        })
    }

    pub fn mirror(&self) -> &ClientMirror<S> {
        &self.mirror
    }

    /// Session cookie (`name=value`) captured from the server, if any
    pub fn session_cookie(&self) -> Option<&str> {
        self.session_cookie.as_deref()
    }

    /// Flip the favorite state of `id` and submit the resulting set
    ///
    /// Returns the new local state. The mirror keeps that state even when the
    /// submission fails; the error is returned for the caller to surface.
    pub async fn toggle(&mut self, id: &ShowId) -> Result<bool> {
        let favorited = !self.mirror.favorite_state(id);
        self.mirror.set_favorite_state(id, favorited)?;
        self.submit().await?;
        Ok(favorited)
    }

    /// Send every currently favorited id to the server
    pub async fn submit(&mut self) -> Result<SubmissionReceipt> {
        let submission = FavoritesSubmission::new(self.mirror.current_favorites());

        let mut request = self.http.post(&self.endpoint).json(&submission);
        if let Some(cookie) = &self.session_cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await.map_err(|e| {
            warn!("Favorites submission failed: {}", e);
            Error::Http(e.to_string())
        })?;

        if let Some(cookie) = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
        {
            self.session_cookie = Some(cookie.trim().to_string());
        }

        let status = response.status();
        if !status.is_success() {
            warn!("Favorites submission rejected: server responded with {}", status);
            return Err(Error::Http(format!("Server responded with {}", status)));
        }

        let receipt: SubmissionReceipt = response
            .json()
            .await
            .map_err(|e| Error::Http(format!("Unreadable favorites receipt: {}", e)))?;

        info!(
            count = submission.current_favorites.len(),
            "Sent favorites successfully"
        );
        Ok(receipt)
    }
}
