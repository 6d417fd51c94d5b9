//! HTTP client for the show catalog
//!
//! Stateless: each call is an independent GET. Ids are inserted as
//! percent-encoded path segments so an opaque id can never change the route.

use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use showfav_common::{Error, ShowId};

use super::models::{CastCredit, Episode, SearchResult, Show};
use super::{ShowSource, UpstreamError};

pub const DEFAULT_BASE_URL: &str = "https://api.tvmaze.com";
const USER_AGENT: &str = concat!("showfav/", env!("CARGO_PKG_VERSION"));

/// Catalog API client
#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: Url,
}

impl CatalogClient {
    /// Client using transport-default timeouts
    pub fn new(base_url: &str) -> showfav_common::Result<Self> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> showfav_common::Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid upstream URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("Upstream URL cannot be a base: {}", base_url)));
        }

        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, base_url })
    }

    /// `GET {base}/shows?page={page}`
    pub async fn fetch_shows(&self, page: u32) -> Result<Vec<Show>, UpstreamError> {
        let mut url = self.endpoint(&["shows"]);
        url.query_pairs_mut().append_pair("page", &page.to_string());
        self.get_json(url).await
    }

    /// `GET {base}/shows/{id}`
    pub async fn fetch_show(&self, id: &ShowId) -> Result<Show, UpstreamError> {
        self.get_json(self.endpoint(&["shows", id.as_str()])).await
    }

    /// `GET {base}/shows/{id}/episodes`
    pub async fn fetch_episodes(&self, id: &ShowId) -> Result<Vec<Episode>, UpstreamError> {
        self.get_json(self.endpoint(&["shows", id.as_str(), "episodes"]))
            .await
    }

    /// `GET {base}/shows/{id}/cast`
    pub async fn fetch_cast(&self, id: &ShowId) -> Result<Vec<CastCredit>, UpstreamError> {
        self.get_json(self.endpoint(&["shows", id.as_str(), "cast"]))
            .await
    }

    /// `GET {base}/search/shows?q={query}`
    pub async fn search_shows(&self, query: &str) -> Result<Vec<SearchResult>, UpstreamError> {
        let mut url = self.endpoint(&["search", "shows"]);
        url.query_pairs_mut().append_pair("q", query);
        self.get_json(url).await
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked at construction: the base URL can always take path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, UpstreamError> {
        tracing::debug!(url = %url, "Querying upstream catalog");

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| UpstreamError::Unreachable(e.to_string()))?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(UpstreamError::NotFound(url.path().to_string()));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

impl ShowSource for CatalogClient {
    async fn fetch_show(&self, id: &ShowId) -> Result<Show, UpstreamError> {
        CatalogClient::fetch_show(self, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_routes_under_base_path() {
        let client = CatalogClient::new("http://catalog.test/api/").unwrap();
        let id = ShowId::parse("82").unwrap();
        let url = client.endpoint(&["shows", id.as_str(), "episodes"]);
        assert_eq!(url.as_str(), "http://catalog.test/api/shows/82/episodes");

        let root = CatalogClient::new("http://catalog.test").unwrap();
        assert_eq!(root.endpoint(&["shows"]).as_str(), "http://catalog.test/shows");
    }

    #[test]
    fn opaque_ids_are_escaped() {
        let client = CatalogClient::new("http://catalog.test").unwrap();
        let id = ShowId::parse("../search?q=x").unwrap();
        let url = client.endpoint(&["shows", id.as_str()]);
        assert_eq!(url.path(), "/shows/..%2Fsearch%3Fq=x");
        assert!(url.query().is_none());
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(CatalogClient::new("not a url").is_err());
        assert!(CatalogClient::new("mailto:someone@example.com").is_err());
    }
}
