//! Upstream show catalog access
//!
//! Every upstream call, wherever it happens, fails with the same
//! [`UpstreamError`] taxonomy so callers can pick a friendly message
//! without inspecting transport details.

pub mod client;
pub mod models;

use std::future::Future;
use thiserror::Error;

use showfav_common::ShowId;

pub use client::{CatalogClient, DEFAULT_BASE_URL};
pub use models::{CastCredit, Episode, Image, SearchResult, Show};

pub const NOT_FOUND_MESSAGE: &str = "Show(s) not found!";
pub const UNREACHABLE_MESSAGE: &str = "The Server is not responding. Please check your connection.";
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Something went wrong";

/// Upstream catalog failures
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The catalog answered that the resource does not exist
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// No response at all (connection refused, DNS failure, timeout)
    #[error("Upstream unreachable: {0}")]
    Unreachable(String),

    /// The catalog answered with a non-success status
    #[error("Upstream error {status}: {message}")]
    Status { status: u16, message: String },

    /// The catalog answered 2xx with a body we could not read
    #[error("Failed to decode upstream response: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// Short human-readable message safe to show to end users
    pub fn friendly_message(&self) -> &'static str {
        match self {
            UpstreamError::NotFound(_) => NOT_FOUND_MESSAGE,
            UpstreamError::Unreachable(_) => UNREACHABLE_MESSAGE,
            UpstreamError::Status { .. } | UpstreamError::Decode(_) => UPSTREAM_FAILURE_MESSAGE,
        }
    }
}

/// Single-show lookup, the only upstream call the fan-out aggregator needs
pub trait ShowSource: Send + Sync {
    fn fetch_show(&self, id: &ShowId) -> impl Future<Output = Result<Show, UpstreamError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn friendly_messages_hide_transport_details() {
        let cases = [
            (UpstreamError::NotFound("shows/9".into()), NOT_FOUND_MESSAGE),
            (
                UpstreamError::Unreachable("connection refused (os error 111)".into()),
                UNREACHABLE_MESSAGE,
            ),
            (
                UpstreamError::Status {
                    status: 502,
                    message: "<html>bad gateway</html>".into(),
                },
                UPSTREAM_FAILURE_MESSAGE,
            ),
            (UpstreamError::Decode("expected value".into()), UPSTREAM_FAILURE_MESSAGE),
        ];

        for (err, expected) in cases {
            assert_eq!(err.friendly_message(), expected, "for {:?}", err);
        }
    }
}
