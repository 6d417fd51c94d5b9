//! Fan-out aggregation of favorite shows
//!
//! One upstream lookup per favorited id, all issued concurrently within the
//! request. Every lookup runs to a terminal outcome; a failed lookup becomes
//! an inline [`AggregationError`] at its own position instead of failing the
//! batch.

use futures::future::join_all;
use serde::Serialize;
use std::future::Future;
use tracing::{debug, warn};

use showfav_common::ShowId;

use crate::upstream::{Show, ShowSource};

/// Reason attached to every per-item aggregation failure
pub const AGGREGATION_FAILURE: &str = "The show could not be retrieved!";

/// Per-item failure marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationError {
    pub id: ShowId,
    #[serde(rename = "error")]
    pub reason: String,
}

impl AggregationError {
    pub fn new(id: ShowId) -> Self {
        Self {
            id,
            reason: AGGREGATION_FAILURE.to_string(),
        }
    }
}

/// Outcome for one requested id: a full show or a failure marker, never both
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AggregatedShow {
    Show(Box<Show>),
    Failed(AggregationError),
}

impl AggregatedShow {
    pub fn is_failed(&self) -> bool {
        matches!(self, AggregatedShow::Failed(_))
    }
}

/// Await every future, collecting each outcome at its input position.
///
/// Never short-circuits: an early failure does not cancel or skip the
/// remaining tasks.
pub async fn settle_all<I, F, T, E>(tasks: I) -> Vec<Result<T, E>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    join_all(tasks).await
}

/// Look up every id concurrently; `result[i]` always answers `ids[i]`
pub async fn aggregate<S: ShowSource>(source: &S, ids: &[ShowId]) -> Vec<AggregatedShow> {
    if ids.is_empty() {
        return Vec::new();
    }

    let outcomes = settle_all(ids.iter().map(|id| source.fetch_show(id))).await;

    let shows: Vec<AggregatedShow> = ids
        .iter()
        .zip(outcomes)
        .map(|(id, outcome)| match outcome {
            Ok(show) => AggregatedShow::Show(Box::new(show.sanitized())),
            Err(e) => {
                warn!(show_id = %id, error = %e, "Favorite show lookup failed");
                AggregatedShow::Failed(AggregationError::new(id.clone()))
            }
        })
        .collect();

    debug!(
        requested = ids.len(),
        failed = shows.iter().filter(|s| s.is_failed()).count(),
        "Aggregated favorite shows"
    );

    shows
}
