//! Favorites reconciler
//!
//! Owns the rules for turning a client submission into the session record
//! and for reading back the ids to aggregate.
//!
//! Session states:
//! - no record: nothing has ever been submitted; reads return an empty list
//! - has record: the latest submission, fully replacing the previous one
//!
//! There is no delete transition; submitting an empty set clears favorites.
//! Two tabs of one session submitting concurrently race at the store and the
//! later write wins.

use tracing::{error, info, warn};

use showfav_common::{FavoritesSubmission, ShowId};

use crate::session::SessionToken;
use crate::store::{SessionRecord, SessionStore, StoreError};

#[derive(Clone)]
pub struct FavoritesReconciler {
    store: SessionStore,
}

impl FavoritesReconciler {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    /// Replace the session's favorites with the submitted set
    pub async fn submit(
        &self,
        token: &SessionToken,
        submission: &FavoritesSubmission,
    ) -> Result<SessionRecord, StoreError> {
        let current = submission.distinct_ids();

        let previous = match self.store.load(token).await {
            Ok(previous) => previous,
            // The submission replaces the whole record, so an unreadable one is simply overwritten
            Err(StoreError::Corrupt(e)) => {
                warn!("Overwriting unreadable session record: {}", e);
                None
            }
            Err(e) => return Err(e),
        };

        let record = match previous {
            Some(previous) => previous.replaced_with(current),
            None => SessionRecord::new(current),
        };

        self.store.save(token, &record).await?;

        info!(
            favorites = record.current.len(),
            remembered = record.favorites.len(),
            "Session favorites replaced"
        );
        Ok(record)
    }

    /// Currently favorited ids in submission order
    ///
    /// No token or no record yields an empty list. A store transport failure
    /// is returned as [`StoreError::Unavailable`], never as an empty list.
    pub async fn list_favorite_ids(
        &self,
        token: Option<&SessionToken>,
    ) -> Result<Vec<ShowId>, StoreError> {
        let Some(token) = token else {
            return Ok(Vec::new());
        };

        match self.store.load(token).await {
            Ok(Some(record)) => Ok(record.current),
            Ok(None) => Ok(Vec::new()),
            Err(StoreError::Corrupt(e)) => {
                error!("Session record unreadable, treating as empty: {}", e);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::time::Duration;

    async fn reconciler() -> (FavoritesReconciler, SessionStore) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SessionStore::from_pool(pool, Duration::from_secs(3600))
            .await
            .unwrap();
        (FavoritesReconciler::new(store.clone()), store)
    }

    fn submission(raw: &[&str]) -> FavoritesSubmission {
        FavoritesSubmission::new(raw.iter().map(|s| ShowId::parse(s).unwrap()).collect())
    }

    fn ids(raw: &[&str]) -> Vec<ShowId> {
        raw.iter().map(|s| ShowId::parse(s).unwrap()).collect()
    }

    #[tokio::test]
    async fn no_record_lists_empty() {
        let (reconciler, _) = reconciler().await;
        let token = SessionToken::generate();

        assert!(reconciler.list_favorite_ids(Some(&token)).await.unwrap().is_empty());
        assert!(reconciler.list_favorite_ids(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn submission_replaces_rather_than_merges() {
        let (reconciler, _) = reconciler().await;
        let token = SessionToken::generate();

        reconciler.submit(&token, &submission(&["1", "2"])).await.unwrap();
        let record = reconciler.submit(&token, &submission(&["1"])).await.unwrap();

        assert_eq!(reconciler.list_favorite_ids(Some(&token)).await.unwrap(), ids(&["1"]));
        assert_eq!(record.favorites.get(&ShowId::from(2)), Some(false));
    }

    #[tokio::test]
    async fn empty_submission_clears() {
        let (reconciler, _) = reconciler().await;
        let token = SessionToken::generate();

        reconciler.submit(&token, &submission(&["3"])).await.unwrap();
        reconciler.submit(&token, &submission(&[])).await.unwrap();

        assert!(reconciler.list_favorite_ids(Some(&token)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicates_collapse_in_submission_order() {
        let (reconciler, _) = reconciler().await;
        let token = SessionToken::generate();

        reconciler
            .submit(&token, &submission(&["9", "4", "9", "1"]))
            .await
            .unwrap();

        assert_eq!(
            reconciler.list_favorite_ids(Some(&token)).await.unwrap(),
            ids(&["9", "4", "1"])
        );
    }

    #[tokio::test]
    async fn store_outage_is_not_reported_as_empty() {
        let (reconciler, store) = reconciler().await;
        let token = SessionToken::generate();
        reconciler.submit(&token, &submission(&["5"])).await.unwrap();

        store.close().await;

        assert!(matches!(
            reconciler.list_favorite_ids(Some(&token)).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            reconciler.submit(&token, &submission(&["6"])).await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
