//! Server-held favorites record for one session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use showfav_common::{FavoriteSet, ShowId};

/// Favorites state owned by a session
///
/// `current` is the most recent submission in submission order; `favorites`
/// additionally remembers ids that were favorited once and later dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub favorites: FavoriteSet,
    pub current: Vec<ShowId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    /// First record for a session
    pub fn new(current: Vec<ShowId>) -> Self {
        let now = Utc::now();
        Self {
            favorites: FavoriteSet::new().replaced_by(&current),
            current,
            created_at: now,
            updated_at: now,
        }
    }

    /// Full replacement by a later submission; creation time is kept
    pub fn replaced_with(&self, current: Vec<ShowId>) -> Self {
        Self {
            favorites: self.favorites.replaced_by(&current),
            current,
            created_at: self.created_at,
            updated_at: Utc::now(),
        }
    }
}

/// Serialized form kept in the `record` column
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StoredFavorites {
    pub favorites: FavoriteSet,
    pub current: Vec<ShowId>,
}

impl From<&SessionRecord> for StoredFavorites {
    fn from(record: &SessionRecord) -> Self {
        Self {
            favorites: record.favorites.clone(),
            current: record.current.clone(),
        }
    }
}
