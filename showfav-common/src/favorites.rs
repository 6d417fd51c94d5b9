//! Favorites data types
//!
//! A [`FavoriteSet`] maps show ids to a favorited flag. An absent key means
//! the show was never favorited; an explicit `false` means it was favorited
//! once and later removed. The same shape is used by the server-held session
//! record and by the client-local mirror.

use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::{Error, Result};

/// Opaque catalog show identifier
///
/// Deserializes from either a JSON string (`"42"`) or a JSON integer (`42`);
/// both forms name the same show.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ShowId(String);

impl ShowId {
    /// Parse an id, rejecting blank input
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("show id must not be empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for ShowId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for ShowId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => ShowId::parse(&text).map_err(de::Error::custom),
            Raw::Number(number) => Ok(ShowId::from(number)),
        }
    }
}

/// Mapping of show id to favorited flag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoriteSet {
    states: BTreeMap<String, bool>,
}

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded state for `id`; `None` if the show was never seen
    pub fn get(&self, id: &ShowId) -> Option<bool> {
        self.states.get(id.as_str()).copied()
    }

    pub fn is_favorited(&self, id: &ShowId) -> bool {
        self.get(id).unwrap_or(false)
    }

    pub fn set(&mut self, id: &ShowId, favorited: bool) {
        self.states.insert(id.as_str().to_string(), favorited);
    }

    /// Ids currently flagged `true`
    ///
    /// Integer-like ids come first in numeric order, then every other id in
    /// string order, the order a browser enumerates object keys in.
    pub fn favorited_ids(&self) -> Vec<ShowId> {
        let mut ids: Vec<&String> = self
            .states
            .iter()
            .filter(|(_, favorited)| **favorited)
            .map(|(id, _)| id)
            .collect();
        ids.sort_by_key(|id| match integer_key(id) {
            Some(n) => (false, n),
            None => (true, 0),
        });
        ids.into_iter().map(|id| ShowId(id.clone())).collect()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Full-replacement reconciliation against a submitted "currently favorited" list.
    ///
    /// Submitted ids become `true`. Ids that were `true` here but are missing from
    /// the submission become `false`. Ids that were already `false` stay `false`.
    pub fn replaced_by(&self, current: &[ShowId]) -> FavoriteSet {
        let submitted: HashSet<&str> = current.iter().map(ShowId::as_str).collect();

        let mut states: BTreeMap<String, bool> = self
            .states
            .keys()
            .filter(|id| !submitted.contains(id.as_str()))
            .map(|id| (id.clone(), false))
            .collect();

        for id in current {
            states.insert(id.as_str().to_string(), true);
        }

        FavoriteSet { states }
    }
}

/// Numeric value of a canonical integer id (`"10"`, not `"010"` or `"+1"`)
fn integer_key(id: &str) -> Option<u64> {
    id.parse::<u64>().ok().filter(|n| n.to_string() == id)
}

/// Body of a favorites submission: `{ "currentFavorites": [id, ...] }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesSubmission {
    #[serde(default)]
    pub current_favorites: Vec<ShowId>,
}

impl FavoritesSubmission {
    pub fn new(current_favorites: Vec<ShowId>) -> Self {
        Self { current_favorites }
    }

    /// Submitted ids with duplicates removed, first occurrence wins
    pub fn distinct_ids(&self) -> Vec<ShowId> {
        let mut seen = HashSet::new();
        let mut distinct = Vec::with_capacity(self.current_favorites.len());
        for id in &self.current_favorites {
            if seen.insert(id.as_str()) {
                distinct.push(id.clone());
            }
        }
        distinct
    }
}
