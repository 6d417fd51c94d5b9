//! Client-local mirror of favorites state
//!
//! Persists the favorites map and the last-active navigation tab on the
//! client side so UI state can be restored before the server round-trip
//! completes. Never authoritative: the server session record is the source
//! of truth for rendered favorites.
//!
//! Values are stored as JSON strings under fixed keys, the same layout a
//! browser keeps in local storage:
//! - `favorites`: `{ "<show id>": true | false, ... }`
//! - `activeBtn`: `{ "active": <index> | null }`

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::favorites::{FavoriteSet, ShowId};
use crate::Result;

pub const FAVORITES_KEY: &str = "favorites";
pub const ACTIVE_TAB_KEY: &str = "activeBtn";

/// String key-value persistence backing a [`ClientMirror`]
pub trait MirrorStorage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: String) -> Result<()>;
}

/// Volatile storage; lost when dropped
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MirrorStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<()> {
        self.items.insert(key.to_string(), value);
        Ok(())
    }
}

/// Storage persisted as a single JSON object on disk
///
/// Every write rewrites the whole file through a temporary sibling and a rename.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl FileStorage {
    /// Open storage at `path`, starting empty if the file does not exist
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let items = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Discarding unreadable mirror file {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, items })
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&self.items)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl MirrorStorage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<()> {
        self.items.insert(key.to_string(), value);
        self.flush()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ActiveTab {
    active: Option<usize>,
}

/// Favorites map and active tab, written through to a [`MirrorStorage`]
#[derive(Debug)]
pub struct ClientMirror<S: MirrorStorage> {
    storage: S,
    favorites: FavoriteSet,
    active_tab: Option<usize>,
}

impl<S: MirrorStorage> ClientMirror<S> {
    /// Restore mirror state from storage; unreadable entries start fresh
    pub fn load(storage: S) -> Self {
        let favorites = read_json::<FavoriteSet>(&storage, FAVORITES_KEY).unwrap_or_default();
        let active_tab = read_json::<ActiveTab>(&storage, ACTIVE_TAB_KEY)
            .unwrap_or_default()
            .active;

        Self {
            storage,
            favorites,
            active_tab,
        }
    }

    pub fn favorite_state(&self, id: &ShowId) -> bool {
        self.favorites.is_favorited(id)
    }

    pub fn set_favorite_state(&mut self, id: &ShowId, favorited: bool) -> Result<()> {
        self.favorites.set(id, favorited);
        let encoded = serde_json::to_string(&self.favorites)?;
        self.storage.set_item(FAVORITES_KEY, encoded)
    }

    pub fn active_tab(&self) -> Option<usize> {
        self.active_tab
    }

    pub fn set_active_tab(&mut self, index: usize) -> Result<()> {
        self.active_tab = Some(index);
        let encoded = serde_json::to_string(&ActiveTab { active: Some(index) })?;
        self.storage.set_item(ACTIVE_TAB_KEY, encoded)
    }

    /// Every id whose mirrored state is `true`; the payload of the next submission
    pub fn current_favorites(&self) -> Vec<ShowId> {
        self.favorites.favorited_ids()
    }

    pub fn favorites(&self) -> &FavoriteSet {
        &self.favorites
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(storage: &impl MirrorStorage, key: &str) -> Option<T> {
    let raw = storage.get_item(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, "Ignoring unreadable mirror entry: {}", e);
            None
        }
    }
}
