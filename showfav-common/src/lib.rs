//! # showfav common library
//!
//! Shared code for the showfav service and its clients:
//! - Error and result types
//! - Configuration resolution
//! - Favorites data types (show ids, favorite sets, submissions)
//! - Summary text sanitizer
//! - Client-local mirror and the favorites submission round-trip

pub mod config;
pub mod error;
pub mod favorites;
pub mod mirror;
pub mod sanitize;
pub mod sync;

pub use error::{Error, Result};
pub use favorites::{FavoriteSet, FavoritesSubmission, ShowId};
pub use sanitize::sanitize;
