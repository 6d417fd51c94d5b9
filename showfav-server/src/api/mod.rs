//! HTTP API handlers for showfav-server

pub mod favorites;
pub mod health;
pub mod shows;

pub use favorites::{favorites_builder, favourites};
pub use health::health_routes;
pub use shows::{home, search, show_detail};
