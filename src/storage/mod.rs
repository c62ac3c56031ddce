//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - games(id, name, description, price, release_date)
//! - categories(id, name)
//! - games_categories(id, game_id, category_id)
//! - categories_dependence(id, main_category_id, sub_category_id)

pub mod schema;
pub mod sqlite;

pub use sqlite::{DbStats, Store};
