//! SQLite database module for the Harvest Market engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
