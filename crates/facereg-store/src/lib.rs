//! facereg-store — Persistent face registry.
//!
//! Stores face identifier → name registrations in SQLite so they survive
//! restarts. Implements [`facereg_core::FaceRegistry`] with the same
//! last-write-wins semantics as the in-memory registry.

mod migrations;
pub mod sqlite;

pub use sqlite::{SqliteRegistry, StoreError};
