//! # pomoloot-store
//!
//! SQLite storage for Pomoloot.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model, plus the transactional [`SqlLedger`] the reward engine claims
//! through.

pub mod activities;
pub mod database;
pub mod labels;
pub mod ledger;
pub mod migrations;
pub mod models;
pub mod rewards;
pub mod time_entries;
pub mod users;

mod convert;
mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use ledger::SqlLedger;
pub use models::*;
