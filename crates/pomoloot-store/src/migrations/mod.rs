//! Schema versioning for the tracker database.
//!
//! The schema version lives in SQLite's `user_version` header field. Opening a
//! [`Database`] brings an older file up to [`CURRENT_VERSION`]; a file that is
//! already current is left untouched.
//!
//! [`Database`]: crate::Database

pub mod v001_initial;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Version written after the last step below has been applied.
pub(crate) const CURRENT_VERSION: u32 = 1;

/// Apply every step newer than the file's recorded version.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if current >= CURRENT_VERSION {
        return Ok(());
    }
    tracing::debug!(from = current, to = CURRENT_VERSION, "upgrading tracker schema");

    if current < 1 {
        tracing::info!("creating accounts, tracking and reward tables");
        v001_initial::up(conn).map_err(|e| StoreError::Migration(e.to_string()))?;
        conn.pragma_update(None, "user_version", 1)?;
    }

    Ok(())
}
