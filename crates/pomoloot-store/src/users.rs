//! CRUD operations for [`User`] and [`Session`] records.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use pomoloot_shared::UserId;

use crate::convert::{ts, ts_at, uuid_at};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Session, User};

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at";

impl Database {
    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Insert a new user. The email must already be normalized and
    /// `password_hash` is the full PHC string.
    ///
    /// Returns [`StoreError::Conflict`] when the email is taken.
    pub fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User> {
        let user = User {
            id: UserId::new(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };

        self.conn()
            .execute(
                "INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![
                    user.id.to_string(),
                    user.name,
                    user.email,
                    user.password_hash,
                    ts(&user.created_at),
                ],
            )
            .map_err(|e| StoreError::from_insert(e, "Email"))?;

        tracing::info!(user = %user.id, "user registered");
        Ok(user)
    }

    pub fn get_user(&self, id: UserId) -> Result<User> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id.to_string()],
                row_to_user,
            )
            .map_err(StoreError::from_query)
    }

    /// Look a user up by (normalized) email.
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                row_to_user,
            )
            .optional()?)
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    pub fn create_session(
        &self,
        token_hash: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<Session> {
        let session = Session {
            token_hash: token_hash.to_string(),
            user_id,
            created_at: Utc::now(),
            expires_at,
        };

        self.conn().execute(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session.token_hash,
                session.user_id.to_string(),
                ts(&session.created_at),
                ts(&session.expires_at),
            ],
        )?;
        Ok(session)
    }

    /// Resolve a token hash to the user it belongs to, if the session is
    /// still valid at `now`.
    pub fn user_for_session(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<User>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT u.id, u.name, u.email, u.password_hash, u.created_at
                 FROM sessions s
                 JOIN users u ON u.id = s.user_id
                 WHERE s.token_hash = ?1 AND s.expires_at > ?2",
                params![token_hash, ts(&now)],
                row_to_user,
            )
            .optional()?)
    }

    /// Drop every session that expired before `now`. Returns how many.
    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        let affected = self
            .conn()
            .execute("DELETE FROM sessions WHERE expires_at <= ?1", params![ts(&now)])?;
        Ok(affected)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId(uuid_at(row, 0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: ts_at(row, 4)?,
    })
}
