//! v001 -- Initial schema creation.
//!
//! Accounts (`users`, `sessions`), labels (`categories`, `tags`), tracking
//! (`activities`, `activity_tags`, `time_entries`) and the reward ledger
//! (`rewards`, `champion_mastery`).
//!
//! Label uniqueness is enforced on `name_key`, the Unicode lower-cased name
//! computed on the Rust side. SQLite's `NOCASE` only folds ASCII.
//!
//! Timestamps are fixed-width RFC-3339 UTC strings, so text comparison and
//! `ORDER BY` follow chronological order.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users & sessions
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,       -- lower-cased
    password_hash TEXT NOT NULL,              -- Argon2id PHC string
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY NOT NULL,     -- hex BLAKE3 of the bearer token
    user_id    TEXT NOT NULL,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);

-- ----------------------------------------------------------------
-- Categories & tags (global, soft-deleted)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS categories (
    id         TEXT PRIMARY KEY NOT NULL,
    name       TEXT NOT NULL,
    name_key   TEXT NOT NULL,                 -- Unicode lower-cased name
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_live_name
    ON categories(name_key) WHERE deleted_at IS NULL;

CREATE TABLE IF NOT EXISTS tags (
    id         TEXT PRIMARY KEY NOT NULL,
    name       TEXT NOT NULL,
    name_key   TEXT NOT NULL,                 -- Unicode lower-cased name
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_tags_live_name
    ON tags(name_key) WHERE deleted_at IS NULL;

-- ----------------------------------------------------------------
-- Activities
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS activities (
    id                 TEXT PRIMARY KEY NOT NULL,
    user_id            TEXT NOT NULL,
    name               TEXT NOT NULL,
    main_category_id   TEXT NOT NULL,
    sub_category_id    TEXT,
    intervals_rewarded INTEGER NOT NULL DEFAULT 0 CHECK (intervals_rewarded >= 0),
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL,
    deleted_at         TEXT,

    FOREIGN KEY (user_id)          REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (main_category_id) REFERENCES categories(id),
    FOREIGN KEY (sub_category_id)  REFERENCES categories(id)
);

CREATE INDEX IF NOT EXISTS idx_activities_user ON activities(user_id, deleted_at);

CREATE TABLE IF NOT EXISTS activity_tags (
    activity_id TEXT NOT NULL,
    tag_id      TEXT NOT NULL,

    PRIMARY KEY (activity_id, tag_id),
    FOREIGN KEY (activity_id) REFERENCES activities(id) ON DELETE CASCADE,
    FOREIGN KEY (tag_id)      REFERENCES tags(id)
);

-- ----------------------------------------------------------------
-- Time entries (end_time NULL while running)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS time_entries (
    id          TEXT PRIMARY KEY NOT NULL,
    user_id     TEXT NOT NULL,
    activity_id TEXT NOT NULL,
    start_time  TEXT NOT NULL,
    end_time    TEXT,
    notes       TEXT,
    created_at  TEXT NOT NULL,

    FOREIGN KEY (user_id)     REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (activity_id) REFERENCES activities(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_time_entries_activity ON time_entries(activity_id);
CREATE INDEX IF NOT EXISTS idx_time_entries_user_start ON time_entries(user_id, start_time);

-- At most one running timer per user.
CREATE UNIQUE INDEX IF NOT EXISTS idx_time_entries_running
    ON time_entries(user_id) WHERE end_time IS NULL;

-- ----------------------------------------------------------------
-- Rewards (append-only) & champion mastery
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS rewards (
    id          TEXT PRIMARY KEY NOT NULL,
    user_id     TEXT NOT NULL,
    reward_type TEXT NOT NULL,                -- item | champion | skin | icon
    external_id TEXT NOT NULL,
    name        TEXT NOT NULL,
    image_url   TEXT NOT NULL,
    rarity      TEXT NOT NULL,                -- common | rare | epic
    created_at  TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_rewards_user_created ON rewards(user_id, created_at DESC);

CREATE TABLE IF NOT EXISTS champion_mastery (
    user_id        TEXT NOT NULL,
    champion_id    TEXT NOT NULL,
    champion_name  TEXT NOT NULL,
    image_url      TEXT NOT NULL,
    times_obtained INTEGER NOT NULL,
    mastery_level  INTEGER NOT NULL CHECK (mastery_level BETWEEN 1 AND 7),
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL,

    PRIMARY KEY (user_id, champion_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
