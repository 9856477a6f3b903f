//! CRUD operations for categories and tags.
//!
//! Both live in their own table with identical shape; [`LabelKind`] selects
//! the table. Names are unique among live rows, compared case-insensitively
//! through the stored `name_key` column (see [`name_key`]).

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use pomoloot_shared::constants::MAX_LABEL_NAME_LEN;

use crate::convert::{ts, ts_at, uuid_at};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Label, LabelKind};

impl Database {
    /// All live labels of a kind, ordered by name.
    pub fn list_labels(&self, kind: LabelKind) -> Result<Vec<Label>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT id, name, created_at, updated_at FROM {}
             WHERE deleted_at IS NULL
             ORDER BY name_key ASC",
            kind.table()
        ))?;

        let rows = stmt.query_map([], row_to_label)?;

        let mut labels = Vec::new();
        for row in rows {
            labels.push(row?);
        }
        Ok(labels)
    }

    pub fn get_label(&self, kind: LabelKind, id: Uuid) -> Result<Label> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT id, name, created_at, updated_at FROM {}
                     WHERE id = ?1 AND deleted_at IS NULL",
                    kind.table()
                ),
                params![id.to_string()],
                row_to_label,
            )
            .map_err(StoreError::from_query)
    }

    /// Rename a live label. Renaming onto another live label's name is a
    /// [`StoreError::Conflict`].
    pub fn rename_label(&self, kind: LabelKind, id: Uuid, name: &str) -> Result<Label> {
        let name = validate_name(kind.noun(), name, MAX_LABEL_NAME_LEN)?;
        let now = Utc::now();

        let affected = self
            .conn()
            .execute(
                &format!(
                    "UPDATE {} SET name = ?1, name_key = ?2, updated_at = ?3
                     WHERE id = ?4 AND deleted_at IS NULL",
                    kind.table()
                ),
                params![name, name_key(&name), ts(&now), id.to_string()],
            )
            .map_err(|e| StoreError::from_insert(e, kind.noun()))?;

        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_label(kind, id)
    }

    /// Soft delete. Activities keep pointing at the row.
    pub fn delete_label(&self, kind: LabelKind, id: Uuid) -> Result<()> {
        let affected = self.conn().execute(
            &format!(
                "UPDATE {} SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
                kind.table()
            ),
            params![ts(&Utc::now()), id.to_string()],
        )?;

        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        tracing::debug!(kind = kind.noun(), %id, "label soft-deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Connection-level helpers (usable inside transactions)
// ---------------------------------------------------------------------------

/// Trim `name` and check it is 1..=`max` characters.
pub(crate) fn validate_name(what: &str, name: &str, max: usize) -> Result<String> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > max {
        return Err(StoreError::Invalid(format!(
            "{what} name must be 1-{max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Comparison key for label names. Unlike SQLite's `NOCASE`, this folds
/// non-ASCII letters too, so `École` and `école` collide.
pub(crate) fn name_key(name: &str) -> String {
    name.to_lowercase()
}

/// Case-insensitive lookup among live labels, creating one when absent.
pub(crate) fn find_or_create(conn: &Connection, kind: LabelKind, name: &str) -> Result<Label> {
    let name = validate_name(kind.noun(), name, MAX_LABEL_NAME_LEN)?;
    let key = name_key(&name);

    let existing = conn
        .query_row(
            &format!(
                "SELECT id, name, created_at, updated_at FROM {}
                 WHERE name_key = ?1 AND deleted_at IS NULL",
                kind.table()
            ),
            params![key],
            row_to_label,
        )
        .optional()?;

    if let Some(label) = existing {
        return Ok(label);
    }

    let now = Utc::now();
    let label = Label {
        id: Uuid::new_v4(),
        name,
        created_at: now,
        updated_at: now,
    };

    conn.execute(
        &format!(
            "INSERT INTO {} (id, name, name_key, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            kind.table()
        ),
        params![label.id.to_string(), label.name, key, ts(&now)],
    )
    .map_err(|e| StoreError::from_insert(e, kind.noun()))?;

    tracing::debug!(kind = kind.noun(), name = %label.name, "label created");
    Ok(label)
}

/// Fetch a label by id, including soft-deleted ones.
pub(crate) fn label_by_id(conn: &Connection, kind: LabelKind, id: Uuid) -> Result<Label> {
    conn.query_row(
        &format!(
            "SELECT id, name, created_at, updated_at FROM {} WHERE id = ?1",
            kind.table()
        ),
        params![id.to_string()],
        row_to_label,
    )
    .map_err(StoreError::from_query)
}

pub(crate) fn row_to_label(row: &rusqlite::Row<'_>) -> rusqlite::Result<Label> {
    Ok(Label {
        id: uuid_at(row, 0)?,
        name: row.get(1)?,
        created_at: ts_at(row, 2)?,
        updated_at: ts_at(row, 3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_or_create_is_case_insensitive_and_trims() {
        let db = Database::open_in_memory().unwrap();
        let first = find_or_create(db.conn(), LabelKind::Category, "  Work ").unwrap();
        assert_eq!(first.name, "Work");

        let again = find_or_create(db.conn(), LabelKind::Category, "work").unwrap();
        assert_eq!(again.id, first.id);
        assert_eq!(db.list_labels(LabelKind::Category).unwrap().len(), 1);
    }

    #[test]
    fn non_ascii_names_fold_case() {
        let db = Database::open_in_memory().unwrap();
        let lower = find_or_create(db.conn(), LabelKind::Category, "école").unwrap();
        let upper = find_or_create(db.conn(), LabelKind::Category, "ÉCOLE").unwrap();
        assert_eq!(upper.id, lower.id);
        assert_eq!(upper.name, "école");
        assert_eq!(db.list_labels(LabelKind::Category).unwrap().len(), 1);

        find_or_create(db.conn(), LabelKind::Tag, "Ölmalerei").unwrap();
        let other = find_or_create(db.conn(), LabelKind::Tag, "Aquarell").unwrap();
        let err = db
            .rename_label(LabelKind::Tag, other.id, "ÖLMALEREI")
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn categories_and_tags_are_separate() {
        let db = Database::open_in_memory().unwrap();
        let cat = find_or_create(db.conn(), LabelKind::Category, "Music").unwrap();
        let tag = find_or_create(db.conn(), LabelKind::Tag, "Music").unwrap();
        assert_ne!(cat.id, tag.id);
        assert!(matches!(
            db.get_label(LabelKind::Tag, cat.id),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn rejects_empty_and_long_names() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            find_or_create(db.conn(), LabelKind::Tag, "   "),
            Err(StoreError::Invalid(_))
        ));
        let long = "x".repeat(51);
        assert!(matches!(
            find_or_create(db.conn(), LabelKind::Tag, &long),
            Err(StoreError::Invalid(_))
        ));
        assert!(find_or_create(db.conn(), LabelKind::Tag, &"x".repeat(50)).is_ok());
    }

    #[test]
    fn rename_conflicts_with_live_name() {
        let db = Database::open_in_memory().unwrap();
        let a = find_or_create(db.conn(), LabelKind::Tag, "focus").unwrap();
        find_or_create(db.conn(), LabelKind::Tag, "deep").unwrap();

        let err = db.rename_label(LabelKind::Tag, a.id, "DEEP").unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let renamed = db.rename_label(LabelKind::Tag, a.id, "flow").unwrap();
        assert_eq!(renamed.name, "flow");
    }

    #[test]
    fn soft_delete_hides_and_frees_the_name() {
        let db = Database::open_in_memory().unwrap();
        let old = find_or_create(db.conn(), LabelKind::Category, "Study").unwrap();
        db.delete_label(LabelKind::Category, old.id).unwrap();

        assert!(db.list_labels(LabelKind::Category).unwrap().is_empty());
        assert!(matches!(
            db.delete_label(LabelKind::Category, old.id),
            Err(StoreError::NotFound)
        ));

        let fresh = find_or_create(db.conn(), LabelKind::Category, "study").unwrap();
        assert_ne!(fresh.id, old.id);
        // Deleted rows stay readable for activities that reference them.
        assert_eq!(
            label_by_id(db.conn(), LabelKind::Category, old.id).unwrap().name,
            "Study"
        );
    }
}
