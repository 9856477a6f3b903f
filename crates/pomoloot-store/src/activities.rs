//! CRUD operations for [`Activity`] records.
//!
//! Activities are always scoped to their owner: reading, updating or
//! deleting someone else's activity is [`StoreError::NotFound`]. Deletion is
//! soft; the row and its time history are kept.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use pomoloot_shared::constants::MAX_ACTIVITY_NAME_LEN;
use pomoloot_shared::time::{self, format_duration};
use pomoloot_shared::{ActivityId, UserId};

use crate::convert::{opt_uuid_at, ts, ts_at, uuid_at};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::labels::{self, row_to_label, validate_name};
use crate::models::{
    Activity, ActivityInput, ActivityTime, ActivityWithStats, EntryWithDuration, LabelKind,
};
use crate::time_entries;

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Create an activity, finding or creating its categories and tags.
    pub fn create_activity(&mut self, user: UserId, input: &ActivityInput) -> Result<Activity> {
        let name = validate_name("Activity", &input.name, MAX_ACTIVITY_NAME_LEN)?;
        if input.main_category_name.trim().is_empty() {
            return Err(StoreError::Invalid("Main category is required".into()));
        }

        let tx = self.conn_mut().transaction()?;

        let main = labels::find_or_create(&tx, LabelKind::Category, &input.main_category_name)?;
        let sub = sub_category(&tx, input.sub_category_name.as_deref())?;

        let id = ActivityId::new();
        let now = ts(&Utc::now());
        tx.execute(
            "INSERT INTO activities
                (id, user_id, name, main_category_id, sub_category_id, intervals_rewarded, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6)",
            params![
                id.to_string(),
                user.to_string(),
                name,
                main.id.to_string(),
                sub.map(|s| s.to_string()),
                now,
            ],
        )?;

        if let Some(tag_names) = &input.tag_names {
            attach_tags(&tx, id, tag_names)?;
        }

        let activity = load(&tx, user, id)?;
        tx.commit()?;

        tracing::debug!(%user, activity = %id, "activity created");
        Ok(activity)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Live activities of `user`, ordered by name.
    pub fn list_activities(&self, user: UserId) -> Result<Vec<Activity>> {
        let mut stmt = self.conn().prepare(
            "SELECT id FROM activities
             WHERE user_id = ?1 AND deleted_at IS NULL
             ORDER BY name COLLATE NOCASE ASC",
        )?;

        let ids = stmt.query_map(params![user.to_string()], |row| uuid_at(row, 0))?;

        let mut activities = Vec::new();
        for id in ids {
            activities.push(load(self.conn(), user, ActivityId(id?))?);
        }
        Ok(activities)
    }

    pub fn get_activity(&self, user: UserId, id: ActivityId) -> Result<Activity> {
        load(self.conn(), user, id)
    }

    /// Live activities with lifetime totals and last tracked time.
    pub fn list_activities_with_stats(&self, user: UserId) -> Result<Vec<ActivityWithStats>> {
        let activities = self.list_activities(user)?;

        let mut result = Vec::with_capacity(activities.len());
        for activity in activities {
            let spans = time_entries::spans_for_activity(self.conn(), activity.id)?;
            let totals = time::aggregate(&spans)?;
            let last_tracked = spans.iter().filter_map(|s| s.end).max();

            result.push(ActivityWithStats {
                activity,
                total_seconds: totals.total_seconds,
                total_formatted: format_duration(totals.total_seconds),
                entry_count: totals.entry_count,
                last_tracked,
            });
        }
        Ok(result)
    }

    /// Time entries (newest first) and totals for one activity.
    pub fn activity_time(&self, user: UserId, id: ActivityId) -> Result<ActivityTime> {
        let activity = load(self.conn(), user, id)?;
        let entries = self.list_time_entries(id)?;

        let spans: Vec<_> = entries.iter().map(time_entries::span_of).collect();
        let totals = time::aggregate(&spans)?;

        let mut formatted = Vec::with_capacity(entries.len());
        for (entry, span) in entries.into_iter().zip(&spans) {
            formatted.push(EntryWithDuration {
                id: entry.id,
                start_time: entry.start_time,
                end_time: entry.end_time,
                duration_seconds: span.duration_secs()?,
                notes: entry.notes,
            });
        }

        Ok(ActivityTime {
            activity_id: activity.id,
            activity_name: activity.name,
            total_seconds: totals.total_seconds,
            total_formatted: format_duration(totals.total_seconds),
            entry_count: totals.entry_count,
            entries: formatted,
        })
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Rename and re-label an activity.
    ///
    /// An empty main category keeps the current one; a missing or empty sub
    /// category clears it; `tag_names: None` leaves tags untouched.
    pub fn update_activity(
        &mut self,
        user: UserId,
        id: ActivityId,
        input: &ActivityInput,
    ) -> Result<Activity> {
        let name = validate_name("Activity", &input.name, MAX_ACTIVITY_NAME_LEN)?;

        let tx = self.conn_mut().transaction()?;
        let current = load(&tx, user, id)?;

        let main = if input.main_category_name.trim().is_empty() {
            current.main_category.id
        } else {
            labels::find_or_create(&tx, LabelKind::Category, &input.main_category_name)?.id
        };
        let sub = sub_category(&tx, input.sub_category_name.as_deref())?;

        tx.execute(
            "UPDATE activities
             SET name = ?1, main_category_id = ?2, sub_category_id = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                name,
                main.to_string(),
                sub.map(|s| s.to_string()),
                ts(&Utc::now()),
                id.to_string(),
            ],
        )?;

        if let Some(tag_names) = &input.tag_names {
            tx.execute(
                "DELETE FROM activity_tags WHERE activity_id = ?1",
                params![id.to_string()],
            )?;
            attach_tags(&tx, id, tag_names)?;
        }

        let activity = load(&tx, user, id)?;
        tx.commit()?;
        Ok(activity)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Soft delete: the activity disappears from listings and reward status.
    pub fn delete_activity(&self, user: UserId, id: ActivityId) -> Result<()> {
        let now = ts(&Utc::now());
        let affected = self.conn().execute(
            "UPDATE activities SET deleted_at = ?1, updated_at = ?1
             WHERE id = ?2 AND user_id = ?3 AND deleted_at IS NULL",
            params![now, id.to_string(), user.to_string()],
        )?;

        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        tracing::debug!(%user, activity = %id, "activity soft-deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct ActivityRow {
    id: ActivityId,
    user_id: UserId,
    name: String,
    main_category_id: Uuid,
    sub_category_id: Option<Uuid>,
    intervals_rewarded: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Load a live activity owned by `user`, labels resolved.
fn load(conn: &Connection, user: UserId, id: ActivityId) -> Result<Activity> {
    let row = conn
        .query_row(
            "SELECT id, user_id, name, main_category_id, sub_category_id,
                    intervals_rewarded, created_at, updated_at
             FROM activities
             WHERE id = ?1 AND user_id = ?2 AND deleted_at IS NULL",
            params![id.to_string(), user.to_string()],
            |row| {
                Ok(ActivityRow {
                    id: ActivityId(uuid_at(row, 0)?),
                    user_id: UserId(uuid_at(row, 1)?),
                    name: row.get(2)?,
                    main_category_id: uuid_at(row, 3)?,
                    sub_category_id: opt_uuid_at(row, 4)?,
                    intervals_rewarded: row.get(5)?,
                    created_at: ts_at(row, 6)?,
                    updated_at: ts_at(row, 7)?,
                })
            },
        )
        .map_err(StoreError::from_query)?;

    let main_category = labels::label_by_id(conn, LabelKind::Category, row.main_category_id)?;
    let sub_category = row
        .sub_category_id
        .map(|sub| labels::label_by_id(conn, LabelKind::Category, sub))
        .transpose()?;

    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, t.created_at, t.updated_at
         FROM activity_tags at
         JOIN tags t ON t.id = at.tag_id
         WHERE at.activity_id = ?1 AND t.deleted_at IS NULL
         ORDER BY t.name_key ASC",
    )?;
    let rows = stmt.query_map(params![row.id.to_string()], row_to_label)?;
    let mut tags = Vec::new();
    for tag in rows {
        tags.push(tag?);
    }

    Ok(Activity {
        id: row.id,
        user_id: row.user_id,
        name: row.name,
        main_category,
        sub_category,
        tags,
        intervals_rewarded: row.intervals_rewarded,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn sub_category(conn: &Connection, name: Option<&str>) -> Result<Option<Uuid>> {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => Ok(Some(labels::find_or_create(conn, LabelKind::Category, name)?.id)),
        None => Ok(None),
    }
}

/// Link tags by name. Blank names are skipped, duplicates collapse.
fn attach_tags(conn: &Connection, activity: ActivityId, names: &[String]) -> Result<()> {
    for name in names.iter().filter(|n| !n.trim().is_empty()) {
        let tag = labels::find_or_create(conn, LabelKind::Tag, name)?;
        conn.execute(
            "INSERT OR IGNORE INTO activity_tags (activity_id, tag_id) VALUES (?1, ?2)",
            params![activity.to_string(), tag.id.to_string()],
        )?;
    }
    Ok(())
}
