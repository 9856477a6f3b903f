//! Time entries: the start/stop timer, manual corrections and period
//! summaries.
//!
//! A user has at most one running entry (`end_time IS NULL`). Starting a
//! timer stops the running one first, in the same transaction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use pomoloot_shared::time::{self, format_duration, Period, TimeSpan};
use pomoloot_shared::{ActivityId, TimeEntryId, UserId};

use crate::convert::{opt_ts_at, ts, ts_at, uuid_at};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{
    ActiveTimer, ActivityResume, Resume, StartedTimer, StoppedTimer, TimeEntry, TimerStart,
    TimerStatus,
};

const ENTRY_COLUMNS: &str =
    "te.id, te.user_id, te.activity_id, te.start_time, te.end_time, te.notes, te.created_at";

/// Number of activities listed in a period summary.
const RESUME_TOP: usize = 3;

impl Database {
    // ------------------------------------------------------------------
    // Timer
    // ------------------------------------------------------------------

    /// Start a timer on `activity`, stopping whatever was running.
    pub fn start_timer(
        &mut self,
        user: UserId,
        activity: ActivityId,
        now: DateTime<Utc>,
    ) -> Result<TimerStart> {
        let tx = self.conn_mut().transaction()?;

        let activity_name = live_activity_name(&tx, user, activity)?;
        let stopped_previous = stop_running(&tx, user, now)?;

        let id = TimeEntryId::new();
        tx.execute(
            "INSERT INTO time_entries (id, user_id, activity_id, start_time, end_time, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, NULL, NULL, ?4)",
            params![id.to_string(), user.to_string(), activity.to_string(), ts(&now)],
        )?;
        tx.commit()?;

        if let Some(prev) = &stopped_previous {
            tracing::info!(%user, entry = %prev.id, "auto-stopped previous timer");
        }
        tracing::debug!(%user, entry = %id, %activity, "timer started");

        Ok(TimerStart {
            started_new: StartedTimer {
                id,
                activity_id: activity,
                activity_name,
                start_time: now,
                end_time: None,
                status: TimerStatus::Running,
            },
            stopped_previous,
        })
    }

    /// Stop the running timer. [`StoreError::NotFound`] when nothing runs.
    pub fn stop_timer(&self, user: UserId, now: DateTime<Utc>) -> Result<StoppedTimer> {
        stop_running(self.conn(), user, now)?.ok_or(StoreError::NotFound)
    }

    pub fn active_timer(&self, user: UserId, now: DateTime<Utc>) -> Result<Option<ActiveTimer>> {
        let Some((entry, activity_name)) = running_entry(self.conn(), user)? else {
            return Ok(None);
        };

        let elapsed = u64::try_from((now - entry.start_time).num_seconds()).unwrap_or(0);
        Ok(Some(ActiveTimer {
            id: entry.id,
            activity_id: entry.activity_id,
            activity_name,
            start_time: entry.start_time,
            elapsed_seconds: elapsed,
            elapsed: format_duration(elapsed),
            status: TimerStatus::Running,
        }))
    }

    // ------------------------------------------------------------------
    // Entries
    // ------------------------------------------------------------------

    /// Record an entry directly, e.g. to backfill forgotten time.
    pub fn insert_time_entry(
        &self,
        user: UserId,
        activity: ActivityId,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        notes: Option<&str>,
    ) -> Result<TimeEntry> {
        if end.is_some_and(|end| end < start) {
            return Err(StoreError::Invalid("Time entry ends before it starts".into()));
        }
        live_activity_name(self.conn(), user, activity)?;

        let entry = TimeEntry {
            id: TimeEntryId::new(),
            user_id: user,
            activity_id: activity,
            start_time: start,
            end_time: end,
            notes: notes.map(str::to_string),
            created_at: Utc::now(),
        };

        self.conn()
            .execute(
                "INSERT INTO time_entries (id, user_id, activity_id, start_time, end_time, notes, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    entry.id.to_string(),
                    user.to_string(),
                    activity.to_string(),
                    ts(&entry.start_time),
                    entry.end_time.as_ref().map(ts),
                    entry.notes,
                    ts(&entry.created_at),
                ],
            )
            .map_err(|e| StoreError::from_insert(e, "Running timer"))?;
        Ok(entry)
    }

    /// Every entry of an activity, newest first.
    pub fn list_time_entries(&self, activity: ActivityId) -> Result<Vec<TimeEntry>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM time_entries te
             WHERE te.activity_id = ?1
             ORDER BY te.start_time DESC"
        ))?;

        let rows = stmt.query_map(params![activity.to_string()], row_to_entry)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Hard delete, for corrections. Claimed rewards are not revoked.
    pub fn delete_time_entry(&self, user: UserId, id: TimeEntryId) -> Result<()> {
        let affected = self.conn().execute(
            "DELETE FROM time_entries WHERE id = ?1 AND user_id = ?2",
            params![id.to_string(), user.to_string()],
        )?;

        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Period summary
    // ------------------------------------------------------------------

    /// Top activities by completed time started within `period`.
    pub fn resume(&self, user: UserId, period: Period, now: DateTime<Utc>) -> Result<Resume> {
        let (start, end) = period.bounds(now);

        let mut stmt = self.conn().prepare(
            "SELECT te.activity_id, a.name, te.id, te.start_time, te.end_time
             FROM time_entries te
             JOIN activities a ON a.id = te.activity_id
             WHERE te.user_id = ?1
               AND te.start_time >= ?2 AND te.start_time <= ?3
               AND te.end_time IS NOT NULL
               AND a.deleted_at IS NULL",
        )?;

        let rows = stmt.query_map(params![user.to_string(), ts(&start), ts(&end)], |row| {
            Ok((
                ActivityId(uuid_at(row, 0)?),
                row.get::<_, String>(1)?,
                TimeSpan {
                    entry_id: TimeEntryId(uuid_at(row, 2)?),
                    start: ts_at(row, 3)?,
                    end: opt_ts_at(row, 4)?,
                },
            ))
        })?;

        let mut grouped: HashMap<ActivityId, (String, Vec<TimeSpan>)> = HashMap::new();
        for row in rows {
            let (id, name, span) = row?;
            grouped.entry(id).or_insert_with(|| (name, Vec::new())).1.push(span);
        }

        let mut activities = Vec::with_capacity(grouped.len());
        let mut overall = 0u64;
        for (id, (name, spans)) in grouped {
            let totals = time::aggregate(&spans)?;
            overall += totals.total_seconds;
            activities.push(ActivityResume {
                activity_id: id,
                activity_name: name,
                total_seconds: totals.total_seconds,
                total_time: format_duration(totals.total_seconds),
                entry_count: totals.entry_count,
                percentage: 0.0,
            });
        }

        activities.sort_by(|a, b| {
            b.total_seconds
                .cmp(&a.total_seconds)
                .then_with(|| a.activity_name.cmp(&b.activity_name))
        });
        activities.truncate(RESUME_TOP);

        if overall > 0 {
            for a in &mut activities {
                a.percentage = a.total_seconds as f64 / overall as f64 * 100.0;
            }
        }

        Ok(Resume {
            period,
            total_seconds: overall,
            total_time: format_duration(overall),
            activities,
        })
    }
}

// ---------------------------------------------------------------------------
// Connection-level helpers
// ---------------------------------------------------------------------------

/// Spans of every entry recorded against an activity.
pub(crate) fn spans_for_activity(conn: &Connection, activity: ActivityId) -> Result<Vec<TimeSpan>> {
    let mut stmt = conn.prepare(
        "SELECT id, start_time, end_time FROM time_entries WHERE activity_id = ?1",
    )?;

    let rows = stmt.query_map(params![activity.to_string()], |row| {
        Ok(TimeSpan {
            entry_id: TimeEntryId(uuid_at(row, 0)?),
            start: ts_at(row, 1)?,
            end: opt_ts_at(row, 2)?,
        })
    })?;

    let mut spans = Vec::new();
    for row in rows {
        spans.push(row?);
    }
    Ok(spans)
}

pub(crate) fn span_of(entry: &TimeEntry) -> TimeSpan {
    TimeSpan {
        entry_id: entry.id,
        start: entry.start_time,
        end: entry.end_time,
    }
}

fn live_activity_name(conn: &Connection, user: UserId, activity: ActivityId) -> Result<String> {
    conn.query_row(
        "SELECT name FROM activities WHERE id = ?1 AND user_id = ?2 AND deleted_at IS NULL",
        params![activity.to_string(), user.to_string()],
        |row| row.get(0),
    )
    .map_err(StoreError::from_query)
}

/// The running entry of `user` with its activity name.
fn running_entry(conn: &Connection, user: UserId) -> Result<Option<(TimeEntry, String)>> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {ENTRY_COLUMNS}, a.name
                 FROM time_entries te
                 JOIN activities a ON a.id = te.activity_id
                 WHERE te.user_id = ?1 AND te.end_time IS NULL"
            ),
            params![user.to_string()],
            |row| Ok((row_to_entry(row)?, row.get::<_, String>(7)?)),
        )
        .optional()?)
}

fn stop_running(conn: &Connection, user: UserId, now: DateTime<Utc>) -> Result<Option<StoppedTimer>> {
    let Some((entry, activity_name)) = running_entry(conn, user)? else {
        return Ok(None);
    };

    // A clock step backwards must not produce a negative entry.
    let end = now.max(entry.start_time);
    conn.execute(
        "UPDATE time_entries SET end_time = ?1 WHERE id = ?2",
        params![ts(&end), entry.id.to_string()],
    )?;

    let duration = u64::try_from((end - entry.start_time).num_seconds()).unwrap_or(0);
    Ok(Some(StoppedTimer {
        id: entry.id,
        activity_id: entry.activity_id,
        activity_name,
        start_time: entry.start_time,
        end_time: end,
        duration_seconds: duration,
        duration: format_duration(duration),
        status: TimerStatus::Stopped,
    }))
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<TimeEntry> {
    Ok(TimeEntry {
        id: TimeEntryId(uuid_at(row, 0)?),
        user_id: UserId(uuid_at(row, 1)?),
        activity_id: ActivityId(uuid_at(row, 2)?),
        start_time: ts_at(row, 3)?,
        end_time: opt_ts_at(row, 4)?,
        notes: row.get(5)?,
        created_at: ts_at(row, 6)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::models::ActivityInput;

    fn setup() -> (Database, UserId, ActivityId, ActivityId) {
        let mut db = Database::open_in_memory().unwrap();
        let user = db.create_user("Ana", "ana@example.com", "h").unwrap().id;
        let mut make = |name: &str| {
            db.create_activity(
                user,
                &ActivityInput {
                    name: name.into(),
                    main_category_name: "General".into(),
                    ..Default::default()
                },
            )
            .unwrap()
            .id
        };
        let piano = make("Piano");
        let reading = make("Reading");
        (db, user, piano, reading)
    }

    #[test]
    fn start_auto_stops_running_timer() {
        let (mut db, user, piano, reading) = setup();
        let t0 = Utc::now() - Duration::minutes(30);

        let first = db.start_timer(user, piano, t0).unwrap();
        assert!(first.stopped_previous.is_none());
        assert_eq!(first.started_new.activity_name, "Piano");

        let second = db.start_timer(user, reading, t0 + Duration::minutes(20)).unwrap();
        let stopped = second.stopped_previous.unwrap();
        assert_eq!(stopped.id, first.started_new.id);
        assert_eq!(stopped.duration_seconds, 20 * 60);
        assert_eq!(stopped.duration, "20m");

        let active = db
            .active_timer(user, t0 + Duration::minutes(25))
            .unwrap()
            .unwrap();
        assert_eq!(active.activity_id, reading);
        assert_eq!(active.elapsed_seconds, 5 * 60);
    }

    #[test]
    fn stop_without_running_timer_is_not_found() {
        let (db, user, _, _) = setup();
        assert!(matches!(
            db.stop_timer(user, Utc::now()),
            Err(StoreError::NotFound)
        ));
        assert!(db.active_timer(user, Utc::now()).unwrap().is_none());
    }

    #[test]
    fn stop_records_end_time() {
        let (mut db, user, piano, _) = setup();
        let t0 = Utc::now() - Duration::hours(1);
        db.start_timer(user, piano, t0).unwrap();

        let stopped = db.stop_timer(user, t0 + Duration::seconds(901)).unwrap();
        assert_eq!(stopped.status, TimerStatus::Stopped);
        assert_eq!(stopped.duration_seconds, 901);

        let entries = db.list_time_entries(piano).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].end_time, Some(t0 + Duration::seconds(901)));
    }

    #[test]
    fn start_on_foreign_or_deleted_activity_fails() {
        let (mut db, user, piano, _) = setup();
        let other = db.create_user("Bo", "bo@example.com", "h").unwrap().id;
        assert!(matches!(
            db.start_timer(other, piano, Utc::now()),
            Err(StoreError::NotFound)
        ));

        db.delete_activity(user, piano).unwrap();
        assert!(matches!(
            db.start_timer(user, piano, Utc::now()),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn manual_entries_are_validated() {
        let (db, user, piano, _) = setup();
        let t0 = Utc::now();
        assert!(matches!(
            db.insert_time_entry(user, piano, t0, Some(t0 - Duration::seconds(1)), None),
            Err(StoreError::Invalid(_))
        ));

        db.insert_time_entry(user, piano, t0, None, None).unwrap();
        assert!(matches!(
            db.insert_time_entry(user, piano, t0, None, None),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn delete_entry_is_scoped_to_owner() {
        let (db, user, piano, _) = setup();
        let other = db.create_user("Bo", "bo@example.com", "h").unwrap().id;
        let t0 = Utc::now() - Duration::hours(1);
        let entry = db
            .insert_time_entry(user, piano, t0, Some(t0 + Duration::minutes(5)), None)
            .unwrap();

        assert!(matches!(
            db.delete_time_entry(other, entry.id),
            Err(StoreError::NotFound)
        ));
        db.delete_time_entry(user, entry.id).unwrap();
        assert!(db.list_time_entries(piano).unwrap().is_empty());
    }

    #[test]
    fn resume_ranks_activities_in_period() {
        let (mut db, user, piano, reading) = setup();
        let writing = db
            .create_activity(
                user,
                &ActivityInput {
                    name: "Writing".into(),
                    main_category_name: "General".into(),
                    ..Default::default()
                },
            )
            .unwrap()
            .id;
        let chess = db
            .create_activity(
                user,
                &ActivityInput {
                    name: "Chess".into(),
                    main_category_name: "Games".into(),
                    ..Default::default()
                },
            )
            .unwrap()
            .id;

        // Thursday afternoon.
        let now = Utc.with_ymd_and_hms(2024, 3, 14, 18, 0, 0).unwrap();
        let today = Utc.with_ymd_and_hms(2024, 3, 14, 9, 0, 0).unwrap();
        let add = |activity, start: DateTime<Utc>, mins: i64| {
            db.insert_time_entry(user, activity, start, Some(start + Duration::minutes(mins)), None)
                .unwrap();
        };
        add(piano, today, 60);
        add(reading, today + Duration::hours(2), 30);
        add(writing, today + Duration::hours(3), 20);
        add(chess, today + Duration::hours(4), 10);
        // Last week: outside the week and day periods.
        add(chess, today - Duration::days(8), 500);

        let day = db.resume(user, Period::Day, now).unwrap();
        assert_eq!(day.total_seconds, 120 * 60);
        assert_eq!(day.total_time, "2h");
        let names: Vec<_> = day.activities.iter().map(|a| a.activity_name.as_str()).collect();
        assert_eq!(names, vec!["Piano", "Reading", "Writing"]);
        assert!((day.activities[0].percentage - 50.0).abs() < 1e-9);

        let month = db.resume(user, Period::Month, now).unwrap();
        assert_eq!(month.activities[0].activity_name, "Chess");
        assert_eq!(month.activities[0].entry_count, 2);

        // Deleted activities drop out of the summary.
        db.delete_activity(user, piano).unwrap();
        let day = db.resume(user, Period::Day, now).unwrap();
        assert_eq!(day.total_seconds, 60 * 60);
    }
}
