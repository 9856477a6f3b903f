//! SQLite implementation of the reward engine's storage collaborator.
//!
//! Claims run through [`Database::claim_reward`], which opens an immediate
//! (write-locking) transaction, hands a [`SqlLedger`] over it to the engine,
//! and commits only when the claim succeeds. Two concurrent claims on the same
//! activity therefore serialize, and a failed claim leaves nothing behind.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use pomoloot_shared::eligibility::{self, Eligibility, RewardStatus};
use pomoloot_shared::ledger::{LedgerResult, RewardLedger};
use pomoloot_shared::time::TimeSpan;
use pomoloot_shared::{
    claim, ActivityId, CatalogSnapshot, ClaimError, ClaimOutcome, MasteryRecord, RandomSource,
    RewardRecord, TrackedActivity, UserId,
};

use crate::convert::{ts, uuid_at};
use crate::database::Database;
use crate::rewards;
use crate::time_entries;

/// [`RewardLedger`] over a borrowed connection or transaction.
pub struct SqlLedger<'c> {
    conn: &'c Connection,
}

impl<'c> SqlLedger<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl RewardLedger for SqlLedger<'_> {
    fn load_activity(&mut self, id: ActivityId) -> LedgerResult<Option<TrackedActivity>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, user_id, name, intervals_rewarded FROM activities
                 WHERE id = ?1 AND deleted_at IS NULL",
                params![id.to_string()],
                row_to_tracked,
            )
            .optional()?)
    }

    fn list_time_spans(&mut self, activity: ActivityId) -> LedgerResult<Vec<TimeSpan>> {
        Ok(time_entries::spans_for_activity(self.conn, activity)?)
    }

    fn list_activities(&mut self, user: UserId) -> LedgerResult<Vec<TrackedActivity>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, intervals_rewarded FROM activities
             WHERE user_id = ?1 AND deleted_at IS NULL
             ORDER BY name COLLATE NOCASE ASC",
        )?;

        let rows = stmt.query_map(params![user.to_string()], row_to_tracked)?;

        let mut activities = Vec::new();
        for row in rows {
            activities.push(row?);
        }
        Ok(activities)
    }

    fn save_activity(&mut self, activity: &TrackedActivity) -> LedgerResult<()> {
        self.conn.execute(
            "UPDATE activities SET intervals_rewarded = ?1, updated_at = ?2 WHERE id = ?3",
            params![
                activity.intervals_rewarded,
                ts(&Utc::now()),
                activity.id.to_string(),
            ],
        )?;
        Ok(())
    }

    fn create_reward(&mut self, reward: &RewardRecord) -> LedgerResult<()> {
        Ok(rewards::insert_reward(self.conn, reward)?)
    }

    fn load_mastery(
        &mut self,
        user: UserId,
        champion_id: &str,
    ) -> LedgerResult<Option<MasteryRecord>> {
        Ok(rewards::load_mastery(self.conn, user, champion_id)?)
    }

    fn upsert_mastery(&mut self, record: &MasteryRecord) -> LedgerResult<()> {
        Ok(rewards::upsert_mastery(self.conn, record)?)
    }
}

fn row_to_tracked(row: &rusqlite::Row<'_>) -> rusqlite::Result<TrackedActivity> {
    Ok(TrackedActivity {
        id: ActivityId(uuid_at(row, 0)?),
        user_id: UserId(uuid_at(row, 1)?),
        name: row.get(2)?,
        intervals_rewarded: row.get(3)?,
    })
}

fn storage(err: rusqlite::Error) -> ClaimError {
    ClaimError::Storage(Box::new(err))
}

impl Database {
    /// Claim one reward for `activity` atomically.
    pub fn claim_reward(
        &mut self,
        user: UserId,
        activity: ActivityId,
        catalog: &CatalogSnapshot,
        rng: &mut dyn RandomSource,
    ) -> Result<ClaimOutcome, ClaimError> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(storage)?;

        // Dropping `tx` without committing rolls back.
        let outcome = claim(&mut SqlLedger::new(&tx), catalog, rng, user, activity)?;

        tx.commit().map_err(storage)?;
        Ok(outcome)
    }

    /// Claimable rewards across every live activity of `user`.
    pub fn reward_status(&self, user: UserId) -> Result<RewardStatus, ClaimError> {
        eligibility::reward_status(&mut SqlLedger::new(self.conn()), user)
    }

    /// Eligibility of one activity owned by `user`.
    pub fn activity_eligibility(
        &self,
        user: UserId,
        activity: ActivityId,
    ) -> Result<Eligibility, ClaimError> {
        let mut ledger = SqlLedger::new(self.conn());
        let tracked = ledger
            .load_activity(activity)?
            .filter(|a| a.user_id == user)
            .ok_or(ClaimError::NotFound(activity))?;
        eligibility::assess_activity(&mut ledger, &tracked)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use chrono::{DateTime, Duration};

    use pomoloot_shared::catalog::{Champion, Item};
    use pomoloot_shared::random::ScriptedRandom;
    use pomoloot_shared::RewardType;

    use super::*;
    use crate::models::ActivityInput;

    fn catalog() -> CatalogSnapshot {
        CatalogSnapshot::new(
            "14.1.1",
            vec![Champion {
                id: "Ahri".into(),
                name: "Ahri".into(),
                title: "the Nine-Tailed Fox".into(),
            }],
            vec![Item {
                id: "3031".into(),
                name: "Infinity Edge".into(),
            }],
            vec![],
            vec![],
        )
    }

    fn setup(tracked_secs: i64) -> (Database, UserId, ActivityId) {
        let mut db = Database::open_in_memory().unwrap();
        let (user, activity) = seed(&mut db, tracked_secs);
        (db, user, activity)
    }

    fn seed(db: &mut Database, tracked_secs: i64) -> (UserId, ActivityId) {
        let user = db.create_user("Ana", "ana@example.com", "h").unwrap().id;
        let activity = db
            .create_activity(
                user,
                &ActivityInput {
                    name: "Deep work".into(),
                    main_category_name: "Work".into(),
                    ..Default::default()
                },
            )
            .unwrap()
            .id;

        let start: DateTime<Utc> = Utc::now() - Duration::days(1);
        db.insert_time_entry(
            user,
            activity,
            start,
            Some(start + Duration::seconds(tracked_secs)),
            None,
        )
        .unwrap();
        (user, activity)
    }

    fn counter(db: &Database, activity: ActivityId) -> u32 {
        db.conn()
            .query_row(
                "SELECT intervals_rewarded FROM activities WHERE id = ?1",
                params![activity.to_string()],
                |r| r.get(0),
            )
            .unwrap()
    }

    #[test]
    fn claim_persists_reward_and_counter() {
        let (mut db, user, activity) = setup(2 * 900 + 30);
        // 30 minutes tier, roll 0 -> item
        let mut rng = ScriptedRandom::new([0, 0]);

        let outcome = db.claim_reward(user, activity, &catalog(), &mut rng).unwrap();
        assert_eq!(outcome.reward.record.reward_type, RewardType::Item);
        assert_eq!(outcome.intervals_remaining, 1);
        assert_eq!(outcome.total_minutes, 30);

        assert_eq!(counter(&db, activity), 1);
        assert_eq!(db.list_rewards(user).unwrap().len(), 1);

        let e = db.activity_eligibility(user, activity).unwrap();
        assert_eq!(e.claimable, 1);
        assert!((e.progress - 30.0 / 900.0).abs() < 1e-12);
    }

    #[test]
    fn failed_generation_rolls_back() {
        let (mut db, user, activity) = setup(900);
        // 15 minutes tier, roll 95 -> icon; the catalog has none
        let mut rng = ScriptedRandom::new([95]);

        let err = db
            .claim_reward(user, activity, &catalog(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, ClaimError::GenerationUnavailable(RewardType::Icon)));
        assert_eq!(counter(&db, activity), 0);
        assert!(db.list_rewards(user).unwrap().is_empty());
    }

    #[test]
    fn champion_claims_build_mastery() {
        let (mut db, user, activity) = setup(3 * 900);
        // 45 minutes tier: item 25, champion 35 -> roll 30 is a champion
        let mut rng = ScriptedRandom::new([30, 0, 30, 0]);

        let first = db.claim_reward(user, activity, &catalog(), &mut rng).unwrap();
        assert!(!first.reward.is_duplicate);
        let second = db.claim_reward(user, activity, &catalog(), &mut rng).unwrap();
        assert!(second.reward.is_duplicate);
        assert_eq!(second.reward.mastery_level, 2);

        let collection = db.reward_collection(user).unwrap();
        assert_eq!(collection.stats.total_rewards, 2);
        assert_eq!(collection.stats.champions_collected, 1);
        assert_eq!(collection.mastery[0].times_obtained, 2);
    }

    #[test]
    fn backlog_is_drained_one_claim_at_a_time() {
        let (mut db, user, activity) = setup(3 * 900);
        let mut rng = ScriptedRandom::default();

        for remaining in (0..3).rev() {
            let outcome = db.claim_reward(user, activity, &catalog(), &mut rng).unwrap();
            assert_eq!(outcome.intervals_remaining, remaining);
        }
        let err = db
            .claim_reward(user, activity, &catalog(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, ClaimError::NothingToClaim { .. }));
        assert_eq!(counter(&db, activity), 3);
    }

    #[test]
    fn racing_connections_cannot_double_claim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("claims.db");
        let (user, activity) = seed(&mut Database::open_at(&path).unwrap(), 900);

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let path = path.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let mut db = Database::open_at(&path).unwrap();
                    let mut rng = ScriptedRandom::default();
                    barrier.wait();
                    db.claim_reward(user, activity, &catalog(), &mut rng)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(ClaimError::NothingToClaim { .. }))));

        let db = Database::open_at(&path).unwrap();
        assert_eq!(counter(&db, activity), 1);
        assert_eq!(db.list_rewards(user).unwrap().len(), 1);
    }

    #[test]
    fn claim_waits_for_a_held_write_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("claims.db");
        let mut holder = Database::open_at(&path).unwrap();
        let (user, activity) = seed(&mut holder, 900);

        // Another writer grants the interval first while holding the lock.
        let tx = holder
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .unwrap();

        let claimer = thread::spawn(move || {
            let mut db = Database::open_at(&path).unwrap();
            let mut rng = ScriptedRandom::default();
            db.claim_reward(user, activity, &catalog(), &mut rng)
        });

        thread::sleep(std::time::Duration::from_millis(200));
        tx.execute(
            "UPDATE activities SET intervals_rewarded = 1 WHERE id = ?1",
            params![activity.to_string()],
        )
        .unwrap();
        tx.commit().unwrap();

        let result = claimer.join().unwrap();
        assert!(matches!(result, Err(ClaimError::NothingToClaim { .. })));
        assert!(holder.list_rewards(user).unwrap().is_empty());
        assert_eq!(counter(&holder, activity), 1);
    }

    #[test]
    fn foreign_and_deleted_activities_cannot_be_claimed() {
        let (mut db, user, activity) = setup(900);
        let other = db.create_user("Bo", "bo@example.com", "h").unwrap().id;
        let mut rng = ScriptedRandom::default();

        assert!(matches!(
            db.claim_reward(other, activity, &catalog(), &mut rng),
            Err(ClaimError::NotFound(_))
        ));

        db.delete_activity(user, activity).unwrap();
        assert!(matches!(
            db.claim_reward(user, activity, &catalog(), &mut rng),
            Err(ClaimError::NotFound(_))
        ));
        assert_eq!(db.reward_status(user).unwrap().total_claimable, 0);
    }

    #[test]
    fn status_lists_tracked_activities() {
        let (db, user, activity) = setup(2 * 900 + 450);
        let status = db.reward_status(user).unwrap();
        assert_eq!(status.total_claimable, 2);
        assert_eq!(status.activities.len(), 1);
        assert_eq!(status.activities[0].activity_id, activity);
        assert_eq!(status.activities[0].progress_to_next, 0.5);
    }
}
