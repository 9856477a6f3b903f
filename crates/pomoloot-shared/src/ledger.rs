//! Storage collaborator used by the reward engine.
//!
//! The store crate implements this on top of a SQLite transaction; the claim
//! orchestration only ever talks to storage through it.

use crate::error::LedgerError;
use crate::records::{MasteryRecord, RewardRecord, TrackedActivity};
use crate::time::TimeSpan;
use crate::types::{ActivityId, UserId};

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

pub trait RewardLedger {
    /// Load a non-deleted activity.
    fn load_activity(&mut self, id: ActivityId) -> LedgerResult<Option<TrackedActivity>>;

    /// Every time entry recorded against the activity, running ones included.
    fn list_time_spans(&mut self, activity: ActivityId) -> LedgerResult<Vec<TimeSpan>>;

    /// Non-deleted activities owned by `user`.
    fn list_activities(&mut self, user: UserId) -> LedgerResult<Vec<TrackedActivity>>;

    /// Persist the activity's rewarded-interval counter.
    fn save_activity(&mut self, activity: &TrackedActivity) -> LedgerResult<()>;

    fn create_reward(&mut self, reward: &RewardRecord) -> LedgerResult<()>;

    fn load_mastery(&mut self, user: UserId, champion_id: &str) -> LedgerResult<Option<MasteryRecord>>;

    fn upsert_mastery(&mut self, record: &MasteryRecord) -> LedgerResult<()>;
}
