//! Domain model structs persisted in the SQLite database.
//!
//! Most structs derive `Serialize` so the server can hand them straight to
//! the JSON API. Owner ids and credentials are never serialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pomoloot_shared::time::Period;
use pomoloot_shared::{ActivityId, MasteryRecord, RewardRecord, TimeEntryId, UserId};

// ---------------------------------------------------------------------------
// User & session
// ---------------------------------------------------------------------------

/// A registered account.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Always lower-cased.
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A server-side session. Only the hash of the bearer token is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token_hash: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Categories & tags
// ---------------------------------------------------------------------------

/// A category or a tag. Both are global name labels with soft delete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Label {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub type Category = Label;
pub type Tag = Label;

/// Which label table an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Category,
    Tag,
}

impl LabelKind {
    /// Table name, also the plural used in API payloads.
    pub fn table(&self) -> &'static str {
        match self {
            LabelKind::Category => "categories",
            LabelKind::Tag => "tags",
        }
    }

    /// Human-readable name used in error messages.
    pub fn noun(&self) -> &'static str {
        match self {
            LabelKind::Category => "Category",
            LabelKind::Tag => "Tag",
        }
    }
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

/// A trackable activity with its labels resolved.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Activity {
    pub id: ActivityId,
    #[serde(skip_serializing)]
    pub user_id: UserId,
    pub name: String,
    pub main_category: Category,
    pub sub_category: Option<Category>,
    pub tags: Vec<Tag>,
    /// Reward intervals already claimed. Only ever grows.
    pub intervals_rewarded: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create / update payload. Labels are given by name and found or created.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ActivityInput {
    pub name: String,
    #[serde(default)]
    pub main_category_name: String,
    #[serde(default)]
    pub sub_category_name: Option<String>,
    /// `None` on update leaves the tag set untouched.
    #[serde(default)]
    pub tag_names: Option<Vec<String>>,
}

/// Activity plus lifetime tracking totals.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActivityWithStats {
    #[serde(flatten)]
    pub activity: Activity,
    pub total_seconds: u64,
    pub total_formatted: String,
    pub entry_count: u64,
    /// End of the most recent completed entry.
    pub last_tracked: Option<DateTime<Utc>>,
}

/// Time history of a single activity.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActivityTime {
    pub activity_id: ActivityId,
    pub activity_name: String,
    pub total_seconds: u64,
    pub total_formatted: String,
    pub entry_count: u64,
    pub entries: Vec<EntryWithDuration>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EntryWithDuration {
    pub id: TimeEntryId,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// `None` while running.
    pub duration_seconds: Option<u64>,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Time entries & timer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TimeEntry {
    pub id: TimeEntryId,
    #[serde(skip_serializing)]
    pub user_id: UserId,
    pub activity_id: ActivityId,
    pub start_time: DateTime<Utc>,
    /// `None` while the timer is running.
    pub end_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Running,
    Stopped,
}

/// A timer that was just started.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StartedTimer {
    pub id: TimeEntryId,
    pub activity_id: ActivityId,
    pub activity_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: TimerStatus,
}

/// A timer that was just stopped.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StoppedTimer {
    pub id: TimeEntryId,
    pub activity_id: ActivityId,
    pub activity_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: u64,
    pub duration: String,
    pub status: TimerStatus,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TimerStart {
    pub started_new: StartedTimer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_previous: Option<StoppedTimer>,
}

/// The currently running timer with its elapsed time.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ActiveTimer {
    pub id: TimeEntryId,
    pub activity_id: ActivityId,
    pub activity_name: String,
    pub start_time: DateTime<Utc>,
    pub elapsed_seconds: u64,
    pub elapsed: String,
    pub status: TimerStatus,
}

// ---------------------------------------------------------------------------
// Resume (period summary)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActivityResume {
    pub activity_id: ActivityId,
    pub activity_name: String,
    pub total_seconds: u64,
    pub total_time: String,
    pub entry_count: u64,
    /// Share of the period's overall total, 0-100.
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Resume {
    pub period: Period,
    pub total_seconds: u64,
    pub total_time: String,
    /// Top three activities by tracked time.
    pub activities: Vec<ActivityResume>,
}

// ---------------------------------------------------------------------------
// Reward collection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CollectionStats {
    pub total_rewards: u64,
    pub champions_collected: u64,
    pub max_mastery_champions: u64,
}

/// Everything a user has collected.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RewardCollection {
    pub rewards: Vec<RewardRecord>,
    pub mastery: Vec<MasteryRecord>,
    pub stats: CollectionStats,
}
