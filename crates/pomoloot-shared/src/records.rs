//! Records the reward engine reads from and writes to storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ActivityId, Rarity, RewardId, RewardType, UserId};

/// The slice of an activity the reward engine cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedActivity {
    pub id: ActivityId,
    pub user_id: UserId,
    pub name: String,
    /// Intervals already converted into rewards. Only ever grows.
    pub intervals_rewarded: u32,
}

/// One granted reward. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardRecord {
    pub id: RewardId,
    #[serde(skip_serializing)]
    pub user_id: UserId,
    pub reward_type: RewardType,
    /// Catalog id, e.g. `Ahri`, `3031` or `Ahri_1`.
    pub external_id: String,
    pub name: String,
    pub image_url: String,
    pub rarity: Rarity,
    pub created_at: DateTime<Utc>,
}

/// Per-user progression for a single champion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MasteryRecord {
    #[serde(skip_serializing)]
    pub user_id: UserId,
    pub champion_id: String,
    pub champion_name: String,
    pub image_url: String,
    pub times_obtained: u32,
    pub mastery_level: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
