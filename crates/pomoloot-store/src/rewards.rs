//! Reward and champion mastery records.
//!
//! Rewards are append-only. Mastery rows are upserted by the claim path.

use rusqlite::{params, Connection, OptionalExtension};

use pomoloot_shared::{MasteryRecord, Rarity, RewardId, RewardRecord, RewardType, UserId};

use crate::convert::{conversion_failure, ts, ts_at, uuid_at};
use crate::database::Database;
use crate::error::Result;
use crate::models::{CollectionStats, RewardCollection};

const MASTERY_COLUMNS: &str = "user_id, champion_id, champion_name, image_url, times_obtained,
     mastery_level, created_at, updated_at";

impl Database {
    /// Rewards of `user`, newest first.
    pub fn list_rewards(&self, user: UserId) -> Result<Vec<RewardRecord>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, user_id, reward_type, external_id, name, image_url, rarity, created_at
             FROM rewards
             WHERE user_id = ?1
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map(params![user.to_string()], row_to_reward)?;

        let mut rewards = Vec::new();
        for row in rows {
            rewards.push(row?);
        }
        Ok(rewards)
    }

    /// Champion mastery of `user`, highest level first.
    pub fn list_mastery(&self, user: UserId) -> Result<Vec<MasteryRecord>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MASTERY_COLUMNS}
             FROM champion_mastery
             WHERE user_id = ?1
             ORDER BY mastery_level DESC, times_obtained DESC, champion_name ASC"
        ))?;

        let rows = stmt.query_map(params![user.to_string()], row_to_mastery)?;

        let mut mastery = Vec::new();
        for row in rows {
            mastery.push(row?);
        }
        Ok(mastery)
    }

    /// Rewards, mastery and collection counters in one read.
    pub fn reward_collection(&self, user: UserId) -> Result<RewardCollection> {
        let rewards = self.list_rewards(user)?;
        let mastery = self.list_mastery(user)?;

        let stats = CollectionStats {
            total_rewards: rewards.len() as u64,
            champions_collected: mastery.len() as u64,
            max_mastery_champions: mastery.iter().filter(|m| m.is_maxed()).count() as u64,
        };

        Ok(RewardCollection {
            rewards,
            mastery,
            stats,
        })
    }
}

// ---------------------------------------------------------------------------
// Connection-level helpers (used by the ledger inside a transaction)
// ---------------------------------------------------------------------------

pub(crate) fn insert_reward(conn: &Connection, reward: &RewardRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO rewards (id, user_id, reward_type, external_id, name, image_url, rarity, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            reward.id.to_string(),
            reward.user_id.to_string(),
            reward.reward_type.as_str(),
            reward.external_id,
            reward.name,
            reward.image_url,
            reward.rarity.as_str(),
            ts(&reward.created_at),
        ],
    )?;
    Ok(())
}

pub(crate) fn load_mastery(
    conn: &Connection,
    user: UserId,
    champion_id: &str,
) -> Result<Option<MasteryRecord>> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {MASTERY_COLUMNS} FROM champion_mastery
                 WHERE user_id = ?1 AND champion_id = ?2"
            ),
            params![user.to_string(), champion_id],
            row_to_mastery,
        )
        .optional()?)
}

pub(crate) fn upsert_mastery(conn: &Connection, record: &MasteryRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO champion_mastery
            (user_id, champion_id, champion_name, image_url, times_obtained, mastery_level, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT (user_id, champion_id) DO UPDATE SET
            champion_name  = excluded.champion_name,
            image_url      = excluded.image_url,
            times_obtained = excluded.times_obtained,
            mastery_level  = excluded.mastery_level,
            updated_at     = excluded.updated_at",
        params![
            record.user_id.to_string(),
            record.champion_id,
            record.champion_name,
            record.image_url,
            record.times_obtained,
            record.mastery_level,
            ts(&record.created_at),
            ts(&record.updated_at),
        ],
    )?;
    Ok(())
}

fn row_to_reward(row: &rusqlite::Row<'_>) -> rusqlite::Result<RewardRecord> {
    let type_tag: String = row.get(2)?;
    let rarity_tag: String = row.get(6)?;

    let reward_type = RewardType::from_tag(&type_tag)
        .ok_or_else(|| conversion_failure(2, format!("unknown reward type {type_tag:?}")))?;
    let rarity = Rarity::from_tag(&rarity_tag)
        .ok_or_else(|| conversion_failure(6, format!("unknown rarity {rarity_tag:?}")))?;

    Ok(RewardRecord {
        id: RewardId(uuid_at(row, 0)?),
        user_id: UserId(uuid_at(row, 1)?),
        reward_type,
        external_id: row.get(3)?,
        name: row.get(4)?,
        image_url: row.get(5)?,
        rarity,
        created_at: ts_at(row, 7)?,
    })
}

fn row_to_mastery(row: &rusqlite::Row<'_>) -> rusqlite::Result<MasteryRecord> {
    Ok(MasteryRecord {
        user_id: UserId(uuid_at(row, 0)?),
        champion_id: row.get(1)?,
        champion_name: row.get(2)?,
        image_url: row.get(3)?,
        times_obtained: row.get(4)?,
        mastery_level: row.get(5)?,
        created_at: ts_at(row, 6)?,
        updated_at: ts_at(row, 7)?,
    })
}
