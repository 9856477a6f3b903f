//! Duplicate-aware champion mastery.

use chrono::Utc;
use serde::Serialize;

use crate::constants::MAX_MASTERY_LEVEL;
use crate::error::LedgerError;
use crate::ledger::RewardLedger;
use crate::records::MasteryRecord;
use crate::types::UserId;

/// Mastery level for a champion obtained `times_obtained` times.
pub fn mastery_level(times_obtained: u32) -> u8 {
    u8::try_from(times_obtained)
        .unwrap_or(MAX_MASTERY_LEVEL)
        .min(MAX_MASTERY_LEVEL)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MasteryUpdate {
    pub is_duplicate: bool,
    pub mastery_level: u8,
}

impl MasteryRecord {
    /// Record for the first time a user draws a champion.
    pub fn first_draw(
        user_id: UserId,
        champion_id: impl Into<String>,
        champion_name: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            champion_id: champion_id.into(),
            champion_name: champion_name.into(),
            image_url: image_url.into(),
            times_obtained: 1,
            mastery_level: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Count another draw of the same champion.
    pub fn record_duplicate(&mut self) {
        self.times_obtained = self.times_obtained.saturating_add(1);
        self.mastery_level = mastery_level(self.times_obtained);
        self.updated_at = Utc::now();
    }

    pub fn is_maxed(&self) -> bool {
        self.mastery_level >= MAX_MASTERY_LEVEL
    }
}

/// Update (or start) the user's mastery of a freshly drawn champion.
pub fn record_champion_draw<L: RewardLedger + ?Sized>(
    ledger: &mut L,
    user: UserId,
    champion_id: &str,
    champion_name: &str,
    image_url: &str,
) -> Result<MasteryUpdate, LedgerError> {
    let (record, is_duplicate) = match ledger.load_mastery(user, champion_id)? {
        Some(mut existing) => {
            existing.record_duplicate();
            (existing, true)
        }
        None => (
            MasteryRecord::first_draw(user, champion_id, champion_name, image_url),
            false,
        ),
    };

    ledger.upsert_mastery(&record)?;

    tracing::debug!(
        %user,
        champion = champion_id,
        times = record.times_obtained,
        level = record.mastery_level,
        "champion mastery updated"
    );

    Ok(MasteryUpdate {
        is_duplicate,
        mastery_level: record.mastery_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::memory::MemoryLedger;

    #[test]
    fn level_caps_at_seven() {
        assert_eq!(mastery_level(1), 1);
        assert_eq!(mastery_level(6), 6);
        assert_eq!(mastery_level(7), 7);
        assert_eq!(mastery_level(8), 7);
        assert_eq!(mastery_level(u32::MAX), 7);
    }

    #[test]
    fn first_draw_is_not_a_duplicate() {
        let mut ledger = MemoryLedger::default();
        let user = UserId::new();
        let update = record_champion_draw(&mut ledger, user, "Ahri", "Ahri", "url").unwrap();
        assert_eq!(
            update,
            MasteryUpdate {
                is_duplicate: false,
                mastery_level: 1
            }
        );
        let stored = ledger.mastery.get(&(user, "Ahri".to_string())).unwrap();
        assert_eq!(stored.times_obtained, 1);
    }

    #[test]
    fn second_draw_of_ahri_is_level_two() {
        let mut ledger = MemoryLedger::default();
        let user = UserId::new();
        record_champion_draw(&mut ledger, user, "Ahri", "Ahri", "url").unwrap();
        let update = record_champion_draw(&mut ledger, user, "Ahri", "Ahri", "url").unwrap();
        assert!(update.is_duplicate);
        assert_eq!(update.mastery_level, 2);
    }

    #[test]
    fn level_tracks_draw_count_then_holds() {
        let mut ledger = MemoryLedger::default();
        let user = UserId::new();
        for draw in 1..=10u32 {
            let update = record_champion_draw(&mut ledger, user, "Lux", "Lux", "url").unwrap();
            assert_eq!(update.is_duplicate, draw > 1);
            assert_eq!(u32::from(update.mastery_level), draw.min(7));
        }
        let stored = ledger.mastery.get(&(user, "Lux".to_string())).unwrap();
        assert_eq!(stored.times_obtained, 10);
        assert!(stored.is_maxed());
    }

    #[test]
    fn mastery_is_per_user() {
        let mut ledger = MemoryLedger::default();
        let alice = UserId::new();
        let bob = UserId::new();
        record_champion_draw(&mut ledger, alice, "Ahri", "Ahri", "url").unwrap();
        let update = record_champion_draw(&mut ledger, bob, "Ahri", "Ahri", "url").unwrap();
        assert!(!update.is_duplicate);
    }
}
