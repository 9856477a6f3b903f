//! Claim orchestration: eligibility, roulette, mastery, persistence.
//!
//! [`claim`] grants at most one reward per call. The ledger it is given is
//! expected to be transactional; the store commits only when this returns
//! `Ok`, so a failure at any step leaves no reward and no counter change.

use chrono::Utc;
use serde::Serialize;

use crate::catalog::CatalogSnapshot;
use crate::eligibility;
use crate::error::ClaimError;
use crate::ledger::RewardLedger;
use crate::mastery::{self, MasteryUpdate};
use crate::random::RandomSource;
use crate::records::RewardRecord;
use crate::roulette;
use crate::types::{ActivityId, RewardId, RewardType, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimedReward {
    #[serde(flatten)]
    pub record: RewardRecord,
    pub is_duplicate: bool,
    /// 0 for anything but champions.
    pub mastery_level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimOutcome {
    pub reward: ClaimedReward,
    pub intervals_remaining: u32,
    pub total_minutes: u64,
}

/// Convert one earned interval of `activity_id` into a reward for `user`.
pub fn claim<L: RewardLedger + ?Sized>(
    ledger: &mut L,
    catalog: &CatalogSnapshot,
    rng: &mut dyn RandomSource,
    user: UserId,
    activity_id: ActivityId,
) -> Result<ClaimOutcome, ClaimError> {
    let mut activity = ledger
        .load_activity(activity_id)?
        .filter(|a| a.user_id == user)
        .ok_or(ClaimError::NotFound(activity_id))?;

    let eligibility = eligibility::assess_activity(ledger, &activity)?;
    if eligibility.claimable == 0 {
        return Err(ClaimError::NothingToClaim {
            progress: eligibility.progress,
        });
    }

    let drawn = roulette::draw(catalog, eligibility.total_minutes, rng)?;

    let update = if drawn.reward_type == RewardType::Champion {
        mastery::record_champion_draw(
            ledger,
            user,
            &drawn.external_id,
            &drawn.name,
            &drawn.image_url,
        )?
    } else {
        MasteryUpdate {
            is_duplicate: false,
            mastery_level: 0,
        }
    };

    let record = RewardRecord {
        id: RewardId::new(),
        user_id: user,
        reward_type: drawn.reward_type,
        external_id: drawn.external_id,
        name: drawn.name,
        image_url: drawn.image_url,
        rarity: drawn.rarity,
        created_at: Utc::now(),
    };
    ledger.create_reward(&record)?;

    activity.intervals_rewarded += 1;
    ledger.save_activity(&activity)?;

    tracing::info!(
        %user,
        activity = %activity.id,
        reward_type = %record.reward_type,
        external_id = %record.external_id,
        intervals_rewarded = activity.intervals_rewarded,
        "reward claimed"
    );

    Ok(ClaimOutcome {
        reward: ClaimedReward {
            record,
            is_duplicate: update.is_duplicate,
            mastery_level: update.mastery_level,
        },
        intervals_remaining: eligibility.claimable - 1,
        total_minutes: eligibility.total_minutes,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::catalog::fixtures::sample_catalog;
    use crate::ledger::memory::MemoryLedger;
    use crate::random::ScriptedRandom;
    use crate::records::TrackedActivity;
    use crate::time::TimeSpan;
    use crate::types::{Rarity, TimeEntryId};

    fn setup(seconds: i64, rewarded: u32) -> (MemoryLedger, UserId, ActivityId) {
        let user = UserId::new();
        let activity = TrackedActivity {
            id: ActivityId::new(),
            user_id: user,
            name: "Deep work".into(),
            intervals_rewarded: rewarded,
        };
        let id = activity.id;
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        let spans = vec![
            TimeSpan {
                entry_id: TimeEntryId::new(),
                start,
                end: Some(start + Duration::seconds(seconds)),
            },
            TimeSpan {
                entry_id: TimeEntryId::new(),
                start: start + Duration::hours(5),
                end: None,
            },
        ];
        (MemoryLedger::with_activity(activity, spans), user, id)
    }

    #[test]
    fn claim_grants_one_reward_and_bumps_counter() {
        let (mut ledger, user, id) = setup(3 * 900 + 10, 0);
        let catalog = sample_catalog();
        // 45 minutes, roll 0 -> item
        let mut rng = ScriptedRandom::new([0, 0]);

        let outcome = claim(&mut ledger, &catalog, &mut rng, user, id).unwrap();
        assert_eq!(outcome.intervals_remaining, 2);
        assert_eq!(outcome.total_minutes, 45);
        assert_eq!(outcome.reward.record.reward_type, RewardType::Item);
        assert_eq!(outcome.reward.record.rarity, Rarity::Common);
        assert!(!outcome.reward.is_duplicate);
        assert_eq!(outcome.reward.mastery_level, 0);

        assert_eq!(ledger.rewards.len(), 1);
        assert_eq!(ledger.activities[&id].intervals_rewarded, 1);
        assert_eq!(
            eligibility::calculate_claimable(&mut ledger, id).unwrap().claimable,
            2
        );
    }

    #[test]
    fn backlog_drains_one_claim_at_a_time() {
        let (mut ledger, user, id) = setup(2 * 900, 0);
        let catalog = sample_catalog();
        let mut rng = ScriptedRandom::new([0, 0, 0, 0]);

        let first = claim(&mut ledger, &catalog, &mut rng, user, id).unwrap();
        assert_eq!(first.intervals_remaining, 1);
        let second = claim(&mut ledger, &catalog, &mut rng, user, id).unwrap();
        assert_eq!(second.intervals_remaining, 0);

        let err = claim(&mut ledger, &catalog, &mut rng, user, id).unwrap_err();
        assert!(matches!(err, ClaimError::NothingToClaim { progress } if progress == 0.0));
        assert_eq!(ledger.rewards.len(), 2);
        assert_eq!(ledger.activities[&id].intervals_rewarded, 2);
    }

    #[test]
    fn nothing_to_claim_reports_progress() {
        let (mut ledger, user, id) = setup(450, 0);
        let catalog = sample_catalog();
        let mut rng = ScriptedRandom::default();

        let err = claim(&mut ledger, &catalog, &mut rng, user, id).unwrap_err();
        match err {
            ClaimError::NothingToClaim { progress } => assert_eq!(progress, 0.5),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(ledger.rewards.is_empty());
        assert_eq!(ledger.activities[&id].intervals_rewarded, 0);
    }

    #[test]
    fn foreign_activity_is_not_found() {
        let (mut ledger, _owner, id) = setup(900, 0);
        let catalog = sample_catalog();
        let mut rng = ScriptedRandom::default();

        let err = claim(&mut ledger, &catalog, &mut rng, UserId::new(), id).unwrap_err();
        assert!(matches!(err, ClaimError::NotFound(_)));
    }

    #[test]
    fn empty_catalog_mutates_nothing() {
        let (mut ledger, user, id) = setup(900, 0);
        let catalog = CatalogSnapshot::empty();
        // 15 minutes, roll 70 -> champion bucket, which is empty
        let mut rng = ScriptedRandom::new([70]);

        let err = claim(&mut ledger, &catalog, &mut rng, user, id).unwrap_err();
        assert!(matches!(
            err,
            ClaimError::GenerationUnavailable(RewardType::Champion)
        ));
        assert!(ledger.rewards.is_empty());
        assert!(ledger.mastery.is_empty());
        assert_eq!(ledger.activities[&id].intervals_rewarded, 0);
    }

    #[test]
    fn champion_draws_feed_mastery() {
        let (mut ledger, user, id) = setup(4 * 900, 0);
        let catalog = sample_catalog();
        // 60 minutes tier: item 15, champion 30 -> roll 20 is a champion, instance 0 = Ahri
        let mut rng = ScriptedRandom::new([20, 0, 20, 0]);

        let first = claim(&mut ledger, &catalog, &mut rng, user, id).unwrap();
        assert_eq!(first.reward.record.external_id, "Ahri");
        assert!(!first.reward.is_duplicate);
        assert_eq!(first.reward.mastery_level, 1);

        let second = claim(&mut ledger, &catalog, &mut rng, user, id).unwrap();
        assert!(second.reward.is_duplicate);
        assert_eq!(second.reward.mastery_level, 2);
    }

    #[test]
    fn storage_failure_surfaces() {
        let (mut ledger, user, id) = setup(900, 0);
        ledger.fail_reward_writes = true;
        let catalog = sample_catalog();
        let mut rng = ScriptedRandom::new([0, 0]);

        let err = claim(&mut ledger, &catalog, &mut rng, user, id).unwrap_err();
        assert!(matches!(err, ClaimError::Storage(_)));
        assert_eq!(ledger.activities[&id].intervals_rewarded, 0);
    }

    #[test]
    fn claimed_reward_serializes_flat() {
        let (mut ledger, user, id) = setup(900, 0);
        let catalog = sample_catalog();
        let mut rng = ScriptedRandom::new([0, 0]);
        let outcome = claim(&mut ledger, &catalog, &mut rng, user, id).unwrap();

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["reward"]["reward_type"], "item");
        assert_eq!(json["reward"]["external_id"], "3031");
        assert_eq!(json["reward"]["is_duplicate"], false);
        assert_eq!(json["intervals_remaining"], 0);
        assert_eq!(json["total_minutes"], 15);
        assert!(json["reward"].get("user_id").is_none());
    }
}
