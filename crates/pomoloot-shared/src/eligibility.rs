//! Converts tracked time into claimable reward intervals.

use serde::Serialize;

use crate::constants::REWARD_INTERVAL_SECS;
use crate::error::ClaimError;
use crate::ledger::RewardLedger;
use crate::records::TrackedActivity;
use crate::time;
use crate::types::{ActivityId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Eligibility {
    /// Intervals earned but not yet turned into rewards.
    pub claimable: u32,
    /// Fraction of the way into the next interval, in `[0, 1)`.
    pub progress: f64,
    pub total_minutes: u64,
    pub total_seconds: u64,
}

/// Pure eligibility arithmetic.
///
/// `progress` keeps advancing even while a backlog of claimable intervals
/// exists.
pub fn assess(total_seconds: u64, intervals_rewarded: u32) -> Eligibility {
    let total_intervals = total_seconds / REWARD_INTERVAL_SECS;
    let claimable = total_intervals.saturating_sub(u64::from(intervals_rewarded));
    let remainder = total_seconds % REWARD_INTERVAL_SECS;

    Eligibility {
        claimable: u32::try_from(claimable).unwrap_or(u32::MAX),
        progress: remainder as f64 / REWARD_INTERVAL_SECS as f64,
        total_minutes: total_seconds / 60,
        total_seconds,
    }
}

/// Eligibility of an already-loaded activity.
pub fn assess_activity<L: RewardLedger + ?Sized>(
    ledger: &mut L,
    activity: &TrackedActivity,
) -> Result<Eligibility, ClaimError> {
    let spans = ledger.list_time_spans(activity.id)?;
    let totals = time::aggregate(&spans)?;
    Ok(assess(totals.total_seconds, activity.intervals_rewarded))
}

/// Load an activity and compute its eligibility.
pub fn calculate_claimable<L: RewardLedger + ?Sized>(
    ledger: &mut L,
    activity_id: ActivityId,
) -> Result<Eligibility, ClaimError> {
    let activity = ledger
        .load_activity(activity_id)?
        .ok_or(ClaimError::NotFound(activity_id))?;
    assess_activity(ledger, &activity)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRewardStatus {
    pub activity_id: ActivityId,
    pub activity_name: String,
    pub total_minutes: u64,
    pub intervals_rewarded: u32,
    pub claimable: u32,
    pub progress_to_next: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewardStatus {
    pub total_claimable: u64,
    pub activities: Vec<ActivityRewardStatus>,
}

/// Claimable rewards across all of a user's activities.
///
/// Activities with no tracked time at all are left out of the listing, as
/// is any activity whose entries cannot be totalled. Storage failures still
/// abort the whole call.
pub fn reward_status<L: RewardLedger + ?Sized>(
    ledger: &mut L,
    user: UserId,
) -> Result<RewardStatus, ClaimError> {
    let activities = ledger.list_activities(user)?;

    let mut status = RewardStatus {
        total_claimable: 0,
        activities: Vec::new(),
    };

    for activity in activities {
        let eligibility = match assess_activity(ledger, &activity) {
            Ok(eligibility) => eligibility,
            Err(ClaimError::InvalidTimeEntry(err)) => {
                tracing::warn!(
                    activity = %activity.id,
                    error = %err,
                    "skipping activity in reward status"
                );
                continue;
            }
            Err(err) => return Err(err),
        };
        status.total_claimable += u64::from(eligibility.claimable);

        if eligibility.claimable > 0 || eligibility.progress > 0.0 {
            status.activities.push(ActivityRewardStatus {
                activity_id: activity.id,
                activity_name: activity.name,
                total_minutes: eligibility.total_minutes,
                intervals_rewarded: activity.intervals_rewarded,
                claimable: eligibility.claimable,
                progress_to_next: eligibility.progress,
            });
        }
    }

    Ok(status)
}
