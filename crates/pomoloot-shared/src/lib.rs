//! # pomoloot-shared
//!
//! Domain types and the reward engine for Pomoloot.
//!
//! Tracked time is converted into 15-minute reward intervals; each earned
//! interval can be claimed once, spinning a roulette whose odds depend on the
//! minutes invested in the activity. The engine is storage-agnostic: it reads
//! and writes through the [`RewardLedger`] trait and draws randomness through
//! [`RandomSource`].

pub mod catalog;
pub mod claim;
pub mod constants;
pub mod eligibility;
pub mod error;
pub mod ledger;
pub mod mastery;
pub mod random;
pub mod records;
pub mod roulette;
pub mod time;
pub mod types;

pub use catalog::{CatalogSnapshot, CatalogStore};
pub use claim::{claim, ClaimOutcome, ClaimedReward};
pub use eligibility::{Eligibility, RewardStatus};
pub use error::{ClaimError, LedgerError, RouletteError, TimeError};
pub use ledger::RewardLedger;
pub use random::{RandomSource, SystemRandom};
pub use records::{MasteryRecord, RewardRecord, TrackedActivity};
pub use types::*;
