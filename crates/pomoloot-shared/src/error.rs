use thiserror::Error;

use crate::types::{ActivityId, RewardType, TimeEntryId};

/// Error type produced by a storage collaborator.
pub type LedgerError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeError {
    #[error("Time entry {entry_id} ends before it starts")]
    EndBeforeStart { entry_id: TimeEntryId },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouletteError {
    #[error("Catalog has no {0} entries")]
    EmptyCatalog(RewardType),
}

#[derive(Error, Debug)]
pub enum ClaimError {
    #[error("Activity not found: {0}")]
    NotFound(ActivityId),

    #[error("No rewards available. Keep tracking time!")]
    NothingToClaim { progress: f64 },

    #[error("Reward generation unavailable: no {0} entries in catalog")]
    GenerationUnavailable(RewardType),

    #[error("Invalid time entry: {0}")]
    InvalidTimeEntry(#[from] TimeError),

    #[error("Storage error: {0}")]
    Storage(#[source] LedgerError),
}

impl From<RouletteError> for ClaimError {
    fn from(err: RouletteError) -> Self {
        match err {
            RouletteError::EmptyCatalog(kind) => ClaimError::GenerationUnavailable(kind),
        }
    }
}

impl From<LedgerError> for ClaimError {
    fn from(err: LedgerError) -> Self {
        ClaimError::Storage(err)
    }
}
