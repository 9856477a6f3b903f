//! Time aggregation over time-entry history.
//!
//! Only completed entries count: a running entry (no end timestamp) adds
//! neither seconds nor an entry to the totals.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TimeError;
use crate::types::TimeEntryId;

/// The part of a time entry the aggregator needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    pub entry_id: TimeEntryId,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeSpan {
    /// Whole seconds between start and end, `None` while running.
    pub fn duration_secs(&self) -> Result<Option<u64>, TimeError> {
        let Some(end) = self.end else {
            return Ok(None);
        };
        let secs = (end - self.start).num_seconds();
        u64::try_from(secs)
            .map(Some)
            .map_err(|_| TimeError::EndBeforeStart {
                entry_id: self.entry_id,
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeTotals {
    pub total_seconds: u64,
    pub entry_count: u64,
}

/// Sum completed durations and count completed entries.
pub fn aggregate<'a>(spans: impl IntoIterator<Item = &'a TimeSpan>) -> Result<TimeTotals, TimeError> {
    let mut totals = TimeTotals::default();
    for span in spans {
        if let Some(secs) = span.duration_secs()? {
            totals.total_seconds += secs;
            totals.entry_count += 1;
        }
    }
    Ok(totals)
}

/// Render seconds as `45s`, `12m`, `2h` or `2h 30m`.
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }

    let minutes = seconds / 60;
    let hours = minutes / 60;
    let remaining_minutes = minutes % 60;

    match (hours, remaining_minutes) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// Calendar period used by the summary endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }

    /// `[start, now]` for the period containing `now`, in UTC.
    ///
    /// Weeks start on Monday.
    pub fn bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let today = now.date_naive();
        let first_day = match self {
            Period::Day => today,
            Period::Week => {
                today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
            }
            Period::Month => NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today),
            Period::Year => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
        };
        let start = Utc.from_utc_datetime(&first_day.and_time(NaiveTime::default()));
        (start, now)
    }
}
