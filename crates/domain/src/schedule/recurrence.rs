use std::fmt;

use chrono::{DateTime, Datelike, TimeZone, Weekday};
use serde::{Deserialize, Serialize};

use super::ScheduleSlot;

/// Weekly doses always fall on this weekday.
pub const WEEKLY_DOSE_DAY: Weekday = Weekday::Sun;

/// Monthly doses always fall on this day of the month.
pub const MONTHLY_DOSE_DAY: u32 = 15;

/// Recurrence cadence of a medication
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    /// Taken at the patient's discretion, never due on a schedule
    #[serde(rename = "As Needed", alias = "AsNeeded")]
    AsNeeded,
}

impl Default for Frequency {
    fn default() -> Self {
        Self::Daily
    }
}

impl Frequency {
    /// Whether a dose in `slot` is due at `instant`.
    pub fn is_due_now<Tz: TimeZone>(&self, slot: ScheduleSlot, instant: &DateTime<Tz>) -> bool {
        match self {
            Self::Daily => slot.matches(instant),
            Self::Weekly => slot.matches(instant) && instant.weekday() == WEEKLY_DOSE_DAY,
            Self::Monthly => slot.matches(instant) && instant.day() == MONTHLY_DOSE_DAY,
            Self::AsNeeded => false,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::AsNeeded => "As Needed",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
