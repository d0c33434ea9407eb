use std::fmt;

use chrono::{DateTime, Months, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Treatment length, counted in calendar months from creation
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub enum TreatmentDuration {
    #[serde(rename = "1 Month")]
    OneMonth,
    #[serde(rename = "2 Months")]
    TwoMonths,
    #[serde(rename = "3 Months")]
    ThreeMonths,
    Ongoing,
}

impl Default for TreatmentDuration {
    fn default() -> Self {
        Self::OneMonth
    }
}

impl TreatmentDuration {
    /// Month count of a fixed-length treatment, `None` when ongoing.
    pub fn months(&self) -> Option<u32> {
        match self {
            Self::OneMonth => Some(1),
            Self::TwoMonths => Some(2),
            Self::ThreeMonths => Some(3),
            Self::Ongoing => None,
        }
    }

    /// Whether a medication created at `created_at` is still being taken at
    /// `now`. The cutoff is inclusive and month addition happens on `now`'s
    /// local wall clock, clamping to the last day of shorter months. An end
    /// that falls in a DST gap or overlap still compares as a wall-clock time.
    ///
    /// A missing creation instant is never within the window.
    pub fn is_within_treatment_window<Tz: TimeZone>(
        &self,
        created_at: Option<&DateTime<Utc>>,
        now: &DateTime<Tz>,
    ) -> bool {
        let Some(created_at) = created_at else {
            return false;
        };

        let Some(months) = self.months() else {
            return true;
        };

        created_at
            .with_timezone(&now.timezone())
            .naive_local()
            .checked_add_months(Months::new(months))
            .map_or(false, |end| now.naive_local() <= end)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::OneMonth => "1 Month",
            Self::TwoMonths => "2 Months",
            Self::ThreeMonths => "3 Months",
            Self::Ongoing => "Ongoing",
        }
    }
}

impl fmt::Display for TreatmentDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
