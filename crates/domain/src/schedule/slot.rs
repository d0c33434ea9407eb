use std::{fmt, ops::Range};

use chrono::{DateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

/// Named time-of-day slot a dose is taken in
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub enum ScheduleSlot {
    #[serde(rename = "Before Breakfast")]
    BeforeBreakfast,
    #[serde(rename = "After Breakfast")]
    AfterBreakfast,
    #[serde(rename = "Before Lunch")]
    BeforeLunch,
    #[serde(rename = "After Lunch")]
    AfterLunch,
    #[serde(rename = "Before Dinner")]
    BeforeDinner,
    #[serde(rename = "After Dinner")]
    AfterDinner,
    /// Union of the meal slots, overlaps the individual ones
    #[serde(rename = "Before Meals")]
    BeforeMeals,
    #[serde(rename = "After Meals")]
    AfterMeals,
}

impl Default for ScheduleSlot {
    fn default() -> Self {
        Self::BeforeBreakfast
    }
}

impl ScheduleSlot {
    pub const ALL: [ScheduleSlot; 8] = [
        Self::BeforeBreakfast,
        Self::AfterBreakfast,
        Self::BeforeLunch,
        Self::AfterLunch,
        Self::BeforeDinner,
        Self::AfterDinner,
        Self::BeforeMeals,
        Self::AfterMeals,
    ];

    /// Half-open hour-of-day interval covered by the slot.
    pub fn hours(&self) -> Range<u32> {
        match self {
            Self::BeforeBreakfast => 6..9,
            Self::AfterBreakfast => 9..12,
            Self::BeforeLunch => 11..13,
            Self::AfterLunch => 13..15,
            Self::BeforeDinner => 17..19,
            Self::AfterDinner => 19..22,
            Self::BeforeMeals => 6..19,
            Self::AfterMeals => 9..22,
        }
    }

    /// Whether the local hour of `instant` falls inside the slot.
    /// Minutes and seconds are ignored.
    pub fn matches<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> bool {
        self.hours().contains(&instant.hour())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::BeforeBreakfast => "Before Breakfast",
            Self::AfterBreakfast => "After Breakfast",
            Self::BeforeLunch => "Before Lunch",
            Self::AfterLunch => "After Lunch",
            Self::BeforeDinner => "Before Dinner",
            Self::AfterDinner => "After Dinner",
            Self::BeforeMeals => "Before Meals",
            Self::AfterMeals => "After Meals",
        }
    }
}

impl fmt::Display for ScheduleSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;

    fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 12, hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn before_breakfast_lower_bound_inclusive_upper_exclusive() {
        assert!(ScheduleSlot::BeforeBreakfast.matches(&at(6, 0)));
        assert!(ScheduleSlot::BeforeBreakfast.matches(&at(8, 59)));
        assert!(!ScheduleSlot::BeforeBreakfast.matches(&at(9, 0)));
        assert!(!ScheduleSlot::BeforeBreakfast.matches(&at(5, 59)));
    }

    #[test]
    fn every_slot_matches_exactly_its_hours() {
        for slot in ScheduleSlot::ALL {
            let hours = slot.hours();
            for hour in 0..24 {
                assert_eq!(
                    slot.matches(&at(hour, 30)),
                    hours.contains(&hour),
                    "{slot} at {hour}:30"
                );
            }
        }
    }

    #[test]
    fn meal_unions_overlap_named_slots() {
        let lunch = at(11, 15);
        assert!(ScheduleSlot::AfterBreakfast.matches(&lunch));
        assert!(ScheduleSlot::BeforeLunch.matches(&lunch));
        assert!(ScheduleSlot::BeforeMeals.matches(&lunch));
        assert!(ScheduleSlot::AfterMeals.matches(&lunch));

        let late = at(21, 0);
        assert!(ScheduleSlot::AfterDinner.matches(&late));
        assert!(ScheduleSlot::AfterMeals.matches(&late));
        assert!(!ScheduleSlot::BeforeMeals.matches(&late));
    }

    #[test]
    fn uses_local_hour_of_the_instant() {
        // 05:30 UTC is 07:30 at +02:00
        let utc = chrono::Utc.with_ymd_and_hms(2024, 3, 12, 5, 30, 0).unwrap();
        assert!(!ScheduleSlot::BeforeBreakfast.matches(&utc));
        let local = utc.with_timezone(&FixedOffset::east_opt(2 * 3600).unwrap());
        assert!(ScheduleSlot::BeforeBreakfast.matches(&local));
    }

    #[test]
    fn unknown_slot_label_is_rejected() {
        let parsed: Result<ScheduleSlot, _> = serde_json::from_str("\"Midnight Snack\"");
        assert!(parsed.is_err());

        let parsed: ScheduleSlot = serde_json::from_str("\"After Lunch\"").unwrap();
        assert_eq!(parsed, ScheduleSlot::AfterLunch);
    }
}
