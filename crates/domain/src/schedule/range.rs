use std::{fmt, ops::Range, str::FromStr};

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, TimeZone};

use crate::errors::Error;

/// Reporting window a caller lists due medications for
///
/// Weeks start on Sunday 00:00 local time and months on the 1st; both are
/// half-open intervals.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ReportScope {
    Today,
    Week,
    Month,
}

impl Default for ReportScope {
    fn default() -> Self {
        Self::Today
    }
}

impl ReportScope {
    /// Local wall-clock interval of the calendar week or month containing
    /// `anchor`. `Today` has no interval of its own.
    pub fn bounds(&self, anchor: NaiveDateTime) -> Option<Range<NaiveDateTime>> {
        let date = anchor.date();
        let (start, end) = match self {
            Self::Today => return None,
            Self::Week => {
                let back = Days::new(date.weekday().num_days_from_sunday().into());
                let start = date.checked_sub_days(back)?;
                (start, start.checked_add_days(Days::new(7))?)
            }
            Self::Month => {
                let start = date.with_day(1)?;
                (start, start.checked_add_months(Months::new(1))?)
            }
        };

        Some(midnight(start)?..midnight(end)?)
    }

    /// Whether `instant` falls inside the window anchored at `anchor`.
    pub fn contains<Tz: TimeZone>(&self, anchor: &DateTime<Tz>, instant: &DateTime<Tz>) -> bool {
        match self {
            Self::Today => true,
            Self::Week | Self::Month => self
                .bounds(anchor.naive_local())
                .map_or(false, |window| window.contains(&instant.naive_local())),
        }
    }

    /// Range check of `now` against the window containing itself.
    ///
    /// This can never reject: the bounds come from `now`. It stays a real
    /// interval check so callers evaluating other instants use `contains`.
    pub fn in_report_range<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        self.contains(now, now)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

fn midnight(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_opt(0, 0, 0)
}

impl FromStr for ReportScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(Error::validation(format!(
                "Invalid filter option '{other}'. Use \"today\", \"week\", or \"month\""
            ))),
        }
    }
}

impl fmt::Display for ReportScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, FixedOffset, Utc};

    use super::*;

    fn naive(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn parses_known_scopes_only() {
        assert_eq!("today".parse::<ReportScope>().unwrap(), ReportScope::Today);
        assert_eq!("week".parse::<ReportScope>().unwrap(), ReportScope::Week);
        assert_eq!("month".parse::<ReportScope>().unwrap(), ReportScope::Month);

        for bad in ["", "Today", "year", "weekly"] {
            assert!(matches!(
                bad.parse::<ReportScope>(),
                Err(Error::Validation { .. })
            ));
        }
    }

    #[test]
    fn week_starts_on_sunday() {
        // Wednesday 2024-03-13
        let window = ReportScope::Week.bounds(naive(2024, 3, 13, 15)).unwrap();
        assert_eq!(window.start, naive(2024, 3, 10, 0));
        assert_eq!(window.end, naive(2024, 3, 17, 0));

        // A Sunday anchors its own week
        let window = ReportScope::Week.bounds(naive(2024, 3, 17, 0)).unwrap();
        assert_eq!(window.start, naive(2024, 3, 17, 0));
    }

    #[test]
    fn week_crosses_month_and_year() {
        // Tuesday 2025-01-01
        let window = ReportScope::Week.bounds(naive(2025, 1, 1, 9)).unwrap();
        assert_eq!(window.start, naive(2024, 12, 29, 0));
        assert_eq!(window.end, naive(2025, 1, 5, 0));
    }

    #[test]
    fn month_is_calendar_month() {
        let window = ReportScope::Month.bounds(naive(2024, 2, 20, 23)).unwrap();
        assert_eq!(window.start, naive(2024, 2, 1, 0));
        assert_eq!(window.end, naive(2024, 3, 1, 0));

        let window = ReportScope::Month.bounds(naive(2024, 12, 31, 23)).unwrap();
        assert_eq!(window.end, naive(2025, 1, 1, 0));
    }

    #[test]
    fn today_has_no_bounds() {
        assert!(ReportScope::Today.bounds(naive(2024, 2, 20, 23)).is_none());
    }

    #[test]
    fn contains_checks_other_instants() {
        let anchor = Utc.with_ymd_and_hms(2024, 3, 13, 12, 0, 0).unwrap();

        assert!(ReportScope::Week.contains(&anchor, &(anchor + Duration::days(3))));
        assert!(!ReportScope::Week.contains(&anchor, &(anchor + Duration::days(4))));
        assert!(!ReportScope::Week.contains(&anchor, &(anchor - Duration::days(4))));

        assert!(ReportScope::Month.contains(&anchor, &(anchor + Duration::days(18))));
        assert!(!ReportScope::Month.contains(&anchor, &(anchor + Duration::days(19))));

        assert!(ReportScope::Today.contains(&anchor, &(anchor + Duration::days(400))));
    }

    #[test]
    fn current_instant_is_always_in_range() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let start = tz.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for hours in (0..(24 * 400)).step_by(7) {
            let now = start + Duration::hours(hours);
            assert!(ReportScope::Today.in_report_range(&now));
            assert!(ReportScope::Week.in_report_range(&now));
            assert!(ReportScope::Month.in_report_range(&now));
        }
    }
}
