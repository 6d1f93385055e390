//! Date-range resolution
//!
//! Turns a `DateRangeSpec` into concrete query bounds and a chart title.
//! All ranges are half-open intervals `[lower, upper)` so a reading exactly
//! at a day or month rollover belongs to the later period, never both.
//!
//! Titles are Japanese-localized, matching the station's display language
//! (e.g. `2023年09月01日 (金)`).

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

/// Timestamp format used across the store and the tabular seam
pub const FMT_MEASUREMENT_TIME: &str = "%Y-%m-%d %H:%M";
/// ISO-8601 date format accepted at the request boundary
pub const FMT_ISO_DATE: &str = "%Y-%m-%d";

/// Weekday names indexed by `Weekday::num_days_from_monday()`
const WEEKDAYS_JP: [&str; 7] = ["月", "火", "水", "木", "金", "土", "日"];

/// Which of the three date-window variants a request uses
///
/// Carried through to the renderer, where it selects the x-axis tick
/// formatter and domain rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    /// A single calendar day
    Today,
    /// A full calendar month
    YearMonth,
    /// Rolling N-day lookback window ending at a chosen start day
    Range {
        /// Window width in days
        before_days: i64,
    },
}

/// A date-range request, exactly one variant active at a time
///
/// Each variant carries only its own fields; there is no way to read a
/// field that belongs to a different variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRangeSpec {
    /// One calendar day starting at midnight of `reference_date`
    Today { reference_date: NaiveDate },
    /// One calendar month
    YearMonth { year: i32, month: u32 },
    /// `[start_day - before_days, start_day]` inclusive of `start_day`
    Range { start_day: NaiveDate, before_days: i64 },
}

/// Resolved query bounds plus presentation metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRange {
    /// Inclusive lower bound
    pub lower: NaiveDateTime,
    /// Exclusive upper bound
    pub upper: NaiveDateTime,
    /// Which variant produced these bounds
    pub kind: RangeKind,
    /// Localized title for the rendered chart
    pub title: String,
}

impl DateRangeSpec {
    /// Resolve the spec to concrete bounds and a title
    ///
    /// # Panics
    /// Panics if a `YearMonth` spec names a nonexistent month. Inputs are
    /// validated at the request boundary; this is a defensive check only.
    pub fn resolve(&self) -> ResolvedRange {
        self.try_resolve()
            .expect("DateRangeSpec: year/month out of range")
    }

    /// Resolve the spec, returning `None` for a nonexistent year-month
    pub fn try_resolve(&self) -> Option<ResolvedRange> {
        let resolved = match *self {
            DateRangeSpec::Today { reference_date } => {
                let lower = midnight(reference_date);
                ResolvedRange {
                    lower,
                    upper: lower + Duration::days(1),
                    kind: RangeKind::Today,
                    title: jp_date_with_weekday(reference_date),
                }
            }
            DateRangeSpec::YearMonth { year, month } => {
                let first = NaiveDate::from_ymd_opt(year, month, 1)?;
                let (next_year, next_month) = next_year_month(year, month);
                let next_first = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
                ResolvedRange {
                    lower: midnight(first),
                    upper: midnight(next_first),
                    kind: RangeKind::YearMonth,
                    title: format!("{:04}年{:02}月", year, month),
                }
            }
            DateRangeSpec::Range { start_day, before_days } => {
                let from_day = start_day - Duration::days(before_days);
                ResolvedRange {
                    lower: midnight(from_day),
                    upper: midnight(start_day) + Duration::days(1),
                    kind: RangeKind::Range { before_days },
                    title: format!("{} 〜 {}", jp_date(from_day), jp_date(start_day)),
                }
            }
        };
        debug_assert!(resolved.lower < resolved.upper);
        Some(resolved)
    }
}

impl ResolvedRange {
    /// Re-pin a `Today` range to the calendar day of the first observed
    /// sample
    ///
    /// Sensor broadcasts arrive every few minutes, so the first row of a
    /// "today" series decides which day the 24-hour axis actually covers.
    /// Non-`Today` ranges are returned unchanged.
    pub fn pin_to_sample_day(&self, first_sample: NaiveDateTime) -> ResolvedRange {
        if self.kind != RangeKind::Today {
            return self.clone();
        }
        let day = first_sample.date();
        let lower = midnight(day);
        ResolvedRange {
            lower,
            upper: lower + Duration::days(1),
            kind: RangeKind::Today,
            title: jp_date_with_weekday(day),
        }
    }
}

/// First day of the month following `(year, month)`, rolling December into
/// January of the next year
pub fn next_year_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// Midnight at the start of `date`
pub fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).expect("midnight always exists")
}

/// `YYYY年MM月DD日`
pub fn jp_date(date: NaiveDate) -> String {
    format!("{:04}年{:02}月{:02}日", date.year(), date.month(), date.day())
}

/// `YYYY年MM月DD日 (曜)`
pub fn jp_date_with_weekday(date: NaiveDate) -> String {
    let weekday = WEEKDAYS_JP[date.weekday().num_days_from_monday() as usize];
    format!("{} ({})", jp_date(date), weekday)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_today_bounds_are_one_day() {
        let spec = DateRangeSpec::Today {
            reference_date: date(2023, 9, 1),
        };
        let range = spec.resolve();

        assert_eq!(range.lower, midnight(date(2023, 9, 1)));
        assert_eq!(range.upper - range.lower, Duration::days(1));
        assert_eq!(range.kind, RangeKind::Today);
    }

    #[test]
    fn test_year_month_bounds() {
        let spec = DateRangeSpec::YearMonth { year: 2023, month: 9 };
        let range = spec.resolve();

        assert_eq!(range.lower, midnight(date(2023, 9, 1)));
        assert_eq!(range.upper, midnight(date(2023, 10, 1)));
        assert_eq!(range.upper.day(), 1);
        assert!(range.upper > range.lower);
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let spec = DateRangeSpec::YearMonth { year: 2023, month: 12 };
        let range = spec.resolve();

        assert_eq!(range.lower, midnight(date(2023, 12, 1)));
        assert_eq!(range.upper, midnight(date(2024, 1, 1)));
    }

    #[test]
    fn test_range_bounds() {
        let spec = DateRangeSpec::Range {
            start_day: date(2023, 9, 1),
            before_days: 7,
        };
        let range = spec.resolve();

        assert_eq!(range.lower, midnight(date(2023, 8, 25)));
        assert_eq!(range.upper, midnight(date(2023, 9, 2)));
        assert_eq!(range.kind, RangeKind::Range { before_days: 7 });
    }

    #[test]
    fn test_invalid_month_is_rejected() {
        let spec = DateRangeSpec::YearMonth { year: 2023, month: 13 };
        assert!(spec.try_resolve().is_none());
    }

    #[test]
    fn test_next_year_month() {
        assert_eq!(next_year_month(2023, 1), (2023, 2));
        assert_eq!(next_year_month(2023, 11), (2023, 12));
        assert_eq!(next_year_month(2023, 12), (2024, 1));
    }

    #[test]
    fn test_titles() {
        // 2023-09-01 is a Friday
        let today = DateRangeSpec::Today {
            reference_date: date(2023, 9, 1),
        };
        assert_eq!(today.resolve().title, "2023年09月01日 (金)");

        let month = DateRangeSpec::YearMonth { year: 2023, month: 9 };
        assert_eq!(month.resolve().title, "2023年09月");

        let range = DateRangeSpec::Range {
            start_day: date(2023, 9, 1),
            before_days: 2,
        };
        assert_eq!(range.resolve().title, "2023年08月30日 〜 2023年09月01日");
    }

    #[test]
    fn test_pin_to_sample_day() {
        let spec = DateRangeSpec::Today {
            reference_date: date(2023, 9, 2),
        };
        let range = spec.resolve();

        // First sample landed on the previous day (e.g. replaying a fixed date)
        let first = date(2023, 9, 1).and_hms_opt(10, 0, 0).unwrap();
        let pinned = range.pin_to_sample_day(first);

        assert_eq!(pinned.lower, midnight(date(2023, 9, 1)));
        assert_eq!(pinned.upper, midnight(date(2023, 9, 2)));
        assert_eq!(pinned.title, "2023年09月01日 (金)");
    }

    #[test]
    fn test_pin_leaves_other_kinds_unchanged() {
        let spec = DateRangeSpec::YearMonth { year: 2023, month: 9 };
        let range = spec.resolve();
        let first = date(2023, 9, 15).and_hms_opt(0, 0, 0).unwrap();

        assert_eq!(range.pin_to_sample_day(first), range);
    }
}
