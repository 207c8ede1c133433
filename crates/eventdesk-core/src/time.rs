//! Time handling for event drafts.
//!
//! This module provides [`TimeOfDay`] for the wall-clock strings edited in a
//! draft, [`TimeFormat`] for rendering them, and [`DateTimeNormalizer`] which
//! converts between zone-local calendar values and the UTC instants stored on
//! an event.
//!
//! All-day events are stored as UTC midnights: an all-day event on the 2nd of
//! May is `[2019-05-02T00:00Z, 2019-05-03T00:00Z)` no matter which zone it was
//! created in. The stored instants only *denote* calendar days.

use std::fmt;
use std::sync::LazyLock;

use chrono::{
    DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike,
    Utc,
};
use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::event::RepeatPeriod;

static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d{1,2})(?::?(\d{2}))?\s*(am|pm|a\.m\.|p\.m\.)?\s*$")
        .expect("time pattern is valid")
});

/// Clock format used when rendering times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFormat {
    /// 24-hour format (e.g., "14:30").
    #[default]
    #[serde(rename = "24h")]
    H24,
    /// 12-hour format with AM/PM (e.g., "2:30 PM").
    #[serde(rename = "12h")]
    H12,
}

/// A wall-clock time without date or zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hours: u32,
    minutes: u32,
}

impl TimeOfDay {
    /// Midnight.
    pub const MIDNIGHT: TimeOfDay = TimeOfDay {
        hours: 0,
        minutes: 0,
    };

    /// Creates a time if `hours` is in 0..24 and `minutes` in 0..60.
    pub fn new(hours: u32, minutes: u32) -> Option<Self> {
        (hours < 24 && minutes < 60).then_some(Self { hours, minutes })
    }

    /// Parses user input such as `"13:05"`, `"1305"`, `"9"`, `"1:05 pm"`.
    ///
    /// With an am/pm suffix the hour must be in 1..=12.
    pub fn parse(input: &str) -> Option<Self> {
        let caps = TIME_PATTERN.captures(input)?;
        let mut hours: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minutes: u32 = match caps.get(2) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };

        if let Some(suffix) = caps.get(3) {
            if !(1..=12).contains(&hours) {
                return None;
            }
            let is_pm = suffix.as_str().to_ascii_lowercase().starts_with('p');
            hours = match (is_pm, hours) {
                (false, 12) => 0,
                (false, h) => h,
                (true, 12) => 12,
                (true, h) => h + 12,
            };
        }

        Self::new(hours, minutes)
    }

    /// Hour component (0..24).
    pub fn hours(&self) -> u32 {
        self.hours
    }

    /// Minute component (0..60).
    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// Minutes since midnight.
    pub fn total_minutes(&self) -> u32 {
        self.hours * 60 + self.minutes
    }

    /// Builds a time from minutes since midnight, clamping the hour to 23.
    pub fn from_total_minutes_clamped(total: u32) -> Self {
        Self {
            hours: (total / 60).min(23),
            minutes: total % 60,
        }
    }

    /// Renders the time in the given clock format.
    pub fn format(&self, format: TimeFormat) -> String {
        match format {
            TimeFormat::H24 => format!("{:02}:{:02}", self.hours, self.minutes),
            TimeFormat::H12 => {
                let suffix = if self.hours < 12 { "AM" } else { "PM" };
                let hours = match self.hours % 12 {
                    0 => 12,
                    h => h,
                };
                format!("{}:{:02} {}", hours, self.minutes, suffix)
            }
        }
    }

    fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hours, self.minutes, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(TimeFormat::H24))
    }
}

/// Encodes a calendar day as the UTC midnight instant that denotes it.
pub fn encode_all_day_boundary(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Inverse of [`encode_all_day_boundary`].
pub fn decode_all_day_to_local_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

/// Returns true if both instants sit on UTC midnight, which is how all-day
/// events are stored.
pub fn is_all_day_span(start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    start.time() == NaiveTime::MIN && end.time() == NaiveTime::MIN
}

/// Adds `count` periods to a local date-time. Months and years clamp to the
/// last valid day of the target month.
fn shift_naive(naive: NaiveDateTime, period: RepeatPeriod, count: i32) -> Option<NaiveDateTime> {
    match period {
        RepeatPeriod::Daily => naive.checked_add_signed(Duration::days(i64::from(count))),
        RepeatPeriod::Weekly => naive.checked_add_signed(Duration::weeks(i64::from(count))),
        RepeatPeriod::Monthly => shift_months(naive, count),
        RepeatPeriod::Yearly => shift_months(naive, count.checked_mul(12)?),
    }
}

fn shift_months(naive: NaiveDateTime, months: i32) -> Option<NaiveDateTime> {
    let delta = Months::new(months.unsigned_abs());
    if months >= 0 {
        naive.checked_add_months(delta)
    } else {
        naive.checked_sub_months(delta)
    }
}

/// Zone-aware conversions between draft values and stored instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeNormalizer {
    zone: Tz,
}

impl DateTimeNormalizer {
    /// Creates a normalizer for the given IANA zone.
    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }

    /// The zone this normalizer works in.
    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Resolves a local date-time in the zone to an instant.
    ///
    /// Ambiguous local times (DST fall-back) resolve to the earlier instant.
    /// Local times inside a DST gap are moved forward past the gap.
    pub fn resolve_local(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        let mut candidate = naive;
        for _ in 0..4 {
            if let Some(dt) = self.zone.from_local_datetime(&candidate).earliest() {
                return dt.with_timezone(&Utc);
            }
            candidate += Duration::minutes(30);
        }
        // No zone has a gap longer than two hours; fall back to reading the
        // wall clock as UTC.
        naive.and_utc()
    }

    /// Combines a local date and time of day into an instant.
    pub fn to_canonical_instant(&self, date: NaiveDate, time: TimeOfDay) -> DateTime<Utc> {
        self.resolve_local(date.and_time(time.to_naive_time()))
    }

    /// Parses `time` and combines it with `date`. Returns `None` if the time
    /// string does not parse.
    pub fn parse_to_instant(&self, date: NaiveDate, time: &str) -> Option<DateTime<Utc>> {
        TimeOfDay::parse(time).map(|t| self.to_canonical_instant(date, t))
    }

    /// Local midnight of `date`.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        self.resolve_local(date.and_time(NaiveTime::MIN))
    }

    /// Local midnight of the day after `date`.
    pub fn start_of_next_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let next = date.succ_opt().unwrap_or(date);
        self.start_of_day(next)
    }

    /// The local calendar date of an instant.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.zone).date_naive()
    }

    /// The local wall-clock time of an instant.
    pub fn local_time(&self, instant: DateTime<Utc>) -> TimeOfDay {
        let local = instant.with_timezone(&self.zone);
        TimeOfDay::new(local.hour(), local.minute()).unwrap_or(TimeOfDay::MIDNIGHT)
    }

    /// Encodes the local day an instant falls on as an all-day boundary.
    pub fn encode_all_day_instant(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        encode_all_day_boundary(self.local_date(instant))
    }

    /// Local midnight of the day an all-day boundary denotes.
    pub fn all_day_to_local_instant(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        self.start_of_day(decode_all_day_to_local_date(instant))
    }

    /// Shifts a date by `count` recurrence periods.
    ///
    /// Dates at the edge of the representable range are returned unchanged.
    pub fn shift_by_recurrence_period(
        &self,
        date: NaiveDate,
        period: RepeatPeriod,
        count: i32,
    ) -> NaiveDate {
        let start = self.start_of_day(date);
        self.local_date(self.shift_instant(start, period, count))
    }

    /// Shifts an instant by `count` recurrence periods, keeping its local
    /// wall-clock time across DST changes.
    pub fn shift_instant(
        &self,
        instant: DateTime<Utc>,
        period: RepeatPeriod,
        count: i32,
    ) -> DateTime<Utc> {
        let local = instant.with_timezone(&self.zone).naive_local();
        match shift_naive(local, period, count) {
            Some(shifted) => self.resolve_local(shifted),
            None => instant,
        }
    }

    /// Number of whole days from `from` to `to`.
    pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
        (to - from).num_days()
    }

    /// Replaces the year of `date`, clamping Feb 29 to Feb 28 if needed.
    pub fn with_year(date: NaiveDate, year: i32) -> NaiveDate {
        date.with_year(year)
            .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
            .unwrap_or(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::{America, Australia, Europe, Pacific};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    mod time_of_day {
        use super::*;

        #[test]
        fn parses_24h_forms() {
            assert_eq!(TimeOfDay::parse("13:05"), TimeOfDay::new(13, 5));
            assert_eq!(TimeOfDay::parse("1305"), TimeOfDay::new(13, 5));
            assert_eq!(TimeOfDay::parse("9"), TimeOfDay::new(9, 0));
            assert_eq!(TimeOfDay::parse(" 7:30 "), TimeOfDay::new(7, 30));
            assert_eq!(TimeOfDay::parse("00:00"), Some(TimeOfDay::MIDNIGHT));
        }

        #[test]
        fn parses_12h_forms() {
            assert_eq!(TimeOfDay::parse("1:05 pm"), TimeOfDay::new(13, 5));
            assert_eq!(TimeOfDay::parse("12:00 AM"), TimeOfDay::new(0, 0));
            assert_eq!(TimeOfDay::parse("12:30 p.m."), TimeOfDay::new(12, 30));
            assert_eq!(TimeOfDay::parse("11am"), TimeOfDay::new(11, 0));
        }

        #[test]
        fn rejects_invalid_input() {
            assert_eq!(TimeOfDay::parse(""), None);
            assert_eq!(TimeOfDay::parse("24:00"), None);
            assert_eq!(TimeOfDay::parse("12:60"), None);
            assert_eq!(TimeOfDay::parse("13:00 pm"), None);
            assert_eq!(TimeOfDay::parse("0 am"), None);
            assert_eq!(TimeOfDay::parse("noon"), None);
            assert_eq!(TimeOfDay::parse("1:2"), None);
        }

        #[test]
        fn formats_both_clocks() {
            let t = TimeOfDay::new(14, 5).unwrap();
            assert_eq!(t.format(TimeFormat::H24), "14:05");
            assert_eq!(t.format(TimeFormat::H12), "2:05 PM");
            assert_eq!(TimeOfDay::MIDNIGHT.format(TimeFormat::H12), "12:00 AM");
            assert_eq!(TimeOfDay::new(12, 0).unwrap().format(TimeFormat::H12), "12:00 PM");
        }

        #[test]
        fn formatted_times_parse_back() {
            for (h, m) in [(0, 0), (9, 15), (12, 0), (23, 59)] {
                let t = TimeOfDay::new(h, m).unwrap();
                assert_eq!(TimeOfDay::parse(&t.format(TimeFormat::H12)), Some(t));
                assert_eq!(TimeOfDay::parse(&t.format(TimeFormat::H24)), Some(t));
            }
        }

        #[test]
        fn clamps_total_minutes() {
            assert_eq!(
                TimeOfDay::from_total_minutes_clamped(25 * 60 + 10),
                TimeOfDay::new(23, 10).unwrap()
            );
        }
    }

    mod normalizer {
        use super::*;

        #[test]
        fn canonical_instant_uses_zone_offset() {
            let n = DateTimeNormalizer::new(Europe::Berlin);
            let t = TimeOfDay::new(12, 0).unwrap();
            // CEST is UTC+2.
            assert_eq!(n.to_canonical_instant(date(2020, 5, 26), t), utc(2020, 5, 26, 10, 0));
            // CET is UTC+1.
            assert_eq!(n.to_canonical_instant(date(2020, 1, 26), t), utc(2020, 1, 26, 11, 0));
        }

        #[test]
        fn parse_to_instant_rejects_bad_time() {
            let n = DateTimeNormalizer::new(Europe::Berlin);
            assert!(n.parse_to_instant(date(2020, 5, 26), "25:00").is_none());
            assert!(n.parse_to_instant(date(2020, 5, 26), "08:30").is_some());
        }

        #[test]
        fn dst_gap_moves_forward() {
            let n = DateTimeNormalizer::new(Europe::Berlin);
            // 02:30 does not exist on 2021-03-28 in Berlin.
            let t = TimeOfDay::new(2, 30).unwrap();
            assert_eq!(n.to_canonical_instant(date(2021, 3, 28), t), utc(2021, 3, 28, 1, 0));
        }

        #[test]
        fn dst_overlap_picks_earliest() {
            let n = DateTimeNormalizer::new(Europe::Berlin);
            let t = TimeOfDay::new(2, 30).unwrap();
            assert_eq!(n.to_canonical_instant(date(2021, 10, 31), t), utc(2021, 10, 31, 0, 30));
        }

        #[test]
        fn all_day_round_trip_in_many_zones() {
            let zones = [
                Tz::UTC,
                Europe::Berlin,
                America::New_York,
                Pacific::Kiritimati,
                Pacific::Pago_Pago,
                Australia::Lord_Howe,
            ];
            let dates = [
                date(2019, 5, 2),
                date(2020, 2, 29),
                date(2021, 3, 28),
                date(1969, 12, 31),
                date(2038, 1, 19),
            ];
            for zone in zones {
                let n = DateTimeNormalizer::new(zone);
                for d in dates {
                    let encoded = encode_all_day_boundary(d);
                    assert_eq!(decode_all_day_to_local_date(encoded), d);
                    assert_eq!(n.encode_all_day_instant(n.start_of_day(d)), encoded);
                }
            }
        }

        #[test]
        fn all_day_boundary_is_utc_midnight() {
            let encoded = encode_all_day_boundary(date(2019, 5, 2));
            assert_eq!(encoded, utc(2019, 5, 2, 0, 0));
            assert!(is_all_day_span(encoded, encode_all_day_boundary(date(2019, 5, 3))));
            assert!(!is_all_day_span(encoded, utc(2019, 5, 2, 13, 0)));
        }

        #[test]
        fn monthly_shift_clamps_to_month_end() {
            let n = DateTimeNormalizer::new(Europe::Berlin);
            assert_eq!(
                n.shift_by_recurrence_period(date(2021, 1, 31), RepeatPeriod::Monthly, 1),
                date(2021, 2, 28)
            );
            assert_eq!(
                n.shift_by_recurrence_period(date(2020, 1, 31), RepeatPeriod::Monthly, 1),
                date(2020, 2, 29)
            );
            assert_eq!(
                n.shift_by_recurrence_period(date(2020, 2, 29), RepeatPeriod::Yearly, 1),
                date(2021, 2, 28)
            );
        }

        #[test]
        fn shifts_backwards_and_by_weeks() {
            let n = DateTimeNormalizer::new(America::New_York);
            assert_eq!(
                n.shift_by_recurrence_period(date(2021, 3, 1), RepeatPeriod::Daily, -1),
                date(2021, 2, 28)
            );
            assert_eq!(
                n.shift_by_recurrence_period(date(2021, 3, 1), RepeatPeriod::Weekly, 2),
                date(2021, 3, 15)
            );
            assert_eq!(
                n.shift_by_recurrence_period(date(2021, 3, 31), RepeatPeriod::Monthly, -1),
                date(2021, 2, 28)
            );
        }

        #[test]
        fn instant_shift_keeps_wall_clock_across_dst() {
            let n = DateTimeNormalizer::new(Europe::Berlin);
            // 09:00 CET on Saturday, one day later is 09:00 CEST.
            let before = utc(2021, 3, 27, 8, 0);
            let after = n.shift_instant(before, RepeatPeriod::Daily, 1);
            assert_eq!(after, utc(2021, 3, 28, 7, 0));
            assert_eq!(n.local_time(after), TimeOfDay::new(9, 0).unwrap());
        }

        #[test]
        fn local_date_and_time() {
            let n = DateTimeNormalizer::new(America::New_York);
            let instant = utc(2020, 5, 27, 2, 30);
            assert_eq!(n.local_date(instant), date(2020, 5, 26));
            assert_eq!(n.local_time(instant), TimeOfDay::new(22, 30).unwrap());
        }

        #[test]
        fn year_replacement_clamps_leap_day() {
            assert_eq!(DateTimeNormalizer::with_year(date(1960, 2, 29), 2021), date(2021, 2, 28));
            assert_eq!(DateTimeNormalizer::with_year(date(1960, 6, 3), 2021), date(2021, 6, 3));
        }

        #[test]
        fn days_between_dates() {
            assert_eq!(DateTimeNormalizer::days_between(date(2020, 5, 26), date(2020, 5, 3)), -23);
        }
    }
}
