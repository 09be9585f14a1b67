//! Extended-hour venue clock
//!
//! The venue's operating day runs past midnight and is expressed as hours
//! 0–29: wall-clock hours 00:00–05:59 belong to the *business date* of the
//! previous calendar day (the shift that started the evening before) and
//! sort as hours 24–29 of that date. All ordering, overlap and lead-time
//! arithmetic goes through this type; raw wall-clock hours are never
//! compared directly.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Wall-clock hours below this belong to the previous business date.
pub const BUSINESS_DAY_ROLLOVER_HOUR: u32 = 6;

/// An instant on the venue's extended-hour clock.
///
/// Internally canonical as calendar date + wall-clock hour (0–23) +
/// minute; the business-date / extended-hour view is derived. Two
/// instants compare on the real timeline, which is identical to ordering
/// by (business date, extended hour, minute).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockInstant {
    date: NaiveDate,
    hour: u32,
    minute: u32,
}

impl ClockInstant {
    /// Build from a calendar date and wall-clock time.
    ///
    /// Returns `None` when `hour` or `minute` is out of range.
    pub fn from_wall(date: NaiveDate, hour: u32, minute: u32) -> Option<Self> {
        if hour >= 24 || minute >= 60 {
            return None;
        }
        Some(Self { date, hour, minute })
    }

    /// Build from a business date and an extended hour (0–30).
    ///
    /// Hours 24–30 land on the next calendar day. Hour 30 is accepted so
    /// slot end bounds can be converted; it is wall-clock 06:00 of the
    /// following day.
    pub fn from_business(business_date: NaiveDate, extended_hour: u32, minute: u32) -> Option<Self> {
        if extended_hour > 30 || minute >= 60 {
            return None;
        }
        if extended_hour >= 24 {
            Some(Self {
                date: business_date.succ_opt()?,
                hour: extended_hour - 24,
                minute,
            })
        } else {
            Some(Self {
                date: business_date,
                hour: extended_hour,
                minute,
            })
        }
    }

    /// Build from a local naive datetime.
    pub fn from_local_datetime(dt: NaiveDateTime) -> Self {
        Self {
            date: dt.date(),
            hour: dt.hour(),
            minute: dt.minute(),
        }
    }

    /// The current instant in venue-local time, given the venue's UTC
    /// offset in hours.
    pub fn now(utc_offset_hours: i32) -> Self {
        let local = Utc::now().naive_utc() + Duration::hours(utc_offset_hours as i64);
        Self::from_local_datetime(local)
    }

    /// Calendar date of this instant.
    pub fn calendar_date(&self) -> NaiveDate {
        self.date
    }

    /// Wall-clock hour (0–23).
    pub fn wall_hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// The business date this instant is attributed to: hours 0–5 belong
    /// to the previous calendar day.
    pub fn business_date(&self) -> NaiveDate {
        if self.hour < BUSINESS_DAY_ROLLOVER_HOUR {
            self.date.pred_opt().unwrap_or(self.date)
        } else {
            self.date
        }
    }

    /// Hour on the extended 0–29 clock of the business date.
    pub fn extended_hour(&self) -> u32 {
        if self.hour < BUSINESS_DAY_ROLLOVER_HOUR {
            self.hour + 24
        } else {
            self.hour
        }
    }

    /// (business date, extended hour) view used for grouping and display.
    pub fn extended(&self) -> (NaiveDate, u32) {
        (self.business_date(), self.extended_hour())
    }

    /// The real-timeline datetime of this instant.
    pub fn to_local_datetime(&self) -> NaiveDateTime {
        self.date
            .and_time(NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or_default())
    }

    pub fn add_hours(&self, hours: i64) -> Self {
        Self::from_local_datetime(self.to_local_datetime() + Duration::hours(hours))
    }

    pub fn add_days(&self, days: i64) -> Self {
        Self::from_local_datetime(self.to_local_datetime() + Duration::days(days))
    }

    pub fn is_before(&self, other: &Self) -> bool {
        self < other
    }

    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }

    /// Whole hours from `self` until `other` (negative when `other` is in
    /// the past).
    pub fn hours_until(&self, other: &Self) -> i64 {
        (other.to_local_datetime() - self.to_local_datetime()).num_hours()
    }

    /// Whole minutes from `self` until `other`.
    pub fn minutes_until(&self, other: &Self) -> i64 {
        (other.to_local_datetime() - self.to_local_datetime()).num_minutes()
    }
}

impl Ord for ClockInstant {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.to_local_datetime().cmp(&other.to_local_datetime())
    }
}

impl PartialOrd for ClockInstant {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for ClockInstant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (date, hour) = self.extended();
        write!(f, "{} {:02}:{:02}", date, hour, self.minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_early_morning_belongs_to_previous_business_date() {
        // 02:30 on July 27 is hour 26 of the July 26 business day
        let instant = ClockInstant::from_wall(date(2025, 7, 27), 2, 30).unwrap();
        assert_eq!(instant.business_date(), date(2025, 7, 26));
        assert_eq!(instant.extended_hour(), 26);
    }

    #[test]
    fn test_daytime_keeps_calendar_date() {
        let instant = ClockInstant::from_wall(date(2025, 7, 26), 14, 0).unwrap();
        assert_eq!(instant.business_date(), date(2025, 7, 26));
        assert_eq!(instant.extended_hour(), 14);
    }

    #[test]
    fn test_rollover_boundary() {
        let five_am = ClockInstant::from_wall(date(2025, 7, 27), 5, 59).unwrap();
        assert_eq!(five_am.business_date(), date(2025, 7, 26));
        assert_eq!(five_am.extended_hour(), 29);

        let six_am = ClockInstant::from_wall(date(2025, 7, 27), 6, 0).unwrap();
        assert_eq!(six_am.business_date(), date(2025, 7, 27));
        assert_eq!(six_am.extended_hour(), 6);
    }

    #[test]
    fn test_from_business_extended_hours_cross_midnight() {
        let instant = ClockInstant::from_business(date(2025, 7, 26), 26, 0).unwrap();
        assert_eq!(instant.calendar_date(), date(2025, 7, 27));
        assert_eq!(instant.wall_hour(), 2);
        assert_eq!(instant.business_date(), date(2025, 7, 26));
    }

    #[test]
    fn test_from_business_roundtrip() {
        for hour in 6..30 {
            let instant = ClockInstant::from_business(date(2025, 7, 26), hour, 15).unwrap();
            assert_eq!(instant.extended(), (date(2025, 7, 26), hour));
        }
    }

    #[test]
    fn test_ordering_follows_business_timeline() {
        // 23:00 on the 26th sorts before 01:00 on the 27th (= hour 25 of
        // the 26th business day)
        let late = ClockInstant::from_wall(date(2025, 7, 26), 23, 0).unwrap();
        let after_midnight = ClockInstant::from_wall(date(2025, 7, 27), 1, 0).unwrap();
        assert!(late.is_before(&after_midnight));
        assert!(after_midnight.is_after(&late));
        assert_eq!(late.hours_until(&after_midnight), 2);
    }

    #[test]
    fn test_add_hours_and_days() {
        let instant = ClockInstant::from_wall(date(2025, 7, 26), 22, 0).unwrap();
        let plus_four = instant.add_hours(4);
        assert_eq!(plus_four.calendar_date(), date(2025, 7, 27));
        assert_eq!(plus_four.business_date(), date(2025, 7, 26));
        assert_eq!(plus_four.extended_hour(), 26);

        let plus_day = instant.add_days(1);
        assert_eq!(plus_day.calendar_date(), date(2025, 7, 27));
        assert_eq!(plus_day.extended_hour(), 22);
    }

    #[test]
    fn test_minutes_until() {
        let a = ClockInstant::from_business(date(2025, 7, 26), 14, 0).unwrap();
        let b = ClockInstant::from_business(date(2025, 7, 26), 16, 0).unwrap();
        assert_eq!(a.minutes_until(&b), 120);
        assert_eq!(b.minutes_until(&a), -120);
    }

    #[test]
    fn test_slot_end_hour_thirty() {
        let end = ClockInstant::from_business(date(2025, 7, 26), 30, 0).unwrap();
        assert_eq!(end.calendar_date(), date(2025, 7, 27));
        assert_eq!(end.wall_hour(), 6);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(ClockInstant::from_wall(date(2025, 7, 26), 24, 0).is_none());
        assert!(ClockInstant::from_wall(date(2025, 7, 26), 10, 60).is_none());
        assert!(ClockInstant::from_business(date(2025, 7, 26), 31, 0).is_none());
    }
}
