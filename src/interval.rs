use serde::{Deserialize, Serialize};
use time::{Date, Duration, Time};

use crate::error::SchedulingError;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// A half-open slice of a single calendar day. `start` is inclusive,
/// `end` exclusive, so back-to-back intervals never conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub date: Date,
    pub start: Time,
    pub end: Time,
}

impl TimeInterval {
    pub fn new(date: Date, start: Time, end: Time) -> Result<Self, SchedulingError> {
        if start >= end {
            return Err(SchedulingError::Validation(format!(
                "interval start {start} must be before end {end}"
            )));
        }
        Ok(Self { date, start, end })
    }

    /// Builds the interval a booking request describes. Slots that would
    /// run past midnight are rejected; appointments are single-day only.
    pub fn from_start_and_duration(
        date: Date,
        start: Time,
        duration_minutes: i64,
    ) -> Result<Self, SchedulingError> {
        if duration_minutes <= 0 {
            return Err(SchedulingError::Validation(format!(
                "duration must be positive, got {duration_minutes}"
            )));
        }
        // `Time + Duration` wraps around midnight, so a full day or more
        // would silently alias onto a shorter same-day interval.
        if duration_minutes >= MINUTES_PER_DAY {
            return Err(SchedulingError::Validation(format!(
                "duration must be shorter than a day, got {duration_minutes} minutes"
            )));
        }
        let end = start + Duration::minutes(duration_minutes);
        if end <= start {
            return Err(SchedulingError::Validation(
                "appointment may not extend past midnight".to_string(),
            ));
        }
        Self::new(date, start, end)
    }

    /// Two intervals overlap iff they share the same date and any instant
    /// of time. Touching endpoints (a.end == b.start) do not overlap.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.date == other.date && self.start < other.end && other.start < self.end
    }

    /// True iff `inner` lies entirely within `self`. Matching endpoints count
    /// as contained.
    pub fn contains(&self, inner: &TimeInterval) -> bool {
        self.date == inner.date && self.start <= inner.start && self.end >= inner.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).whole_minutes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, time};

    fn iv(start: Time, end: Time) -> TimeInterval {
        TimeInterval::new(date!(2025 - 06 - 01), start, end).unwrap()
    }

    #[test]
    fn rejects_inverted_and_empty_intervals() {
        let d = date!(2025 - 06 - 01);
        assert!(TimeInterval::new(d, time!(10:00), time!(9:00)).is_err());
        assert!(TimeInterval::new(d, time!(10:00), time!(10:00)).is_err());
    }

    #[test]
    fn overlap_is_half_open() {
        let a = iv(time!(9:00), time!(10:00));
        let b = iv(time!(10:00), time!(11:00));
        let c = iv(time!(9:30), time!(10:30));

        // touching endpoints do not conflict
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));

        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
        assert!(a.overlaps(&a));
    }

    #[test]
    fn overlap_requires_same_date() {
        let a = iv(time!(9:00), time!(10:00));
        let b = TimeInterval::new(date!(2025 - 06 - 02), time!(9:00), time!(10:00)).unwrap();
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn containment_allows_shared_endpoints() {
        let window = iv(time!(9:00), time!(12:00));
        assert!(window.contains(&iv(time!(9:00), time!(12:00))));
        assert!(window.contains(&iv(time!(10:00), time!(10:30))));
        assert!(!window.contains(&iv(time!(8:30), time!(9:30))));
        assert!(!window.contains(&iv(time!(11:30), time!(12:30))));
    }

    #[test]
    fn duration_builder_rejects_midnight_wrap() {
        let d = date!(2025 - 06 - 01);
        let err = TimeInterval::from_start_and_duration(d, time!(23:45), 30);
        assert!(err.is_err());

        let ok = TimeInterval::from_start_and_duration(d, time!(10:00), 30).unwrap();
        assert_eq!(ok.end, time!(10:30));
        assert_eq!(ok.duration_minutes(), 30);
    }

    #[test]
    fn duration_builder_rejects_a_full_day_or_more() {
        let d = date!(2025 - 06 - 01);

        // A 25-hour duration wraps back onto the same day and must not be
        // accepted as a one-hour interval.
        assert!(TimeInterval::from_start_and_duration(d, time!(10:00), 25 * 60).is_err());
        assert!(TimeInterval::from_start_and_duration(d, time!(0:00), 24 * 60).is_err());

        let ok = TimeInterval::from_start_and_duration(d, time!(0:00), 24 * 60 - 1).unwrap();
        assert_eq!(ok.end, time!(23:59));
    }
}
