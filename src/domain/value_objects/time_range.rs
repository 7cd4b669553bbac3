//! Half-open UTC time interval used for appointments and opening windows.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Returns `None` when `end <= start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    /// `None` when the end would fall outside the representable range.
    pub fn starting_at(start: DateTime<Utc>, duration: Duration) -> Option<Self> {
        Self::new(start, start.checked_add_signed(duration)?)
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Touching ranges (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    fn range(h1: u32, m1: u32, h2: u32, m2: u32) -> TimeRange {
        TimeRange::new(at(h1, m1), at(h2, m2)).unwrap()
    }

    #[test]
    fn test_empty_range_rejected() {
        assert!(TimeRange::new(at(10, 0), at(10, 0)).is_none());
        assert!(TimeRange::new(at(11, 0), at(10, 0)).is_none());
    }

    #[test]
    fn test_overlap() {
        let a = range(10, 0, 11, 0);
        assert!(a.overlaps(&range(10, 30, 11, 30)));
        assert!(a.overlaps(&range(9, 0, 12, 0)));
        assert!(!a.overlaps(&range(11, 0, 12, 0)));
        assert!(!a.overlaps(&range(9, 0, 10, 0)));
    }

    #[test]
    fn test_starting_at_overflow_is_none() {
        assert!(TimeRange::starting_at(DateTime::<Utc>::MAX_UTC, Duration::minutes(1)).is_none());
        assert_eq!(
            TimeRange::starting_at(at(10, 0), Duration::minutes(45)),
            Some(range(10, 0, 10, 45))
        );
    }

    #[test]
    fn test_contains() {
        let day = range(9, 0, 18, 0);
        assert!(day.contains(&range(9, 0, 10, 0)));
        assert!(day.contains(&range(17, 0, 18, 0)));
        assert!(!day.contains(&range(17, 30, 18, 30)));
    }
}
