use chrono::{DateTime, Duration, NaiveDate, Utc};

use chama_types::Clock;

/// Calendar bucket of an instant relative to the viewer's current day
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DayBucket {
    Today,
    Yesterday,
    Date(NaiveDate),
    /// The instant could not be parsed
    Unknown,
}

impl DayBucket {
    /// Bucket `instant` in the clock's offset, evaluated against `clock.now()`
    pub fn of(instant: Option<DateTime<Utc>>, clock: &dyn Clock) -> Self {
        let Some(instant) = instant else {
            return Self::Unknown;
        };

        let offset = clock.offset();
        let today = clock.now().with_timezone(&offset).date_naive();
        let day = instant.with_timezone(&offset).date_naive();

        if day == today {
            Self::Today
        } else if today.pred_opt() == Some(day) {
            Self::Yesterday
        } else {
            Self::Date(day)
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Today => "Today".to_string(),
            Self::Yesterday => "Yesterday".to_string(),
            Self::Date(day) => day.format("%-m/%-d/%Y").to_string(),
            Self::Unknown => "Unknown date".to_string(),
        }
    }
}

impl std::fmt::Display for DayBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// Short relative age for list rows ("5m ago"); older than a week shows the date
pub fn format_relative(instant: DateTime<Utc>, clock: &dyn Clock) -> String {
    let age = clock.now() - instant;

    if age < Duration::minutes(1) {
        "just now".to_string()
    } else if age < Duration::hours(1) {
        format!("{}m ago", age.num_minutes())
    } else if age < Duration::days(1) {
        format!("{}h ago", age.num_hours())
    } else if age < Duration::days(7) {
        format!("{}d ago", age.num_days())
    } else {
        instant
            .with_timezone(&clock.offset())
            .format("%-m/%-d/%Y")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chama_types::FixedClock;
    use chrono::{FixedOffset, TimeZone};

    fn clock() -> FixedClock {
        FixedClock::at(Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap())
    }

    #[test]
    fn test_buckets() {
        let clock = clock();
        let at = |d, h| Some(Utc.with_ymd_and_hms(2024, 3, d, h, 0, 0).unwrap());

        assert_eq!(DayBucket::of(at(10, 1), &clock), DayBucket::Today);
        assert_eq!(DayBucket::of(at(9, 23), &clock), DayBucket::Yesterday);
        assert_eq!(DayBucket::of(at(8, 12), &clock).label(), "3/8/2024");
        assert_eq!(DayBucket::of(None, &clock), DayBucket::Unknown);
    }

    #[test]
    fn test_buckets_follow_offset() {
        let mut clock = clock();
        // 23:30 UTC on the 9th is already the 10th in Nairobi
        clock.offset = FixedOffset::east_opt(3 * 3600).unwrap();
        let late = Some(Utc.with_ymd_and_hms(2024, 3, 9, 23, 30, 0).unwrap());
        assert_eq!(DayBucket::of(late, &clock), DayBucket::Today);
    }

    #[test]
    fn test_format_relative() {
        let clock = clock();
        let now = clock.now;
        assert_eq!(format_relative(now - Duration::seconds(20), &clock), "just now");
        assert_eq!(format_relative(now - Duration::minutes(5), &clock), "5m ago");
        assert_eq!(format_relative(now - Duration::hours(3), &clock), "3h ago");
        assert_eq!(format_relative(now - Duration::days(2), &clock), "2d ago");
        assert_eq!(format_relative(now - Duration::days(30), &clock), "2/9/2024");
    }
}
