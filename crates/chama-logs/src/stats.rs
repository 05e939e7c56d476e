use chrono::Duration;

use chama_types::{Clock, LogEntry, LogLevel};

/// Entries newer than this count as recent
pub const RECENT_WINDOW_MINUTES: i64 = 60;

/// Counts per log level
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelCounts {
    pub error: usize,
    pub warn: usize,
    pub info: usize,
    pub debug: usize,
    pub unknown: usize,
}

impl LevelCounts {
    pub fn total(&self) -> usize {
        self.error + self.warn + self.info + self.debug + self.unknown
    }

    pub fn get(&self, level: LogLevel) -> usize {
        match level {
            LogLevel::Error => self.error,
            LogLevel::Warn => self.warn,
            LogLevel::Info => self.info,
            LogLevel::Debug => self.debug,
            LogLevel::Unknown => self.unknown,
        }
    }

    fn increment(&mut self, level: LogLevel) {
        match level {
            LogLevel::Error => self.error += 1,
            LogLevel::Warn => self.warn += 1,
            LogLevel::Info => self.info += 1,
            LogLevel::Debug => self.debug += 1,
            LogLevel::Unknown => self.unknown += 1,
        }
    }
}

/// Read-side aggregates over a sequence of log entries
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogStats {
    pub total: usize,
    pub by_level: LevelCounts,

    /// Entries within the last hour of `clock.now()`
    pub recent: usize,
}

impl LogStats {
    pub fn compute(entries: &[LogEntry], clock: &dyn Clock) -> Self {
        let cutoff = clock.now() - Duration::minutes(RECENT_WINDOW_MINUTES);
        let mut stats = Self {
            total: entries.len(),
            ..Self::default()
        };

        for entry in entries {
            stats.by_level.increment(entry.level_name);
            // Future-dated entries are counted; unparsable ones never are
            if entry.effective_instant().is_some_and(|t| t > cutoff) {
                stats.recent += 1;
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chama_types::FixedClock;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_counts_and_recent() {
        let clock = FixedClock::at(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap());
        let entries = vec![
            LogEntry::new(LogLevel::Error, "2024-01-15T11:30:00Z", "a"),
            LogEntry::new(LogLevel::Error, "2024-01-15T10:59:59Z", "b"),
            LogEntry::new(LogLevel::Info, "2024-01-15T12:10:00Z", "c"),
            LogEntry::new(LogLevel::Warn, "garbage", "d"),
        ];

        let stats = LogStats::compute(&entries, &clock);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.by_level.get(LogLevel::Error), 2);
        assert_eq!(stats.by_level.warn, 1);
        assert_eq!(stats.by_level.total(), 4);
        assert_eq!(stats.recent, 2);
    }

    #[test]
    fn test_empty_input() {
        let clock = FixedClock::at(Utc::now());
        assert_eq!(LogStats::compute(&[], &clock), LogStats::default());
    }
}
