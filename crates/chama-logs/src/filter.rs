use std::str::FromStr;

use chrono::{DateTime, Utc};
use tracing::debug;

use chama_types::LogEntry;

/// Level criterion: everything, or one level given by name or numeric code
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LevelFilter {
    #[default]
    All,
    Matching(String),
}

impl LevelFilter {
    /// Passes if the symbolic name matches case-insensitively, or the raw
    /// level as sent equals the requested value exactly
    pub fn matches(&self, entry: &LogEntry) -> bool {
        match self {
            Self::All => true,
            Self::Matching(wanted) => {
                entry.level_name.as_str().eq_ignore_ascii_case(wanted)
                    || entry.level.as_deref() == Some(wanted.as_str())
            }
        }
    }
}

impl FromStr for LevelFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            Ok(Self::Matching(s.to_string()))
        }
    }
}

/// Inclusive range of absolute instants
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant <= self.to
    }
}

/// Filter criteria for the log view; all present criteria must pass
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogFilterSpec {
    pub level: LevelFilter,

    /// Case-insensitive substring over message or source
    pub search: String,

    pub date_range: Option<DateRange>,
}

/// Partial update: `None` leaves the current value untouched
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogFilterPatch {
    pub level: Option<LevelFilter>,
    pub search: Option<String>,
    pub date_range: Option<Option<DateRange>>,
}

impl LogFilterPatch {
    pub fn level(mut self, level: LevelFilter) -> Self {
        self.level = Some(level);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// `None` clears the range
    pub fn date_range(mut self, range: Option<DateRange>) -> Self {
        self.date_range = Some(range);
        self
    }
}

impl LogFilterSpec {
    /// Merge only the keys present in `patch`
    pub fn apply(&mut self, patch: LogFilterPatch) {
        if let Some(level) = patch.level {
            self.level = level;
        }
        if let Some(search) = patch.search {
            self.search = search;
        }
        if let Some(range) = patch.date_range {
            self.date_range = range;
        }
    }

    /// Check if the spec passes every entry
    pub fn is_empty(&self) -> bool {
        self.level == LevelFilter::All && self.search.is_empty() && self.date_range.is_none()
    }

    /// Check if a log entry passes level, search and date criteria
    pub fn matches(&self, entry: &LogEntry) -> bool {
        self.level.matches(entry) && self.matches_search(entry) && self.matches_date(entry)
    }

    fn matches_search(&self, entry: &LogEntry) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        entry.message().to_lowercase().contains(&needle)
            || entry.source().to_lowercase().contains(&needle)
    }

    fn matches_date(&self, entry: &LogEntry) -> bool {
        let Some(range) = &self.date_range else {
            return true;
        };
        // Unparsable dates never fall inside a range
        entry
            .effective_instant()
            .is_some_and(|instant| range.contains(instant))
    }
}

/// Positions of the entries passing `spec`, in input order
pub fn filter_indices(logs: &[LogEntry], spec: &LogFilterSpec) -> Vec<usize> {
    logs.iter()
        .enumerate()
        .filter(|(_, entry)| spec.matches(entry))
        .map(|(i, _)| i)
        .collect()
}

/// Stable-order subsequence of `logs` passing `spec`
pub fn filter(logs: &[LogEntry], spec: &LogFilterSpec) -> Vec<LogEntry> {
    if spec.is_empty() {
        return logs.to_vec();
    }

    let kept: Vec<LogEntry> = logs.iter().filter(|e| spec.matches(e)).cloned().collect();
    debug!(total = logs.len(), kept = kept.len(), "filtered log entries");
    kept
}
