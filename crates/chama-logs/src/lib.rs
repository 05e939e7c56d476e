//! Log filtering for chama
//!
//! This crate provides the pure filter engine over fetched log entries and
//! the read-side statistics shown next to the log view.

mod filter;
mod stats;

pub use filter::{DateRange, LevelFilter, LogFilterPatch, LogFilterSpec, filter, filter_indices};
pub use stats::{LevelCounts, LogStats, RECENT_WINDOW_MINUTES};

// Re-export types used in our public API
pub use chama_types::{LogEntry, LogLevel};
