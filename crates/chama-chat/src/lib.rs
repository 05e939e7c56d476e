//! Chat message reconciliation for chama
//!
//! This crate turns fetched chat messages into ordered, deduplicated display
//! threads with day dividers, and keeps the read model for the support view.

mod day;
mod reconcile;
mod tickets;

pub use day::{DayBucket, format_relative};
pub use reconcile::{
    DisplayMessage, group_by_conversation, merge_messages, normalize, reconcile,
};
pub use tickets::{TicketBoard, TicketFilter};

// Re-export types used in our public API
pub use chama_types::{ChatMessage, Conversation, MessageStatus, SenderType};
