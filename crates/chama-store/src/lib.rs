//! Application state for chama
//!
//! A single [`AppState`] changes only through [`Action`]s applied by its
//! reducer. Effects run the async `Request`/`Success`/`Fail` flows against the
//! API, and each flow carries a [`Ticket`] so that late responses for a
//! superseded request are dropped instead of overwriting newer data.

mod action;
pub mod effects;
mod poller;
mod state;
mod store;
mod tracker;

pub use action::Action;
pub use poller::{DEFAULT_REFRESH_INTERVAL, LogPoller};
pub use state::{AppState, ChatState, LogsState, Remote, Route, SessionState};
pub use store::{Store, StoreHooks};
pub use tracker::{RequestTracker, Resource, Ticket};
