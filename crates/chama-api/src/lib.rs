//! REST client for chama
//!
//! This crate wraps the backend endpoints behind [`ApiClient`], which attaches
//! the session token and runs [`SessionHooks`] on auth and transport failures.

mod admin;
mod chat;
mod client;
mod error;
mod logs;
mod payload;
mod session;

pub use chat::SendMessage;
pub use client::{ApiClient, ApiConfig};
pub use error::{ApiError, Result};
pub use session::{LoggingHooks, SessionHooks, TokenStore};
