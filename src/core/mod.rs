//! Core conversation components
//!
//! The controller decides what happens on each user action; the session
//! store keeps every session's state between requests.

mod controller;
mod sessions;

pub use controller::{Action, ControllerError, ConversationController};
pub use sessions::{SessionLimits, SessionStore};
