//! Suggestion relay library.
//!
//! Connects agent sessions (over WebSocket) to an external suggestion
//! generator: customer messages come in as events, a suggestion is generated
//! once and fanned out to every connection subscribed to the conversation.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
