//! Agent-side session for the suggestion relay.
//!
//! An agent session keeps one WebSocket channel to the relay open, subscribes
//! it to the conversation the agent is handling, and polls the conversation
//! transcript so that new customer messages reach the relay.

pub mod config;
pub mod domain;
pub mod error;
pub mod formatter;
pub mod poller;
pub mod relay;
pub mod session;
pub mod subscription;
pub mod transcript;
pub mod ui;
