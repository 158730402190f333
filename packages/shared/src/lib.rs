//! Shared utilities for the Madoguchi server and agent client.

pub mod logger;
pub mod time;
