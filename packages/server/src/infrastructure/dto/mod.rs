//! Data Transfer Objects (DTOs) for the relay.
//!
//! DTOs are organized by protocol:
//! - `websocket`: channel frames between agent sessions and the relay
//! - `http`: HTTP API bodies (events, streaming, transcripts, debug)

pub mod conversion;
pub mod http;
pub mod websocket;
