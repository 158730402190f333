//! UI handlers.
//!
//! - `http`: HTTP エンドポイント
//! - `websocket`: WebSocket チャンネル

pub mod http;
pub mod websocket;
