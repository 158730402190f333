//! ストリーミング有効化の実装
//!
//! - `http`: テレフォニー基盤の有効化エンドポイントを HTTP で呼ぶ実装

pub mod http;

pub use http::HttpStreamingActivator;
