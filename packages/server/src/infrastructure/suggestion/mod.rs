//! 提案生成関数の呼び出し
//!
//! - `http`: HTTP で公開された提案生成関数を呼ぶ実装

pub mod http;

pub use http::HttpSuggestionGenerator;
