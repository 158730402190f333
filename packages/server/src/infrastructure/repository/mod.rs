//! 接続レジストリの実装
//!
//! - `inmemory`: HashMap を使ったインメモリ実装
//! - 将来的に: 永続 KVS を使った実装

pub mod inmemory;

pub use inmemory::InMemoryConnectionRegistry;
