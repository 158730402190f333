//! UI 層: HTTP / WebSocket のフロントドア

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::{Components, Server};
