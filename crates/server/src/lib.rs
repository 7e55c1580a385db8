//! HTTP and WebSocket surface for the speech translation pipeline

pub mod http;
pub mod state;
pub mod ws;

pub use state::AppState;
