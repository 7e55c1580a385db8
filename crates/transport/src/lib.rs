//! Wire types for the streaming WebSocket transport

pub mod messages;
pub mod sink;

pub use messages::{ClientMessage, ServerMessage};
pub use sink::ChannelSink;
