//! Streaming transport
//!
//! Owns the WebSocket connection to the backend: connect, dispatch typed
//! inbound frames, reconnect with exponential backoff, and publish
//! connection-status changes.

mod handler;
mod socket;

pub use handler::MessageSender;
pub use socket::{
    reconnect_delay, ConnectionState, ReconnectPolicy, Transport, TransportHandle,
};
