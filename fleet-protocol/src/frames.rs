//! WebSocket frame types
//!
//! Inbound frames are tagged on `"type"`; an unrecognized tag fails
//! deserialization so the transport can reject and log it instead of
//! silently ignoring it.

use serde::{Deserialize, Serialize};

/// Reserved pseudo-origin for server-generated notices (client connect,
/// disconnect, delivery failures). Distinct from any real client id.
pub const SYSTEM_TAG: &str = "系统";

/// Payload of the initialization request sent right after connecting
const INIT_REQUEST: &str = "request_current_state";

/// Error produced when a frame cannot be encoded or decoded
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Invalid frame: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Frames sent from the backend to the console
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Authoritative snapshot of the currently connected client set
    ClientUpdate { clients: Vec<String> },

    /// One message from a remote client, or a system notice when `addr`
    /// is [`SYSTEM_TAG`]
    Message { addr: String, data: String },
}

impl ServerFrame {
    /// Decode a frame from its JSON wire form
    pub fn from_json(raw: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Whether this is a system-originated message frame
    pub fn is_system_message(&self) -> bool {
        matches!(self, Self::Message { addr, .. } if addr == SYSTEM_TAG)
    }
}

/// Frames sent from the console to the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConsoleFrame {
    /// Request the current full state snapshot (sent once per connection)
    Init { message: String },

    /// Deliver an operator-authored message to one client
    Send { addr: String, message: String },
}

impl ConsoleFrame {
    /// The initialization request declaring interest in the current state
    pub fn init() -> Self {
        Self::Init {
            message: INIT_REQUEST.to_string(),
        }
    }

    /// An outbound operator message addressed to `target`
    pub fn send(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Send {
            addr: target.into(),
            message: message.into(),
        }
    }

    /// Encode this frame to its JSON wire form
    pub fn to_json(&self) -> Result<String, FrameError> {
        Ok(serde_json::to_string(self)?)
    }
}
