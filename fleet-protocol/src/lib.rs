//! fleet-protocol: Shared wire definitions for the fleet operator console
//!
//! This crate defines the JSON frames exchanged with the backend over the
//! WebSocket stream and the response bodies of its log-retrieval HTTP API.
//! Field and tag names must match the backend byte-for-byte; nothing here
//! may be renamed without a coordinated backend change.

pub mod frames;
pub mod logs;

// Re-export main types at crate root
pub use frames::{ConsoleFrame, FrameError, ServerFrame, SYSTEM_TAG};
pub use logs::{ChunkRequest, LogChunk, LogFileInfo, SourceId};
