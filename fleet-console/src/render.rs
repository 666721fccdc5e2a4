//! Display rendering pipeline
//!
//! Converts raw message and log text into safely-escaped HTML fragments:
//! ANSI SGR sequences become styled spans, structured log lines are split
//! into timestamp/level/thread/message fields.

mod ansi;
mod line;

pub use ansi::ansi_to_html;
pub use line::{classify_line, ParsedLine, Severity};
