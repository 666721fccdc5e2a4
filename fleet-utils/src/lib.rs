//! fleet-utils: Common utilities for the fleet operator console
//!
//! Provides the shared error type, logging setup, and XDG path helpers
//! used by the other fleet crates.

pub mod error;
pub mod logging;
pub mod paths;

pub use error::{ConsoleError, Result};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogOutput};
