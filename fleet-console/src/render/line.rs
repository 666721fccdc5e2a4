//! Structured log-line classification
//!
//! Backend log lines follow `TIMESTAMP - LEVEL - [THREAD] - MESSAGE`.
//! Lines that do not match are legitimate output too; they classify as an
//! unstructured message with no severity. This never fails.

use regex::Regex;
use std::sync::OnceLock;

/// `YYYY-MM-DD HH:MM:SS - LEVEL - [thread] - message`
fn structured_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}) - (\w+) - \[([^\]]+)\] - (.+)$")
            .expect("valid log line pattern")
    })
}

/// Severity class derived from the LEVEL field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Default,
}

impl Severity {
    fn from_level(level: &str) -> Self {
        match level {
            "ERROR" => Self::Error,
            "WARNING" => Self::Warning,
            _ => Self::Default,
        }
    }
}

/// One classified log line; unstructured lines carry only `message`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub timestamp: Option<String>,
    pub level: Option<String>,
    pub thread: Option<String>,
    pub message: String,
}

impl ParsedLine {
    pub fn is_structured(&self) -> bool {
        self.timestamp.is_some()
    }

    pub fn severity(&self) -> Severity {
        self.level
            .as_deref()
            .map(Severity::from_level)
            .unwrap_or(Severity::Default)
    }
}

/// Classify one line of log text
pub fn classify_line(line: &str) -> ParsedLine {
    match structured_line().captures(line) {
        Some(caps) => ParsedLine {
            timestamp: Some(caps[1].to_string()),
            level: Some(caps[2].to_string()),
            thread: Some(caps[3].to_string()),
            message: caps[4].to_string(),
        },
        None => ParsedLine {
            timestamp: None,
            level: None,
            thread: None,
            message: line.to_string(),
        },
    }
}
