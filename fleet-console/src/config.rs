//! Console configuration loading
//!
//! Reads `config.toml` from the XDG config directory. Every field has a
//! default, so a missing file or a partial file both work; a file that
//! exists but cannot be parsed is an error rather than a silent
//! fall-back to defaults.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use fleet_utils::{paths, ConsoleError, Result};

use crate::transport::ReconnectPolicy;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Backend host, shared by the HTTP and WebSocket servers
    pub host: String,
    pub http_port: u16,
    pub ws_port: u16,
    /// Lines per log chunk requested from the backend
    pub chunk_size_lines: u64,
    /// Distance from the bottom, in pixels, at which scrolling prefetches
    /// the next chunk
    pub scroll_threshold_px: u32,
    pub reconnect: ReconnectConfig,
    /// Phrases that mark a system notice as relevant to every client,
    /// matched case-insensitively against the message text
    pub system_phrases: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub base_delay_ms: u64,
    pub max_attempts: u32,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            http_port: 8080,
            ws_port: 8765,
            chunk_size_lines: 500,
            scroll_threshold_px: 200,
            reconnect: ReconnectConfig::default(),
            system_phrases: vec!["新客户端连接".into(), "客户端断开连接".into()],
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            max_attempts: 10,
        }
    }
}

impl ConsoleConfig {
    /// Load from the default config file, or defaults if it is absent
    pub fn load() -> Result<Self> {
        let path = paths::config_file();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConsoleError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConsoleError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// WebSocket endpoint for the message stream
    pub fn ws_url(&self) -> String {
        format!("ws://{}:{}", self.host, self.ws_port)
    }

    /// Base URL for the HTTP log API
    pub fn http_base(&self) -> Result<Url> {
        let raw = format!("http://{}:{}", self.host, self.http_port);
        Url::parse(&raw).map_err(|e| ConsoleError::config(format!("bad host {:?}: {}", self.host, e)))
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            base_delay: Duration::from_millis(self.reconnect.base_delay_ms),
            max_attempts: self.reconnect.max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Default Tests ====================

    #[test]
    fn test_defaults() {
        let config = ConsoleConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.ws_port, 8765);
        assert_eq!(config.chunk_size_lines, 500);
        assert_eq!(config.scroll_threshold_px, 200);
        assert_eq!(config.reconnect.base_delay_ms, 1000);
        assert_eq!(config.reconnect.max_attempts, 10);
        assert_eq!(config.system_phrases.len(), 2);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: ConsoleConfig = toml::from_str("").unwrap();
        assert_eq!(config.http_port, 8080);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
            host = "192.168.1.50"
            ws_port = 9000
        "#;
        let config: ConsoleConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.host, "192.168.1.50");
        assert_eq!(config.ws_port, 9000);
        // Defaults for unspecified
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.chunk_size_lines, 500);
    }

    #[test]
    fn test_parse_reconnect_section() {
        let toml = r#"
            [reconnect]
            base_delay_ms = 500
            max_attempts = 3
        "#;
        let config: ConsoleConfig = toml::from_str(toml).unwrap();
        let policy = config.reconnect_policy();
        assert_eq!(policy.base_delay, Duration::from_millis(500));
        assert_eq!(policy.max_attempts, 3);
    }

    #[test]
    fn test_parse_system_phrases() {
        let toml = r#"
            system_phrases = ["device online", "device offline"]
        "#;
        let config: ConsoleConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.system_phrases, vec!["device online", "device offline"]);
    }

    // ==================== URL Derivation Tests ====================

    #[test]
    fn test_derived_urls() {
        let config = ConsoleConfig::default();
        assert_eq!(config.ws_url(), "ws://127.0.0.1:8765");
        assert_eq!(
            config.http_base().unwrap().as_str(),
            "http://127.0.0.1:8080/"
        );
    }

    // ==================== File Loading Tests ====================

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "host = \"10.0.0.2\"\n").unwrap();
        let config = ConsoleConfig::load_from(&path).unwrap();
        assert_eq!(config.host, "10.0.0.2");
    }

    #[test]
    fn test_load_from_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "http_port = \"not a number\"\n").unwrap();
        assert!(matches!(
            ConsoleConfig::load_from(&path),
            Err(ConsoleError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(ConsoleConfig::load_from(&path).is_err());
    }
}
