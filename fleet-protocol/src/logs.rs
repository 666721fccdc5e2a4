//! Log-retrieval API types
//!
//! Response bodies and request parameters for the backend's chunked log
//! endpoints (`/api/logs/...`).

use serde::{Deserialize, Serialize};

/// One bounded slice of a remote log file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogChunk {
    /// Raw text of the slice (may span partial escape sequences at the
    /// line level, never mid-line)
    pub content: String,
    /// Zero-based line offset of the first line of `content` in the file
    pub start_line: u64,
    /// Index of this chunk
    pub current_chunk: u64,
    /// Total number of chunks in the file at the time of the request
    pub total_chunks: u64,
}

/// One entry in the flat log listing (`GET /api/logs`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogFileInfo {
    pub name: String,
    pub size: u64,
    /// Unix seconds
    pub modified_time: i64,
}

/// Identity of one browsable log: a device identifier plus a date
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceId {
    pub device: String,
    pub date: String,
}

impl SourceId {
    /// Reserved device identifier for the global (non per-device) log
    pub const GLOBAL_DEVICE: &'static str = "default";

    pub fn new(device: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            date: date.into(),
        }
    }

    /// The global log for a given date
    pub fn global(date: impl Into<String>) -> Self {
        Self::new(Self::GLOBAL_DEVICE, date)
    }

    pub fn is_global(&self) -> bool {
        self.device == Self::GLOBAL_DEVICE
    }

    /// Request path fragment used by the content endpoint
    pub fn log_path(&self) -> String {
        format!("{}/{}.log", self.device, self.date)
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.device, self.date)
    }
}

/// Parameters of one chunk fetch, tagged with the source and the view
/// generation it was issued for so a late response can be discarded after
/// the operator switches source or reopens the same one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRequest {
    pub source: SourceId,
    /// Bumped each time the view is reset; not part of the wire request
    pub generation: u64,
    pub chunk_size: u64,
    pub chunk_index: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== LogChunk Tests ====================

    #[test]
    fn test_log_chunk_decodes_backend_body() {
        let raw = r#"{"content":"line1\nline2","start_line":0,"current_chunk":0,"total_chunks":3}"#;
        let chunk: LogChunk = serde_json::from_str(raw).unwrap();
        assert_eq!(chunk.content, "line1\nline2");
        assert_eq!(chunk.start_line, 0);
        assert_eq!(chunk.current_chunk, 0);
        assert_eq!(chunk.total_chunks, 3);
    }

    #[test]
    fn test_log_chunk_rejects_missing_total() {
        let raw = r#"{"content":"x","start_line":0,"current_chunk":0}"#;
        assert!(serde_json::from_str::<LogChunk>(raw).is_err());
    }

    // ==================== LogFileInfo Tests ====================

    #[test]
    fn test_log_file_info_decodes() {
        let raw = r#"[{"name":"tcp_server.log","size":524288,"modified_time":1704067200}]"#;
        let infos: Vec<LogFileInfo> = serde_json::from_str(raw).unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].name, "tcp_server.log");
        assert_eq!(infos[0].size, 524288);
        assert_eq!(infos[0].modified_time, 1704067200);
    }

    // ==================== SourceId Tests ====================

    #[test]
    fn test_source_id_log_path() {
        let source = SourceId::new("SN12345", "2024-01-01");
        assert_eq!(source.log_path(), "SN12345/2024-01-01.log");
    }

    #[test]
    fn test_global_source_id() {
        let source = SourceId::global("2024-01-01");
        assert!(source.is_global());
        assert_eq!(source.log_path(), "default/2024-01-01.log");
    }

    #[test]
    fn test_device_source_is_not_global() {
        let source = SourceId::new("SN12345", "2024-01-01");
        assert!(!source.is_global());
    }

    #[test]
    fn test_source_id_display() {
        let source = SourceId::new("SN12345", "2024-01-01");
        assert_eq!(source.to_string(), "SN12345/2024-01-01");
    }

    #[test]
    fn test_source_id_equality_and_hash() {
        use std::collections::HashSet;

        let a = SourceId::new("SN1", "2024-01-01");
        let b = SourceId::new("SN1", "2024-01-01");
        let c = SourceId::new("SN1", "2024-01-02");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }

    // ==================== ChunkRequest Tests ====================

    #[test]
    fn test_chunk_request_carries_source_tag() {
        let req = ChunkRequest {
            source: SourceId::global("2024-01-01"),
            generation: 0,
            chunk_size: 500,
            chunk_index: 2,
        };
        assert_eq!(req.source, SourceId::global("2024-01-01"));
        assert_ne!(req.source, SourceId::new("SN1", "2024-01-01"));
    }

    #[test]
    fn test_chunk_requests_differ_across_generations() {
        let a = ChunkRequest {
            source: SourceId::global("2024-01-01"),
            generation: 0,
            chunk_size: 500,
            chunk_index: 0,
        };
        let b = ChunkRequest { generation: 1, ..a.clone() };
        assert_ne!(a, b);
    }
}
