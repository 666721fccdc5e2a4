//! HTTP client for the log backend
//!
//! One method per backend endpoint. Transport failures and non-2xx
//! responses surface as `ConsoleError::Fetch`; undecodable bodies as
//! `ConsoleError::Parse`, both tagged with the operation that failed so
//! the viewer can name it in its inline error placeholder.

use std::path::Path;

use serde::de::DeserializeOwned;
use url::Url;

use fleet_protocol::{ChunkRequest, LogChunk, LogFileInfo};
use fleet_utils::{ConsoleError, Result};

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            base,
        }
    }

    /// Device serial numbers with at least one log file
    pub async fn sn_list(&self) -> Result<Vec<String>> {
        let url = self.endpoint(&["api", "logs", "sn-list"], "sn_list")?;
        self.get_json("sn_list", url).await
    }

    /// Dates with logs for one device, newest first as served
    pub async fn date_list(&self, sn: &str) -> Result<Vec<String>> {
        let url = self.endpoint(&["api", "logs", "date-list", sn], "date_list")?;
        self.get_json("date_list", url).await
    }

    /// One chunk of a log file, sliced by the backend
    pub async fn chunk(&self, req: &ChunkRequest) -> Result<LogChunk> {
        let url = self.chunk_url(req)?;
        self.get_json("chunk", url).await
    }

    fn chunk_url(&self, req: &ChunkRequest) -> Result<Url> {
        let path = req.source.log_path();
        let mut segments = vec!["api", "logs", "content"];
        segments.extend(path.split('/'));
        let mut url = self.endpoint(&segments, "chunk")?;
        url.query_pairs_mut()
            .append_pair("chunk_size", &req.chunk_size.to_string())
            .append_pair("chunk_index", &req.chunk_index.to_string());
        Ok(url)
    }

    /// Whole-file text retrieval; only suitable for small files
    pub async fn view(&self, name: &str) -> Result<String> {
        let url = self.endpoint(&["api", "logs", "view", name], "view")?;
        let response = self.get_ok("view", url).await?;
        response
            .text()
            .await
            .map_err(|e| ConsoleError::parse("view", e.to_string()))
    }

    /// Flat listing of available log files with size and mtime
    pub async fn list_logs(&self) -> Result<Vec<LogFileInfo>> {
        let url = self.endpoint(&["api", "logs"], "list_logs")?;
        self.get_json("list_logs", url).await
    }

    /// Fetch a log file and write it to `dest`, returning the byte count
    pub async fn download(&self, name: &str, dest: &Path) -> Result<u64> {
        let url = self.download_url(name)?;
        let response = self.get_ok("download", url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ConsoleError::fetch("download", e.to_string()))?;
        std::fs::write(dest, &bytes).map_err(|e| ConsoleError::FileWrite {
            path: dest.to_path_buf(),
            source: e,
        })?;
        Ok(bytes.len() as u64)
    }

    /// Download URL for a named log file, for display or external tools
    pub fn download_url(&self, name: &str) -> Result<Url> {
        self.endpoint(&["api", "logs", name, "download"], "download")
    }

    fn endpoint(&self, segments: &[&str], operation: &'static str) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut parts = url.path_segments_mut().map_err(|_| {
                ConsoleError::fetch(operation, "base URL cannot carry a path")
            })?;
            parts.pop_if_empty();
            for segment in segments {
                parts.push(segment);
            }
        }
        Ok(url)
    }

    async fn get_ok(&self, operation: &'static str, url: Url) -> Result<reqwest::Response> {
        tracing::debug!(%url, operation, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ConsoleError::fetch(operation, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ConsoleError::fetch(operation, format!("HTTP {}", status)));
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, operation: &'static str, url: Url) -> Result<T> {
        let response = self.get_ok(operation, url).await?;
        response
            .json()
            .await
            .map_err(|e| ConsoleError::parse(operation, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_protocol::SourceId;

    fn client() -> ApiClient {
        ApiClient::new(Url::parse("http://127.0.0.1:8080").unwrap())
    }

    // ==================== URL Construction Tests ====================

    #[test]
    fn test_endpoint_simple() {
        let url = client().endpoint(&["api", "logs"], "list_logs").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/logs");
    }

    #[test]
    fn test_endpoint_with_device_and_date() {
        let url = client()
            .endpoint(&["api", "logs", "date-list", "SN001"], "date_list")
            .unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/logs/date-list/SN001");
    }

    #[test]
    fn test_chunk_url_shape() {
        let req = ChunkRequest {
            source: SourceId::new("SN001", "2024-01-15"),
            generation: 1,
            chunk_size: 500,
            chunk_index: 2,
        };
        let url = client().chunk_url(&req).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/api/logs/content/SN001/2024-01-15.log?chunk_size=500&chunk_index=2"
        );
    }

    #[test]
    fn test_chunk_url_for_global_source() {
        let req = ChunkRequest {
            source: SourceId::global("2024-01-01"),
            generation: 1,
            chunk_size: 500,
            chunk_index: 0,
        };
        let url = client().chunk_url(&req).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/api/logs/content/default/2024-01-01.log?chunk_size=500&chunk_index=0"
        );
    }

    #[test]
    fn test_download_url() {
        let url = client().download_url("console.log").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/api/logs/console.log/download"
        );
    }

    #[test]
    fn test_endpoint_escapes_unsafe_segments() {
        // Path traversal in a name must not escape the logs prefix
        let url = client()
            .endpoint(&["api", "logs", "view", "../etc/passwd"], "view")
            .unwrap();
        assert!(url.path().starts_with("/api/logs/view/"));
        assert!(!url.path().contains("/etc/passwd"));
    }

    #[test]
    fn test_base_with_trailing_slash() {
        let client = ApiClient::new(Url::parse("http://host:8080/").unwrap());
        let url = client.endpoint(&["api", "logs"], "list_logs").unwrap();
        assert_eq!(url.as_str(), "http://host:8080/api/logs");
    }
}
