//! Persisted history of sent commands
//!
//! Most-recent-first, capped at 50 entries. Re-sending a remembered
//! command moves it back to the front rather than duplicating it. The
//! history survives restarts via a JSON file in the data directory; a
//! missing or corrupt file just means starting empty.

use std::path::{Path, PathBuf};

use fleet_utils::{paths, ConsoleError, Result};

pub const HISTORY_CAPACITY: usize = 50;

#[derive(Debug, Clone)]
pub struct SendHistory {
    entries: Vec<String>,
    path: PathBuf,
}

impl SendHistory {
    /// Load history from the default data-directory location
    pub fn load() -> Self {
        Self::load_from(paths::history_file())
    }

    /// Load history from `path`, starting empty if it is absent or
    /// unreadable
    pub fn load_from(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Discarding corrupt history file");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read history file");
                Vec::new()
            }
        };
        let mut history = Self { entries, path };
        history.entries.truncate(HISTORY_CAPACITY);
        history
    }

    /// Remember a sent command at the front, deduplicating and trimming
    /// to capacity, then persist. Persistence failures are logged, not
    /// fatal: losing history never blocks a send.
    pub fn record(&mut self, message: &str) {
        self.entries.retain(|e| e != message);
        self.entries.insert(0, message.to_string());
        self.entries.truncate(HISTORY_CAPACITY);

        if let Err(e) = self.save() {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to persist send history");
        }
    }

    /// Entries newest first
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            paths::ensure_dir(&parent.to_path_buf())?;
        }
        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| ConsoleError::internal(format!("history encode: {}", e)))?;
        write_atomic(&self.path, &json)
    }
}

/// Write via a sibling temp file and rename, so an interrupted save
/// never truncates the existing history
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents).map_err(|e| ConsoleError::FileWrite {
        path: tmp.clone(),
        source: e,
    })?;
    std::fs::rename(&tmp, path).map_err(|e| ConsoleError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
