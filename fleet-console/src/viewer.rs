//! Chunked log viewer
//!
//! Streams a large remote log file as a sequence of bounded chunks. The
//! viewer itself performs no I/O: it hands out [`ChunkRequest`]s, the
//! caller fetches them, and results come back through [`apply_chunk`] /
//! [`fetch_failed`]. Each request carries the source it was issued for, so
//! a response arriving after the operator switched device or date is
//! detected and discarded instead of being appended under the wrong source.
//!
//! [`apply_chunk`]: LogViewer::apply_chunk
//! [`fetch_failed`]: LogViewer::fetch_failed

use fleet_protocol::{ChunkRequest, LogChunk, SourceId};
use fleet_utils::ConsoleError;

use crate::render::{ansi_to_html, classify_line, Severity};

/// One renderable entry in the viewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerLine {
    /// A log line, numbered within its file
    Log {
        number: u64,
        html: String,
        severity: Severity,
    },
    /// Inline placeholder shown where a chunk failed to load; the cursor
    /// is untouched so re-triggering the fetch retries the same chunk
    FetchError { message: String },
}

/// Viewer state for the active log source
#[derive(Debug)]
pub struct LogViewer {
    active: Option<SourceId>,
    /// Next chunk to request
    current_chunk: u64,
    /// Chunk count reported by the last response; `None` until the first
    /// chunk arrives
    total_chunks: Option<u64>,
    in_flight: bool,
    /// Bumped on every reset; requests issued for an earlier generation
    /// are stale even when the source is the same
    generation: u64,
    chunk_size: u64,
    scroll_threshold_px: u32,
    lines: Vec<ViewerLine>,
}

impl LogViewer {
    pub fn new(chunk_size: u64, scroll_threshold_px: u32) -> Self {
        Self {
            active: None,
            current_chunk: 0,
            total_chunks: None,
            in_flight: false,
            generation: 0,
            chunk_size,
            scroll_threshold_px,
            lines: Vec::new(),
        }
    }

    /// Switch to a new source: reset the cursor, clear rendered lines and
    /// any in-flight marker, and issue the first chunk fetch
    pub fn open_source(&mut self, source: SourceId) -> ChunkRequest {
        tracing::debug!(source = %source, "Opening log source");
        self.active = Some(source.clone());
        self.current_chunk = 0;
        self.total_chunks = None;
        self.in_flight = false;
        self.generation += 1;
        self.lines.clear();

        self.in_flight = true;
        ChunkRequest {
            source,
            generation: self.generation,
            chunk_size: self.chunk_size,
            chunk_index: 0,
        }
    }

    /// Request the next chunk, unless one is already in flight or the
    /// source is exhausted
    pub fn fetch_next_chunk(&mut self) -> Option<ChunkRequest> {
        if self.in_flight {
            return None;
        }
        let source = self.active.clone()?;
        match self.total_chunks {
            Some(total) if self.current_chunk >= total => return None,
            _ => {}
        }

        self.in_flight = true;
        Some(ChunkRequest {
            source,
            generation: self.generation,
            chunk_size: self.chunk_size,
            chunk_index: self.current_chunk,
        })
    }

    /// Level-triggered scroll policy: when the remaining unscrolled
    /// distance drops below the threshold and more chunks remain, request
    /// the next one. Safe to call on every scroll event; the in-flight
    /// guard makes it idempotent.
    pub fn on_scroll(&mut self, remaining_px: u32) -> Option<ChunkRequest> {
        if remaining_px >= self.scroll_threshold_px {
            return None;
        }
        let total = self.total_chunks?;
        if self.current_chunk + 1 >= total {
            return None;
        }
        self.fetch_next_chunk()
    }

    /// Apply a fetched chunk. Returns false when the response is stale
    /// (issued before the view was last reset, or for a source that is no
    /// longer active) and was discarded.
    pub fn apply_chunk(&mut self, request: &ChunkRequest, chunk: &LogChunk) -> bool {
        if self.is_stale(request) {
            tracing::debug!(
                source = %request.source,
                "Discarding chunk from a superseded fetch"
            );
            return false;
        }

        self.in_flight = false;
        // A successful retry replaces the trailing error placeholder
        while matches!(self.lines.last(), Some(ViewerLine::FetchError { .. })) {
            self.lines.pop();
        }

        let mut number = chunk.start_line;
        for line in chunk.content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            number += 1;
            let parsed = classify_line(line);
            let severity = parsed.severity();
            let html = render_line(&parsed);
            self.lines.push(ViewerLine::Log {
                number,
                html,
                severity,
            });
        }

        self.current_chunk = chunk.current_chunk + 1;
        self.total_chunks = Some(chunk.total_chunks);
        true
    }

    /// Record a failed fetch: clear the in-flight marker (the cursor is
    /// unchanged, so the same chunk can be retried) and surface an inline
    /// placeholder
    pub fn fetch_failed(&mut self, request: &ChunkRequest, error: &ConsoleError) {
        if self.is_stale(request) {
            return;
        }
        self.in_flight = false;
        self.lines.push(ViewerLine::FetchError {
            message: format!(
                "Failed to load chunk {} of {}: {} (scroll to retry)",
                request.chunk_index, request.source, error
            ),
        });
    }

    /// Drop the accumulated rendered lines without touching the cursor.
    /// For streaming consumers that emit each chunk as it arrives and
    /// never scroll back.
    pub fn discard_rendered(&mut self) {
        self.lines.clear();
    }

    fn is_stale(&self, request: &ChunkRequest) -> bool {
        self.active.as_ref() != Some(&request.source) || request.generation != self.generation
    }

    /// Whether every chunk of the active source has been retrieved
    pub fn is_exhausted(&self) -> bool {
        matches!(self.total_chunks, Some(total) if self.current_chunk >= total)
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// (next chunk to request, total chunks or 0 when unknown)
    pub fn cursor(&self) -> (u64, u64) {
        (self.current_chunk, self.total_chunks.unwrap_or(0))
    }

    pub fn lines(&self) -> &[ViewerLine] {
        &self.lines
    }

    pub fn active_source(&self) -> Option<&SourceId> {
        self.active.as_ref()
    }
}

/// Render one classified line to an HTML fragment
fn render_line(parsed: &crate::render::ParsedLine) -> String {
    if parsed.is_structured() {
        let level = parsed.level.as_deref().unwrap_or_default();
        format!(
            "<span class=\"timestamp\">{}</span> - <span class=\"log-level {}\">{}</span> - <span class=\"thread-name\">[{}]</span> - {}",
            parsed.timestamp.as_deref().unwrap_or_default(),
            level.to_lowercase(),
            level,
            parsed.thread.as_deref().unwrap_or_default(),
            ansi_to_html(&parsed.message)
        )
    } else {
        ansi_to_html(&parsed.message)
    }
}
