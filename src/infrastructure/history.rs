//! Request history stored as JSON Lines.
//!
//! Appends are buffered in memory and flushed with [`HistoryRecorder::write`].
//! The read side loads the whole file once and caches it.

use crate::application::services::HistorySink;
use crate::domain::entities::Request;
use crate::domain::errors::HistoryError;
use crate::domain::history::HistoryEntry;
use crate::domain::settings::ClientSettings;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

pub struct HistoryRecorder {
    path: PathBuf,
    pending: Vec<HistoryEntry>,
    cache: Option<Vec<HistoryEntry>>,
}

impl HistoryRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pending: Vec::new(),
            cache: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Buffers an entry for the next [`write`](Self::write)
    pub fn append(&mut self, request: &Request, settings: &ClientSettings) -> Result<HistoryEntry, HistoryError> {
        let entry = HistoryEntry::from_request(request, settings);
        self.pending.push(entry.clone());
        Ok(entry)
    }

    pub fn pending(&self) -> &[HistoryEntry] {
        &self.pending
    }

    /// Appends all buffered entries to the log, creating it if needed
    pub fn write(&mut self) -> Result<(), HistoryError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let mut buf = Vec::new();
        for entry in &self.pending {
            serde_json::to_writer(&mut buf, entry)?;
            buf.push(b'\n');
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(&buf)?;
        file.flush()?;

        let written = std::mem::take(&mut self.pending);
        tracing::debug!(path = %self.path.display(), entries = written.len(), "history written");
        if let Some(cache) = self.cache.as_mut() {
            cache.extend(written);
        }
        Ok(())
    }

    pub fn get_all(&mut self) -> Result<&[HistoryEntry], HistoryError> {
        if self.cache.is_none() {
            self.cache = Some(self.load()?);
        }
        Ok(self.cache.as_deref().unwrap_or_default())
    }

    /// Zero-based, oldest first
    pub fn get_by_index(&mut self, index: usize) -> Result<&HistoryEntry, HistoryError> {
        let entries = self.get_all()?;
        let len = entries.len();
        entries
            .get(index)
            .ok_or(HistoryError::InvalidHistoryIndex { index, len })
    }

    pub fn latest(&mut self) -> Result<&HistoryEntry, HistoryError> {
        self.get_all()?.last().ok_or(HistoryError::NoHistory)
    }

    /// Truncates the log and drops everything cached or pending
    pub fn clear(&mut self) -> Result<(), HistoryError> {
        match File::create(&self.path) {
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        self.pending.clear();
        self.cache = Some(Vec::new());
        Ok(())
    }

    fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut entries = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<HistoryEntry>(&line) {
                Ok(entry) => entries.push(entry),
                // a torn write from a concurrent invocation only loses that line
                Err(err) => tracing::warn!(line = line_no + 1, error = %err, "skipping corrupt history entry"),
            }
        }
        Ok(entries)
    }
}

impl HistorySink for HistoryRecorder {
    fn record(&mut self, request: &Request, settings: &ClientSettings) -> Result<(), HistoryError> {
        self.append(request, settings)?;
        self.write()
    }
}
