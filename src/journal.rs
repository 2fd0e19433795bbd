use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::FtpError;

const JOURNAL_FILE: &str = ".pasvlink_downloads.jsonl";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    Completed,
    Aborted,
    Failed,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DownloadRecord {
    pub timestamp: String,
    pub session_id: String,
    pub remote: String,
    pub local: PathBuf,
    pub status: DownloadStatus,
    pub bytes: u64,
    pub error: Option<String>,
}

/// Append-only JSON-lines record of downloads. One session id per journal
/// instance, so runs can be told apart.
pub struct DownloadJournal {
    path: PathBuf,
    session_id: String,
}

impl DownloadJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DownloadJournal {
            path: path.into(),
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Journal kept next to the downloads themselves.
    pub fn in_dir(download_dir: &Path) -> Self {
        Self::new(download_dir.join(JOURNAL_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Record the outcome of one download. Failed records carry the bytes
    /// received before the data connection broke, zero otherwise.
    pub fn record(
        &self,
        remote: &str,
        local: &Path,
        outcome: &std::result::Result<u64, FtpError>,
    ) -> Result<()> {
        let (status, bytes, error) = match outcome {
            Ok(n) => (DownloadStatus::Completed, *n, None),
            Err(FtpError::Aborted { bytes }) => (DownloadStatus::Aborted, *bytes, None),
            Err(e) => (DownloadStatus::Failed, e.partial_bytes(), Some(e.to_string())),
        };
        self.add_entry(DownloadRecord {
            timestamp: Utc::now().to_rfc3339(),
            session_id: self.session_id.clone(),
            remote: remote.to_string(),
            local: local.to_path_buf(),
            status,
            bytes,
            error,
        })
    }

    pub fn add_entry(&self, entry: DownloadRecord) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).ok();
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .context("Failed to open download journal")?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &entry)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_entries(&self) -> Result<Vec<DownloadRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path).context("Failed to open download journal for reading")?;
        let reader = BufReader::new(file);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: DownloadRecord = serde_json::from_str(&line)?;
            entries.push(entry);
        }
        Ok(entries)
    }
}
