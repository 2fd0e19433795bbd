use anyhow::Result;
use chrono::Utc;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Session event sink. Every method defaults to doing nothing.
pub trait Logger: Send + Sync {
    fn connected(&self, _peer: &str) {}
    fn command(&self, _line: &str) {}
    fn reply(&self, _line: &str) {}
    fn transfer_done(&self, _verb: &str, _bytes: u64, _seconds: f64) {}
    fn download(&self, _remote: &str, _local: &Path, _bytes: u64) {}
    fn error(&self, _context: &str, _msg: &str) {}
    fn closed(&self) {}
}

pub struct NoopLogger;
impl Logger for NoopLogger {}

fn transfer_line(verb: &str, bytes: u64, seconds: f64) -> String {
    format!("DONE {verb} bytes={bytes} seconds={seconds:.3}")
}

pub struct TextLogger {
    file: Mutex<File>,
}

impl TextLogger {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(f),
        })
    }

    fn line(&self, s: &str) {
        if let Ok(mut f) = self.file.lock() {
            let _ = writeln!(f, "[{}] {}", Utc::now().to_rfc3339(), s);
        }
    }
}

impl Logger for TextLogger {
    fn connected(&self, peer: &str) {
        self.line(&format!("CONNECT peer={peer}"));
    }
    fn command(&self, line: &str) {
        self.line(&format!(">>> {line}"));
    }
    fn reply(&self, line: &str) {
        self.line(&format!("<<< {line}"));
    }
    fn transfer_done(&self, verb: &str, bytes: u64, seconds: f64) {
        self.line(&transfer_line(verb, bytes, seconds));
    }
    fn download(&self, remote: &str, local: &Path, bytes: u64) {
        self.line(&format!(
            "SAVED remote={} local={} bytes={}",
            remote,
            local.display(),
            bytes
        ));
    }
    fn error(&self, context: &str, msg: &str) {
        self.line(&format!("ERROR ctx={context} msg={msg}"));
    }
    fn closed(&self) {
        self.line("CLOSED");
    }
}

/// Keeps the last `capacity` lines in memory for on-screen scroll-back,
/// optionally mirroring everything to a [`TextLogger`].
pub struct TranscriptLogger {
    lines: Mutex<VecDeque<String>>,
    capacity: usize,
    file: Option<TextLogger>,
}

impl TranscriptLogger {
    pub fn new(capacity: usize, file: Option<TextLogger>) -> Self {
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            file,
        }
    }

    pub fn push(&self, s: String) {
        if let Ok(mut lines) = self.lines.lock() {
            if lines.len() >= self.capacity {
                lines.pop_front();
            }
            lines.push_back(s);
        }
    }

    /// Most recent `n` lines, oldest first.
    pub fn tail(&self, n: usize) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.iter().skip(lines.len().saturating_sub(n)).cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Logger for TranscriptLogger {
    fn connected(&self, peer: &str) {
        self.push(format!("Connected to {peer}"));
        if let Some(f) = &self.file {
            f.connected(peer);
        }
    }
    fn command(&self, line: &str) {
        self.push(format!("> {line}"));
        if let Some(f) = &self.file {
            f.command(line);
        }
    }
    fn reply(&self, line: &str) {
        self.push(line.to_string());
        if let Some(f) = &self.file {
            f.reply(line);
        }
    }
    fn transfer_done(&self, verb: &str, bytes: u64, seconds: f64) {
        if let Some(f) = &self.file {
            f.transfer_done(verb, bytes, seconds);
        }
    }
    fn download(&self, remote: &str, local: &Path, bytes: u64) {
        self.push(format!("Saved {remote} -> {} ({bytes} bytes)", local.display()));
        if let Some(f) = &self.file {
            f.download(remote, local, bytes);
        }
    }
    fn error(&self, context: &str, msg: &str) {
        self.push(format!("{context}: {msg}"));
        if let Some(f) = &self.file {
            f.error(context, msg);
        }
    }
    fn closed(&self) {
        self.push("Connection closed".to_string());
        if let Some(f) = &self.file {
            f.closed();
        }
    }
}
