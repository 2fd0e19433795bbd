//! Terminal progress for the command-line client
//!
//! A spinner sits on the bottom line while a transfer runs and reports the
//! running byte count and throughput. Ctrl-C flips the shared abort flag,
//! which the transfer loop picks up on its next chunk.

use crossterm::style::{Color, Stylize};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::transfer::TransferObserver;

pub struct DownloadProgress {
    spinner: ProgressBar,
    start_time: Instant,
    name: String,
    abort: Arc<AtomicBool>,
}

impl DownloadProgress {
    pub fn new(name: &str, abort: Arc<AtomicBool>) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        let me = Self {
            spinner,
            start_time: Instant::now(),
            name: name.to_string(),
            abort,
        };
        me.set_bytes(0);
        me
    }

    fn set_bytes(&self, bytes: u64) {
        let elapsed_secs = self.start_time.elapsed().as_secs_f64();
        let throughput = if elapsed_secs > 0.1 {
            format!(" @ {:.1} MB/s", bytes as f64 / elapsed_secs / 1_048_576.0)
        } else {
            String::new()
        };
        self.spinner.set_message(format!(
            "{} {} {} in {:.1}s{}",
            "Receiving".with(Color::Green).bold(),
            self.name,
            human_bytes(bytes),
            elapsed_secs,
            throughput
        ));
    }

    pub fn finish_success(&self, bytes: u64) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let throughput = if elapsed > 0.0 {
            bytes as f64 / elapsed / 1_048_576.0
        } else {
            0.0
        };
        self.spinner.finish_with_message(format!(
            "{} {} ({}) in {:.1}s ({:.1} MB/s)",
            "Completed".with(Color::Green).bold(),
            self.name,
            human_bytes(bytes),
            elapsed,
            throughput
        ));
    }

    pub fn finish_error(&self, msg: &str) {
        self.spinner.finish_with_message(format!(
            "{} {}",
            "Failed".with(Color::Red).bold(),
            msg
        ));
    }
}

impl TransferObserver for DownloadProgress {
    fn progress(&mut self, bytes: u64) {
        self.set_bytes(bytes);
    }

    fn should_abort(&mut self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }
}

/// Spinner for listings, where the byte count is not interesting.
pub struct SimpleSpinner {
    spinner: ProgressBar,
    abort: Arc<AtomicBool>,
}

impl SimpleSpinner {
    pub fn new(msg: &str, abort: Arc<AtomicBool>) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner.set_message(msg.to_string());
        Self { spinner, abort }
    }

    pub fn finish_and_clear(&self) {
        self.spinner.finish_and_clear();
    }
}

impl TransferObserver for SimpleSpinner {
    fn should_abort(&mut self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }
}

pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_formatting() {
        assert_eq!(human_bytes(0), "0 B");
        assert_eq!(human_bytes(3500), "3.4 KiB");
        assert_eq!(human_bytes(5 * 1024 * 1024), "5.0 MiB");
    }

    #[test]
    fn abort_flag_is_shared() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut p = DownloadProgress::new("f.bin", flag.clone());
        assert!(!p.should_abort());
        flag.store(true, Ordering::Relaxed);
        assert!(p.should_abort());
        p.finish_error("aborted");
    }
}
