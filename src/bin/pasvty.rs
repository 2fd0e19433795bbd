use anyhow::anyhow;
use clap::Parser;
use std::sync::Arc;

use pasvlink::cli::TuiOpts;
use pasvlink::config::{default_config_path, load_config};
use pasvlink::logger::{TextLogger, TranscriptLogger};

#[path = "pasvty/app.rs"]
mod app;
#[path = "pasvty/theme.rs"]
mod theme;
#[path = "pasvty/ui.rs"]
mod ui;

const TRANSCRIPT_CAPACITY: usize = 256;

fn main() -> anyhow::Result<()> {
    let opts = TuiOpts::parse();
    let config_path = opts.config.unwrap_or_else(default_config_path);
    let config = load_config(&config_path)?;
    let remote = match opts.remote {
        Some(s) => Some(
            pasvlink::url::parse_remote_url(&s, config.port)
                .ok_or_else(|| anyhow!("expected ftp://host[:port][/path], got {s:?}"))?,
        ),
        None => None,
    };
    // A log file that cannot be opened only loses the on-disk copy
    let file = opts.log_file.and_then(|p| TextLogger::new(p).ok());
    let transcript = Arc::new(TranscriptLogger::new(TRANSCRIPT_CAPACITY, file));
    app::run(app::AppState::new(config, config_path, transcript, remote))
}
