//! pasvlink - one-shot passive-mode FTP commands
//!
//! `ls`, `get` and `pwd` each open a session, log in, do their one job and
//! QUIT. The interactive browser lives in the `pasvty` binary.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pasvlink::browser::sanitize_local_name;
use pasvlink::cli::{Cli, Command, GlobalOpts};
use pasvlink::config::{default_config_path, load_config, save_config, ClientConfig};
use pasvlink::journal::DownloadJournal;
use pasvlink::listing::build_listing;
use pasvlink::logger::{Logger, NoopLogger, TextLogger};
use pasvlink::progress::{DownloadProgress, SimpleSpinner};
use pasvlink::url::{parse_remote_url, RemoteTarget};
use pasvlink::Session;

fn main() -> Result<()> {
    // First Ctrl-C asks the running transfer to stop; a second one exits
    let abort = Arc::new(AtomicBool::new(false));
    let flag = abort.clone();
    ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            eprintln!("\nInterrupted by user. Exiting (Ctrl-C)...");
            std::process::exit(130);
        }
        eprintln!("\nAborting transfer (Ctrl-C again to exit)...");
    })
    .context("Error setting Ctrl-C handler")?;

    let cli = Cli::parse();

    let config_path = cli.global.config.clone().unwrap_or_else(default_config_path);
    let mut config = load_config(&config_path)
        .with_context(|| format!("reading config {}", config_path.display()))?;

    // Choose logger once; NoopLogger keeps the session quiet otherwise
    let logger: Arc<dyn Logger> = if let Some(ref p) = cli.global.log_file {
        match TextLogger::new(p) {
            Ok(l) => Arc::new(l),
            Err(e) => {
                eprintln!("warning: cannot open log file {}: {}", p.display(), e);
                Arc::new(NoopLogger)
            }
        }
    } else {
        Arc::new(NoopLogger)
    };

    let url = match &cli.command {
        Command::Ls { url, .. } | Command::Get { url, .. } | Command::Pwd { url } => url,
    };
    let target = parse_remote_url(url, config.port)
        .ok_or_else(|| anyhow!("expected ftp://host[:port][/path], got {url:?}"))?;

    let mut session = connect_and_login(&target, &cli.global, &mut config, &config_path, logger)?;
    let result = match &cli.command {
        Command::Ls { long, .. } => cmd_ls(&mut session, &target, *long, &abort),
        Command::Get { out, .. } => cmd_get(&mut session, &target, out.clone(), &config, &abort),
        Command::Pwd { .. } => cmd_pwd(&mut session, &target),
    };
    session.quit();
    result
}

fn connect_and_login(
    target: &RemoteTarget,
    global: &GlobalOpts,
    config: &mut ClientConfig,
    config_path: &Path,
    logger: Arc<dyn Logger>,
) -> Result<Session> {
    let mut session = Session::open(&target.host, target.port, logger)?;
    if let Some(greeting) = session.greeting() {
        eprintln!("{}", greeting);
    }
    let user = global
        .user
        .clone()
        .or_else(|| target.user.clone())
        .unwrap_or_else(|| config.user.clone());
    session
        .login(&user, global.password.as_deref())
        .with_context(|| format!("login as {user} failed"))?;

    config.record_login(&target.host, target.port);
    if let Err(e) = save_config(config_path, config) {
        eprintln!("warning: could not save config: {e:#}");
    }
    Ok(session)
}

fn cmd_ls(
    session: &mut Session,
    target: &RemoteTarget,
    long: bool,
    abort: &Arc<AtomicBool>,
) -> Result<()> {
    if target.path != "/" {
        session.cwd(&target.path)?;
    }
    let path = session.pwd()?;
    let mut spinner = SimpleSpinner::new(&format!("Listing {path}"), abort.clone());
    let raw = if long {
        session.list(&mut spinner)
    } else {
        session.nlst(&mut spinner)
    };
    spinner.finish_and_clear();
    let raw = raw?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if long {
        out.write_all(&raw)?;
    } else {
        for entry in build_listing(&raw, &path).entries {
            writeln!(out, "{}", entry.name)?;
        }
    }
    Ok(())
}

fn cmd_get(
    session: &mut Session,
    target: &RemoteTarget,
    out: Option<PathBuf>,
    config: &ClientConfig,
    abort: &Arc<AtomicBool>,
) -> Result<()> {
    let (dir, file) = target.split_file();
    let file = file.ok_or_else(|| anyhow!("URL names a directory, not a file: {}", target.path))?;
    if dir != "/" {
        session.cwd(dir)?;
    }

    let out_dir = out.unwrap_or_else(|| config.download_dir());
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let local = out_dir.join(sanitize_local_name(file));
    let journal = DownloadJournal::in_dir(&out_dir);

    let mut progress = DownloadProgress::new(file, abort.clone());
    let outcome = session.download(file, &local, &mut progress);
    if let Err(e) = journal.record(file, &local, &outcome) {
        eprintln!("warning: could not update download journal: {e:#}");
    }
    match outcome {
        Ok(bytes) => {
            progress.finish_success(bytes);
            println!("{}", local.display());
            Ok(())
        }
        Err(e) => {
            progress.finish_error(&e.to_string());
            Err(e.into())
        }
    }
}

fn cmd_pwd(session: &mut Session, target: &RemoteTarget) -> Result<()> {
    if target.path != "/" {
        session.cwd(&target.path)?;
    }
    println!("{}", session.pwd()?);
    Ok(())
}
