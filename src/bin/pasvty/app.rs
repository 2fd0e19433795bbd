use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pasvlink::browser::{Activation, Browser};
use pasvlink::config::{adjust_port, parse_endpoint, save_config, ClientConfig};
use pasvlink::journal::DownloadJournal;
use pasvlink::logger::TranscriptLogger;
use pasvlink::transfer::TransferObserver;
use pasvlink::url::RemoteTarget;
use pasvlink::{FtpError, Session};

use super::ui;

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Terminal guard that ensures proper cleanup on drop
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = io::stdout().flush();
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Connect,
    Browse,
}

pub struct AppState {
    pub screen: Screen,
    pub host_input: String,
    pub port: u16,
    pub config: ClientConfig,
    pub config_path: PathBuf,
    pub browser: Option<Browser>,
    pub transcript: Arc<TranscriptLogger>,
    pub status: String,
    pub busy: Option<String>,
    pub error: Option<String>,
    pub help_visible: bool,
    pub toast: Option<(String, Instant)>,
    recent_idx: usize,
    initial_path: Option<String>,
}

impl AppState {
    pub fn new(
        config: ClientConfig,
        config_path: PathBuf,
        transcript: Arc<TranscriptLogger>,
        remote: Option<RemoteTarget>,
    ) -> Self {
        let (host_input, port, initial_path) = match remote {
            Some(r) => (r.host, r.port, Some(r.path)),
            None => (config.host.clone(), config.port, None),
        };
        Self {
            screen: Screen::Connect,
            host_input,
            port,
            config,
            config_path,
            browser: None,
            transcript,
            status: String::new(),
            busy: None,
            error: None,
            help_visible: false,
            toast: None,
            recent_idx: 0,
            initial_path,
        }
    }

    fn notify(&mut self, msg: String) {
        self.toast = Some((msg, Instant::now()));
    }

    fn report(&mut self, err: &FtpError) {
        self.error = Some(err.to_string());
        if err.is_fatal() {
            // control connection is gone; start over from the connect screen
            self.browser = None;
            self.screen = Screen::Connect;
        }
    }
}

/// Polls the keyboard once per received chunk. Esc or `b` stops the
/// transfer; Ctrl+C does too.
struct KeyAbort;

impl TransferObserver for KeyAbort {
    fn should_abort(&mut self) -> bool {
        while let Ok(true) = event::poll(Duration::ZERO) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match k.code {
                    KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('B') => return true,
                    KeyCode::Char('c') if k.modifiers.contains(KeyModifiers::CONTROL) => return true,
                    _ => {}
                }
            }
        }
        false
    }
}

pub fn run(mut app: AppState) -> Result<()> {
    // Install panic hook to restore terminal on panic
    let original_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = io::stdout().flush();
        original_panic(info);
    }));

    let _guard = TerminalGuard;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    if app.initial_path.is_some() {
        connect(&mut terminal, &mut app)?;
    }

    loop {
        if let Some((_, at)) = &app.toast {
            if at.elapsed() > Duration::from_secs(3) {
                app.toast = None;
            }
        }

        terminal.draw(|f| ui::draw(f, &app))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let key = match event::read()? {
            Event::Key(k) if k.kind == KeyEventKind::Press => k,
            _ => continue,
        };

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            break;
        }
        // Any key dismisses the error popup
        if app.error.take().is_some() {
            continue;
        }
        if app.help_visible {
            if matches!(key.code, KeyCode::Char('h') | KeyCode::F(1) | KeyCode::Esc) {
                app.help_visible = false;
            }
            continue;
        }

        let keep_going = match app.screen {
            Screen::Connect => handle_connect_key(&mut terminal, &mut app, key)?,
            Screen::Browse => handle_browse_key(&mut terminal, &mut app, key)?,
        };
        if !keep_going {
            break;
        }
    }

    if let Some(browser) = app.browser.take() {
        browser.quit();
    }
    terminal.show_cursor()?;
    Ok(())
}

fn handle_connect_key(terminal: &mut Term, app: &mut AppState, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => return Ok(false),
        KeyCode::Enter => connect(terminal, app)?,
        KeyCode::Up => app.port = adjust_port(app.port, 1),
        KeyCode::Down => app.port = adjust_port(app.port, -1),
        KeyCode::Right => app.port = adjust_port(app.port, 10),
        KeyCode::Left => app.port = adjust_port(app.port, -10),
        KeyCode::PageUp => app.port = adjust_port(app.port, 100),
        KeyCode::PageDown => app.port = adjust_port(app.port, -100),
        KeyCode::Tab => {
            if !app.config.recent_hosts.is_empty() {
                let h = &app.config.recent_hosts[app.recent_idx % app.config.recent_hosts.len()];
                app.host_input = h.host.clone();
                app.port = h.port;
                app.recent_idx += 1;
            }
        }
        KeyCode::F(1) => app.help_visible = true,
        KeyCode::Backspace => {
            app.host_input.pop();
        }
        KeyCode::Char(c) if !c.is_whitespace() => app.host_input.push(c),
        _ => {}
    }
    Ok(true)
}

fn handle_browse_key(terminal: &mut Term, app: &mut AppState, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Char('q') => {
            if let Some(browser) = app.browser.take() {
                browser.quit();
            }
            return Ok(false);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            if let Some(b) = app.browser.as_mut() {
                b.select_previous();
            }
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if let Some(b) = app.browser.as_mut() {
                b.select_next();
            }
        }
        KeyCode::Enter => activate(terminal, app)?,
        KeyCode::Backspace | KeyCode::Left => go_up(terminal, app)?,
        KeyCode::Char('r') => refresh(terminal, app)?,
        KeyCode::Char('h') | KeyCode::F(1) => app.help_visible = true,
        _ => {}
    }
    Ok(true)
}

/// Show the busy line before a blocking network call.
fn set_busy(terminal: &mut Term, app: &mut AppState, msg: String) -> Result<()> {
    app.busy = Some(msg);
    terminal.draw(|f| ui::draw(f, app))?;
    Ok(())
}

fn connect(terminal: &mut Term, app: &mut AppState) -> Result<()> {
    let (host, port) = match parse_endpoint(&app.host_input, app.port) {
        Ok(hp) => hp,
        Err(e) => {
            app.error = Some(e.to_string());
            return Ok(());
        }
    };
    set_busy(terminal, app, format!("Connecting to {host}:{port}..."))?;
    let result = open_browser(app, &host, port);
    app.busy = None;
    match result {
        Ok(browser) => {
            app.config.record_login(&host, port);
            if let Err(e) = save_config(&app.config_path, &app.config) {
                app.notify(format!("Config not saved: {e}"));
            }
            app.host_input = host;
            app.port = port;
            app.status = format!("Logged in as {}", app.config.user);
            app.browser = Some(browser);
            app.screen = Screen::Browse;
        }
        Err(e) => app.report(&e),
    }
    Ok(())
}

fn open_browser(app: &mut AppState, host: &str, port: u16) -> Result<Browser, FtpError> {
    let mut session = Session::open(host, port, app.transcript.clone())?;
    session.login(&app.config.user, None)?;
    let download_dir = app.config.download_dir();
    let mut browser =
        Browser::new(session, download_dir.clone()).with_journal(DownloadJournal::in_dir(&download_dir));
    if let Some(path) = app.initial_path.take().filter(|p| p != "/") {
        browser.session_mut().cwd(&path)?;
    }
    browser.refresh(&mut KeyAbort)?;
    Ok(browser)
}

fn activate(terminal: &mut Term, app: &mut AppState) -> Result<()> {
    let name = match app.browser.as_ref().and_then(|b| b.listing().selected_entry()) {
        Some(e) => e.name.clone(),
        None => return Ok(()),
    };
    set_busy(terminal, app, format!("Opening {name}... [Esc/b] abort"))?;
    let result = match app.browser.as_mut() {
        Some(b) => b.activate(&mut KeyAbort),
        None => return Ok(()),
    };
    app.busy = None;
    match result {
        Ok(Activation::Entered(path)) => app.status = path,
        Ok(Activation::Downloaded { remote, local, bytes }) => {
            let icon = if ui::is_ascii_mode() { "[OK]" } else { "✓" };
            app.status = format!("{icon} {remote} -> {} ({bytes} bytes)", local.display());
            app.notify(format!("{icon} Downloaded {remote}"));
        }
        Ok(Activation::Nothing) => {}
        Err(FtpError::Aborted { bytes }) => {
            let icon = if ui::is_ascii_mode() { "[X]" } else { "⛔" };
            app.status = format!("{icon} {name} aborted after {bytes} bytes");
            app.notify(format!("{icon} Transfer aborted"));
        }
        Err(e) => app.report(&e),
    }
    Ok(())
}

fn go_up(terminal: &mut Term, app: &mut AppState) -> Result<()> {
    if app.browser.as_ref().map_or(true, |b| b.listing().is_root()) {
        return Ok(());
    }
    set_busy(terminal, app, "Going up...".to_string())?;
    let result = match app.browser.as_mut() {
        Some(b) => b.go_up(&mut KeyAbort),
        None => return Ok(()),
    };
    app.busy = None;
    match result {
        Ok(Some(path)) => app.status = path,
        Ok(None) => {}
        Err(e) => app.report(&e),
    }
    Ok(())
}

fn refresh(terminal: &mut Term, app: &mut AppState) -> Result<()> {
    set_busy(terminal, app, "Refreshing...".to_string())?;
    let result = match app.browser.as_mut() {
        Some(b) => b.refresh(&mut KeyAbort),
        None => return Ok(()),
    };
    app.busy = None;
    if let Err(e) = result {
        app.report(&e);
    }
    Ok(())
}
