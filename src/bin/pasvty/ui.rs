use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::{
    app::{AppState, Screen},
    theme::Theme,
};

const TRANSCRIPT_LINES: usize = 6;

pub fn draw(f: &mut Frame, app: &AppState) {
    f.render_widget(Block::default().style(Theme::base()), f.size());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(TRANSCRIPT_LINES as u16 + 1),
            Constraint::Length(2),
        ])
        .split(f.size());

    draw_header(f, chunks[0], app);
    match app.screen {
        Screen::Connect => draw_connect(f, chunks[1], app),
        Screen::Browse => draw_listing(f, chunks[1], app),
    }
    draw_transcript(f, chunks[2], app);
    draw_status(f, chunks[3], app);

    if let Some((msg, _)) = &app.toast {
        let area = centered_rect(40, 15, f.size());
        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(msg.as_str()).alignment(Alignment::Center).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Theme::received())
                    .style(Theme::base()),
            ),
            area,
        );
    }
    if app.help_visible {
        draw_help(f, app);
    }
    if let Some(err) = &app.error {
        let area = centered_rect(60, 20, f.size());
        f.render_widget(Clear, area);
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(err.as_str(), Theme::error())),
            Line::from(""),
            Line::from(Span::styled("Press any key", Theme::dim())),
        ];
        f.render_widget(
            Paragraph::new(lines).alignment(Alignment::Center).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Theme::error())
                    .title(Span::styled(" Error ", Theme::error()))
                    .style(Theme::base()),
            ),
            area,
        );
    }
}

pub fn is_ascii_mode() -> bool {
    // Check if we should use ASCII mode (for non-UTF8 terminals)
    std::env::var("PASVTY_ASCII").is_ok()
        || std::env::var("TERM").map_or(false, |t| t.contains("dumb"))
}

fn draw_header(f: &mut Frame, area: Rect, app: &AppState) {
    let line = match (&app.screen, &app.browser) {
        (Screen::Browse, Some(b)) => Line::from(vec![
            Span::styled("HOST: ", Theme::label()),
            Span::styled(b.session().peer(), Theme::received()),
            Span::raw("  "),
            Span::styled("PATH: ", Theme::label()),
            Span::styled(make_breadcrumb(b.current_path(), 50), Theme::entry()),
        ]),
        _ => Line::from(vec![
            Span::styled("pasvty ", Theme::label()),
            Span::styled(env!("CARGO_PKG_VERSION"), Theme::dim()),
            Span::raw("  "),
            Span::styled("USER: ", Theme::label()),
            Span::styled(app.config.user.as_str(), Theme::entry()),
        ]),
    };
    f.render_widget(
        Paragraph::new(line).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Theme::dim())
                .style(Theme::base()),
        ),
        area,
    );
}

fn draw_connect(f: &mut Frame, area: Rect, app: &AppState) {
    let area = centered_rect(60, 80, area);
    let cursor = if is_ascii_mode() { "_" } else { "█" };
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("Server address:", Theme::label())),
        Line::from(vec![
            Span::styled(" > ", Theme::label()),
            Span::styled(format!("{}{}", app.host_input, cursor), Theme::received()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Port: ", Theme::label()),
            Span::styled(app.port.to_string(), Theme::key()),
        ]),
        Line::from(Span::styled(
            "[Up/Down] ±1  [Right/Left] ±10  [PgUp/PgDn] ±100",
            Theme::dim(),
        )),
        Line::from(""),
    ];
    if !app.config.recent_hosts.is_empty() {
        lines.push(Line::from(Span::styled("Recent ([Tab] to cycle):", Theme::label())));
        for h in app.config.recent_hosts.iter().take(5) {
            lines.push(Line::from(Span::styled(
                format!("  {}:{}", h.host, h.port),
                Theme::dim(),
            )));
        }
    }
    f.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::label())
                .title(Span::styled(" Connect ", Theme::label()))
                .style(Theme::base()),
        ),
        area,
    );
}

fn draw_listing(f: &mut Frame, area: Rect, app: &AppState) {
    let browser = match &app.browser {
        Some(b) => b,
        None => return,
    };
    let listing = browser.listing();
    let items: Vec<ListItem> = if listing.is_empty() {
        vec![ListItem::new(Span::styled("(empty)", Theme::dim()))]
    } else {
        listing
            .entries
            .iter()
            .map(|e| {
                if e.is_parent() {
                    let icon = if is_ascii_mode() { "[..] " } else { "⬆ " };
                    ListItem::new(Span::styled(format!("{icon}{}", e.name), Theme::parent()))
                } else {
                    ListItem::new(Span::styled(e.name.clone(), Theme::entry()))
                }
            })
            .collect()
    };

    let mut state = ListState::default();
    if !listing.is_empty() {
        state.select(Some(listing.selected));
    }
    let title = format!(" {} ({} entries) ", make_breadcrumb(&listing.path, 40), listing.len());
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::key())
                .title(Span::styled(title, Theme::key()))
                .style(Theme::base()),
        )
        .highlight_style(Theme::selected())
        .highlight_symbol(if is_ascii_mode() { "> " } else { "▶ " });
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_transcript(f: &mut Frame, area: Rect, app: &AppState) {
    let mut lines: Vec<Line> = app
        .transcript
        .tail(TRANSCRIPT_LINES)
        .into_iter()
        .map(|l| {
            let style = if l.starts_with("> ") {
                Theme::sent()
            } else if l.as_bytes().first().map_or(false, |b| b.is_ascii_digit()) {
                Theme::received()
            } else {
                Theme::dim()
            };
            Line::from(Span::styled(l, style))
        })
        .collect();
    while lines.len() < TRANSCRIPT_LINES {
        lines.push(Line::from(""));
    }
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Theme::dim())
                .style(Theme::base()),
        ),
        area,
    );
}

fn draw_status(f: &mut Frame, area: Rect, app: &AppState) {
    let status = match &app.busy {
        Some(msg) => Span::styled(format!(" {msg}"), Theme::busy()),
        None if app.status.is_empty() => Span::styled(" Ready", Theme::entry()),
        None => Span::styled(format!(" {}", app.status), Theme::entry()),
    };
    let keys = match app.screen {
        Screen::Connect => " [type]host [↑↓←→ PgUp PgDn]port [Tab]recent [Enter]connect [F1]help [Esc]quit",
        Screen::Browse => " [↑↓]select [Enter]open [Backspace/←]up [r]efresh [h]elp [q]uit  (transfer: [Esc]/[b] abort)",
    };
    f.render_widget(
        Paragraph::new(vec![Line::from(status), Line::from(Span::styled(keys, Theme::dim()))])
            .block(Block::default().style(Theme::base())),
        area,
    );
}

fn draw_help(f: &mut Frame, app: &AppState) {
    let area = centered_rect(60, 60, f.size());
    f.render_widget(Clear, area);
    let heading = |s: &'static str| Line::from(Span::styled(s, Theme::label()));
    let mut lines = vec![
        heading("Connect screen:"),
        Line::from("  text       Edit host (host or host:port)"),
        Line::from("  Up/Down    Port +1 / -1"),
        Line::from("  Right/Left Port +10 / -10"),
        Line::from("  PgUp/PgDn  Port +100 / -100"),
        Line::from("  Tab        Cycle recent hosts"),
        Line::from("  Enter      Connect and log in"),
        Line::from(""),
        heading("Browser:"),
        Line::from("  Up/Down    Move selection"),
        Line::from("  Enter      Open directory or download file"),
        Line::from("  Backspace  Parent directory"),
        Line::from("  r          Refresh listing"),
        Line::from("  Esc / b    Abort running transfer"),
        Line::from("  q          QUIT and exit"),
    ];
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Downloads go to {}", app.config.download_dir().display()),
        Theme::dim(),
    )));
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::key())
                .title(Span::styled(" Help ", Theme::key()))
                .style(Theme::base()),
        ),
        area,
    );
}

/// Keep the tail of a long remote path.
fn make_breadcrumb(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }
    let mut result = String::new();
    for part in path.split('/').filter(|s| !s.is_empty()).rev() {
        let candidate = if result.is_empty() {
            part.to_string()
        } else {
            format!("{}/{}", part, result)
        };
        if candidate.chars().count() + 4 > max_len {
            break;
        }
        result = candidate;
    }
    format!(".../{}", result)
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
