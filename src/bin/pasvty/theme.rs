use ratatui::style::{Color, Modifier, Style};

pub struct Theme;

impl Theme {
    // Dracula palette
    pub const BG: Color = Color::Rgb(40, 42, 54);
    pub const FG: Color = Color::Rgb(248, 248, 242);
    pub const COMMENT: Color = Color::Rgb(98, 114, 164);
    pub const CYAN: Color = Color::Rgb(139, 233, 253);
    pub const GREEN: Color = Color::Rgb(80, 250, 123);
    pub const ORANGE: Color = Color::Rgb(255, 184, 108);
    pub const PINK: Color = Color::Rgb(255, 121, 198);
    pub const RED: Color = Color::Rgb(255, 85, 85);
    pub const YELLOW: Color = Color::Rgb(241, 250, 140);

    pub fn base() -> Style {
        Style::default().fg(Self::FG).bg(Self::BG)
    }
    pub fn label() -> Style {
        Style::default().fg(Self::CYAN).add_modifier(Modifier::BOLD)
    }
    pub fn key() -> Style {
        Style::default().fg(Self::PINK).add_modifier(Modifier::BOLD)
    }
    pub fn dim() -> Style {
        Style::default().fg(Self::COMMENT)
    }
    pub fn parent() -> Style {
        Style::default().fg(Self::CYAN)
    }
    pub fn entry() -> Style {
        Style::default().fg(Self::FG)
    }
    pub fn selected() -> Style {
        Style::default()
            .bg(Self::PINK)
            .fg(Self::BG)
            .add_modifier(Modifier::BOLD)
    }
    pub fn sent() -> Style {
        Style::default().fg(Self::ORANGE)
    }
    pub fn received() -> Style {
        Style::default().fg(Self::GREEN)
    }
    pub fn error() -> Style {
        Style::default().fg(Self::RED).add_modifier(Modifier::BOLD)
    }
    pub fn busy() -> Style {
        Style::default().fg(Self::YELLOW)
    }
}
