use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles for the store's terminal output, by role
#[derive(Debug, Clone)]
pub struct Theme {
    pub title: Style,
    pub ok: Style,
    pub failure: Style,
    pub caution: Style,
    pub label: Style,
    /// Entity ids in confirmations
    pub id: Style,
}

impl Theme {
    /// Colored only when stdout is a terminal and `NO_COLOR`/`CLICOLOR` allow it
    pub fn detect() -> Self {
        if console::Term::stdout().is_term() && console::colors_enabled() {
            Self::colored()
        } else {
            Self::default()
        }
    }

    pub fn colored() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            ok: Style::new().green().bold(),
            failure: Style::new().red().bold(),
            caution: Style::new().yellow(),
            label: Style::new().dimmed(),
            id: Style::new().magenta().bold(),
        }
    }
}

impl Default for Theme {
    /// No styling at all
    fn default() -> Self {
        Self {
            title: Style::new(),
            ok: Style::new(),
            failure: Style::new(),
            caution: Style::new(),
            label: Style::new(),
            id: Style::new(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
