use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeSetting {
    #[default]
    Auto,
    Light,
    Dark,
}

impl ThemeSetting {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeSetting::Auto => "auto",
            ThemeSetting::Light => "light",
            ThemeSetting::Dark => "dark",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Some(ThemeSetting::Auto),
            "light" => Some(ThemeSetting::Light),
            "dark" => Some(ThemeSetting::Dark),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ThemeSetting::Auto => "Auto",
            ThemeSetting::Light => "Light",
            ThemeSetting::Dark => "Dark",
        }
    }

    /// auto -> light -> dark -> auto
    pub fn next(&self) -> Self {
        match self {
            ThemeSetting::Auto => ThemeSetting::Light,
            ThemeSetting::Light => ThemeSetting::Dark,
            ThemeSetting::Dark => ThemeSetting::Auto,
        }
    }
}

/// Colors used by the render layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub foreground: Color,
    pub muted: Color,
    pub accent: Color,
    pub user: Color,
    pub assistant: Color,
    pub highlight_bg: Color,
    pub highlight_fg: Color,
}

impl Palette {
    pub fn for_setting(setting: ThemeSetting) -> Self {
        match setting {
            // Leave the terminal's own colors alone
            ThemeSetting::Auto => Self {
                background: Color::Reset,
                foreground: Color::Reset,
                muted: Color::DarkGray,
                accent: Color::Cyan,
                user: Color::Cyan,
                assistant: Color::Yellow,
                highlight_bg: Color::Blue,
                highlight_fg: Color::White,
            },
            ThemeSetting::Light => Self {
                background: Color::White,
                foreground: Color::Black,
                muted: Color::Gray,
                accent: Color::Blue,
                user: Color::Blue,
                assistant: Color::Magenta,
                highlight_bg: Color::LightBlue,
                highlight_fg: Color::Black,
            },
            ThemeSetting::Dark => Self {
                background: Color::Black,
                foreground: Color::White,
                muted: Color::DarkGray,
                accent: Color::Cyan,
                user: Color::LightCyan,
                assistant: Color::LightYellow,
                highlight_bg: Color::DarkGray,
                highlight_fg: Color::White,
            },
        }
    }
}
