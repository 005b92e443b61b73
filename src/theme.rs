use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub const THEMES: [Theme; 3] = [
  Theme {
    name: "Studio",
    bg: Color::Rgb(24, 24, 28),
    fg: Color::Rgb(226, 224, 220),
    accent: Color::Rgb(240, 150, 120),
    muted: Color::Rgb(130, 128, 136),
    border: Color::Rgb(70, 68, 78),
    highlight_fg: Color::Rgb(24, 24, 28),
    highlight_bg: Color::Rgb(240, 150, 120),
    stripe_bg: Color::Rgb(32, 32, 38),
    status: Color::Rgb(150, 200, 170),
    error: Color::Rgb(235, 100, 100),
    key_fg: Color::Rgb(24, 24, 28),
    key_bg: Color::Rgb(130, 128, 136),
  },
  Theme {
    name: "Chalk",
    bg: Color::Rgb(246, 244, 238),
    fg: Color::Rgb(40, 40, 44),
    accent: Color::Rgb(60, 120, 150),
    muted: Color::Rgb(130, 130, 130),
    border: Color::Rgb(200, 196, 188),
    highlight_fg: Color::Rgb(246, 244, 238),
    highlight_bg: Color::Rgb(60, 120, 150),
    stripe_bg: Color::Rgb(236, 233, 226),
    status: Color::Rgb(50, 130, 80),
    error: Color::Rgb(190, 50, 50),
    key_fg: Color::Rgb(246, 244, 238),
    key_bg: Color::Rgb(110, 110, 110),
  },
  Theme {
    name: "Terminal",
    bg: Color::Reset,
    fg: Color::Reset,
    accent: Color::Cyan,
    muted: Color::DarkGray,
    border: Color::DarkGray,
    highlight_fg: Color::Black,
    highlight_bg: Color::Cyan,
    stripe_bg: Color::Reset,
    status: Color::Green,
    error: Color::Red,
    key_fg: Color::Black,
    key_bg: Color::Gray,
  },
];

/// Index of the theme called `name` (case-insensitive), or the first theme.
pub fn theme_index(name: Option<&str>) -> usize {
  name.and_then(|n| THEMES.iter().position(|t| t.name.eq_ignore_ascii_case(n))).unwrap_or(0)
}
