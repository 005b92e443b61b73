use clap::ValueEnum;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliThumbnailMode {
  Auto,
  Blocks,
  Ascii,
  Off,
}

/// How thumbnails are drawn in the preview pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailMode {
  /// No preview pane; the list takes the full width.
  Off,
  /// Luma mapped onto a character ramp.
  Ascii,
  /// True-colour half blocks: two pixels per cell.
  Blocks,
}

impl ThumbnailMode {
  pub fn label(self) -> &'static str {
    match self {
      ThumbnailMode::Off => "off",
      ThumbnailMode::Ascii => "ascii",
      ThumbnailMode::Blocks => "blocks",
    }
  }

  /// Pixel rows drawn per terminal row.
  pub fn rows_per_cell(self) -> u32 {
    match self {
      ThumbnailMode::Blocks => 2,
      ThumbnailMode::Ascii | ThumbnailMode::Off => 1,
    }
  }
}

/// Pick half blocks when the terminal advertises 24-bit colour, ASCII otherwise.
pub fn detect_thumbnail_mode() -> ThumbnailMode {
  let colorterm = std::env::var("COLORTERM").unwrap_or_default().to_lowercase();
  if colorterm == "truecolor" || colorterm == "24bit" { ThumbnailMode::Blocks } else { ThumbnailMode::Ascii }
}

pub fn resolve_thumbnail_mode(cli: CliThumbnailMode) -> ThumbnailMode {
  match cli {
    CliThumbnailMode::Auto => detect_thumbnail_mode(),
    CliThumbnailMode::Blocks => ThumbnailMode::Blocks,
    CliThumbnailMode::Ascii => ThumbnailMode::Ascii,
    CliThumbnailMode::Off => ThumbnailMode::Off,
  }
}
