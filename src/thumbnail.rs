use image::{DynamicImage, imageops::FilterType};
use ratatui::{
  buffer::Buffer,
  layout::Rect,
  style::{Color, Style},
  widgets::Widget,
};

use crate::display::ThumbnailMode;

const ASCII_RAMP: [&str; 10] = [" ", ".", ":", "-", "=", "+", "*", "#", "%", "@"];

/// Largest 16:9 pixel size that fits `area` in the given mode.
///
/// Terminal cells are roughly twice as tall as wide, so in ASCII mode one cell
/// stands for a 1x2 pixel patch and the width is doubled relative to height.
pub fn fit_size(area: Rect, mode: ThumbnailMode) -> (u32, u32) {
  let cols = area.width as u32;
  let rows = area.height as u32 * mode.rows_per_cell();
  // Blocks: square pixels. Ascii: each row counts double.
  let aspect_rows = match mode {
    ThumbnailMode::Blocks => rows,
    ThumbnailMode::Ascii | ThumbnailMode::Off => rows * 2,
  };
  let width_from_rows = aspect_rows * 16 / 9;
  let w = cols.min(width_from_rows).max(1);
  let h = match mode {
    ThumbnailMode::Blocks => w * 9 / 16,
    ThumbnailMode::Ascii | ThumbnailMode::Off => w * 9 / 32,
  };
  (w, h.clamp(1, rows.max(1)))
}

/// Resize once per (video, area) so rendering each frame is a plain copy.
pub fn prepare(image: &DynamicImage, area: Rect, mode: ThumbnailMode) -> DynamicImage {
  let (w, h) = fit_size(area, mode);
  image.resize_to_fill(w, h, FilterType::Triangle)
}

/// Draws an image that was already sized with [`prepare`], centred in the area.
pub struct ThumbnailWidget<'a> {
  pub image: &'a DynamicImage,
  pub mode: ThumbnailMode,
}

impl Widget for ThumbnailWidget<'_> {
  fn render(self, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
      return;
    }
    match self.mode {
      ThumbnailMode::Blocks => render_blocks(self.image, area, buf),
      ThumbnailMode::Ascii => render_ascii(self.image, area, buf),
      ThumbnailMode::Off => {}
    }
  }
}

fn centre(area: Rect, cols: u32, rows: u32) -> (u16, u16) {
  let x = area.x.saturating_add(((area.width as u32).saturating_sub(cols) / 2) as u16);
  let y = area.y.saturating_add(((area.height as u32).saturating_sub(rows) / 2) as u16);
  (x, y)
}

fn render_blocks(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let rgb = image.to_rgb8();
  let cols = rgb.width().min(area.width as u32);
  let rows = rgb.height().div_ceil(2).min(area.height as u32);
  let (x0, y0) = centre(area, cols, rows);

  for row in 0..rows {
    for col in 0..cols {
      let top = rgb.get_pixel(col, row * 2);
      let bottom_y = row * 2 + 1;
      let bg = if bottom_y < rgb.height() {
        let p = rgb.get_pixel(col, bottom_y);
        Color::Rgb(p[0], p[1], p[2])
      } else {
        Color::Reset
      };
      buf.set_string(
        x0 + col as u16,
        y0 + row as u16,
        "▀",
        Style::default().fg(Color::Rgb(top[0], top[1], top[2])).bg(bg),
      );
    }
  }
}

fn render_ascii(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let luma = image.to_luma8();
  let cols = luma.width().min(area.width as u32);
  let rows = luma.height().min(area.height as u32);
  let (x0, y0) = centre(area, cols, rows);
  let last = ASCII_RAMP.len() - 1;

  for row in 0..rows {
    for col in 0..cols {
      let level = luma.get_pixel(col, row)[0] as usize;
      let idx = (level * last + 127) / 255;
      buf.set_string(x0 + col as u16, y0 + row as u16, ASCII_RAMP[idx.min(last)], Style::default());
    }
  }
}
