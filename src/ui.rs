use image::DynamicImage;
use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Flex, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, Clear, List, ListItem, Padding, Paragraph, Tabs, Wrap},
};
use std::collections::HashMap;

use crate::app::{App, AppMode, GraphicsCache};
use crate::display::ThumbnailMode;
use crate::duration::format_duration;
use crate::projection::resolve_duration;
use crate::theme::Theme;
use crate::thumbnail::{ThumbnailWidget, prepare};
use crate::youtube::{VideoSummary, embed_url};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

fn rounded_block<'a>(theme: &Theme) -> Block<'a> {
  Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border))
}

/// Resized thumbnail for `video_id` at `area`, reusing the last resize when nothing changed.
fn sized_thumbnail<'a>(
  thumbnails: &HashMap<String, DynamicImage>,
  gfx: &'a mut GraphicsCache,
  video_id: &str,
  area: Rect,
  mode: ThumbnailMode,
) -> Option<&'a DynamicImage> {
  let source = thumbnails.get(video_id)?;
  let stale = match &gfx.resized_thumb {
    Some((id, w, h, _)) => id != video_id || *w != area.width || *h != area.height,
    None => true,
  };
  if stale {
    gfx.resized_thumb = Some((video_id.to_string(), area.width, area.height, prepare(source, area, mode)));
  }
  gfx.resized_thumb.as_ref().map(|(_, _, _, img)| img)
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, filter_area, main_area, status_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, app, header_area);
  render_filter(frame, app, filter_area);
  render_main(frame, app, main_area);
  render_status(frame, app, status_area);
  render_footer(frame, app, footer_area);

  if app.state.selected().is_some() {
    render_overlay(frame, app, main_area);
  }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let brand = " ▶ yfit ";
  let [brand_area, tabs_area] =
    Layout::horizontal([Constraint::Length(brand.chars().count() as u16), Constraint::Min(0)]).areas(area);

  frame.render_widget(
    Line::from(Span::styled(brand, Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
    brand_area,
  );

  let titles: Vec<Line> = app
    .state
    .categories()
    .iter()
    .enumerate()
    .map(|(i, c)| Line::from(format!("{} {}", i + 1, c.label)))
    .collect();
  let tabs = Tabs::new(titles)
    .select(app.state.category_index())
    .style(Style::default().fg(theme.muted))
    .highlight_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD | Modifier::UNDERLINED))
    .divider(Span::styled("·", Style::default().fg(theme.border)));
  frame.render_widget(tabs, tabs_area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area }
      .intersection(area);
  frame.render_widget(right, right_area);
}

fn render_filter(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let editing = app.mode == AppMode::Filter;
  let border_color = if editing { theme.accent } else { theme.border };
  let block = Block::bordered()
    .title(" Filter by title ")
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let filter = app.state.filter().to_string();
  if filter.is_empty() && !editing {
    let hint = Paragraph::new("Press / to filter by video title…").style(Style::default().fg(theme.muted)).block(block);
    frame.render_widget(hint, area);
    return;
  }

  // Borders plus padding take four columns; keep at least one for the text.
  let inner_w = (area.width.saturating_sub(4) as usize).max(1);
  let cursor_col = display_width(&filter, app.filter_cursor);
  if cursor_col < app.filter_scroll {
    app.filter_scroll = cursor_col;
  } else if cursor_col >= app.filter_scroll + inner_w {
    app.filter_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = filter
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.filter_scroll)
    .take_while(|(start, _, _)| *start < app.filter_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  frame.render_widget(Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(block), area);

  if editing {
    let cursor_x = area.x.saturating_add(2).saturating_add(cursor_col.saturating_sub(app.filter_scroll) as u16);
    frame.set_cursor_position((cursor_x.min(area.right().saturating_sub(1)), area.y + 1));
  }
}

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  if app.thumbnail_mode == ThumbnailMode::Off || area.width < 60 {
    render_results(frame, app, area);
    return;
  }
  let [list_area, preview_area] =
    Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(area);
  render_results(frame, app, list_area);
  if app.state.selected().is_none() {
    render_preview(frame, app, preview_area);
  }
}

fn results_title(app: &App) -> String {
  let category = app.state.category().map_or("", |c| c.label.as_str());
  let page = app.state.page();
  let sort = if app.state.sort_by_duration() { " · shortest first" } else { "" };
  format!(" {} · page {}/{}{} ", category, page.current(), page.max_page(), sort)
}

fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let block = rounded_block(theme)
    .title(results_title(app))
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD));

  if app.is_loading() {
    let tick = (app.started_at.elapsed().as_millis() / 100) as usize % SPINNER.len();
    let text = vec![
      Line::from(""),
      Line::from(Span::styled(format!("{} Loading...", SPINNER[tick]), Style::default().fg(theme.status))),
    ];
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center).block(block), area);
    return;
  }

  let visible = app.state.projection();
  if visible.is_empty() {
    let msg =
      if app.state.filter().is_empty() { "No videos." } else { "No videos found for your search query." };
    let text = vec![Line::from(""), Line::from(Span::styled(msg, Style::default().fg(theme.muted)))];
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center).block(block), area);
    return;
  }

  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;
  let details = &app.state.fetched().details;
  let selected = app.list_state.selected();

  let items: Vec<ListItem> = visible
    .iter()
    .enumerate()
    .map(|(i, video)| {
      let is_selected = Some(i) == selected;
      let fg = if is_selected { theme.highlight_fg } else { theme.fg };
      let bg = if is_selected {
        theme.highlight_bg
      } else if i % 2 == 1 {
        theme.stripe_bg
      } else {
        theme.bg
      };

      let right = if details.contains_key(&video.id) {
        format_duration(resolve_duration(video, details))
      } else {
        "--:--".to_string()
      };
      let right_w = right.chars().count();
      let title = truncate_str(&video.title, inner_w.saturating_sub(right_w + 2));
      let gap = inner_w.saturating_sub(title.chars().count() + right_w);
      let line = Line::from(vec![
        Span::styled(title, Style::default().fg(fg)),
        Span::raw(" ".repeat(gap)),
        Span::styled(right, Style::default().fg(if is_selected { fg } else { theme.muted })),
      ]);
      ListItem::new(line).bg(bg)
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_preview(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let block = rounded_block(theme).title(" Preview ").title_style(Style::default().fg(theme.muted));
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let Some(video) = app.highlighted().cloned() else { return };
  let [thumb_area, info_area] = Layout::vertical([Constraint::Percentage(65), Constraint::Min(3)]).areas(inner);

  let mode = app.thumbnail_mode;
  if let Some(image) = sized_thumbnail(&app.thumbnails, &mut app.gfx, &video.id, thumb_area, mode) {
    frame.render_widget(ThumbnailWidget { image, mode }, thumb_area);
  } else {
    let placeholder = Paragraph::new(Span::styled("…", Style::default().fg(theme.muted))).alignment(Alignment::Center);
    frame.render_widget(placeholder, thumb_area);
  }

  frame.render_widget(video_info(app, &video, info_area.width as usize), info_area);
}

/// Title, duration and player address of a video.
fn video_info<'a>(app: &App, video: &VideoSummary, width: usize) -> Paragraph<'a> {
  let theme = app.theme();
  let details = &app.state.fetched().details;
  let duration = if details.contains_key(&video.id) {
    format_duration(resolve_duration(video, details))
  } else {
    "unknown".to_string()
  };
  let lines = vec![
    Line::from(Span::styled(video.title.clone(), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(vec![
      Span::styled("Length  ", Style::default().fg(theme.muted)),
      Span::styled(duration, Style::default().fg(theme.fg)),
    ]),
    Line::from(Span::styled(
      truncate_str(&embed_url(&video.id), width),
      Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
    )),
  ];
  Paragraph::new(lines).wrap(Wrap { trim: true })
}

fn render_overlay(frame: &mut Frame, app: &mut App, area: Rect) {
  let Some(video) = app.state.selected().cloned() else { return };
  let theme = app.theme();

  let [popup] = Layout::vertical([Constraint::Percentage(85)]).flex(Flex::Center).areas(area);
  let [popup] = Layout::horizontal([Constraint::Percentage(80)]).flex(Flex::Center).areas(popup);
  frame.render_widget(Clear, popup);

  let block = Block::bordered()
    .title(Line::from(vec![
      Span::styled(" Now Playing ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
      Span::styled("[x] ", Style::default().fg(theme.muted)),
    ]))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.accent))
    .style(Style::default().bg(theme.bg))
    .padding(Padding::horizontal(1));
  let inner = block.inner(popup);
  frame.render_widget(block, popup);

  let [thumb_area, info_area, hint_area] =
    Layout::vertical([Constraint::Min(3), Constraint::Length(4), Constraint::Length(1)]).areas(inner);

  let mode = app.thumbnail_mode;
  if mode != ThumbnailMode::Off
    && let Some(image) = sized_thumbnail(&app.thumbnails, &mut app.gfx, &video.id, thumb_area, mode)
  {
    frame.render_widget(ThumbnailWidget { image, mode }, thumb_area);
  }

  frame.render_widget(video_info(app, &video, info_area.width as usize), info_area);

  let hint = Line::from(vec![
    Span::styled(" o ", Style::default().fg(theme.key_fg).bg(theme.key_bg)),
    Span::styled(" Open player in browser  ", Style::default().fg(theme.muted)),
    Span::styled(" Esc ", Style::default().fg(theme.key_fg).bg(theme.key_bg)),
    Span::styled(" Close ", Style::default().fg(theme.muted)),
  ]);
  frame.render_widget(hint, hint_area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if app.is_loading() {
    let query = app.state.in_flight().map_or("", |t| t.query.as_str());
    (format!(" ⏳ Fetching '{}'…", query), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(info) = &app.info_message {
    (format!(" ℹ {}", info), Style::default().fg(theme.muted))
  } else {
    let shown = app.state.projection().len();
    let total = app.state.fetched().summaries.len();
    let text = if shown == total { format!(" {} videos", total) } else { format!(" {} of {} videos", shown, total) };
    (text, Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);

  let page = app.state.page();
  let prev = if page.can_go_previous() { "◀ Previous  " } else { "" };
  let next = if page.can_go_next() { "  Next ▶" } else { "" };
  let pager = format!("{}Page {} of {}{} ", prev, page.current(), page.max_page(), next);
  let pager_w = pager.chars().count() as u16;
  let right_area = Rect { x: area.x + area.width.saturating_sub(pager_w), width: pager_w.min(area.width), ..area };
  frame.render_widget(Line::from(Span::styled(pager, Style::default().fg(theme.accent))), right_area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let has_results = !app.state.projection().is_empty();
  let keys: Vec<(&str, &str)> = if app.state.selected().is_some() {
    vec![("o", "Browser"), ("Esc", "Close"), ("^t", "Theme")]
  } else {
    match app.mode {
      AppMode::Filter => vec![("Enter", "Apply"), ("Esc", "Clear"), ("↑/↓", "Navigate")],
      AppMode::Browse => {
        let mut k = Vec::new();
        if has_results {
          k.push(("Enter", "Watch"));
          k.push(("j/k", "Navigate"));
        }
        k.push(("Tab", "Category"));
        k.push(("/", "Filter"));
        k.push(("s", "Sort"));
        k.push(("n/p", "Page"));
        k.push(("^t", "Theme"));
        k.push(("q", "Quit"));
        k
      }
    }
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area }
      .intersection(area);
  frame.render_widget(right, right_area);
}
