use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, AppMode};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: event::KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return;
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('t') {
    app.next_theme();
    return;
  }

  // The overlay captures everything until it is dismissed.
  if app.state.selected().is_some() {
    handle_overlay_key(app, key);
    return;
  }

  match app.mode {
    AppMode::Browse => handle_browse_key(app, key),
    AppMode::Filter => handle_filter_key(app, key),
  }
}

fn handle_overlay_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('x') => app.close_overlay(),
    KeyCode::Char('o') | KeyCode::Enter => app.open_in_browser(),
    _ => {}
  }
}

fn handle_browse_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => app.open_highlighted(),
    KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
    KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
    KeyCode::Right | KeyCode::Char('n') => app.change_page(1),
    KeyCode::Left | KeyCode::Char('p') => app.change_page(-1),
    KeyCode::Tab => app.cycle_category(1),
    KeyCode::BackTab => app.cycle_category(-1),
    KeyCode::Char(c @ '1'..='9') => {
      let idx = c as usize - '1' as usize;
      app.select_category(idx);
    }
    KeyCode::Char('s') => app.toggle_sort(),
    KeyCode::Char('r') => app.refresh(),
    KeyCode::Char('/') => {
      app.filter_cursor = app.state.filter().chars().count();
      app.mode = AppMode::Filter;
    }
    KeyCode::Esc => {
      if !app.state.filter().is_empty() {
        app.set_filter(String::new());
        app.filter_cursor = 0;
        app.filter_scroll = 0;
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Char('q') => app.should_quit = true,
    _ => {}
  }
}

fn handle_filter_key(app: &mut App, key: event::KeyEvent) {
  let mut filter = app.state.filter().to_string();
  match key.code {
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&filter, app.filter_cursor);
      filter.insert(byte_idx, c);
      app.filter_cursor += 1;
      app.set_filter(filter);
    }
    KeyCode::Backspace => {
      if app.filter_cursor > 0 {
        app.filter_cursor -= 1;
        let byte_idx = char_to_byte_index(&filter, app.filter_cursor);
        filter.remove(byte_idx);
        app.set_filter(filter);
      }
    }
    KeyCode::Delete => {
      if app.filter_cursor < filter.chars().count() {
        let byte_idx = char_to_byte_index(&filter, app.filter_cursor);
        filter.remove(byte_idx);
        app.set_filter(filter);
      }
    }
    KeyCode::Left => {
      app.filter_cursor = app.filter_cursor.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.filter_cursor < filter.chars().count() {
        app.filter_cursor += 1;
      }
    }
    KeyCode::Home => {
      app.filter_cursor = 0;
    }
    KeyCode::End => {
      app.filter_cursor = filter.chars().count();
    }
    // Navigate filtered results while typing
    KeyCode::Down => app.move_selection(1),
    KeyCode::Up => app.move_selection(-1),
    KeyCode::Enter => {
      // Keep the filter and go back to the list
      app.mode = AppMode::Browse;
    }
    KeyCode::Esc => {
      // Clear filter and go back to the list
      app.set_filter(String::new());
      app.filter_cursor = 0;
      app.filter_scroll = 0;
      app.mode = AppMode::Browse;
    }
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{Config, Overrides, Settings};
  use crate::display::ThumbnailMode;
  use crate::youtube::{ApiKey, FetchedVideos, VideoSummary, YouTubeClient};
  use ratatui::crossterm::event::KeyEvent;

  fn make_app() -> App {
    let settings = Settings::resolve(Config::default(), &Overrides::default()).unwrap();
    let client = YouTubeClient::new(ApiKey::new("test-key")).unwrap();
    let mut app = App::new(client, settings, ThumbnailMode::Off);
    let (state, req) = app.state.clone().refresh();
    let summaries = ["Morning Yoga", "Pilates Core", "yoga basics"]
      .iter()
      .enumerate()
      .map(|(i, t)| VideoSummary { id: format!("v{}", i), title: t.to_string(), thumbnail_url: String::new() })
      .collect();
    app.state = state.apply_fetch(&req.unwrap().tag, Ok(FetchedVideos { summaries, details: Default::default() }));
    app.list_state.select(Some(0));
    app
  }

  fn press(app: &mut App, code: KeyCode) {
    handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
  }

  fn type_str(app: &mut App, s: &str) {
    for c in s.chars() {
      press(app, KeyCode::Char(c));
    }
  }

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5); // past end
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日"; // a=1 byte, é=2 bytes, 日=3 bytes
    assert_eq!(char_to_byte_index(s, 0), 0);
    assert_eq!(char_to_byte_index(s, 1), 1);
    assert_eq!(char_to_byte_index(s, 2), 3);
    assert_eq!(char_to_byte_index(s, 3), 6);
  }

  // --- filter editing ---

  #[test]
  fn typing_in_filter_mode_narrows_results() {
    let mut app = make_app();
    press(&mut app, KeyCode::Char('/'));
    assert_eq!(app.mode, AppMode::Filter);
    type_str(&mut app, "YOGA");
    assert_eq!(app.state.filter(), "YOGA");
    let titles: Vec<&str> = app.state.projection().iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Morning Yoga", "yoga basics"]);
  }

  #[test]
  fn backspace_and_cursor_editing() {
    let mut app = make_app();
    press(&mut app, KeyCode::Char('/'));
    type_str(&mut app, "yoxga");
    press(&mut app, KeyCode::Left);
    press(&mut app, KeyCode::Left);
    press(&mut app, KeyCode::Backspace);
    assert_eq!(app.state.filter(), "yoga");
    press(&mut app, KeyCode::Home);
    press(&mut app, KeyCode::Delete);
    assert_eq!(app.state.filter(), "oga");
  }

  #[test]
  fn enter_keeps_filter_and_esc_clears_it() {
    let mut app = make_app();
    press(&mut app, KeyCode::Char('/'));
    type_str(&mut app, "core");
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.mode, AppMode::Browse);
    assert_eq!(app.state.filter(), "core");

    press(&mut app, KeyCode::Char('/'));
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.mode, AppMode::Browse);
    assert_eq!(app.state.filter(), "");
  }

  #[test]
  fn browse_keys_do_not_leak_into_filter() {
    let mut app = make_app();
    press(&mut app, KeyCode::Char('/'));
    type_str(&mut app, "q");
    assert!(!app.should_quit);
    assert_eq!(app.state.filter(), "q");
  }

  // --- browse ---

  #[test]
  fn sort_key_toggles_sort() {
    let mut app = make_app();
    press(&mut app, KeyCode::Char('s'));
    assert!(app.state.sort_by_duration());
    press(&mut app, KeyCode::Char('s'));
    assert!(!app.state.sort_by_duration());
  }

  #[test]
  fn esc_clears_filter_before_quitting() {
    let mut app = make_app();
    app.set_filter("yoga".to_string());
    press(&mut app, KeyCode::Esc);
    assert!(!app.should_quit);
    assert_eq!(app.state.filter(), "");
    press(&mut app, KeyCode::Esc);
    assert!(app.should_quit);
  }

  #[test]
  fn ctrl_c_quits_from_any_mode() {
    let mut app = make_app();
    press(&mut app, KeyCode::Char('/'));
    handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
  }

  // --- overlay ---

  #[test]
  fn overlay_opens_on_enter_and_closes_on_esc() {
    let mut app = make_app();
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.state.selected().map(|s| s.id.as_str()), Some("v1"));
    // List keys are swallowed while the overlay is up.
    press(&mut app, KeyCode::Down);
    assert_eq!(app.list_state.selected(), Some(1));
    press(&mut app, KeyCode::Esc);
    assert!(app.state.selected().is_none());
    assert!(!app.should_quit);
  }
}
