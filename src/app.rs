use image::DynamicImage;
use ratatui::widgets::ListState;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::constants::constants;
use crate::display::ThumbnailMode;
use crate::pagination::PageState;
use crate::state::{FetchRequest, RequestTag, ViewState};
use crate::theme::{THEMES, Theme, theme_index};
use crate::youtube::{FetchError, FetchedVideos, VideoSummary, YouTubeClient, embed_url};

// --- Types ---

pub type FetchResult = Result<FetchedVideos, FetchError>;
pub type ThumbResult = anyhow::Result<DynamicImage>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  /// Navigating the results list.
  Browse,
  /// Typing into the title filter.
  Filter,
}

/// Thumbnail resize cache keyed by (video id, pane width, pane height).
#[derive(Default)]
pub struct GraphicsCache {
  pub resized_thumb: Option<(String, u16, u16, DynamicImage)>,
}

/// In-flight async task receivers and handles.
#[derive(Default)]
pub(crate) struct AsyncTasks {
  pub(crate) fetch_rx: Option<(RequestTag, oneshot::Receiver<FetchResult>)>,
  pub(crate) fetch_handle: Option<JoinHandle<()>>,
  pub(crate) thumb_rx: Option<(String, oneshot::Receiver<ThumbResult>)>,
}

pub struct App {
  /// Category, page, filter, sort flag, fetched data and overlay selection.
  pub state: ViewState,
  pub client: YouTubeClient,
  pub mode: AppMode,
  pub theme_index: usize,
  pub thumbnail_mode: ThumbnailMode,
  /// Highlight position within the projected list.
  pub list_state: ListState,
  /// Cursor position within the filter input (char index).
  pub filter_cursor: usize,
  /// Horizontal scroll offset for the filter input.
  pub filter_scroll: usize,
  /// Downloaded thumbnails for the current fetch, keyed by video id.
  pub thumbnails: HashMap<String, DynamicImage>,
  thumb_failed: HashSet<String>,
  pub gfx: GraphicsCache,
  pub last_error: Option<String>,
  /// Informational message, shown below status/error in priority.
  pub info_message: Option<String>,
  pub should_quit: bool,
  /// Drives the loading spinner.
  pub started_at: Instant,
  pub(crate) tasks: AsyncTasks,
  error_time: Option<Instant>,
}

impl App {
  pub fn new(client: YouTubeClient, settings: Settings, thumbnail_mode: ThumbnailMode) -> Self {
    let page = PageState::new(settings.page_size, settings.total_results);
    Self {
      state: ViewState::new(settings.categories, settings.initial_category, page),
      client,
      mode: AppMode::Browse,
      theme_index: theme_index(settings.theme_name.as_deref()),
      thumbnail_mode,
      list_state: ListState::default(),
      filter_cursor: 0,
      filter_scroll: 0,
      thumbnails: HashMap::new(),
      thumb_failed: HashSet::new(),
      gfx: GraphicsCache::default(),
      last_error: None,
      info_message: None,
      should_quit: false,
      started_at: Instant::now(),
      tasks: AsyncTasks::default(),
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static Theme {
    // Safety: theme_index comes from theme_index() or modular arithmetic in next_theme().
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages after the configured delay.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_dismiss_secs)
    {
      self.clear_error();
    }
  }

  // --- Projection helpers ---

  /// The summary under the list highlight.
  pub fn highlighted(&self) -> Option<&VideoSummary> {
    let idx = self.list_state.selected()?;
    self.state.projection().get(idx).copied()
  }

  fn highlighted_id(&self) -> Option<String> {
    self.highlighted().map(|s| s.id.clone())
  }

  /// Put the highlight back on `id` if it is still visible, otherwise clamp it into range.
  fn reselect(&mut self, id: Option<String>) {
    let visible = self.state.projection();
    if visible.is_empty() {
      self.list_state.select(None);
      return;
    }
    let idx = id.and_then(|id| visible.iter().position(|s| s.id == id));
    let clamped = idx.unwrap_or_else(|| self.list_state.selected().unwrap_or(0).min(visible.len() - 1));
    self.list_state.select(Some(clamped));
  }

  pub fn move_selection(&mut self, delta: isize) {
    let count = self.state.projection().len();
    if count == 0 {
      self.list_state.select(None);
      return;
    }
    let current = self.list_state.selected().unwrap_or(0) as isize;
    let next = (current + delta).rem_euclid(count as isize) as usize;
    self.list_state.select(Some(next));
  }

  // --- Transitions ---

  /// Run a state transition and spawn whatever fetch it asks for.
  fn transition(&mut self, f: impl FnOnce(ViewState) -> (ViewState, Option<FetchRequest>)) {
    let (next, request) = f(self.state.clone());
    self.state = next;
    if let Some(request) = request {
      self.spawn_fetch(request);
    }
  }

  pub fn refresh(&mut self) {
    self.transition(ViewState::refresh);
  }

  pub fn select_category(&mut self, index: usize) {
    self.transition(|s| s.select_category(index));
  }

  pub fn cycle_category(&mut self, step: isize) {
    self.transition(|s| s.cycle_category(step));
  }

  pub fn change_page(&mut self, delta: i64) {
    self.transition(|s| s.change_page(delta));
  }

  pub fn toggle_sort(&mut self) {
    let keep = self.highlighted_id();
    self.state = self.state.clone().toggle_sort();
    self.info_message =
      Some(if self.state.sort_by_duration() { "Sorted by length" } else { "Original order" }.to_string());
    self.reselect(keep);
  }

  /// Apply an edited filter string and keep the highlight on a visible row.
  pub fn set_filter(&mut self, filter: String) {
    let keep = self.highlighted_id();
    self.state = self.state.clone().with_filter(filter);
    self.reselect(keep);
  }

  pub fn open_highlighted(&mut self) {
    let Some(id) = self.highlighted_id() else { return };
    debug!(video_id = %id, "overlay: open");
    self.state = self.state.clone().open(&id);
  }

  pub fn close_overlay(&mut self) {
    self.state = self.state.clone().close();
  }

  /// Hand the selected video's embed address to the system browser.
  pub fn open_in_browser(&mut self) {
    let Some(video) = self.state.selected() else { return };
    let url = embed_url(&video.id);
    #[cfg(target_os = "macos")]
    let cmd = "open";
    #[cfg(not(target_os = "macos"))]
    let cmd = "xdg-open";
    match std::process::Command::new(cmd)
      .arg(&url)
      .stdin(std::process::Stdio::null())
      .stdout(std::process::Stdio::null())
      .stderr(std::process::Stdio::null())
      .spawn()
    {
      Ok(mut child) => {
        info!(url = %url, "overlay: opened in browser");
        // Reap the child in a background thread to avoid zombie processes.
        std::thread::spawn(move || {
          let _ = child.wait();
        });
        self.info_message = Some("Opened in browser".to_string());
      }
      Err(e) => {
        warn!(err = %e, "overlay: failed to launch browser");
        self.set_error(format!("Failed to open browser: {}", e));
      }
    }
  }

  // --- Background work ---

  fn spawn_fetch(&mut self, request: FetchRequest) {
    if let Some(handle) = self.tasks.fetch_handle.take() {
      handle.abort();
    }
    self.tasks.thumb_rx = None;
    self.thumbnails.clear();
    self.thumb_failed.clear();
    self.gfx.resized_thumb = None;
    self.list_state.select(None);
    self.clear_error();
    self.info_message = None;

    let FetchRequest { tag, query, page } = request;
    let client = self.client.clone();
    let (tx, rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
      let _ = tx.send(client.fetch_page(&query, page).await);
    });
    self.tasks.fetch_rx = Some((tag, rx));
    self.tasks.fetch_handle = Some(handle);
  }

  /// Fetch the highlighted video's thumbnail if it is not cached yet. One download at a time.
  pub fn ensure_thumbnail(&mut self) {
    if self.thumbnail_mode == ThumbnailMode::Off || self.tasks.thumb_rx.is_some() {
      return;
    }
    let Some(video) = self.state.selected().or_else(|| self.highlighted()) else { return };
    if self.thumbnails.contains_key(&video.id) || self.thumb_failed.contains(&video.id) {
      return;
    }
    let (id, url) = (video.id.clone(), video.thumbnail_url.clone());
    let client = self.client.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(client.fetch_thumbnail(&url).await);
    });
    self.tasks.thumb_rx = Some((id, rx));
  }

  pub fn check_pending(&mut self) {
    if let Some((tag, mut rx)) = self.tasks.fetch_rx.take() {
      match rx.try_recv() {
        Ok(outcome) => {
          self.tasks.fetch_handle = None;
          self.state = self.state.clone().apply_fetch(&tag, outcome);
          self.after_fetch();
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.fetch_rx = Some((tag, rx));
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.tasks.fetch_handle = None;
          self.state = self.state.clone().abandon_fetch(&tag);
          self.after_fetch();
        }
      }
    }

    if let Some((id, mut rx)) = self.tasks.thumb_rx.take() {
      match rx.try_recv() {
        Ok(Ok(image)) => {
          self.thumbnails.insert(id, image);
        }
        Ok(Err(e)) => {
          // The list still works without a preview.
          debug!(video_id = %id, err = %e, "thumbnail: fetch failed");
          self.thumb_failed.insert(id);
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.thumb_rx = Some((id, rx));
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.thumb_failed.insert(id);
        }
      }
    }
  }

  fn after_fetch(&mut self) {
    if let Some(msg) = self.state.last_error().map(str::to_string) {
      self.set_error(format!("Fetch failed: {}", msg));
      self.state = self.state.clone().clear_error();
    }
    self.reselect(None);
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }
}
