//! The browsing state as a plain value with pure transitions.
//!
//! Every user action maps to a method that consumes the current state and returns
//! the next one. Transitions that need the network also hand back a
//! [`FetchRequest`]; the shell spawns it and later feeds the outcome to
//! [`ViewState::apply_fetch`] together with the request's tag. Outcomes whose tag
//! is not the one currently in flight are dropped, so a slow response for an old
//! page or category can never overwrite newer state.

use tracing::{debug, error, info, warn};

use crate::constants::Category;
use crate::pagination::PageState;
use crate::projection::project;
use crate::youtube::{FetchError, FetchedVideos, VideoSummary};

/// Identifies one fetch trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTag {
  pub generation: u64,
  pub query: String,
  pub page: u32,
}

/// What the shell must fetch to satisfy a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
  pub tag: RequestTag,
  pub query: String,
  pub page: PageState,
}

#[derive(Debug, Clone)]
pub struct ViewState {
  categories: Vec<Category>,
  category: usize,
  page: PageState,
  filter: String,
  sort_by_duration: bool,
  fetched: FetchedVideos,
  loading: bool,
  /// Video id of the summary shown in the overlay.
  selected: Option<String>,
  in_flight: Option<RequestTag>,
  generation: u64,
  last_error: Option<String>,
}

impl ViewState {
  /// Fresh state on `category`; nothing fetched yet.
  pub fn new(categories: Vec<Category>, category: usize, page: PageState) -> Self {
    let category = category.min(categories.len().saturating_sub(1));
    Self {
      categories,
      category,
      page: page.reset(),
      filter: String::new(),
      sort_by_duration: false,
      fetched: FetchedVideos::default(),
      loading: false,
      selected: None,
      in_flight: None,
      generation: 0,
      last_error: None,
    }
  }

  // --- Accessors ---

  pub fn categories(&self) -> &[Category] {
    &self.categories
  }

  pub fn category_index(&self) -> usize {
    self.category
  }

  pub fn category(&self) -> Option<&Category> {
    self.categories.get(self.category)
  }

  pub fn page(&self) -> PageState {
    self.page
  }

  pub fn filter(&self) -> &str {
    &self.filter
  }

  pub fn sort_by_duration(&self) -> bool {
    self.sort_by_duration
  }

  pub fn fetched(&self) -> &FetchedVideos {
    &self.fetched
  }

  pub fn is_loading(&self) -> bool {
    self.loading
  }

  pub fn last_error(&self) -> Option<&str> {
    self.last_error.as_deref()
  }

  pub fn in_flight(&self) -> Option<&RequestTag> {
    self.in_flight.as_ref()
  }

  /// The visible list: filtered, then optionally sorted by duration.
  pub fn projection(&self) -> Vec<&VideoSummary> {
    project(&self.fetched.summaries, &self.fetched.details, &self.filter, self.sort_by_duration)
  }

  pub fn selected(&self) -> Option<&VideoSummary> {
    let id = self.selected.as_deref()?;
    self.fetched.summaries.iter().find(|s| s.id == id)
  }

  // --- Fetch triggers ---

  /// Start a fetch for the current category and page, discarding what was fetched before.
  pub fn refresh(mut self) -> (Self, Option<FetchRequest>) {
    let Some(query) = self.category().map(|c| c.query.clone()) else {
      warn!("state: no categories configured, nothing to fetch");
      return (self, None);
    };
    self.generation += 1;
    let tag = RequestTag { generation: self.generation, query: query.clone(), page: self.page.current() };
    info!(query = %query, page = self.page.current(), generation = self.generation, "state: fetch triggered");

    self.fetched = FetchedVideos::default();
    self.selected = None;
    self.loading = true;
    self.last_error = None;
    self.in_flight = Some(tag.clone());
    let request = FetchRequest { tag, query, page: self.page };
    (self, Some(request))
  }

  /// Switch category. Resets to page 1 and refetches, even when re-selecting the current category.
  pub fn select_category(mut self, index: usize) -> (Self, Option<FetchRequest>) {
    if index >= self.categories.len() {
      return (self, None);
    }
    self.category = index;
    self.page = self.page.reset();
    self.refresh()
  }

  /// Cycle to the next (or previous, for negative `step`) category.
  pub fn cycle_category(self, step: isize) -> (Self, Option<FetchRequest>) {
    let n = self.categories.len();
    if n == 0 {
      return (self, None);
    }
    let next = (self.category as isize + step).rem_euclid(n as isize) as usize;
    self.select_category(next)
  }

  /// Move by `delta` pages. No fetch when the clamped page does not change.
  pub fn change_page(mut self, delta: i64) -> (Self, Option<FetchRequest>) {
    let next = self.page.advance(delta);
    if next == self.page {
      return (self, None);
    }
    self.page = next;
    self.refresh()
  }

  /// Accept the outcome of a fetch. Stale outcomes leave the state untouched.
  pub fn apply_fetch(mut self, tag: &RequestTag, outcome: Result<FetchedVideos, FetchError>) -> Self {
    if self.in_flight.as_ref() != Some(tag) {
      debug!(generation = tag.generation, query = %tag.query, page = tag.page, "state: dropping stale fetch outcome");
      return self;
    }
    self.in_flight = None;
    self.loading = false;
    match outcome {
      Ok(fetched) => {
        info!(
          query = %tag.query,
          page = tag.page,
          videos = fetched.summaries.len(),
          details = fetched.details.len(),
          "state: fetch completed"
        );
        self.fetched = fetched;
      }
      Err(e) => {
        error!(query = %tag.query, page = tag.page, err = %e, "state: fetch failed");
        self.fetched = FetchedVideos::default();
        self.last_error = Some(e.to_string());
      }
    }
    self
  }

  /// The fetch task vanished without reporting; settle into an empty, non-loading state.
  pub fn abandon_fetch(mut self, tag: &RequestTag) -> Self {
    if self.in_flight.as_ref() != Some(tag) {
      return self;
    }
    warn!(query = %tag.query, page = tag.page, "state: fetch task ended without a result");
    self.in_flight = None;
    self.loading = false;
    self.fetched = FetchedVideos::default();
    self.last_error = Some("Fetch task failed.".to_string());
    self
  }

  // --- Local view changes ---

  pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
    self.filter = filter.into();
    self
  }

  pub fn toggle_sort(mut self) -> Self {
    self.sort_by_duration = !self.sort_by_duration;
    debug!(sort_by_duration = self.sort_by_duration, "state: sort toggled");
    self
  }

  /// Open the overlay on `video_id`. Ignored if the id is not part of the current fetch.
  pub fn open(mut self, video_id: &str) -> Self {
    if self.fetched.summaries.iter().any(|s| s.id == video_id) {
      self.selected = Some(video_id.to_string());
    }
    self
  }

  pub fn close(mut self) -> Self {
    self.selected = None;
    self
  }

  pub fn clear_error(mut self) -> Self {
    self.last_error = None;
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::youtube::VideoDetail;
  use std::collections::HashMap;

  fn categories() -> Vec<Category> {
    [("Pilates", "Pilates"), ("Yoga", "Yoga"), ("Barre", "Barre Workout")]
      .iter()
      .map(|(l, q)| Category { label: l.to_string(), query: q.to_string() })
      .collect()
  }

  fn make_state() -> ViewState {
    ViewState::new(categories(), 0, PageState::new(10, 200))
  }

  fn make_fetched(items: &[(&str, &str, Option<&str>)]) -> FetchedVideos {
    let summaries = items
      .iter()
      .map(|(id, title, _)| VideoSummary {
        id: id.to_string(),
        title: title.to_string(),
        thumbnail_url: String::new(),
      })
      .collect();
    let details: HashMap<String, VideoDetail> = items
      .iter()
      .filter_map(|(id, _, iso)| {
        iso.map(|iso| (id.to_string(), VideoDetail { id: id.to_string(), duration_iso: iso.to_string() }))
      })
      .collect();
    FetchedVideos { summaries, details }
  }

  fn loaded(items: &[(&str, &str, Option<&str>)]) -> ViewState {
    let (state, req) = make_state().refresh();
    let req = req.unwrap();
    state.apply_fetch(&req.tag, Ok(make_fetched(items)))
  }

  fn ids(state: &ViewState) -> Vec<String> {
    state.projection().iter().map(|s| s.id.clone()).collect()
  }

  // --- fetch triggers ---

  #[test]
  fn initial_refresh_requests_first_page() {
    let (state, req) = make_state().refresh();
    let req = req.unwrap();
    assert_eq!(req.query, "Pilates");
    assert_eq!(req.page.current(), 1);
    assert_eq!(req.page.max_results(), 10);
    assert!(state.is_loading());
    assert_eq!(state.in_flight(), Some(&req.tag));
  }

  #[test]
  fn successful_fetch_populates_results() {
    let state = loaded(&[("a", "Pilates Core", Some("PT10M")), ("b", "Pilates Arms", None)]);
    assert!(!state.is_loading());
    assert!(state.in_flight().is_none());
    assert_eq!(ids(&state), vec!["a", "b"]);
  }

  #[test]
  fn switching_category_resets_page_and_discards_results() {
    let state = loaded(&[("a", "Pilates Core", None)]);
    let (state, req) = state.change_page(2);
    let state = state.apply_fetch(&req.unwrap().tag, Ok(make_fetched(&[("p3", "Page three", None)])));
    assert_eq!(state.page().current(), 3);

    let (state, req) = state.select_category(1);
    let req = req.unwrap();
    assert_eq!(req.query, "Yoga");
    assert_eq!(state.page().current(), 1);
    assert_eq!(req.page.max_results(), 10);
    assert!(state.fetched().summaries.is_empty());
    assert!(state.is_loading());

    let state = state.apply_fetch(&req.tag, Ok(make_fetched(&[("y1", "Yoga Flow", None)])));
    assert_eq!(ids(&state), vec!["y1"]);
  }

  #[test]
  fn page_change_triggers_fetch_with_larger_window() {
    let (state, req) = loaded(&[]).change_page(1);
    let req = req.unwrap();
    assert_eq!(state.page().current(), 2);
    assert_eq!(req.page.max_results(), 20);
    assert_eq!(req.tag.page, 2);
  }

  #[test]
  fn page_change_at_bound_does_nothing() {
    let state = loaded(&[("a", "A", None)]);
    let (state, req) = state.change_page(-1);
    assert!(req.is_none());
    assert_eq!(state.page().current(), 1);
    assert!(!state.is_loading());
    assert_eq!(ids(&state), vec!["a"]);
  }

  #[test]
  fn cycle_category_wraps() {
    let (state, req) = make_state().cycle_category(-1);
    assert_eq!(state.category_index(), 2);
    assert_eq!(req.unwrap().query, "Barre Workout");
    let (state, _) = state.cycle_category(1);
    assert_eq!(state.category_index(), 0);
  }

  #[test]
  fn out_of_range_category_is_ignored() {
    let (state, req) = make_state().select_category(7);
    assert!(req.is_none());
    assert_eq!(state.category_index(), 0);
  }

  #[test]
  fn no_categories_means_no_fetch() {
    let (state, req) = ViewState::new(Vec::new(), 0, PageState::new(10, 200)).refresh();
    assert!(req.is_none());
    assert!(!state.is_loading());
  }

  // --- stale responses ---

  #[test]
  fn stale_outcome_is_dropped() {
    let (state, first) = make_state().refresh();
    let first = first.unwrap();
    let (state, second) = state.change_page(1);
    let second = second.unwrap();

    let state = state.apply_fetch(&first.tag, Ok(make_fetched(&[("old", "Old page", None)])));
    assert!(state.is_loading());
    assert!(state.fetched().summaries.is_empty());

    let state = state.apply_fetch(&second.tag, Ok(make_fetched(&[("new", "New page", None)])));
    assert!(!state.is_loading());
    assert_eq!(ids(&state), vec!["new"]);
  }

  #[test]
  fn same_query_and_page_from_older_generation_is_stale() {
    let (state, first) = make_state().refresh();
    let (state, second) = state.refresh();
    let (first, second) = (first.unwrap(), second.unwrap());
    assert_eq!(first.tag.query, second.tag.query);
    assert_eq!(first.tag.page, second.tag.page);
    let state = state.apply_fetch(&first.tag, Ok(make_fetched(&[("old", "Old", None)])));
    assert!(state.is_loading());
  }

  // --- failures ---

  #[test]
  fn failed_fetch_settles_empty_and_not_loading() {
    let (state, req) = make_state().refresh();
    let err = FetchError::Api { status: 403, message: "quota exceeded".to_string() };
    let state = state.apply_fetch(&req.unwrap().tag, Err(err));
    assert!(!state.is_loading());
    assert!(state.projection().is_empty());
    assert!(state.last_error().unwrap().contains("quota exceeded"));
  }

  #[test]
  fn abandoned_fetch_settles_empty_and_not_loading() {
    let (state, req) = make_state().refresh();
    let state = state.abandon_fetch(&req.unwrap().tag);
    assert!(!state.is_loading());
    assert!(state.last_error().is_some());
    let state = state.clear_error();
    assert!(state.last_error().is_none());
  }

  #[test]
  fn missing_detail_does_not_break_sorting() {
    let state = loaded(&[("a", "A", Some("PT5M")), ("b", "B", None), ("c", "C", Some("PT1M"))]).toggle_sort();
    assert_eq!(ids(&state), vec!["b", "c", "a"]);
  }

  // --- filter and sort ---

  #[test]
  fn filter_after_sort_keeps_sort_order() {
    let state = loaded(&[
      ("long", "Yoga Long", Some("PT5M")),
      ("other", "Pilates", Some("PT1M")),
      ("mid", "Yoga Mid", Some("PT2M")),
      ("short", "yoga short", Some("PT1M")),
    ]);
    let state = state.toggle_sort().with_filter("YOGA");
    assert_eq!(ids(&state), vec!["short", "mid", "long"]);
    let state = state.with_filter("");
    assert_eq!(ids(&state), vec!["other", "short", "mid", "long"]);
  }

  #[test]
  fn toggling_sort_off_restores_fetched_order() {
    let state = loaded(&[("a", "A", Some("PT5M")), ("b", "B", Some("PT1M"))]).toggle_sort();
    assert_eq!(ids(&state), vec!["b", "a"]);
    let state = state.toggle_sort();
    assert_eq!(ids(&state), vec!["a", "b"]);
  }

  #[test]
  fn filter_survives_refetch() {
    let (state, req) = loaded(&[("a", "Yoga", None)]).with_filter("core").change_page(1);
    assert_eq!(state.filter(), "core");
    let state = state.apply_fetch(&req.unwrap().tag, Ok(make_fetched(&[("c", "Core Burn", None), ("d", "Legs", None)])));
    assert_eq!(ids(&state), vec!["c"]);
  }

  // --- overlay ---

  #[test]
  fn open_and_close_overlay() {
    let state = loaded(&[("a", "A", None), ("b", "B", None)]).open("b");
    assert_eq!(state.selected().map(|s| s.id.as_str()), Some("b"));
    let state = state.close();
    assert!(state.selected().is_none());
    assert_eq!(state.fetched().summaries.len(), 2);
  }

  #[test]
  fn open_unknown_id_is_ignored() {
    let state = loaded(&[("a", "A", None)]).open("zzz");
    assert!(state.selected().is_none());
  }

  #[test]
  fn refetch_clears_selection() {
    let (state, _) = loaded(&[("a", "A", None)]).open("a").change_page(1);
    assert!(state.selected().is_none());
  }
}
