use std::ops::Range;

/// Current page within a fixed-size result window.
///
/// Invariant: `1 <= current <= max_page()`. All constructors and transitions clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
  current: u32,
  page_size: u32,
  total_available: u32,
}

impl PageState {
  /// Zero sizes are bumped to 1 so `max_page()` is always at least 1.
  pub fn new(page_size: u32, total_available: u32) -> Self {
    Self { current: 1, page_size: page_size.max(1), total_available: total_available.max(1) }
  }

  pub fn current(&self) -> u32 {
    self.current
  }

  pub fn page_size(&self) -> u32 {
    self.page_size
  }

  pub fn max_page(&self) -> u32 {
    self.total_available.div_ceil(self.page_size)
  }

  pub fn can_go_previous(&self) -> bool {
    self.current > 1
  }

  pub fn can_go_next(&self) -> bool {
    self.current < self.max_page()
  }

  /// Move by `delta` pages, clamped to `[1, max_page()]`.
  pub fn advance(self, delta: i64) -> Self {
    let target = (self.current as i64).saturating_add(delta).clamp(1, self.max_page() as i64);
    Self { current: target as u32, ..self }
  }

  /// Back to page 1, keeping the sizes.
  pub fn reset(self) -> Self {
    Self { current: 1, ..self }
  }

  /// Number of results the search request asks for: everything up to the end of this page.
  pub fn max_results(&self) -> u32 {
    self.page_size.saturating_mul(self.current)
  }

  /// Index range of the current page inside a fetched list of `len` items.
  pub fn window(&self, len: usize) -> Range<usize> {
    let start = ((self.current - 1) as usize).saturating_mul(self.page_size as usize).min(len);
    let end = start.saturating_add(self.page_size as usize).min(len);
    start..end
  }
}
