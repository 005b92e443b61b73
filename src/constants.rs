//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!`, so there is no runtime file
//! I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// A category preset: the label shown in the tab bar and the search query it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
  pub label: String,
  pub query: String,
}

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // YouTube Data API v3
  pub api_base: String,
  pub embed_base: String,

  // Default category presets (overridable from config.toml)
  pub categories: Vec<Category>,

  // Pagination
  pub page_size: u32,
  pub total_results: u32,

  // Provider limits
  pub max_results_per_request: u32,
  pub max_ids_per_request: usize,

  // UI
  pub error_dismiss_secs: u64,
  pub poll_interval_ms: u64,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
