//! Display order for the results list.
//!
//! The fetched collection is never reordered. Every render derives the visible
//! sequence from it: filter by title first, then (optionally) a stable sort by
//! duration over what survived the filter.

use std::collections::HashMap;

use crate::duration::parse_duration;
use crate::youtube::{VideoDetail, VideoSummary};

/// Resolved duration of a summary in seconds; 0 when the detail call did not cover it.
pub fn resolve_duration(summary: &VideoSummary, details: &HashMap<String, VideoDetail>) -> u64 {
  details.get(&summary.id).map_or(0, |d| parse_duration(&d.duration_iso))
}

pub fn project<'a>(
  summaries: &'a [VideoSummary],
  details: &HashMap<String, VideoDetail>,
  filter: &str,
  sort_by_duration: bool,
) -> Vec<&'a VideoSummary> {
  // Case-insensitive title substring match; an empty filter keeps everything.
  let needle = filter.to_lowercase();
  let mut visible: Vec<&VideoSummary> =
    summaries.iter().filter(|s| needle.is_empty() || s.title.to_lowercase().contains(&needle)).collect();
  if sort_by_duration {
    // sort_by_cached_key is stable, so equal durations keep their fetched order.
    visible.sort_by_cached_key(|s| resolve_duration(s, details));
  }
  visible
}
