use regex::Regex;
use std::sync::LazyLock;

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
  // Safety: the pattern is a literal; a typo here fails every test in this module.
  Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").expect("duration pattern must compile")
});

/// Convert a YouTube `contentDetails.duration` value (ISO 8601, e.g. `PT1H2M3S`) to seconds.
///
/// Never fails: text without a `PT` marker yields 0, absent components count as 0,
/// and a component too large for `u64` counts as 0.
pub fn parse_duration(text: &str) -> u64 {
  let Some(caps) = DURATION_RE.captures(text) else { return 0 };
  let part = |idx: usize| -> u64 { caps.get(idx).and_then(|m| m.as_str().parse().ok()).unwrap_or(0) };
  part(1).saturating_mul(3600).saturating_add(part(2).saturating_mul(60)).saturating_add(part(3))
}

/// Render seconds as `m:ss`, or `h:mm:ss` from one hour up.
pub fn format_duration(seconds: u64) -> String {
  let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
  if h > 0 { format!("{}:{:02}:{:02}", h, m, s) } else { format!("{}:{:02}", m, s) }
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- parse_duration ---

  #[test]
  fn parse_full_duration() {
    assert_eq!(parse_duration("PT1H2M3S"), 3723);
  }

  #[test]
  fn parse_single_components() {
    assert_eq!(parse_duration("PT45S"), 45);
    assert_eq!(parse_duration("PT2H"), 7200);
    assert_eq!(parse_duration("PT15M"), 900);
  }

  #[test]
  fn parse_skipped_middle_component() {
    assert_eq!(parse_duration("PT1H30S"), 3630);
  }

  #[test]
  fn parse_empty_and_garbage_yield_zero() {
    assert_eq!(parse_duration(""), 0);
    assert_eq!(parse_duration("garbage"), 0);
    assert_eq!(parse_duration("12:34"), 0);
  }

  #[test]
  fn parse_bare_marker_yields_zero() {
    assert_eq!(parse_duration("PT"), 0);
    assert_eq!(parse_duration("PT0S"), 0);
  }

  #[test]
  fn parse_day_durations_do_not_match() {
    // Live streams report `P0D`; multi-day values put `T` after the day part.
    assert_eq!(parse_duration("P0D"), 0);
    assert_eq!(parse_duration("P1DT2H"), 0);
  }

  #[test]
  fn parse_overflowing_component_counts_as_zero() {
    assert_eq!(parse_duration("PT99999999999999999999999H5S"), 5);
  }

  // --- format_duration ---

  #[test]
  fn format_under_an_hour() {
    assert_eq!(format_duration(0), "0:00");
    assert_eq!(format_duration(45), "0:45");
    assert_eq!(format_duration(905), "15:05");
  }

  #[test]
  fn format_hours() {
    assert_eq!(format_duration(3723), "1:02:03");
    assert_eq!(format_duration(7200), "2:00:00");
  }
}
