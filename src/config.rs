use anyhow::{Result, bail};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::constants::{Category, constants};

/// Optional user overrides read from `config.toml` in the platform config dir.
///
/// ```toml
/// page_size = 12
/// theme_name = "Chalk"
///
/// [[categories]]
/// label = "Mobility"
/// query = "mobility routine"
/// ```
#[derive(Deserialize, Default, Debug)]
pub struct Config {
  pub categories: Option<Vec<Category>>,
  pub page_size: Option<u32>,
  pub total_results: Option<u32>,
  pub theme_name: Option<String>,
}

pub fn project_dirs() -> Option<ProjectDirs> {
  ProjectDirs::from("", "", "yfit")
}

impl Config {
  pub fn path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join("config.toml"))
  }

  pub fn load() -> Self {
    let Some(path) = Self::path() else { return Self::default() };
    let Ok(content) = std::fs::read_to_string(&path) else { return Self::default() };
    Self::parse(&content).unwrap_or_else(|e| {
      warn!(path = %path.display(), err = %e, "config: ignoring unreadable config file");
      Self::default()
    })
  }

  pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(content)
  }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
  pub category: Option<String>,
  pub page_size: Option<u32>,
  pub total_results: Option<u32>,
}

/// Effective settings after layering CLI > config file > built-in constants.
#[derive(Debug, Clone)]
pub struct Settings {
  pub categories: Vec<Category>,
  pub initial_category: usize,
  pub page_size: u32,
  pub total_results: u32,
  pub theme_name: Option<String>,
}

impl Settings {
  pub fn resolve(config: Config, overrides: &Overrides) -> Result<Self> {
    let defaults = constants();
    let categories = match config.categories {
      Some(list) if !list.is_empty() => list,
      Some(_) => {
        warn!("config: empty category list, using built-in categories");
        defaults.categories.clone()
      }
      None => defaults.categories.clone(),
    };

    let initial_category = match overrides.category.as_deref() {
      None => 0,
      Some(name) => match find_category(&categories, name) {
        Some(idx) => idx,
        None => {
          let known: Vec<&str> = categories.iter().map(|c| c.label.as_str()).collect();
          bail!("Unknown category '{}'. Available: {}", name, known.join(", "));
        }
      },
    };

    let page_size = overrides.page_size.or(config.page_size).unwrap_or(defaults.page_size);
    let total_results = overrides.total_results.or(config.total_results).unwrap_or(defaults.total_results);
    if page_size == 0 || total_results == 0 {
      bail!("page size and total results must both be at least 1");
    }

    info!(categories = categories.len(), page_size, total_results, "config: settings resolved");
    Ok(Self { categories, initial_category, page_size, total_results, theme_name: config.theme_name })
  }
}

/// Match a category by label or query, ignoring case.
pub fn find_category(categories: &[Category], name: &str) -> Option<usize> {
  let name = name.trim();
  categories.iter().position(|c| c.label.eq_ignore_ascii_case(name) || c.query.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cat(label: &str, query: &str) -> Category {
    Category { label: label.to_string(), query: query.to_string() }
  }

  // --- parsing ---

  #[test]
  fn parse_empty_config() {
    let config = Config::parse("").unwrap();
    assert!(config.categories.is_none());
    assert!(config.page_size.is_none());
  }

  #[test]
  fn parse_full_config() {
    let config = Config::parse(
      r#"
page_size = 12
total_results = 120
theme_name = "Chalk"

[[categories]]
label = "Mobility"
query = "mobility routine"
"#,
    )
    .unwrap();
    assert_eq!(config.page_size, Some(12));
    assert_eq!(config.total_results, Some(120));
    assert_eq!(config.theme_name.as_deref(), Some("Chalk"));
    assert_eq!(config.categories, Some(vec![cat("Mobility", "mobility routine")]));
  }

  #[test]
  fn parse_rejects_wrong_types() {
    assert!(Config::parse("page_size = \"ten\"").is_err());
  }

  // --- resolution ---

  #[test]
  fn defaults_come_from_constants() {
    let s = Settings::resolve(Config::default(), &Overrides::default()).unwrap();
    assert_eq!(s.page_size, 10);
    assert_eq!(s.total_results, 200);
    assert_eq!(s.initial_category, 0);
    assert_eq!(s.categories[0].label, "Pilates");
  }

  #[test]
  fn cli_overrides_config() {
    let config = Config { page_size: Some(20), total_results: Some(100), ..Config::default() };
    let overrides = Overrides { page_size: Some(5), ..Overrides::default() };
    let s = Settings::resolve(config, &overrides).unwrap();
    assert_eq!(s.page_size, 5);
    assert_eq!(s.total_results, 100);
  }

  #[test]
  fn empty_category_list_falls_back_to_defaults() {
    let config = Config { categories: Some(Vec::new()), ..Config::default() };
    let s = Settings::resolve(config, &Overrides::default()).unwrap();
    assert_eq!(s.categories.len(), 3);
  }

  #[test]
  fn initial_category_by_label_or_query() {
    let overrides = Overrides { category: Some("barre workout".to_string()), ..Overrides::default() };
    let s = Settings::resolve(Config::default(), &overrides).unwrap();
    assert_eq!(s.initial_category, 2);

    let overrides = Overrides { category: Some("YOGA".to_string()), ..Overrides::default() };
    assert_eq!(Settings::resolve(Config::default(), &overrides).unwrap().initial_category, 1);
  }

  #[test]
  fn unknown_category_is_an_error() {
    let overrides = Overrides { category: Some("Zumba".to_string()), ..Overrides::default() };
    let err = Settings::resolve(Config::default(), &overrides).unwrap_err();
    assert!(err.to_string().contains("Zumba"));
  }

  #[test]
  fn zero_page_size_is_an_error() {
    let overrides = Overrides { page_size: Some(0), ..Overrides::default() };
    assert!(Settings::resolve(Config::default(), &overrides).is_err());
  }

  #[test]
  fn find_category_ignores_case_and_whitespace() {
    let cats = vec![cat("Pilates", "Pilates"), cat("Barre", "Barre Workout")];
    assert_eq!(find_category(&cats, " barre "), Some(1));
    assert_eq!(find_category(&cats, "nope"), None);
  }
}
