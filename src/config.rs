use chrono::Duration;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Where snapshots were kept before the per-user config directory was used
pub const LEGACY_CACHE_PATH: &str = ".cache/gh-stars.json";

const DEFAULT_API_URL: &str = "https://api.github.com/graphql";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Stars fetched per request (1..=100)
  pub page_size: usize,
  /// Snapshot location. Unset means the default path, empty disables caching.
  pub cache_path: Option<PathBuf>,
  /// Age after which the snapshot is refreshed in the background
  #[serde(deserialize_with = "deserialize_interval")]
  pub sync_interval: Duration,
  /// GraphQL endpoint
  pub api_url: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      page_size: 100,
      cache_path: None,
      sync_interval: Duration::hours(48),
      api_url: DEFAULT_API_URL.to_string(),
    }
  }
}

fn deserialize_interval<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
  D: serde::Deserializer<'de>,
{
  // `sync_interval: 0` arrives as a YAML integer
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Raw {
    Text(String),
    Number(i64),
  }

  let s = match Raw::deserialize(deserializer)? {
    Raw::Text(s) => s,
    Raw::Number(n) => n.to_string(),
  };
  parse_interval(&s).map_err(serde::de::Error::custom)
}

/// Parse a duration such as `48h`, `1h30m`, `2d`, `90s` or `0`.
///
/// A leading `-` yields a negative duration, which disables background sync
/// just like zero does.
pub fn parse_interval(input: &str) -> std::result::Result<Duration, String> {
  let s = input.trim();
  let (negative, body) = match s.strip_prefix('-') {
    Some(rest) => (true, rest.trim_start()),
    None => (false, s),
  };
  if !body.is_empty() && body.chars().all(|c| c == '0') {
    return Ok(Duration::zero());
  }

  let parsed = humantime::parse_duration(body)
    .map_err(|e| format!("invalid interval '{}': {}", input, e))?;
  let total =
    Duration::from_std(parsed).map_err(|_| format!("interval '{}' is too large", input))?;
  Ok(if negative { -total } else { total })
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./gh-stars.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/gh-stars/config.yaml
  ///
  /// Without a config file the defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };
    config.validate()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("gh-stars.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("gh-stars").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn from_yaml(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    // An empty file deserializes as null rather than an empty mapping
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  pub fn validate(&self) -> Result<()> {
    if !(1..=100).contains(&self.page_size) {
      return Err(eyre!(
        "page_size must be between 1 and 100, got {}",
        self.page_size
      ));
    }
    Ok(())
  }

  /// The snapshot path to use; empty means caching is disabled.
  pub fn resolved_cache_path(&self) -> PathBuf {
    self.cache_path.clone().unwrap_or_else(default_cache_path)
  }

  /// Whether the snapshot lives at the default location.
  pub fn uses_default_cache_path(&self) -> bool {
    self.cache_path.is_none() || self.cache_path.as_deref() == Some(default_cache_path().as_path())
  }

  /// Get the GitHub API token.
  ///
  /// Checks GH_STARS_TOKEN, GITHUB_TOKEN and GH_TOKEN, then asks the `gh` CLI.
  pub fn get_api_token() -> Result<String> {
    for var in ["GH_STARS_TOKEN", "GITHUB_TOKEN", "GH_TOKEN"] {
      if let Ok(token) = std::env::var(var) {
        if !token.trim().is_empty() {
          return Ok(token.trim().to_string());
        }
      }
    }

    let output = std::process::Command::new("gh")
      .args(["auth", "token"])
      .output()
      .ok()
      .filter(|o| o.status.success());

    match output {
      Some(o) => {
        let token = String::from_utf8_lossy(&o.stdout).trim().to_string();
        if token.is_empty() {
          Err(eyre!("`gh auth token` returned an empty token"))
        } else {
          Ok(token)
        }
      }
      None => Err(eyre!(
        "GitHub token not found. Set GH_STARS_TOKEN or GITHUB_TOKEN, \
         or make sure `gh auth login` has been run."
      )),
    }
  }
}

/// Default snapshot location: the user config dir, then ~/.config, then a
/// path relative to the working directory.
pub fn default_cache_path() -> PathBuf {
  if let Some(dir) = dirs::config_dir() {
    return dir.join("gh-stars").join("cache.json");
  }
  if let Some(home) = dirs::home_dir() {
    return home.join(".config").join("gh-stars").join("cache.json");
  }
  PathBuf::from(LEGACY_CACHE_PATH)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::from_yaml("").unwrap();
    assert_eq!(config.page_size, 100);
    assert_eq!(config.sync_interval, Duration::hours(48));
    assert!(config.cache_path.is_none());
    assert_eq!(config.api_url, DEFAULT_API_URL);
  }

  #[test]
  fn test_parse_yaml() {
    let config = Config::from_yaml(
      "page_size: 50\ncache_path: /tmp/stars.json\nsync_interval: 6h\nunknown: 1\n",
    );
    // Unknown keys are tolerated
    let config = config.unwrap();
    assert_eq!(config.page_size, 50);
    assert_eq!(config.cache_path, Some(PathBuf::from("/tmp/stars.json")));
    assert_eq!(config.sync_interval, Duration::hours(6));

    let config = Config::from_yaml("sync_interval: 0\n").unwrap();
    assert_eq!(config.sync_interval, Duration::zero());
    assert!(Config::from_yaml("sync_interval: 12\n").is_err());
  }

  #[test]
  fn test_empty_cache_path_disables() {
    let config = Config::from_yaml("cache_path: \"\"\n").unwrap();
    assert_eq!(config.resolved_cache_path(), PathBuf::new());
    assert!(!config.uses_default_cache_path());
  }

  #[test]
  fn test_invalid_page_size() {
    let config = Config::from_yaml("page_size: 500\n").unwrap();
    assert!(config.validate().is_err());
    let config = Config::from_yaml("page_size: 0\n").unwrap();
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_parse_interval() {
    assert_eq!(parse_interval("48h"), Ok(Duration::hours(48)));
    assert_eq!(parse_interval("1h30m"), Ok(Duration::minutes(90)));
    assert_eq!(parse_interval("2d"), Ok(Duration::days(2)));
    assert_eq!(parse_interval("90s"), Ok(Duration::seconds(90)));
    assert_eq!(parse_interval("250ms"), Ok(Duration::milliseconds(250)));
    assert_eq!(parse_interval("0"), Ok(Duration::zero()));
    assert_eq!(parse_interval("-1h"), Ok(Duration::hours(-1)));
    assert_eq!(parse_interval(" 1h 30m "), Ok(Duration::minutes(90)));
    assert_eq!(parse_interval("1w"), Ok(Duration::days(7)));
  }

  #[test]
  fn test_parse_interval_errors() {
    assert!(parse_interval("").is_err());
    assert!(parse_interval("12").is_err());
    assert!(parse_interval("5x").is_err());
    assert!(parse_interval("-").is_err());
    assert!(parse_interval("h").is_err());
    assert!(parse_interval("3h5").is_err());
  }
}
