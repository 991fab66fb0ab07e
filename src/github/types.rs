use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A starred repository
///
/// The aliases accept snapshots written by the older gh-stars release, which
/// used Go's exported field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repo {
  /// "owner/name", unique within a snapshot
  #[serde(alias = "NameWithOwner")]
  pub name_with_owner: String,
  #[serde(default, alias = "Name")]
  pub name: String,
  #[serde(default, alias = "Description")]
  pub description: String,
  #[serde(default, alias = "URL")]
  pub url: String,
  /// Stargazer count
  #[serde(default, alias = "Stars")]
  pub stars: u64,
  /// Empty when GitHub has no language for the repo
  #[serde(default, alias = "PrimaryLanguage")]
  pub primary_language: String,
  #[serde(default, alias = "UpdatedAt", deserialize_with = "deserialize_time")]
  pub updated_at: Option<DateTime<Utc>>,
  #[serde(default, alias = "IsFork")]
  pub is_fork: bool,
  #[serde(default, alias = "Topics", deserialize_with = "deserialize_topics")]
  pub topics: Vec<String>,
  /// When the viewer starred the repo
  #[serde(default)]
  pub starred_at: Option<DateTime<Utc>>,
}

impl Repo {
  /// Minimal repo with only an identity
  #[cfg(test)]
  pub fn named(name_with_owner: &str) -> Self {
    let name = name_with_owner
      .rsplit('/')
      .next()
      .unwrap_or(name_with_owner)
      .to_string();
    Self {
      name_with_owner: name_with_owner.to_string(),
      name,
      description: String::new(),
      url: format!("https://github.com/{}", name_with_owner),
      stars: 0,
      primary_language: String::new(),
      updated_at: None,
      is_fork: false,
      topics: Vec::new(),
      starred_at: None,
    }
  }
}

/// The zero time `0001-01-01T00:00:00Z` stands for "unknown".
fn deserialize_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
  D: Deserializer<'de>,
{
  let v: Option<DateTime<Utc>> = Option::deserialize(deserializer)?;
  Ok(v.filter(|t| t.timestamp() > 0))
}

/// `null` topics read as none.
fn deserialize_topics<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let v: Option<Vec<String>> = Option::deserialize(deserializer)?;
  Ok(v.unwrap_or_default())
}

/// Trim topic names, drop empty ones and exact duplicates, keep order and case.
pub fn normalize_topics<I, S>(topics: I) -> Vec<String>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut out: Vec<String> = Vec::new();
  for topic in topics {
    let topic = topic.as_ref().trim();
    if topic.is_empty() || out.iter().any(|t| t == topic) {
      continue;
    }
    out.push(topic.to_string());
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_normalize_topics() {
    let topics = normalize_topics([" rust ", "cli", "", "rust", "CLI", "  "]);
    assert_eq!(topics, vec!["rust", "cli", "CLI"]);
  }

  #[test]
  fn test_named() {
    let repo = Repo::named("tokio-rs/tokio");
    assert_eq!(repo.name, "tokio");
    assert_eq!(repo.url, "https://github.com/tokio-rs/tokio");
  }

  #[test]
  fn test_deserialize_with_missing_fields() {
    let repo: Repo = serde_json::from_str(r#"{"name_with_owner":"a/b","license":"MIT"}"#).unwrap();
    assert_eq!(repo.name_with_owner, "a/b");
    assert!(repo.topics.is_empty());
    assert!(repo.starred_at.is_none());
  }

  #[test]
  fn test_deserialize_legacy_field_names() {
    let json = r#"{
      "Name": "ripgrep",
      "NameWithOwner": "BurntSushi/ripgrep",
      "Description": "recursively search directories",
      "URL": "https://github.com/BurntSushi/ripgrep",
      "Stars": 48000,
      "PrimaryLanguage": "Rust",
      "UpdatedAt": "2024-05-01T10:00:00Z",
      "IsFork": false,
      "Topics": ["cli", "search"]
    }"#;
    let repo: Repo = serde_json::from_str(json).unwrap();
    assert_eq!(repo.name_with_owner, "BurntSushi/ripgrep");
    assert_eq!(repo.name, "ripgrep");
    assert_eq!(repo.url, "https://github.com/BurntSushi/ripgrep");
    assert_eq!(repo.stars, 48000);
    assert_eq!(repo.primary_language, "Rust");
    assert!(repo.updated_at.is_some());
    assert_eq!(repo.topics, vec!["cli", "search"]);
  }

  #[test]
  fn test_deserialize_zero_time_and_null_topics() {
    let json = r#"{"NameWithOwner":"a/b","UpdatedAt":"0001-01-01T00:00:00Z","Topics":null}"#;
    let repo: Repo = serde_json::from_str(json).unwrap();
    assert!(repo.updated_at.is_none());
    assert!(repo.topics.is_empty());
  }
}
