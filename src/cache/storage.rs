//! Snapshot storage: a JSON file holding every cached entity plus the time
//! it was last written.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::traits::Cacheable;

/// Errors from loading or saving a snapshot.
#[derive(Debug, Error)]
pub enum CacheError {
  #[error("failed to read snapshot {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to parse snapshot {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
  #[error("failed to encode snapshot: {0}")]
  Encode(#[from] serde_json::Error),
  #[error("failed to write snapshot {}: {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// A persisted collection of entities, most recently merged first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Cacheable"))]
pub struct Snapshot<T> {
  /// When the snapshot was last saved, `None` if never
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    deserialize_with = "deserialize_saved_at"
  )]
  pub saved_at: Option<DateTime<Utc>>,
  #[serde(default, rename = "repos", alias = "items")]
  pub items: Vec<T>,
}

impl<T> Default for Snapshot<T> {
  fn default() -> Self {
    Self {
      saved_at: None,
      items: Vec::new(),
    }
  }
}

impl<T> Snapshot<T> {
  /// Whether this snapshot should be refreshed given the sync interval.
  pub fn is_stale(&self, interval: Duration) -> bool {
    is_stale(self.saved_at, interval)
  }
}

/// Treat the zero timestamp some writers emit for "never" as absent.
fn deserialize_saved_at<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
  D: Deserializer<'de>,
{
  let v: Option<DateTime<Utc>> = Option::deserialize(deserializer)?;
  Ok(v.filter(|t| t.timestamp() > 0))
}

/// Decide whether enough time has passed since `saved_at` to refresh.
///
/// A non-positive interval disables refreshing entirely. A snapshot that was
/// never saved is always stale.
pub fn is_stale(saved_at: Option<DateTime<Utc>>, interval: Duration) -> bool {
  if interval <= Duration::zero() {
    return false;
  }
  match saved_at {
    None => true,
    Some(saved_at) => Utc::now() - saved_at >= interval,
  }
}

/// Path-addressed snapshot store.
///
/// An empty path disables the store: loads return an empty snapshot and
/// saves are discarded.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
  path: Option<PathBuf>,
}

impl SnapshotStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    let path = path.into();
    if path.as_os_str().is_empty() {
      Self::disabled()
    } else {
      Self { path: Some(path) }
    }
  }

  /// A store that never reads or writes anything.
  pub fn disabled() -> Self {
    Self { path: None }
  }

  pub fn path(&self) -> Option<&Path> {
    self.path.as_deref()
  }

  pub fn is_enabled(&self) -> bool {
    self.path.is_some()
  }

  /// Load the snapshot. A missing file is an empty snapshot, not an error.
  pub fn load<T: Cacheable>(&self) -> Result<Snapshot<T>, CacheError> {
    let Some(path) = self.path.as_deref() else {
      return Ok(Snapshot::default());
    };

    let content = match std::fs::read(path) {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Snapshot::default()),
      Err(source) => {
        return Err(CacheError::Read {
          path: path.to_path_buf(),
          source,
        })
      }
    };

    let snapshot: Snapshot<T> =
      serde_json::from_slice(&content).map_err(|source| CacheError::Parse {
        path: path.to_path_buf(),
        source,
      })?;

    tracing::debug!(
      path = %path.display(),
      items = snapshot.items.len(),
      "loaded snapshot"
    );
    Ok(snapshot)
  }

  /// Save `items` stamped with the current time.
  ///
  /// The file is written to a temporary sibling and renamed over the target,
  /// so a crash mid-write leaves the previous snapshot intact.
  pub fn save<T: Cacheable>(&self, items: &[T]) -> Result<Option<DateTime<Utc>>, CacheError> {
    let Some(path) = self.path.as_deref() else {
      return Ok(None);
    };

    let write_err = |source: std::io::Error| CacheError::Write {
      path: path.to_path_buf(),
      source,
    };

    let dir = match path.parent() {
      Some(dir) if !dir.as_os_str().is_empty() => dir,
      _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let saved_at = Utc::now();
    let snapshot = SnapshotRef {
      saved_at,
      items,
    };
    let content = serde_json::to_vec_pretty(&snapshot)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(&content).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    tracing::debug!(path = %path.display(), items = items.len(), "saved snapshot");
    Ok(Some(saved_at))
  }

  /// Copy a non-empty snapshot from `legacy` into this store.
  ///
  /// Returns the migrated snapshot, or `None` when the legacy store had
  /// nothing to offer. The legacy file is left in place.
  pub fn migrate_from<T: Cacheable>(
    &self,
    legacy: &SnapshotStore,
  ) -> Result<Option<Snapshot<T>>, CacheError> {
    if !self.is_enabled() || legacy.path() == self.path() {
      return Ok(None);
    }
    let old: Snapshot<T> = legacy.load()?;
    if old.items.is_empty() {
      return Ok(None);
    }
    let saved_at = self.save(&old.items)?;
    tracing::info!(
      from = ?legacy.path(),
      to = ?self.path(),
      items = old.items.len(),
      "migrated legacy snapshot"
    );
    Ok(Some(Snapshot {
      saved_at,
      items: old.items,
    }))
  }
}

/// Borrowed form of [`Snapshot`] so saving does not clone the collection.
#[derive(Serialize)]
struct SnapshotRef<'a, T> {
  saved_at: DateTime<Utc>,
  #[serde(rename = "repos")]
  items: &'a [T],
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde::{Deserialize, Serialize};

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Entry {
    key: String,
  }

  impl Cacheable for Entry {
    fn cache_key(&self) -> &str {
      &self.key
    }
  }

  fn entries(keys: &[&str]) -> Vec<Entry> {
    keys
      .iter()
      .map(|k| Entry { key: k.to_string() })
      .collect()
  }

  #[test]
  fn test_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("missing.json"));
    let snapshot: Snapshot<Entry> = store.load().unwrap();
    assert!(snapshot.saved_at.is_none());
    assert!(snapshot.items.is_empty());
  }

  #[test]
  fn test_disabled_store() {
    let store = SnapshotStore::new("");
    assert!(!store.is_enabled());
    assert_eq!(store.save(&entries(&["a"])).unwrap(), None);
    let snapshot: Snapshot<Entry> = store.load().unwrap();
    assert!(snapshot.items.is_empty());
  }

  #[test]
  fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("cache.json");
    let store = SnapshotStore::new(&path);

    let saved_at = store.save(&entries(&["b", "a"])).unwrap();
    assert!(saved_at.is_some());

    let snapshot: Snapshot<Entry> = store.load().unwrap();
    assert_eq!(snapshot.items, entries(&["b", "a"]));
    assert_eq!(snapshot.saved_at, saved_at);
  }

  #[test]
  fn test_save_leaves_no_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("cache.json"));
    store.save(&entries(&["a"])).unwrap();
    store.save(&entries(&["b", "a"])).unwrap();

    let names: Vec<_> = std::fs::read_dir(dir.path())
      .unwrap()
      .map(|e| e.unwrap().file_name())
      .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("cache.json")]);
  }

  #[test]
  fn test_malformed_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");
    std::fs::write(&path, "{ not json").unwrap();

    let result: Result<Snapshot<Entry>, _> = SnapshotStore::new(&path).load();
    assert!(matches!(result, Err(CacheError::Parse { .. })));
  }

  #[test]
  fn test_unknown_fields_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");
    std::fs::write(
      &path,
      r#"{"saved_at":"2024-05-01T10:00:00Z","format":3,"items":[{"key":"a","extra":true}]}"#,
    )
    .unwrap();

    let snapshot: Snapshot<Entry> = SnapshotStore::new(&path).load().unwrap();
    assert_eq!(snapshot.items, entries(&["a"]));
    assert!(snapshot.saved_at.is_some());
  }

  #[test]
  fn test_zero_timestamp_means_never_saved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");
    std::fs::write(
      &path,
      r#"{"saved_at":"0001-01-01T00:00:00Z","repos":[{"key":"a"}]}"#,
    )
    .unwrap();

    let snapshot: Snapshot<Entry> = SnapshotStore::new(&path).load().unwrap();
    assert!(snapshot.saved_at.is_none());
    assert_eq!(snapshot.items.len(), 1);
  }

  #[test]
  fn test_never_saved_is_stale() {
    assert!(is_stale(None, Duration::hours(1)));
    assert!(is_stale(None, Duration::seconds(1)));
  }

  #[test]
  fn test_just_saved_is_fresh() {
    assert!(!is_stale(Some(Utc::now()), Duration::hours(48)));
  }

  #[test]
  fn test_old_snapshot_is_stale() {
    let saved_at = Utc::now() - Duration::hours(49);
    assert!(is_stale(Some(saved_at), Duration::hours(48)));
  }

  #[test]
  fn test_non_positive_interval_never_stale() {
    assert!(!is_stale(None, Duration::zero()));
    assert!(!is_stale(None, Duration::hours(-1)));
    let old = Utc::now() - Duration::days(365);
    assert!(!is_stale(Some(old), Duration::zero()));
  }

  #[test]
  fn test_migrate_from_legacy() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = SnapshotStore::new(dir.path().join("legacy.json"));
    legacy.save(&entries(&["b", "a"])).unwrap();

    let store = SnapshotStore::new(dir.path().join("new").join("cache.json"));
    let migrated: Snapshot<Entry> = store.migrate_from(&legacy).unwrap().unwrap();
    assert_eq!(migrated.items, entries(&["b", "a"]));
    assert!(migrated.saved_at.is_some());

    let reloaded: Snapshot<Entry> = store.load().unwrap();
    assert_eq!(reloaded.items, entries(&["b", "a"]));
    // Legacy file stays where it was
    assert!(dir.path().join("legacy.json").exists());
  }

  #[test]
  fn test_migrate_skips_empty_legacy() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = SnapshotStore::new(dir.path().join("absent.json"));
    let store = SnapshotStore::new(dir.path().join("cache.json"));
    let migrated: Option<Snapshot<Entry>> = store.migrate_from(&legacy).unwrap();
    assert!(migrated.is_none());
    assert!(!dir.path().join("cache.json").exists());
  }
}
