//! Incremental synchronization of a paginated remote listing into a snapshot.
//!
//! Listings are consumed newest first. Every page is split into entities the
//! snapshot has never seen (prepended) and entities it already has. The first
//! page that contains a known entity proves the rest of the listing is
//! already cached, so the run stops there.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use thiserror::Error;

use super::storage::{CacheError, SnapshotStore};
use super::traits::{Cacheable, PageFetcher};

/// Errors that end a synchronization run.
#[derive(Debug, Error)]
pub enum SyncError {
  /// Another run holds the lease for this store.
  #[error("a sync is already running for {}", .0.display())]
  Busy(PathBuf),
  /// A page fetch failed. Nothing was saved.
  #[error("fetch failed: {0}")]
  Fetch(color_eyre::Report),
  /// Every page merged, but writing the snapshot failed.
  #[error("cache save failed after adding {added} items: {source}")]
  Persist {
    added: usize,
    #[source]
    source: CacheError,
  },
  /// A save outside of a run failed.
  #[error("cache save failed: {0}")]
  Save(#[source] CacheError),
}

/// New entities from one page, handed to the caller as soon as they merge.
#[derive(Debug, Clone)]
pub struct PageMerge<T> {
  /// Entities not seen before, in page order
  pub items: Vec<T>,
  /// Whether the run will fetch another page after this one
  pub has_more: bool,
  /// Total the remote reports for the whole listing
  pub total_count: usize,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct SyncReport<T> {
  /// Number of entities added to the snapshot
  pub added: usize,
  /// Number of pages fetched
  pub pages: usize,
  /// When the snapshot was written, `None` for a disabled store
  pub saved_at: Option<DateTime<Utc>>,
  /// The merged collection, most recent first
  pub items: Vec<T>,
}

/// Store paths with a run in flight in this process.
fn active_runs() -> &'static Mutex<HashSet<PathBuf>> {
  static ACTIVE: OnceLock<Mutex<HashSet<PathBuf>>> = OnceLock::new();
  ACTIVE.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Exclusive claim on a store path for the duration of one run.
#[derive(Debug)]
struct RunLease {
  key: PathBuf,
}

impl RunLease {
  fn acquire(key: &Path) -> Result<Self, SyncError> {
    let mut active = active_runs()
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    if !active.insert(key.to_path_buf()) {
      return Err(SyncError::Busy(key.to_path_buf()));
    }
    Ok(Self {
      key: key.to_path_buf(),
    })
  }
}

impl Drop for RunLease {
  fn drop(&mut self) {
    let mut active = active_runs()
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    active.remove(&self.key);
  }
}

/// Drives page fetches and merges them into a snapshot store.
pub struct Synchronizer<F> {
  fetcher: F,
  page_size: usize,
  store: SnapshotStore,
}

impl<F: PageFetcher> Synchronizer<F> {
  pub fn new(fetcher: F, page_size: usize, store: SnapshotStore) -> Self {
    Self {
      fetcher,
      page_size,
      store,
    }
  }

  pub fn store(&self) -> &SnapshotStore {
    &self.store
  }

  /// Whether a run currently holds the lease for this synchronizer's store.
  #[cfg(test)]
  pub fn is_running(&self) -> bool {
    let active = active_runs()
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    active.contains(self.lease_key())
  }

  fn lease_key(&self) -> &Path {
    self.store.path().unwrap_or(Path::new(""))
  }

  /// Write `items` to the store outside of a run.
  ///
  /// Takes the same lease as [`Synchronizer::run`], so it fails with
  /// [`SyncError::Busy`] instead of racing a run's own save.
  pub fn save(&self, items: &[F::Item]) -> Result<Option<DateTime<Utc>>, SyncError> {
    let _lease = RunLease::acquire(self.lease_key())?;
    self.store.save(items).map_err(SyncError::Save)
  }

  /// Run one synchronization, starting from `seed` (the current snapshot).
  ///
  /// `on_page` is called after each page merges, in fetch order. The store is
  /// written once, after the last page; a fetch error leaves it untouched.
  pub async fn run<P>(
    &self,
    seed: Vec<F::Item>,
    mut on_page: P,
  ) -> Result<SyncReport<F::Item>, SyncError>
  where
    P: FnMut(PageMerge<F::Item>),
  {
    let _lease = RunLease::acquire(self.lease_key())?;

    let mut known: HashSet<String> = seed.iter().map(|e| e.cache_key().to_string()).collect();
    let mut items = seed;
    let mut cursor: Option<String> = None;
    let mut added = 0;
    let mut pages = 0;

    loop {
      let page = self
        .fetcher
        .fetch_page(self.page_size, cursor.as_deref())
        .await
        .map_err(SyncError::Fetch)?;
      pages += 1;

      let mut found_cached = false;
      let mut fresh = Vec::with_capacity(page.items.len());
      for entity in &page.items {
        if known.contains(entity.cache_key()) {
          found_cached = true;
          continue;
        }
        known.insert(entity.cache_key().to_string());
        fresh.push(entity.clone());
      }

      let next = if found_cached {
        None
      } else {
        page.next_cursor().map(String::from)
      };
      if page.has_next && !found_cached && next.is_none() {
        tracing::warn!(page = pages, "remote reported more pages without a cursor");
      }

      tracing::debug!(
        page = pages,
        fetched = page.items.len(),
        new = fresh.len(),
        found_cached,
        "merged page"
      );

      added += fresh.len();
      if !fresh.is_empty() {
        items = fresh.iter().cloned().chain(items).collect();
      }
      on_page(PageMerge {
        items: fresh,
        has_more: next.is_some(),
        total_count: page.total_count,
      });

      match next {
        Some(next) => cursor = Some(next),
        None => break,
      }
    }

    let saved_at = self
      .store
      .save(&items)
      .map_err(|source| SyncError::Persist { added, source })?;

    tracing::info!(added, pages, total = items.len(), "sync finished");
    Ok(SyncReport {
      added,
      pages,
      saved_at,
      items,
    })
  }
}
