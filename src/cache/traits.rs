//! Core traits and types for the caching system.

use color_eyre::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;

/// Trait for entities that can be cached.
///
/// Implementors must provide a unique cache key. Two entities with the same
/// key are the same entity as far as merging is concerned.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  /// Unique identifier for this entity (e.g., "owner/name")
  fn cache_key(&self) -> &str;
}

/// One page of results from a paginated remote listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
  /// Entities in the order the remote returned them (newest first)
  pub items: Vec<T>,
  /// Total number of entities the remote reports for the whole listing
  pub total_count: usize,
  /// Continuation token for the next page, if the remote returned one
  pub end_cursor: Option<String>,
  /// Whether the remote says more pages exist
  pub has_next: bool,
}

impl<T> Page<T> {
  /// Cursor to continue with, only when the remote says there is more.
  pub fn next_cursor(&self) -> Option<&str> {
    if !self.has_next {
      return None;
    }
    self.end_cursor.as_deref().filter(|c| !c.is_empty())
  }
}

/// Source of pages for the synchronizer.
///
/// `after` is `None` for the first page of a run. Errors are transport or
/// auth failures and are passed through to the caller unchanged.
pub trait PageFetcher: Send + Sync {
  type Item: Cacheable;

  fn fetch_page(
    &self,
    page_size: usize,
    after: Option<&str>,
  ) -> impl Future<Output = Result<Page<Self::Item>>> + Send;
}

#[cfg(test)]
mod tests {
  use super::*;

  fn page(end_cursor: Option<&str>, has_next: bool) -> Page<()> {
    Page {
      items: Vec::new(),
      total_count: 0,
      end_cursor: end_cursor.map(String::from),
      has_next,
    }
  }

  #[test]
  fn test_next_cursor_when_more_pages() {
    assert_eq!(page(Some("abc"), true).next_cursor(), Some("abc"));
  }

  #[test]
  fn test_next_cursor_last_page() {
    assert_eq!(page(Some("abc"), false).next_cursor(), None);
  }

  #[test]
  fn test_next_cursor_missing_or_empty() {
    assert_eq!(page(None, true).next_cursor(), None);
    assert_eq!(page(Some(""), true).next_cursor(), None);
  }
}
