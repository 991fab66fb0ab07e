//! List state for the starred repositories view.
//!
//! The whole view state is one value driven by [`ListEvent`]s, so every
//! transition can be exercised without a terminal:
//!
//! ```ignore
//! let state = reduce(state, ListEvent::QueryChanged("rust cli".into()));
//! let state = reduce(state, ListEvent::CursorMove(1));
//! ```
//!
//! The collection is kept "most recently merged first". Filtering and sorting
//! produce an index into it; the cursor and scroll offset point into that
//! index and are re-clamped whenever it changes.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::github::types::Repo;

/// Order of the filtered list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
  /// Most recently starred first
  #[default]
  Starred,
  /// Most stargazers first
  Stars,
  /// owner/name, case-insensitive
  Name,
  /// Most recently updated first
  Updated,
}

impl SortMode {
  pub fn next(self) -> Self {
    match self {
      SortMode::Starred => SortMode::Stars,
      SortMode::Stars => SortMode::Name,
      SortMode::Name => SortMode::Updated,
      SortMode::Updated => SortMode::Starred,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      SortMode::Starred => "starred",
      SortMode::Stars => "stars",
      SortMode::Name => "name",
      SortMode::Updated => "updated",
    }
  }

  fn compare(self, a: &Repo, b: &Repo) -> Ordering {
    match self {
      SortMode::Starred => b.starred_at.cmp(&a.starred_at),
      SortMode::Stars => b.stars.cmp(&a.stars),
      SortMode::Name => a
        .name_with_owner
        .to_lowercase()
        .cmp(&b.name_with_owner.to_lowercase()),
      SortMode::Updated => b.updated_at.cmp(&a.updated_at),
    }
  }
}

/// Inputs to the list state
#[derive(Debug, Clone)]
pub enum ListEvent {
  /// The search text changed
  QueryChanged(String),
  /// Switch to the next sort mode
  SortModeCycled,
  /// New repositories from one fetched page
  PageMerged {
    items: Vec<Repo>,
    /// Whether the run that produced this page will fetch another one
    has_more: bool,
    total_count: usize,
  },
  /// Move the cursor by a number of rows (negative is up)
  CursorMove(isize),
  JumpTop,
  JumpBottom,
  /// Number of rows that fit in the list viewport
  ViewportResized(usize),
  /// A sync run began. Foreground runs hold merged pages back until the run
  /// completes so the list does not shift under the cursor.
  SyncStarted { foreground: bool },
  /// The running sync failed; anything held back is dropped.
  SyncAborted,
}

/// What the list area should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStatus {
  /// Nothing loaded at all
  NoData,
  /// Repositories exist but none match the query
  NoMatches,
  Items,
}

#[derive(Debug, Clone)]
pub struct ListState {
  items: Vec<Repo>,
  known: HashSet<String>,
  filtered: Vec<usize>,
  query: String,
  sort_mode: SortMode,
  cursor: usize,
  offset: usize,
  rows: usize,
  remote_total: usize,
  deferring: bool,
  pending: Vec<Repo>,
  pending_keys: HashSet<String>,
}

impl Default for ListState {
  fn default() -> Self {
    Self::new(Vec::new())
  }
}

/// Apply one event to the state and return the new state.
pub fn reduce(mut state: ListState, event: ListEvent) -> ListState {
  state.apply(event);
  state
}

impl ListState {
  /// Create the state over an initial collection. Later duplicates of an
  /// identity are dropped.
  pub fn new(items: Vec<Repo>) -> Self {
    let mut known = HashSet::with_capacity(items.len());
    let items: Vec<Repo> = items
      .into_iter()
      .filter(|r| known.insert(r.name_with_owner.clone()))
      .collect();

    let mut state = Self {
      items,
      known,
      filtered: Vec::new(),
      query: String::new(),
      sort_mode: SortMode::default(),
      cursor: 0,
      offset: 0,
      rows: 1,
      remote_total: 0,
      deferring: false,
      pending: Vec::new(),
      pending_keys: HashSet::new(),
    };
    state.refilter();
    state
  }

  pub fn apply(&mut self, event: ListEvent) {
    match event {
      ListEvent::QueryChanged(query) => {
        if query != self.query {
          self.query = query;
          self.refilter();
        }
      }
      ListEvent::SortModeCycled => {
        self.sort_mode = self.sort_mode.next();
        self.refilter();
      }
      ListEvent::PageMerged {
        items,
        has_more,
        total_count,
      } => self.merge_page(items, has_more, total_count),
      ListEvent::CursorMove(delta) => self.move_cursor(delta),
      ListEvent::JumpTop => {
        if !self.filtered.is_empty() {
          self.cursor = 0;
          self.offset = 0;
        }
      }
      ListEvent::JumpBottom => {
        if !self.filtered.is_empty() {
          self.cursor = self.filtered.len() - 1;
          self.offset = (self.cursor + 1).saturating_sub(self.rows);
        }
      }
      ListEvent::ViewportResized(rows) => {
        self.rows = rows.max(1);
        self.ensure_cursor_visible();
      }
      ListEvent::SyncStarted { foreground } => {
        self.clear_pending();
        // With nothing on screen there is no position to protect
        self.deferring = foreground && !self.items.is_empty();
      }
      ListEvent::SyncAborted => {
        if !self.pending.is_empty() {
          tracing::debug!(dropped = self.pending.len(), "dropping deferred items");
        }
        self.clear_pending();
        self.deferring = false;
      }
    }
  }

  fn merge_page(&mut self, items: Vec<Repo>, has_more: bool, total_count: usize) {
    if total_count > 0 {
      self.remote_total = total_count;
    }

    let mut seen = HashSet::new();
    let fresh: Vec<Repo> = items
      .into_iter()
      .filter(|r| {
        !self.known.contains(&r.name_with_owner)
          && !self.pending_keys.contains(&r.name_with_owner)
          && seen.insert(r.name_with_owner.clone())
      })
      .collect();

    if self.deferring {
      self.pending_keys.extend(fresh.iter().map(|r| r.name_with_owner.clone()));
      let held = std::mem::take(&mut self.pending);
      self.pending = fresh.into_iter().chain(held).collect();
      if !has_more {
        self.flush_pending();
      }
      return;
    }

    if fresh.is_empty() {
      return;
    }
    self.known.extend(fresh.iter().map(|r| r.name_with_owner.clone()));
    let rest = std::mem::take(&mut self.items);
    self.items = fresh.into_iter().chain(rest).collect();
    self.refilter();
  }

  /// Prepend everything held back during a foreground run in one step.
  fn flush_pending(&mut self) {
    self.deferring = false;
    if self.pending.is_empty() {
      return;
    }
    tracing::debug!(added = self.pending.len(), "applying deferred items");
    self.known.extend(self.pending_keys.drain());
    let pending = std::mem::take(&mut self.pending);
    let rest = std::mem::take(&mut self.items);
    self.items = pending.into_iter().chain(rest).collect();
    self.refilter();
  }

  fn clear_pending(&mut self) {
    self.pending.clear();
    self.pending_keys.clear();
  }

  /// Rebuild the filtered index from scratch and re-clamp the cursor.
  fn refilter(&mut self) {
    let terms: Vec<String> = self
      .query
      .to_lowercase()
      .split_whitespace()
      .map(String::from)
      .collect();

    self.filtered = self
      .items
      .iter()
      .enumerate()
      .filter(|(_, repo)| matches_terms(repo, &terms))
      .map(|(i, _)| i)
      .collect();

    if self.filtered.is_empty() {
      self.cursor = 0;
      self.offset = 0;
      return;
    }

    let items = &self.items;
    let mode = self.sort_mode;
    // Stable, so ties keep collection order
    self
      .filtered
      .sort_by(|&a, &b| mode.compare(&items[a], &items[b]));

    self.cursor = self.cursor.min(self.filtered.len() - 1);
    self.ensure_cursor_visible();
  }

  fn move_cursor(&mut self, delta: isize) {
    if self.filtered.is_empty() {
      return;
    }
    let last = self.filtered.len() - 1;
    self.cursor = if delta < 0 {
      self.cursor.saturating_sub(delta.unsigned_abs())
    } else {
      self.cursor.saturating_add(delta as usize).min(last)
    };
    self.ensure_cursor_visible();
  }

  fn ensure_cursor_visible(&mut self) {
    if self.filtered.is_empty() {
      self.cursor = 0;
      self.offset = 0;
      return;
    }
    if self.cursor < self.offset {
      self.offset = self.cursor;
    }
    if self.cursor >= self.offset + self.rows {
      self.offset = self.cursor + 1 - self.rows;
    }
  }

  // Accessors for rendering

  /// Every repository, most recently merged first
  pub fn items(&self) -> &[Repo] {
    &self.items
  }

  pub fn total_len(&self) -> usize {
    self.items.len()
  }

  pub fn filtered_len(&self) -> usize {
    self.filtered.len()
  }

  pub fn query(&self) -> &str {
    &self.query
  }

  pub fn sort_mode(&self) -> SortMode {
    self.sort_mode
  }

  pub fn cursor(&self) -> usize {
    self.cursor
  }

  #[cfg(test)]
  pub fn offset(&self) -> usize {
    self.offset
  }

  pub fn viewport_rows(&self) -> usize {
    self.rows
  }

  /// Items held back by a running foreground sync
  pub fn pending_len(&self) -> usize {
    self.pending.len()
  }

  pub fn is_deferring(&self) -> bool {
    self.deferring
  }

  pub fn status(&self) -> ListStatus {
    if self.items.is_empty() {
      ListStatus::NoData
    } else if self.filtered.is_empty() {
      ListStatus::NoMatches
    } else {
      ListStatus::Items
    }
  }

  /// The rows in the viewport with their position in the filtered list
  pub fn visible(&self) -> impl Iterator<Item = (usize, &Repo)> + '_ {
    let end = (self.offset + self.rows).min(self.filtered.len());
    let start = self.offset.min(end);
    self.filtered[start..end]
      .iter()
      .enumerate()
      .map(move |(i, &idx)| (start + i, &self.items[idx]))
  }

  pub fn selected(&self) -> Option<&Repo> {
    self
      .filtered
      .get(self.cursor)
      .and_then(|&idx| self.items.get(idx))
  }

  /// Short count summary for the status line
  pub fn count_text(&self) -> String {
    if self.remote_total == 0 {
      if self.items.is_empty() {
        return String::new();
      }
      return format!("{} loaded", self.items.len());
    }
    if !self.query.trim().is_empty() {
      return format!("{}/{} match", self.filtered.len(), self.remote_total);
    }
    format!("{} total", self.remote_total)
  }
}

/// Whether `repo` matches a search query.
///
/// Every whitespace-separated term must appear, case-insensitively, in the
/// repo's name, owner/name, description, language or topics.
#[cfg(test)]
pub fn matches_query(repo: &Repo, query: &str) -> bool {
  let terms: Vec<String> = query
    .to_lowercase()
    .split_whitespace()
    .map(String::from)
    .collect();
  matches_terms(repo, &terms)
}

fn matches_terms(repo: &Repo, terms: &[String]) -> bool {
  if terms.is_empty() {
    return true;
  }
  let haystack = [
    repo.name_with_owner.as_str(),
    repo.name.as_str(),
    repo.description.as_str(),
    repo.primary_language.as_str(),
    repo.topics.join(" ").as_str(),
  ]
  .join(" ")
  .to_lowercase();

  terms.iter().all(|term| haystack.contains(term.as_str()))
}
