use crate::browser;
use crate::cache::{PageFetcher, Snapshot, SyncError, Synchronizer};
use crate::clipboard::Clipboard;
use crate::event::{Event, EventHandler, SyncEvent, SyncSummary};
use crate::github::types::Repo;
use crate::list::{self, ListEvent, ListState};
use crate::ui;
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Which kind of sync run is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
  /// Started at launch with nothing cached, or by an explicit refresh
  Foreground,
  /// Opportunistic refresh of a stale snapshot
  Background,
}

/// Decide whether the session starts with a sync run, and which kind.
pub fn startup_sync(
  snapshot: &Snapshot<Repo>,
  store_enabled: bool,
  refresh: bool,
  interval: chrono::Duration,
) -> Option<FetchKind> {
  if refresh || snapshot.items.is_empty() {
    return Some(FetchKind::Foreground);
  }
  if store_enabled && snapshot.is_stale(interval) {
    return Some(FetchKind::Background);
  }
  None
}

/// Main application state
pub struct App<F> {
  list: ListState,
  search: SearchInput,
  sync: Arc<Synchronizer<F>>,
  clipboard: Clipboard,
  api_url: String,

  /// Kind of the run in flight, if any
  fetching: Option<FetchKind>,
  /// Resolves to whether the run wrote the snapshot
  sync_task: Option<JoinHandle<bool>>,

  status: String,
  status_is_error: bool,

  /// Collection size the snapshot on disk is known to hold
  persisted_len: usize,

  spinner: usize,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  should_quit: bool,
}

impl<F: PageFetcher<Item = Repo> + 'static> App<F> {
  pub fn new(sync: Synchronizer<F>, snapshot: Snapshot<Repo>, api_url: String) -> Self {
    let (tx, _rx) = mpsc::unbounded_channel();

    let status = if snapshot.items.is_empty() {
      String::new()
    } else {
      format!("Loaded {} repositories from cache", snapshot.items.len())
    };
    let list = ListState::new(snapshot.items);

    Self {
      persisted_len: list.total_len(),
      list,
      search: SearchInput::new(),
      sync: Arc::new(sync),
      clipboard: Clipboard::default(),
      api_url,
      fetching: None,
      sync_task: None,
      status,
      status_is_error: false,
      spinner: 0,
      event_tx: tx,
      should_quit: false,
    }
  }

  pub async fn run(&mut self, startup: Option<FetchKind>, warning: Option<String>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(Duration::from_millis(100));
    self.event_tx = events.sender();

    let size = terminal.size()?;
    self.dispatch(ListEvent::ViewportResized(ui::list_rows(size.height)));

    if let Some(kind) = startup {
      self.start_sync(kind);
    }
    if let Some(warning) = warning {
      self.set_error(warning);
    }

    let result = self.event_loop(&mut terminal, &mut events).await;

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    if let Err(e) = self.save_unsaved().await {
      eprintln!("gh-stars: {}", e);
    }
    result
  }

  async fn event_loop(
    &mut self,
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Resize(height) => self.dispatch(ListEvent::ViewportResized(ui::list_rows(height))),
      Event::Tick => {
        if self.fetching.is_some() {
          self.spinner = self.spinner.wrapping_add(1);
        }
      }
      Event::Sync(sync_event) => self.handle_sync_event(sync_event),
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(query)) => {
        self.dispatch(ListEvent::QueryChanged(query));
        return;
      }
      KeyResult::Event(SearchEvent::Submitted) | KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    let page = self.list.viewport_rows() as isize;
    match key.code {
      KeyCode::Char('q') => self.should_quit = true,

      // Navigation
      KeyCode::Up | KeyCode::Char('k') => self.dispatch(ListEvent::CursorMove(-1)),
      KeyCode::Down | KeyCode::Char('j') => self.dispatch(ListEvent::CursorMove(1)),
      KeyCode::PageUp => self.dispatch(ListEvent::CursorMove(-page)),
      KeyCode::PageDown => self.dispatch(ListEvent::CursorMove(page)),
      KeyCode::Home | KeyCode::Char('g') => self.dispatch(ListEvent::JumpTop),
      KeyCode::End | KeyCode::Char('G') => self.dispatch(ListEvent::JumpBottom),

      KeyCode::Enter => self.open_selected(),
      KeyCode::Char('y') => self.copy_selected(),
      KeyCode::Char('r') | KeyCode::Char('R') => {
        self.start_sync(FetchKind::Foreground);
      }
      KeyCode::Char('s') => self.dispatch(ListEvent::SortModeCycled),
      _ => {}
    }
  }

  fn open_selected(&mut self) {
    let Some(repo) = self.list.selected() else {
      return;
    };
    match browser::open_url(&repo.url) {
      Ok(()) => self.set_status("Opened in browser"),
      Err(e) => self.set_error(format!("Open failed: {}", e)),
    }
  }

  fn copy_selected(&mut self) {
    let Some(repo) = self.list.selected() else {
      return;
    };
    let url = repo.url.clone();
    match self.clipboard.copy_url(&url) {
      Ok(()) => self.set_status("Copied URL"),
      Err(e) => self.set_error(format!("Copy failed: {}", e)),
    }
  }

  fn dispatch(&mut self, event: ListEvent) {
    self.list = list::reduce(std::mem::take(&mut self.list), event);
  }

  /// Launch a sync run seeded from the current collection.
  ///
  /// Returns false when a run is already in flight; the request is dropped.
  fn start_sync(&mut self, kind: FetchKind) -> bool {
    if self.fetching.is_some() {
      self.set_status("A sync is already in progress");
      return false;
    }

    let seed = self.list.items().to_vec();
    self.dispatch(ListEvent::SyncStarted {
      foreground: kind == FetchKind::Foreground,
    });
    self.fetching = Some(kind);
    self.spinner = 0;

    let status = match kind {
      FetchKind::Foreground if seed.is_empty() => "Loading starred repositories...",
      FetchKind::Foreground => "Refreshing...",
      FetchKind::Background => "Syncing in background...",
    };
    self.set_status(status);
    tracing::info!(?kind, cached = seed.len(), "starting sync");

    let sync = Arc::clone(&self.sync);
    let tx = self.event_tx.clone();
    self.sync_task = Some(tokio::spawn(async move {
      let page_tx = tx.clone();
      let result = sync
        .run(seed, move |merge| {
          let _ = page_tx.send(Event::Sync(SyncEvent::PageMerged(merge)));
        })
        .await;
      let saved = matches!(&result, Ok(report) if report.saved_at.is_some());
      let summary = result.map(|report| SyncSummary {
        added: report.added,
        pages: report.pages,
        saved_len: report.saved_at.map(|_| report.items.len()),
      });
      let _ = tx.send(Event::Sync(SyncEvent::Finished(summary)));
      saved
    }));
    true
  }

  fn handle_sync_event(&mut self, event: SyncEvent) {
    match event {
      SyncEvent::PageMerged(merge) => self.dispatch(ListEvent::PageMerged {
        items: merge.items,
        has_more: merge.has_more,
        total_count: merge.total_count,
      }),
      SyncEvent::Finished(result) => self.finish_sync(result),
    }
  }

  fn finish_sync(&mut self, result: std::result::Result<SyncSummary, SyncError>) {
    self.fetching = None;
    self.sync_task = None;

    match result {
      Ok(summary) => {
        if let Some(len) = summary.saved_len {
          self.persisted_len = len;
        }
        let text = match summary.added {
          0 => "Up to date".to_string(),
          1 => "1 new repository".to_string(),
          n => format!("{} new repositories", n),
        };
        tracing::info!(added = summary.added, pages = summary.pages, "sync complete");
        self.set_status(text);
      }
      Err(SyncError::Persist { added, source }) => {
        // Items are on screen; saving is retried on exit
        tracing::error!(added, error = %source, "cache save failed");
        self.set_error(format!("cache save failed: {}", source));
      }
      Err(SyncError::Busy(path)) => {
        self.dispatch(ListEvent::SyncAborted);
        tracing::warn!(path = %path.display(), "sync already running");
        self.set_status("A sync is already in progress");
      }
      Err(SyncError::Fetch(e)) => {
        self.dispatch(ListEvent::SyncAborted);
        tracing::error!(error = %e, "sync failed");
        self.set_error(format!("Sync failed: {}", e));
      }
      Err(SyncError::Save(source)) => {
        tracing::error!(error = %source, "cache save failed");
        self.set_error(format!("cache save failed: {}", source));
      }
    }
  }

  /// Write the collection if it holds items the snapshot on disk lacks.
  ///
  /// Returns whether anything was written.
  async fn save_unsaved(&mut self) -> Result<bool> {
    // The run is abandoned; its items so far are already in the list.
    // Waiting for it releases its lease before we save.
    if let Some(task) = self.sync_task.take() {
      task.abort();
      let finished_and_saved = task.await.unwrap_or(false);
      self.fetching = None;
      // Its snapshot holds every item the list has seen from it
      if finished_and_saved {
        self.persisted_len = self.list.total_len();
      }
    }
    if !self.has_unsaved() {
      return Ok(false);
    }
    self.sync.save(self.list.items())?;
    self.persisted_len = self.list.total_len();
    tracing::info!(items = self.persisted_len, "saved unsaved items on exit");
    Ok(true)
  }

  fn set_status(&mut self, text: impl Into<String>) {
    self.status = text.into();
    self.status_is_error = false;
  }

  fn set_error(&mut self, text: impl Into<String>) {
    self.status = text.into();
    self.status_is_error = true;
  }

  // Accessors for UI rendering

  pub fn list(&self) -> &ListState {
    &self.list
  }

  pub fn search(&self) -> &SearchInput {
    &self.search
  }

  pub fn api_url(&self) -> &str {
    &self.api_url
  }

  pub fn is_fetching(&self) -> bool {
    self.fetching.is_some()
  }

  pub fn spinner_frame(&self) -> usize {
    self.spinner
  }

  /// Status line text and whether it reports an error
  pub fn status(&self) -> (&str, bool) {
    (&self.status, self.status_is_error)
  }

  /// Whether the collection holds items the snapshot on disk does not
  pub fn has_unsaved(&self) -> bool {
    self.sync.store().is_enabled() && self.list.total_len() > self.persisted_len
  }

  #[cfg(test)]
  fn set_event_sender(&mut self, tx: mpsc::UnboundedSender<Event>) {
    self.event_tx = tx;
  }
}
