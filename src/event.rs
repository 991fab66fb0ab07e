use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::cache::{PageMerge, SyncError};
use crate::github::types::Repo;

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Terminal resized to this many rows
  Resize(u16),
  /// Periodic tick for spinner animation
  Tick,
  /// Progress from the running sync task
  Sync(SyncEvent),
}

/// Messages from the background sync task to the event loop
#[derive(Debug)]
pub enum SyncEvent {
  /// One page merged
  PageMerged(PageMerge<Repo>),
  /// The run ended
  Finished(Result<SyncSummary, SyncError>),
}

/// What a successful run did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSummary {
  pub added: usize,
  pub pages: usize,
  /// Collection size written to disk, `None` when caching is disabled
  pub saved_len: Option<usize>,
}

/// Event handler that produces events from terminal input and a tick timer
pub struct EventHandler {
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Create a new event handler with the given tick rate
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    let input_tx = tx.clone();

    // Terminal polling blocks, so keep it off the async workers
    tokio::task::spawn_blocking(move || loop {
      let event = if event::poll(tick_rate).unwrap_or(false) {
        match event::read() {
          Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
          Ok(CrosstermEvent::Resize(_, rows)) => Some(Event::Resize(rows)),
          _ => None,
        }
      } else {
        Some(Event::Tick)
      };

      if let Some(event) = event {
        if input_tx.send(event).is_err() {
          break;
        }
      }
    });

    Self { tx, rx }
  }

  /// Sender for tasks that report back into the event loop
  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
