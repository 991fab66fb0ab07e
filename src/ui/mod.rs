pub mod components;
pub mod renderfns;
mod views;

use crate::app::App;
use crate::cache::PageFetcher;
use crate::github::types::Repo;
use crate::list::ListState;
use ratatui::prelude::*;
use renderfns::{draw_footer, draw_header, StatusLine};

/// Rows taken by the header, search bar and footer
const CHROME_HEIGHT: u16 = 3;

/// How many repositories fit in the list for a terminal of the given height
pub fn list_rows(height: u16) -> usize {
  // Two border rows around the list
  let inner = height.saturating_sub(CHROME_HEIGHT + 2);
  usize::from((inner / views::ROWS_PER_ITEM).max(1))
}

/// Count summary for the status line, with items a refresh is holding back
fn count_line(list: &ListState) -> String {
  if list.is_deferring() && list.pending_len() > 0 {
    format!("+{} pending  {}", list.pending_len(), list.count_text())
  } else {
    list.count_text()
  }
}

/// Main draw function
pub fn draw<F: PageFetcher<Item = Repo> + 'static>(frame: &mut Frame, app: &App<F>) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Length(1), // Search bar
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status line
    ])
    .split(frame.area());

  let list = app.list();
  draw_header(frame, chunks[0], app.api_url(), list.sort_mode().label());
  app.search().render(frame, chunks[1]);
  views::draw_stars(frame, chunks[2], list, app.is_fetching());

  let count = count_line(list);
  let (text, is_error) = app.status();
  draw_footer(
    frame,
    chunks[3],
    &StatusLine {
      text,
      is_error,
      spinner: app.is_fetching().then(|| app.spinner_frame()),
      count: &count,
    },
  );
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_list_rows() {
    // 40 rows: 3 chrome + 2 borders leaves 35, 11 full items
    assert_eq!(list_rows(40), 11);
    assert_eq!(list_rows(8), 1);
    // Tiny terminals still get one row
    assert_eq!(list_rows(2), 1);
  }

  #[test]
  fn test_count_line_shows_pending() {
    use crate::list::ListEvent;

    let mut list = ListState::new(vec![Repo::named("a/one")]);
    assert_eq!(count_line(&list), "1 loaded");

    list.apply(ListEvent::SyncStarted { foreground: true });
    list.apply(ListEvent::PageMerged {
      items: vec![Repo::named("b/two"), Repo::named("b/three")],
      has_more: true,
      total_count: 3,
    });
    assert_eq!(count_line(&list), "+2 pending  3 total");

    list.apply(ListEvent::SyncAborted);
    assert_eq!(count_line(&list), "3 total");
  }
}
